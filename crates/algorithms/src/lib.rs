//! # Riparia Algorithms
//!
//! Riparian vegetation degradation detection on vegetation-index rasters.
//!
//! ## Components
//!
//! - **crs**: WGS84 ↔ UTM projection, CRS inference and hemisphere repair
//! - **vector**: bounding boxes and the exclusion-aware river buffer
//! - **degradation**: severity classification, buffer clip, statistics
//! - **sampling**: critical-point sampler, point identity, consistency check
//! - **pipeline**: single-unit and batch analysis
//! - **config**: the analysis configuration object

pub mod config;
pub mod crs;
pub mod degradation;
pub(crate) mod maybe_rayon;
pub mod pipeline;
pub mod sampling;
pub mod vector;

pub use config::AnalysisConfig;
pub use pipeline::{
    analyze, analyze_batch, analyze_with_rng, AcquisitionMetadata, AnalysisReport, AnalysisUnit,
    AreaOfInterest, DegradationAnalysis, Scene, UnitFailure, UnitResult,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::AnalysisConfig;
    pub use crate::crs::{resolve_crs, CrsParams, CrsResolution, CrsSource, HemisphereStrategy};
    pub use crate::degradation::{
        clip_to_buffer, compute_statistics, DegradationStatistics, DegradationStatus,
        SeverityClass, SeverityThresholds, StatusPolicy,
    };
    pub use crate::pipeline::{
        analyze, analyze_batch, analyze_with_rng, AcquisitionMetadata, AnalysisReport,
        AnalysisUnit, AreaOfInterest, DegradationAnalysis, Scene, UnitFailure, UnitResult,
    };
    pub use crate::sampling::{
        point_id, validate_consistency, ConsistencyParams, ConsistencyReport, CriticalPoint,
        PointSet, PrecisionFlag, SamplingParams,
    };
    pub use crate::vector::{build_riparian_zone, BufferParams, RiparianZone};
    pub use riparia_core::prelude::*;
}

//! Critical-point sampling and its checks
//!
//! - Sampler: capped uniform draw per severity class with buffer containment
//! - Identity: coordinate-derived point identifiers
//! - Consistency: sampled vs raster class distribution
//! - Point: point records, point sets and precision flags

mod consistency;
mod identity;
mod point;
mod sampler;

pub use consistency::{validate_consistency, ClassFractions, ConsistencyParams, ConsistencyReport};
pub use identity::{coordinate_key, point_id, POINT_ID_HEX_LEN, POINT_ID_PREFIX};
pub use point::{CriticalPoint, GenerationParameters, PointSet, PrecisionFlag, Provenance};
pub use sampler::{sample_points, ClassSample, SamplingInput, SamplingParams};

//! Degradation detection on vegetation-index rasters
//!
//! - Classify: severity thresholds and per-cell classes
//! - Clip: polygon mask-and-crop to the analysis buffer
//! - Stats: class fractions, index summary and overall status

mod classify;
mod clip;
mod stats;

pub use classify::{classify_raster, SeverityClass, SeverityThresholds};
pub use clip::clip_to_buffer;
pub use stats::{compute_statistics, ClassShare, DegradationStatistics, DegradationStatus, StatusPolicy};

//! Vector operations on riparian zone geometry
//!
//! - Spatial: bounding boxes and centroids
//! - River buffer: analysis buffer with the river channel subtracted

mod river_buffer;
mod spatial;

pub use river_buffer::{build_riparian_zone, riparian_zone_or_fallback, BufferParams, RiparianZone};
pub use spatial::{bounding_box, centroid, BoundingBox};

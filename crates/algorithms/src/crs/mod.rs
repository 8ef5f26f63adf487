//! Coordinate reference system handling
//!
//! - UTM: pure-Rust WGS84 ↔ UTM projection
//! - Reproject: geometry transforms between supported CRSs
//! - Resolve: raster CRS inference and hemisphere-mismatch repair

pub mod reproject;
pub mod resolve;
pub mod utm;

pub use reproject::{reproject_buffer, reproject_river, to_wgs84, Transformer};
pub use resolve::{
    detect_hemisphere_mismatch, infer_raster_crs, northing_offset, resolve_crs, CrsParams,
    CrsResolution, CrsSource, HemisphereCorrection, HemisphereStrategy, ResolvedInputs,
    EQUATORIAL_AMBIGUITY_DEG,
};
pub use utm::{utm_to_wgs84, wgs84_to_utm, FALSE_NORTHING_SOUTH};

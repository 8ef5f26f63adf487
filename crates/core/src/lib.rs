//! # Riparia Core
//!
//! Core types and traits for riparian vegetation degradation analysis.
//!
//! This crate provides:
//! - `Raster<T>`: Generic georeferenced raster grid (index rasters are `Raster<f64>`)
//! - `GeoTransform`: Affine transformation for georeferencing
//! - `CRS`, `UtmZone`: Coordinate Reference System handling
//! - `BufferGeometry`, `RiverCenterline`: vector geometries tied to a CRS
//! - `Error` / `FailureKind`: the unit-failure taxonomy
//! - `Algorithm` trait for a consistent component API

pub mod crs;
pub mod error;
pub mod raster;
pub mod vector;

pub use crs::{Hemisphere, UtmZone, CRS};
pub use error::{Error, FailureKind, Result};
pub use raster::{GeoTransform, Raster, RasterElement};
pub use vector::{BufferGeometry, BufferRole, RiverCenterline};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::crs::{Hemisphere, UtmZone, CRS};
    pub use crate::error::{Error, FailureKind, Result};
    pub use crate::raster::{GeoTransform, Raster, RasterElement};
    pub use crate::vector::{BufferGeometry, RiverCenterline};
    pub use crate::Algorithm;
}

/// Core trait for pipeline components.
///
/// Components are pure functions that transform input data according to parameters.
pub trait Algorithm {
    /// Input type for the algorithm
    type Input;
    /// Output type for the algorithm
    type Output;
    /// Parameters controlling algorithm behavior
    type Params: Default;
    /// Error type for algorithm execution
    type Error: std::error::Error;

    /// Returns the algorithm name
    fn name(&self) -> &'static str;

    /// Returns a description of what the algorithm does
    fn description(&self) -> &'static str;

    /// Execute the algorithm
    fn execute(&self, input: Self::Input, params: Self::Params) -> std::result::Result<Self::Output, Self::Error>;

    /// Execute with default parameters
    fn execute_default(&self, input: Self::Input) -> std::result::Result<Self::Output, Self::Error> {
        self.execute(input, Self::Params::default())
    }
}

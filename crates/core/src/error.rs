//! Error types for Riparia

use serde::Serialize;
use thiserror::Error;

/// Main error type for Riparia operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Index out of bounds: ({row}, {col}) in raster of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Empty input: {0}")]
    EmptyInput(String),

    #[error("Unsupported CRS: {0}")]
    UnsupportedCrs(String),

    #[error("CRS could not be resolved: {0}")]
    CrsUnresolved(String),

    #[error("CRS mismatch: {0} vs {1}")]
    CrsMismatch(String, String),

    #[error(
        "No spatial intersection: raster ({r_min_x:.1}, {r_min_y:.1}, {r_max_x:.1}, {r_max_y:.1}) \
         vs buffer ({b_min_x:.1}, {b_min_y:.1}, {b_max_x:.1}, {b_max_y:.1})"
    )]
    NoSpatialIntersection {
        r_min_x: f64,
        r_min_y: f64,
        r_max_x: f64,
        r_max_y: f64,
        b_min_x: f64,
        b_min_y: f64,
        b_max_x: f64,
        b_max_y: f64,
    },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Algorithm error: {0}")]
    Algorithm(String),

    #[error("{0}")]
    Other(String),
}

/// Coarse failure category of a unit of work.
///
/// Every failure is scoped to one raster/date/site; the kind tells a batch
/// driver whether the unit is worth retrying, skipping or escalating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Missing/empty raster or geometry, or a CRS the core cannot handle
    InputUnusable,
    /// Raster and buffer do not overlap once expressed in one CRS
    NoSpatialOverlap,
    /// No valid cells survived clipping
    InsufficientData,
    /// The analysis configuration itself is invalid
    Configuration,
    /// Anything else (bug or unexpected numeric failure)
    Internal,
}

impl Error {
    /// Map this error onto the unit-failure taxonomy
    pub fn kind(&self) -> FailureKind {
        match self {
            Error::EmptyInput(_)
            | Error::UnsupportedCrs(_)
            | Error::CrsUnresolved(_)
            | Error::CrsMismatch(_, _)
            | Error::InvalidDimensions { .. } => FailureKind::InputUnusable,
            Error::NoSpatialIntersection { .. } => FailureKind::NoSpatialOverlap,
            Error::InsufficientData(_) => FailureKind::InsufficientData,
            Error::InvalidParameter { .. } => FailureKind::Configuration,
            Error::IndexOutOfBounds { .. } | Error::Algorithm(_) | Error::Other(_) => {
                FailureKind::Internal
            }
        }
    }
}

/// Result type alias for Riparia operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            Error::EmptyInput("raster".into()).kind(),
            FailureKind::InputUnusable
        );
        assert_eq!(
            Error::InsufficientData("no valid cells".into()).kind(),
            FailureKind::InsufficientData
        );
        let no_overlap = Error::NoSpatialIntersection {
            r_min_x: 0.0,
            r_min_y: 0.0,
            r_max_x: 1.0,
            r_max_y: 1.0,
            b_min_x: 5.0,
            b_min_y: 5.0,
            b_max_x: 6.0,
            b_max_y: 6.0,
        };
        assert_eq!(no_overlap.kind(), FailureKind::NoSpatialOverlap);
        assert!(no_overlap.to_string().starts_with("No spatial intersection"));
    }
}

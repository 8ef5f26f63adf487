//! Severity classification of vegetation-index values
//!
//! Two ordered thresholds split valid cells into three classes:
//! `value < critical` is critical, `critical <= value < moderate` is
//! moderate, `value >= moderate` is healthy. Invalid cells form the
//! no-data residual.

use std::fmt;

use crate::maybe_rayon::*;
use ndarray::Array2;
use riparia_core::{Error, Raster, Result};
use serde::{Deserialize, Serialize};

/// Discrete degradation tier of a pixel or point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeverityClass {
    Critical,
    Moderate,
    Healthy,
    /// No valid measurement or not vegetated
    NoData,
}

impl SeverityClass {
    /// The three classes a valid cell can take, most severe first
    pub const VEGETATED: [SeverityClass; 3] = [
        SeverityClass::Critical,
        SeverityClass::Moderate,
        SeverityClass::Healthy,
    ];

    /// Cell code in a class raster (0 is no-data)
    pub fn code(self) -> u8 {
        match self {
            SeverityClass::NoData => 0,
            SeverityClass::Critical => 1,
            SeverityClass::Moderate => 2,
            SeverityClass::Healthy => 3,
        }
    }

    /// Inverse of [`SeverityClass::code`]; unknown codes are no-data
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => SeverityClass::Critical,
            2 => SeverityClass::Moderate,
            3 => SeverityClass::Healthy,
            _ => SeverityClass::NoData,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SeverityClass::Critical => "critical",
            SeverityClass::Moderate => "moderate",
            SeverityClass::Healthy => "healthy",
            SeverityClass::NoData => "no_data",
        }
    }
}

impl fmt::Display for SeverityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SeverityClass {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "critical" => Ok(SeverityClass::Critical),
            "moderate" => Ok(SeverityClass::Moderate),
            "healthy" => Ok(SeverityClass::Healthy),
            other => Err(Error::InvalidParameter {
                name: "severity_class",
                value: other.to_string(),
                reason: "expected critical, moderate or healthy".into(),
            }),
        }
    }
}

/// Ordered index thresholds separating the severity classes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityThresholds {
    /// Values below this are critical (default: 0.2)
    pub critical: f64,
    /// Values below this (and at or above `critical`) are moderate (default: 0.5)
    pub moderate: f64,
}

impl Default for SeverityThresholds {
    fn default() -> Self {
        Self {
            critical: 0.2,
            moderate: 0.5,
        }
    }
}

impl SeverityThresholds {
    /// Class of one index value; non-finite values are no-data
    #[inline]
    pub fn classify(&self, value: f64) -> SeverityClass {
        if !value.is_finite() {
            SeverityClass::NoData
        } else if value < self.critical {
            SeverityClass::Critical
        } else if value < self.moderate {
            SeverityClass::Moderate
        } else {
            SeverityClass::Healthy
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("thresholds.critical", self.critical),
            ("thresholds.moderate", self.moderate),
        ] {
            if !(-1.0..=1.0).contains(&value) {
                return Err(Error::InvalidParameter {
                    name,
                    value: value.to_string(),
                    reason: "must lie within [-1, 1]".into(),
                });
            }
        }
        if self.critical >= self.moderate {
            return Err(Error::InvalidParameter {
                name: "thresholds.critical",
                value: self.critical.to_string(),
                reason: format!("must be below thresholds.moderate ({})", self.moderate),
            });
        }
        Ok(())
    }
}

/// Classify every cell of an index raster.
///
/// Returns a `u8` class raster with the same georeferencing, holding
/// [`SeverityClass::code`] values and no-data 0. Cells that are no-data in
/// the index raster are no-data in the output.
pub fn classify_raster(raster: &Raster<f64>, thresholds: &SeverityThresholds) -> Result<Raster<u8>> {
    let (rows, cols) = raster.shape();

    let data: Vec<u8> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![SeverityClass::NoData.code(); cols];
            for (col, out) in row_data.iter_mut().enumerate() {
                let value = raster.data()[[row, col]];
                if !raster.is_nodata(value) {
                    *out = thresholds.classify(value).code();
                }
            }
            row_data
        })
        .collect();

    let mut output = raster.with_same_meta::<u8>(rows, cols);
    output.set_nodata(Some(SeverityClass::NoData.code()));
    *output.data_mut() =
        Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))?;
    Ok(output)
}

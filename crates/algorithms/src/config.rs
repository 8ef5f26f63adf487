//! Analysis configuration
//!
//! One explicit object passed through the pipeline, so concurrent analyses
//! can run under different policies. Every section falls back to its
//! defaults when missing from a config file.

use riparia_core::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::crs::CrsParams;
use crate::degradation::{SeverityThresholds, StatusPolicy};
use crate::sampling::{ConsistencyParams, SamplingParams};
use crate::vector::BufferParams;

/// Full parameter set of one analysis
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub buffer: BufferParams,
    pub thresholds: SeverityThresholds,
    pub status: StatusPolicy,
    pub sampling: SamplingParams,
    pub consistency: ConsistencyParams,
    pub crs: CrsParams,
}

impl AnalysisConfig {
    /// Reject parameter combinations that cannot produce a meaningful result
    pub fn validate(&self) -> Result<()> {
        let b = &self.buffer;
        if !(b.analysis_distance_m.is_finite() && b.analysis_distance_m > 0.0) {
            return Err(Error::InvalidParameter {
                name: "buffer.analysis_distance_m",
                value: b.analysis_distance_m.to_string(),
                reason: "must be a positive distance".into(),
            });
        }
        if !(b.channel_half_width_m.is_finite() && b.channel_half_width_m > 0.0) {
            return Err(Error::InvalidParameter {
                name: "buffer.channel_half_width_m",
                value: b.channel_half_width_m.to_string(),
                reason: "must be a positive distance".into(),
            });
        }
        if b.channel_half_width_m >= b.analysis_distance_m {
            return Err(Error::InvalidParameter {
                name: "buffer.channel_half_width_m",
                value: b.channel_half_width_m.to_string(),
                reason: format!(
                    "must be smaller than buffer.analysis_distance_m ({})",
                    b.analysis_distance_m
                ),
            });
        }

        self.thresholds.validate()?;
        self.status.validate()?;
        self.sampling.validate()?;
        self.consistency.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crs::HemisphereStrategy;
    use crate::degradation::SeverityClass;

    #[test]
    fn test_defaults_are_valid() {
        let config = AnalysisConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.buffer.analysis_distance_m, 200.0);
        assert_eq!(config.buffer.channel_half_width_m, 10.0);
        assert_eq!(config.thresholds.critical, 0.2);
        assert_eq!(config.thresholds.moderate, 0.5);
        assert_eq!(config.sampling.max_points_per_class, 50);
        assert_eq!(config.sampling.emit, vec![SeverityClass::Critical]);
        assert_eq!(config.consistency.tolerance, 0.20);
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let json = r#"{
            "sampling": { "emit": ["critical", "moderate"], "seed": 11 },
            "crs": { "hemisphere_correction": "explicit_crs" }
        }"#;
        let config: AnalysisConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.sampling.emit.len(), 2);
        assert_eq!(config.sampling.seed, Some(11));
        assert_eq!(config.sampling.max_points_per_class, 50);
        assert_eq!(config.crs.hemisphere_correction, HemisphereStrategy::ExplicitCrs);
        assert_eq!(config.buffer, BufferParams::default());
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut config = AnalysisConfig::default();
        config.buffer.channel_half_width_m = 300.0;
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidParameter { name: "buffer.channel_half_width_m", .. }
        ));

        let mut config = AnalysisConfig::default();
        config.buffer.analysis_distance_m = -5.0;
        assert!(config.validate().is_err());

        let mut config = AnalysisConfig::default();
        config.consistency.tolerance = -0.1;
        assert!(config.validate().is_err());

        let mut config = AnalysisConfig::default();
        config.sampling.emit.clear();
        assert!(config.validate().is_err());
    }
}

//! Degradation statistics over a clipped index raster

use riparia_core::{Error, Raster, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::classify::{SeverityClass, SeverityThresholds};

/// Overall condition of a riparian zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradationStatus {
    SeverelyDegraded,
    ModeratelyDegraded,
    AtRisk,
    Healthy,
}

/// Fraction cut-offs turning class fractions into a [`DegradationStatus`].
///
/// Rules are applied in order, first match wins:
/// 1. critical > `severe_critical` → severely degraded
/// 2. critical > `moderate_critical` or moderate > `moderate_moderate` → moderately degraded
/// 3. moderate > `at_risk_moderate` → at risk
/// 4. otherwise healthy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusPolicy {
    pub severe_critical: f64,
    pub moderate_critical: f64,
    pub moderate_moderate: f64,
    pub at_risk_moderate: f64,
}

impl Default for StatusPolicy {
    fn default() -> Self {
        Self {
            severe_critical: 0.30,
            moderate_critical: 0.10,
            moderate_moderate: 0.40,
            at_risk_moderate: 0.20,
        }
    }
}

impl StatusPolicy {
    pub fn status(&self, critical_fraction: f64, moderate_fraction: f64) -> DegradationStatus {
        if critical_fraction > self.severe_critical {
            DegradationStatus::SeverelyDegraded
        } else if critical_fraction > self.moderate_critical
            || moderate_fraction > self.moderate_moderate
        {
            DegradationStatus::ModeratelyDegraded
        } else if moderate_fraction > self.at_risk_moderate {
            DegradationStatus::AtRisk
        } else {
            DegradationStatus::Healthy
        }
    }

    pub fn validate(&self) -> Result<()> {
        let cutoffs = [
            ("status.severe_critical", self.severe_critical),
            ("status.moderate_critical", self.moderate_critical),
            ("status.moderate_moderate", self.moderate_moderate),
            ("status.at_risk_moderate", self.at_risk_moderate),
        ];
        for (name, value) in cutoffs {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::InvalidParameter {
                    name,
                    value: value.to_string(),
                    reason: "fraction must lie within [0, 1]".into(),
                });
            }
        }
        Ok(())
    }
}

/// Cell count and share of valid cells for one class
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ClassShare {
    pub count: usize,
    pub fraction: f64,
}

/// Summary of one clipped index raster
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DegradationStatistics {
    /// Cells with a valid index value inside the buffer
    pub valid_cells: usize,
    /// Cells of the clip window that are masked or no-data
    pub excluded_cells: usize,
    pub critical: ClassShare,
    pub moderate: ClassShare,
    pub healthy: ClassShare,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
    pub status: DegradationStatus,
}

impl DegradationStatistics {
    /// Share of one class; no-data has none by construction
    pub fn share(&self, class: SeverityClass) -> ClassShare {
        match class {
            SeverityClass::Critical => self.critical,
            SeverityClass::Moderate => self.moderate,
            SeverityClass::Healthy => self.healthy,
            SeverityClass::NoData => ClassShare::default(),
        }
    }

    pub fn fraction(&self, class: SeverityClass) -> f64 {
        self.share(class).fraction
    }
}

/// Classify the valid cells of a clipped raster and summarize them.
///
/// Fails with `InsufficientData` when no valid cell remains.
pub fn compute_statistics(
    clipped: &Raster<f64>,
    thresholds: &SeverityThresholds,
    policy: &StatusPolicy,
) -> Result<DegradationStatistics> {
    let mut counts = [0usize; 3];
    for &value in clipped.data().iter() {
        if clipped.is_nodata(value) {
            continue;
        }
        match thresholds.classify(value) {
            SeverityClass::Critical => counts[0] += 1,
            SeverityClass::Moderate => counts[1] += 1,
            SeverityClass::Healthy => counts[2] += 1,
            SeverityClass::NoData => {}
        }
    }

    let valid = counts.iter().sum::<usize>();
    if valid == 0 {
        return Err(Error::InsufficientData(
            "no valid index cells inside the buffer".into(),
        ));
    }

    let summary = clipped.statistics();
    let (min, max, mean, std_dev) = match (summary.min, summary.max, summary.mean, summary.std_dev) {
        (Some(min), Some(max), Some(mean), Some(std)) => (min, max, mean, std),
        _ => {
            return Err(Error::InsufficientData(
                "no valid index cells inside the buffer".into(),
            ))
        }
    };

    let share = |count: usize| ClassShare {
        count,
        fraction: count as f64 / valid as f64,
    };
    let critical = share(counts[0]);
    let moderate = share(counts[1]);
    let healthy = share(counts[2]);
    let status = policy.status(critical.fraction, moderate.fraction);

    info!(
        valid,
        critical = critical.fraction,
        moderate = moderate.fraction,
        mean,
        ?status,
        "degradation statistics"
    );

    Ok(DegradationStatistics {
        valid_cells: valid,
        excluded_cells: clipped.len() - valid,
        critical,
        moderate,
        healthy,
        min,
        max,
        mean,
        std_dev,
        status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_status_rules_in_order() {
        let p = StatusPolicy::default();
        assert_eq!(p.status(0.31, 0.0), DegradationStatus::SeverelyDegraded);
        assert_eq!(p.status(0.30, 0.0), DegradationStatus::ModeratelyDegraded);
        assert_eq!(p.status(0.05, 0.41), DegradationStatus::ModeratelyDegraded);
        assert_eq!(p.status(0.10, 0.21), DegradationStatus::AtRisk);
        assert_eq!(p.status(0.10, 0.20), DegradationStatus::Healthy);
    }

    #[test]
    fn test_fractions_partition_valid_cells() {
        let values = vec![
            0.05, 0.10, 0.25, 0.45, 0.60, //
            0.70, 0.80, f64::NAN, 0.90, 0.30,
        ];
        let raster = Raster::from_vec(values, 2, 5).unwrap();
        let stats =
            compute_statistics(&raster, &SeverityThresholds::default(), &StatusPolicy::default())
                .unwrap();

        assert_eq!(stats.valid_cells, 9);
        assert_eq!(stats.excluded_cells, 1);
        assert_eq!(stats.critical.count, 2);
        assert_eq!(stats.moderate.count, 3);
        assert_eq!(stats.healthy.count, 4);
        assert_relative_eq!(
            stats.critical.fraction + stats.moderate.fraction + stats.healthy.fraction,
            1.0,
            epsilon = 1e-12
        );
        assert_relative_eq!(stats.min, 0.05);
        assert_relative_eq!(stats.max, 0.90);
        assert_eq!(stats.status, DegradationStatus::ModeratelyDegraded);
    }

    #[test]
    fn test_empty_clip_is_insufficient_data() {
        let raster = Raster::filled(3, 3, f64::NAN);
        let err =
            compute_statistics(&raster, &SeverityThresholds::default(), &StatusPolicy::default())
                .unwrap_err();
        assert!(matches!(err, Error::InsufficientData(_)));
    }

    #[test]
    fn test_policy_validation() {
        assert!(StatusPolicy::default().validate().is_ok());
        let bad = StatusPolicy {
            severe_critical: 1.5,
            ..StatusPolicy::default()
        };
        assert!(bad.validate().is_err());
    }
}

//! Cross-check of sampled class fractions against the raster
//!
//! Advisory only: a failed check flags the report, it never discards it.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::point::PointSet;
use crate::degradation::{DegradationStatistics, SeverityClass};
use riparia_core::{Error, Result};

/// Parameters for the consistency check
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsistencyParams {
    /// Largest accepted absolute fraction difference (default: 0.20)
    pub tolerance: f64,
}

impl Default for ConsistencyParams {
    fn default() -> Self {
        Self { tolerance: 0.20 }
    }
}

impl ConsistencyParams {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.tolerance) {
            return Err(Error::InvalidParameter {
                name: "consistency.tolerance",
                value: self.tolerance.to_string(),
                reason: "must lie within [0, 1]".into(),
            });
        }
        Ok(())
    }
}

/// Per-class fractions of one distribution
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ClassFractions {
    pub critical: f64,
    pub moderate: f64,
    pub healthy: f64,
}

impl ClassFractions {
    fn get(&self, class: SeverityClass) -> f64 {
        match class {
            SeverityClass::Critical => self.critical,
            SeverityClass::Moderate => self.moderate,
            SeverityClass::Healthy => self.healthy,
            SeverityClass::NoData => 0.0,
        }
    }

    /// Fractions from raw counts; all zero when nothing was counted
    fn from_counts(critical: usize, moderate: usize, healthy: usize) -> Self {
        let total = (critical + moderate + healthy) as f64;
        if total == 0.0 {
            return Self::default();
        }
        Self {
            critical: critical as f64 / total,
            moderate: moderate as f64 / total,
            healthy: healthy as f64 / total,
        }
    }
}

/// Verdict and the two distributions it was drawn from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsistencyReport {
    pub passed: bool,
    pub tolerance: f64,
    pub sampled_points: usize,
    /// Raster fractions, restricted to the emitted classes
    pub raster: ClassFractions,
    pub sampled: ClassFractions,
    pub critical_difference: f64,
    pub moderate_difference: f64,
    /// Whether raster fractions were rescaled to the emitted classes
    pub renormalized: bool,
}

/// Compare the sampled distribution with the raster distribution.
///
/// Raster fractions are first restricted to the classes the point set was
/// allowed to emit, so a critical-only policy is not itself read as bias.
/// With every class emitted they are the raw raster fractions.
pub fn validate_consistency(
    statistics: &DegradationStatistics,
    points: &PointSet,
    params: &ConsistencyParams,
) -> ConsistencyReport {
    let emitted = |class: SeverityClass| points.parameters.emit.contains(&class);
    let renormalized = !SeverityClass::VEGETATED.iter().all(|c| emitted(*c));

    let count = |class: SeverityClass| {
        if emitted(class) {
            statistics.share(class).count
        } else {
            0
        }
    };
    let raster = ClassFractions::from_counts(
        count(SeverityClass::Critical),
        count(SeverityClass::Moderate),
        count(SeverityClass::Healthy),
    );
    let sampled = ClassFractions::from_counts(
        points.critical.len(),
        points.moderate.len(),
        points.healthy.len(),
    );

    let diff = |class| (raster.get(class) - sampled.get(class)).abs();
    let critical_difference = diff(SeverityClass::Critical);
    let moderate_difference = diff(SeverityClass::Moderate);
    let passed = critical_difference < params.tolerance && moderate_difference < params.tolerance;

    if passed {
        info!(
            critical_difference,
            moderate_difference,
            sampled = points.len(),
            "sampled distribution consistent with raster"
        );
    } else {
        warn!(
            raster_critical = raster.critical,
            sampled_critical = sampled.critical,
            raster_moderate = raster.moderate,
            sampled_moderate = sampled.moderate,
            tolerance = params.tolerance,
            "distribution mismatch between sampled points and raster"
        );
    }

    ConsistencyReport {
        passed,
        tolerance: params.tolerance,
        sampled_points: points.len(),
        raster,
        sampled,
        critical_difference,
        moderate_difference,
        renormalized,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::degradation::{ClassShare, DegradationStatus, SeverityThresholds};
    use crate::sampling::{CriticalPoint, GenerationParameters, Provenance};

    fn stats(critical: usize, moderate: usize, healthy: usize) -> DegradationStatistics {
        let total = (critical + moderate + healthy) as f64;
        let share = |count: usize| ClassShare {
            count,
            fraction: count as f64 / total,
        };
        DegradationStatistics {
            valid_cells: critical + moderate + healthy,
            excluded_cells: 0,
            critical: share(critical),
            moderate: share(moderate),
            healthy: share(healthy),
            min: 0.0,
            max: 1.0,
            mean: 0.5,
            std_dev: 0.1,
            status: DegradationStatus::Healthy,
        }
    }

    fn point_set(emit: Vec<SeverityClass>, counts: [usize; 3]) -> PointSet {
        let mut set = PointSet::new(GenerationParameters {
            thresholds: SeverityThresholds::default(),
            analysis_distance_m: None,
            channel_half_width_m: None,
            max_points_per_class: 50,
            min_spacing_m: 100.0,
            emit,
            seed: None,
        });
        for (class, n) in SeverityClass::VEGETATED.into_iter().zip(counts) {
            for i in 0..n {
                set.push(CriticalPoint {
                    id: format!("{class}{i}"),
                    latitude: 0.0,
                    longitude: 0.0,
                    x: i as f64,
                    y: 0.0,
                    value: 0.0,
                    severity: class,
                    distance_to_river_m: 0.0,
                    label: String::new(),
                    provenance: Provenance::default(),
                });
            }
        }
        set
    }

    #[test]
    fn test_all_classes_exact_reproduction_passes() {
        let report = validate_consistency(
            &stats(9, 0, 91),
            &point_set(SeverityClass::VEGETATED.to_vec(), [9, 0, 50]),
            &ConsistencyParams::default(),
        );
        assert!(!report.renormalized);
        assert!((report.raster.critical - 0.09).abs() < 1e-12);
        assert!((report.sampled.critical - 9.0 / 59.0).abs() < 1e-12);
        assert!(report.passed);
    }

    #[test]
    fn test_all_classes_biased_sample_fails() {
        let report = validate_consistency(
            &stats(10, 10, 80),
            &point_set(SeverityClass::VEGETATED.to_vec(), [20, 0, 5]),
            &ConsistencyParams::default(),
        );
        assert!(report.critical_difference > 0.2);
        assert!(!report.passed);
    }

    #[test]
    fn test_critical_only_policy_is_renormalized() {
        let report = validate_consistency(
            &stats(9, 30, 61),
            &point_set(vec![SeverityClass::Critical], [9, 0, 0]),
            &ConsistencyParams::default(),
        );
        assert!(report.renormalized);
        assert_eq!(report.raster.critical, 1.0);
        assert_eq!(report.raster.moderate, 0.0);
        assert!(report.passed);
    }

    #[test]
    fn test_no_points_against_healthy_raster_passes() {
        let report = validate_consistency(
            &stats(0, 0, 100),
            &point_set(vec![SeverityClass::Critical], [0, 0, 0]),
            &ConsistencyParams::default(),
        );
        assert_eq!(report.sampled_points, 0);
        assert!(report.passed);

        // Critical cells exist but none survived containment
        let report = validate_consistency(
            &stats(5, 0, 95),
            &point_set(vec![SeverityClass::Critical], [0, 0, 0]),
            &ConsistencyParams::default(),
        );
        assert!(!report.passed);
    }
}

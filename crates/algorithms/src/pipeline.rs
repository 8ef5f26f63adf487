//! Degradation analysis pipeline
//!
//! One unit of work is one index raster (a scene/date) against one site:
//!
//! ```text
//! area → riparian zone → CRS resolution → clip → statistics
//!      → sampling → identity → consistency → report
//! ```
//!
//! Units never share mutable state; a batch fans them out in parallel and
//! reports each unit's failure separately.

use std::collections::BTreeSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use riparia_core::{Algorithm, BufferGeometry, Error, FailureKind, Raster, Result, RiverCenterline, CRS};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::AnalysisConfig;
use crate::crs::{resolve_crs, CrsResolution};
use crate::degradation::{clip_to_buffer, compute_statistics, DegradationStatistics};
use crate::maybe_rayon::*;
use crate::sampling::{
    sample_points, validate_consistency, ConsistencyReport, GenerationParameters, PointSet,
    PrecisionFlag, Provenance, SamplingInput,
};
use crate::vector::riparian_zone_or_fallback;

/// Acquisition details handed over with a scene
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionMetadata {
    /// Acquisition date, ISO 8601
    pub date: Option<String>,
    /// Cloud cover of the scene in [0, 1]
    pub cloud_fraction: Option<f64>,
    /// Platform or catalog the scene came from
    pub source: String,
}

/// A vegetation-index raster with its acquisition context
#[derive(Debug, Clone)]
pub struct Scene {
    pub index: Raster<f64>,
    /// CRS of the per-scene band rasters the index was computed from
    pub upstream_crs: Option<CRS>,
    pub acquisition: AcquisitionMetadata,
}

impl Scene {
    pub fn new(index: Raster<f64>) -> Self {
        Self {
            index,
            upstream_crs: None,
            acquisition: AcquisitionMetadata::default(),
        }
    }

    pub fn with_upstream_crs(mut self, crs: CRS) -> Self {
        self.upstream_crs = Some(crs);
        self
    }

    pub fn with_acquisition(mut self, acquisition: AcquisitionMetadata) -> Self {
        self.acquisition = acquisition;
        self
    }
}

/// Geometry describing the site
#[derive(Debug, Clone)]
pub enum AreaOfInterest {
    /// River centerline; the riparian buffer is built from it
    River(RiverCenterline),
    /// Pre-built analysis polygon, used without channel exclusion
    Polygon(BufferGeometry),
}

/// One scene against one site
#[derive(Debug, Clone)]
pub struct AnalysisUnit {
    pub id: String,
    pub scene: Scene,
    pub area: AreaOfInterest,
}

/// Result of one successful unit
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub acquisition: AcquisitionMetadata,
    pub resolution: CrsResolution,
    pub statistics: DegradationStatistics,
    pub points: PointSet,
    pub consistency: ConsistencyReport,
    /// Point pairs closer than the advisory minimum spacing
    pub spacing_violations: usize,
    /// Every degraded-confidence condition raised in this unit
    pub flags: BTreeSet<PrecisionFlag>,
}

impl AnalysisReport {
    pub fn has_flag(&self, flag: PrecisionFlag) -> bool {
        self.flags.contains(&flag)
    }
}

/// Structured failure of one unit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl From<Error> for UnitFailure {
    fn from(err: Error) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Outcome of one unit in a batch
#[derive(Debug, Clone, Serialize)]
pub struct UnitResult {
    pub unit_id: String,
    pub outcome: std::result::Result<AnalysisReport, UnitFailure>,
}

/// Analyze one unit, seeding the sampler from `config.sampling.seed` or
/// from entropy when unset.
pub fn analyze(scene: &Scene, area: &AreaOfInterest, config: &AnalysisConfig) -> Result<AnalysisReport> {
    let mut rng = match config.sampling.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    analyze_with_rng(scene, area, config, &mut rng)
}

/// Analyze one unit with an injected source of randomness
pub fn analyze_with_rng<R: Rng + ?Sized>(
    scene: &Scene,
    area: &AreaOfInterest,
    config: &AnalysisConfig,
    rng: &mut R,
) -> Result<AnalysisReport> {
    config.validate()?;
    info!(
        date = scene.acquisition.date.as_deref().unwrap_or("unknown"),
        rows = scene.index.rows(),
        cols = scene.index.cols(),
        "starting degradation analysis"
    );

    let mut flags = BTreeSet::new();

    let zone = match area {
        AreaOfInterest::River(river) => riparian_zone_or_fallback(Some(river), None, &config.buffer)?,
        AreaOfInterest::Polygon(polygon) => riparian_zone_or_fallback(None, Some(polygon), &config.buffer)?,
    };
    if !zone.has_river_exclusion() {
        flags.insert(PrecisionFlag::NoRiverExclusion);
    }
    if zone.centerline.is_none() {
        warn!("no river centerline; distance to river unavailable");
        flags.insert(PrecisionFlag::DistanceUnavailable);
    }

    let resolved = resolve_crs(&scene.index, scene.upstream_crs.as_ref(), &zone, &config.crs)?;
    if resolved.resolution.source.is_inferred() {
        flags.insert(PrecisionFlag::CrsInferred);
    }
    if resolved.resolution.hemisphere_correction.is_some() {
        flags.insert(PrecisionFlag::HemisphereCorrected);
    }

    let clipped = clip_to_buffer(&resolved.raster, &resolved.zone.analysis)?;
    let statistics = compute_statistics(&clipped, &config.thresholds, &config.status)?;

    let provenance = Provenance {
        source: scene.acquisition.source.clone(),
        acquired: scene.acquisition.date.clone(),
        flags: flags.clone(),
    };
    let input = SamplingInput {
        raster: &clipped,
        zone: &resolved.zone,
        resolution: &resolved.resolution,
        thresholds: &config.thresholds,
        provenance: &provenance,
    };
    let samples = sample_points(&input, &config.sampling, rng)?;

    let river_built = matches!(area, AreaOfInterest::River(_));
    let mut points = PointSet::new(GenerationParameters {
        thresholds: config.thresholds,
        analysis_distance_m: river_built.then_some(config.buffer.analysis_distance_m),
        channel_half_width_m: river_built.then_some(config.buffer.channel_half_width_m),
        max_points_per_class: config.sampling.max_points_per_class,
        min_spacing_m: config.sampling.min_spacing_m,
        emit: config.sampling.emit.clone(),
        seed: config.sampling.seed,
    });
    for sample in samples {
        for point in sample.points {
            points.push(point);
        }
    }

    let spacing_violations = points.spacing_violations();
    if spacing_violations > 0 {
        warn!(
            spacing_violations,
            min_spacing_m = config.sampling.min_spacing_m,
            "points closer than the advisory minimum spacing"
        );
    }

    let consistency = validate_consistency(&statistics, &points, &config.consistency);
    if !consistency.passed {
        flags.insert(PrecisionFlag::DistributionMismatch);
    }

    info!(
        points = points.len(),
        status = ?statistics.status,
        flags = flags.len(),
        "degradation analysis finished"
    );

    Ok(AnalysisReport {
        acquisition: scene.acquisition.clone(),
        resolution: resolved.resolution,
        statistics,
        points,
        consistency,
        spacing_violations,
        flags,
    })
}

/// Analyze independent units, in parallel when the `parallel` feature is on.
///
/// Each unit draws from its own generator derived from the batch seed and
/// the unit's position, so results do not depend on scheduling. A failing
/// unit never affects its siblings.
pub fn analyze_batch(units: &[AnalysisUnit], config: &AnalysisConfig) -> Vec<UnitResult> {
    let batch_seed = config.sampling.seed;

    units
        .into_par_iter()
        .enumerate()
        .map(|(i, unit)| {
            let mut rng = match batch_seed {
                Some(seed) => StdRng::seed_from_u64(unit_seed(seed, i)),
                None => StdRng::from_entropy(),
            };
            let outcome = analyze_with_rng(&unit.scene, &unit.area, config, &mut rng).map_err(|err| {
                warn!(unit = %unit.id, kind = ?err.kind(), error = %err, "unit failed");
                UnitFailure::from(err)
            });
            UnitResult {
                unit_id: unit.id.clone(),
                outcome,
            }
        })
        .collect()
}

fn unit_seed(seed: u64, index: usize) -> u64 {
    seed ^ (index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// Full analysis as an [`Algorithm`]
#[derive(Debug, Clone, Default)]
pub struct DegradationAnalysis;

impl Algorithm for DegradationAnalysis {
    type Input = AnalysisUnit;
    type Output = AnalysisReport;
    type Params = AnalysisConfig;
    type Error = Error;

    fn name(&self) -> &'static str {
        "DegradationAnalysis"
    }

    fn description(&self) -> &'static str {
        "Detect riparian vegetation degradation and sample geolocated critical points"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        analyze(&input.scene, &input.area, &params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;
    use riparia_core::GeoTransform;

    fn utm_scene(value: f64) -> Scene {
        Scene::new(
            Raster::filled(20, 20, value)
                .with_transform(GeoTransform::new(500_000.0, 5_700_200.0, 10.0, -10.0))
                .with_crs(CRS::from_epsg(32718)),
        )
    }

    fn utm_polygon() -> AreaOfInterest {
        AreaOfInterest::Polygon(BufferGeometry::new(
            polygon![
                (x: 499_990.0, y: 5_699_990.0),
                (x: 500_210.0, y: 5_699_990.0),
                (x: 500_210.0, y: 5_700_210.0),
                (x: 499_990.0, y: 5_700_210.0),
            ],
            CRS::from_epsg(32718),
        ))
    }

    #[test]
    fn test_polygon_area_is_flagged() {
        let config = AnalysisConfig {
            sampling: crate::sampling::SamplingParams {
                seed: Some(1),
                ..Default::default()
            },
            ..Default::default()
        };
        let report = analyze(&utm_scene(0.1), &utm_polygon(), &config).unwrap();
        assert!(report.has_flag(PrecisionFlag::NoRiverExclusion));
        assert!(report.has_flag(PrecisionFlag::DistanceUnavailable));
        assert!(!report.has_flag(PrecisionFlag::HemisphereCorrected));
        assert_eq!(report.statistics.valid_cells, 400);
        assert_eq!(report.points.critical.len(), 50);
        assert!(report.points.moderate.is_empty() && report.points.healthy.is_empty());
        assert!(report.consistency.passed);
        assert!(report.points.parameters.analysis_distance_m.is_none());
    }

    #[test]
    fn test_geographic_raster_spacing_in_metres() {
        // 40 x 40 cells of 0.001°, critical cells every 4th row and column
        // (>= ~340 m apart at this latitude)
        let mut raster = Raster::filled(40, 40, 0.7)
            .with_transform(GeoTransform::new(-3.72, 40.44, 0.001, -0.001))
            .with_crs(CRS::wgs84());
        for row in (0..40).step_by(4) {
            for col in (0..40).step_by(4) {
                raster.set(row, col, 0.05).unwrap();
            }
        }
        let area = AreaOfInterest::Polygon(BufferGeometry::new(
            polygon![
                (x: -3.7205, y: 40.3995),
                (x: -3.6795, y: 40.3995),
                (x: -3.6795, y: 40.4405),
                (x: -3.7205, y: 40.4405),
            ],
            CRS::wgs84(),
        ));
        let mut config = AnalysisConfig::default();
        config.sampling.seed = Some(3);

        let report = analyze(&Scene::new(raster), &area, &config).unwrap();
        assert_eq!(report.statistics.critical.count, 100);
        assert_eq!(report.points.critical.len(), 50);
        assert_eq!(report.spacing_violations, 0);
        for p in &report.points.critical {
            assert!((p.latitude - p.y).abs() < 1e-12);
            assert!((p.longitude - p.x).abs() < 1e-12);
        }
    }

    #[test]
    fn test_invalid_config_fails_as_configuration() {
        let mut config = AnalysisConfig::default();
        config.sampling.max_points_per_class = 0;
        let err = analyze(&utm_scene(0.1), &utm_polygon(), &config).unwrap_err();
        assert_eq!(err.kind(), FailureKind::Configuration);
    }

    #[test]
    fn test_batch_isolates_failures_and_is_reproducible() {
        let far_away = AreaOfInterest::Polygon(BufferGeometry::new(
            polygon![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0), (x: 0.0, y: 10.0)],
            CRS::from_epsg(32718),
        ));
        let units = vec![
            AnalysisUnit {
                id: "ok".into(),
                scene: utm_scene(0.1),
                area: utm_polygon(),
            },
            AnalysisUnit {
                id: "miss".into(),
                scene: utm_scene(0.1),
                area: far_away,
            },
            AnalysisUnit {
                id: "nan".into(),
                scene: utm_scene(f64::NAN),
                area: utm_polygon(),
            },
        ];
        let mut config = AnalysisConfig::default();
        config.sampling.seed = Some(99);

        let results = analyze_batch(&units, &config);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].unit_id, "ok");
        assert!(results[0].outcome.is_ok());
        assert_eq!(
            results[1].outcome.as_ref().unwrap_err().kind,
            FailureKind::NoSpatialOverlap
        );
        assert_eq!(
            results[2].outcome.as_ref().unwrap_err().kind,
            FailureKind::InsufficientData
        );

        let again = analyze_batch(&units, &config);
        let ids = |r: &UnitResult| {
            r.outcome
                .as_ref()
                .map(|rep| rep.points.all().map(|p| p.id.clone()).collect::<Vec<_>>())
                .unwrap_or_default()
        };
        assert_eq!(ids(&results[0]), ids(&again[0]));
    }

    #[test]
    fn test_algorithm_trait() {
        let algo = DegradationAnalysis;
        assert_eq!(algo.name(), "DegradationAnalysis");
        let unit = AnalysisUnit {
            id: "u".into(),
            scene: utm_scene(0.7),
            area: utm_polygon(),
        };
        let report = algo.execute_default(unit).unwrap();
        assert!(report.points.is_empty());
        assert_eq!(report.statistics.healthy.count, 400);
    }
}

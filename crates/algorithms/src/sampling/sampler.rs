//! Critical-point sampling
//!
//! For each emitted severity class the sampler collects the qualifying cells
//! of the clipped raster, draws a uniform subset without replacement when
//! there are more than the cap, and keeps the drawn cells whose center lies
//! inside the analysis buffer and outside the river channel. Containment can
//! discard many draws on an irregular buffer; no extra draws replace them.

use geo::line_measures::Distance;
use geo::{Contains, Euclidean, MultiLineString, Point};
use rand::seq::index;
use rand::Rng;
use riparia_core::{Error, Raster, Result, UtmZone, CRS};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::identity::point_id;
use super::point::{CriticalPoint, PrecisionFlag, Provenance};
use crate::crs::{CrsResolution, Transformer};
use crate::degradation::{classify_raster, SeverityClass, SeverityThresholds};
use crate::vector::RiparianZone;

/// Parameters for critical-point sampling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingParams {
    /// Maximum cells drawn per severity class (default: 50)
    pub max_points_per_class: usize,
    /// Advisory minimum distance between points, metres (default: 100).
    /// Reported on the point set, not enforced.
    pub min_spacing_m: f64,
    /// Classes to sample (default: critical only)
    pub emit: Vec<SeverityClass>,
    /// Seed for reproducible draws; `None` seeds from entropy
    pub seed: Option<u64>,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            max_points_per_class: 50,
            min_spacing_m: 100.0,
            emit: vec![SeverityClass::Critical],
            seed: None,
        }
    }
}

impl SamplingParams {
    pub fn emits(&self, class: SeverityClass) -> bool {
        self.emit.contains(&class)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_points_per_class == 0 {
            return Err(Error::InvalidParameter {
                name: "sampling.max_points_per_class",
                value: "0".into(),
                reason: "must be at least 1".into(),
            });
        }
        if !self.min_spacing_m.is_finite() || self.min_spacing_m < 0.0 {
            return Err(Error::InvalidParameter {
                name: "sampling.min_spacing_m",
                value: self.min_spacing_m.to_string(),
                reason: "must be a non-negative distance".into(),
            });
        }
        if self.emit.is_empty() {
            return Err(Error::InvalidParameter {
                name: "sampling.emit",
                value: "[]".into(),
                reason: "at least one severity class must be emitted".into(),
            });
        }
        if self.emit.contains(&SeverityClass::NoData) {
            return Err(Error::InvalidParameter {
                name: "sampling.emit",
                value: SeverityClass::NoData.to_string(),
                reason: "no-data cells cannot be sampled".into(),
            });
        }
        Ok(())
    }
}

/// Sampling outcome for one severity class
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassSample {
    pub class: SeverityClass,
    /// Valid cells of this class in the clipped raster
    pub qualifying: usize,
    /// Cells drawn before the containment test (never above the cap)
    pub drawn: usize,
    /// Drawn cells that passed containment
    pub points: Vec<CriticalPoint>,
}

/// Everything the sampler reads, all in the resolved raster CRS
#[derive(Debug, Clone, Copy)]
pub struct SamplingInput<'a> {
    pub raster: &'a Raster<f64>,
    pub zone: &'a RiparianZone,
    pub resolution: &'a CrsResolution,
    pub thresholds: &'a SeverityThresholds,
    /// Template copied onto every point; the sampler may add flags
    pub provenance: &'a Provenance,
}

/// Sample every emitted class. Classes not in `params.emit` yield nothing.
pub fn sample_points<R: Rng + ?Sized>(
    input: &SamplingInput<'_>,
    params: &SamplingParams,
    rng: &mut R,
) -> Result<Vec<ClassSample>> {
    let river = RiverDistance::new(input.zone, input.resolution)?;
    let mut provenance = input.provenance.clone();
    if river.is_none() {
        provenance.flags.insert(PrecisionFlag::DistanceUnavailable);
    }

    let classes = classify_raster(input.raster, input.thresholds)?;
    let ctx = ClassContext {
        classes: &classes,
        river: river.as_ref(),
        provenance: &provenance,
    };

    SeverityClass::VEGETATED
        .into_iter()
        .filter(|c| params.emits(*c))
        .map(|class| sample_class(input, &ctx, class, params.max_points_per_class, rng))
        .collect()
}

struct ClassContext<'a> {
    classes: &'a Raster<u8>,
    river: Option<&'a RiverDistance>,
    provenance: &'a Provenance,
}

fn sample_class<R: Rng + ?Sized>(
    input: &SamplingInput<'_>,
    ctx: &ClassContext<'_>,
    class: SeverityClass,
    cap: usize,
    rng: &mut R,
) -> Result<ClassSample> {
    let raster = input.raster;
    let river = ctx.river;
    let code = class.code();
    let cells: Vec<(usize, usize)> = ctx
        .classes
        .data()
        .indexed_iter()
        .filter(|(_, c)| **c == code)
        .map(|(idx, _)| idx)
        .collect();

    let qualifying = cells.len();
    let mut drawn: Vec<(usize, usize)> = if qualifying > cap {
        index::sample(rng, qualifying, cap)
            .into_iter()
            .map(|i| cells[i])
            .collect()
    } else {
        cells
    };
    drawn.sort_unstable();

    let analysis = input.zone.analysis.geometry();
    let exclusion = input.zone.exclusion.as_ref().map(|b| b.geometry());

    let mut points = Vec::with_capacity(drawn.len());
    for &(row, col) in &drawn {
        let (x, y) = raster.pixel_to_geo(col, row);
        let native = Point::new(x, y);
        if !analysis.contains(&native) || exclusion.is_some_and(|e| e.contains(&native)) {
            continue;
        }

        let value = raster.data()[[row, col]];
        let distance_to_river_m = river.map(|r| r.distance_m(native)).unwrap_or(0.0);
        let (longitude, latitude) = input.resolution.to_wgs84(x, y)?;

        points.push(CriticalPoint {
            id: point_id(latitude, longitude),
            latitude,
            longitude,
            x,
            y,
            value,
            severity: class,
            distance_to_river_m,
            label: describe(class, value, river.map(|_| distance_to_river_m)),
            provenance: ctx.provenance.clone(),
        });
    }

    debug!(
        class = %class,
        qualifying,
        drawn = drawn.len(),
        kept = points.len(),
        "sampled class"
    );

    Ok(ClassSample {
        class,
        qualifying,
        drawn: drawn.len(),
        points,
    })
}

fn describe(class: SeverityClass, value: f64, distance_m: Option<f64>) -> String {
    match distance_m {
        Some(d) => format!("{class} vegetation, index {value:.3}, {d:.0} m from river"),
        None => format!("{class} vegetation, index {value:.3}"),
    }
}

/// Distance-to-river in metres from native raster coordinates.
///
/// A geographic raster CRS is measured in the UTM zone of the first
/// centerline vertex instead.
struct RiverDistance {
    lines: MultiLineString<f64>,
    to_metric: Option<Transformer>,
}

impl RiverDistance {
    fn new(zone: &RiparianZone, resolution: &CrsResolution) -> Result<Option<Self>> {
        let Some(centerline) = zone.centerline.as_ref().filter(|c| !c.is_empty()) else {
            return Ok(None);
        };
        if resolution.crs.utm_zone().is_some() {
            return Ok(Some(Self {
                lines: centerline.lines().clone(),
                to_metric: None,
            }));
        }

        let first = centerline
            .lines()
            .0
            .iter()
            .find_map(|l| l.0.first().copied())
            .ok_or_else(|| Error::EmptyInput("river centerline has no vertex".into()))?;
        let (lon, lat) = resolution.to_wgs84(first.x, first.y)?;
        let metric = CRS::utm(UtmZone::from_lon_lat(lon, lat));
        let op = Transformer::new(&resolution.crs, &metric)?;

        Ok(Some(Self {
            lines: op.geometry(centerline.lines()),
            to_metric: Some(op),
        }))
    }

    fn distance_m(&self, native: Point<f64>) -> f64 {
        let point = match self.to_metric {
            Some(op) => {
                let (x, y) = op.apply(native.x(), native.y());
                Point::new(x, y)
            }
            None => native,
        };
        self.lines
            .0
            .iter()
            .map(|line| Euclidean.distance(&point, line))
            .fold(f64::INFINITY, f64::min)
    }
}

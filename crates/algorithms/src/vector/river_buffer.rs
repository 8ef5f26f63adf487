//! Riparian zone construction from river centerlines
//!
//! The analysis buffer is the centerline buffered by the analysis distance
//! with the channel (centerline buffered by its half-width) subtracted, so a
//! sampled vegetation point can never fall in open water. Buffering runs in
//! the UTM zone of the river centroid; results go back to the river's CRS.

use geo::{BooleanOps, Buffer, MultiPolygon};
use riparia_core::{BufferGeometry, Error, Result, RiverCenterline, UtmZone, CRS};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::spatial::centroid;
use crate::crs::{reproject_buffer, reproject_river, to_wgs84};

/// Parameters for riparian buffer construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferParams {
    /// Analysis buffer distance from the centerline, in metres (default: 200)
    pub analysis_distance_m: f64,
    /// Half-width of the river channel excluded from sampling, in metres (default: 10)
    pub channel_half_width_m: f64,
}

impl Default for BufferParams {
    fn default() -> Self {
        Self {
            analysis_distance_m: 200.0,
            channel_half_width_m: 10.0,
        }
    }
}

/// Analysis area of one site, with the watercourse it surrounds when known
#[derive(Debug, Clone)]
pub struct RiparianZone {
    /// Area considered for statistics and sampling, channel already removed
    pub analysis: BufferGeometry,
    /// Area occupied by the channel itself
    pub exclusion: Option<BufferGeometry>,
    /// River centerline used for distance-to-river
    pub centerline: Option<RiverCenterline>,
}

impl RiparianZone {
    /// Zone from a pre-built analysis polygon, without river exclusion
    pub fn without_exclusion(analysis: BufferGeometry) -> Self {
        Self {
            analysis,
            exclusion: None,
            centerline: None,
        }
    }

    /// Whether the channel was subtracted from the analysis buffer
    pub fn has_river_exclusion(&self) -> bool {
        self.exclusion.is_some()
    }
}

/// Build the exclusion-aware riparian buffer around a river centerline.
///
/// Returns geometries in the centerline's CRS.
pub fn build_riparian_zone(river: &RiverCenterline, params: &BufferParams) -> Result<RiparianZone> {
    if river.is_empty() {
        return Err(Error::EmptyInput("river centerline has no segment".into()));
    }
    if params.channel_half_width_m >= params.analysis_distance_m {
        return Err(Error::InvalidParameter {
            name: "channel_half_width_m",
            value: params.channel_half_width_m.to_string(),
            reason: format!(
                "must be smaller than analysis_distance_m ({})",
                params.analysis_distance_m
            ),
        });
    }

    let metric = metric_crs_for(river)?;
    let projected = reproject_river(river, &metric)?;
    let lines = projected.lines();

    let outer: MultiPolygon<f64> = lines.buffer(params.analysis_distance_m);
    let channel: MultiPolygon<f64> = lines.buffer(params.channel_half_width_m);
    let riparian = outer.difference(&channel);

    if riparian.0.is_empty() {
        return Err(Error::Algorithm(
            "buffer difference produced an empty riparian zone".into(),
        ));
    }
    debug!(
        crs = %metric,
        parts = riparian.0.len(),
        analysis_m = params.analysis_distance_m,
        channel_m = params.channel_half_width_m,
        "built riparian buffer"
    );

    let analysis = BufferGeometry::new(riparian, metric.clone());
    let exclusion = BufferGeometry::river_exclusion(channel, metric);

    Ok(RiparianZone {
        analysis: reproject_buffer(&analysis, river.crs())?,
        exclusion: Some(reproject_buffer(&exclusion, river.crs())?),
        centerline: Some(river.clone()),
    })
}

/// Build the zone from a river when one is available, otherwise fall back to
/// the pre-existing analysis polygon without channel exclusion.
pub fn riparian_zone_or_fallback(
    river: Option<&RiverCenterline>,
    area: Option<&BufferGeometry>,
    params: &BufferParams,
) -> Result<RiparianZone> {
    match (river.filter(|r| !r.is_empty()), area) {
        (Some(river), _) => build_riparian_zone(river, params),
        (None, Some(area)) => {
            warn!("no river geometry; using analysis polygon without channel exclusion (reduced precision)");
            Ok(RiparianZone::without_exclusion(area.clone()))
        }
        (None, None) => Err(Error::EmptyInput(
            "neither river centerline nor analysis polygon provided".into(),
        )),
    }
}

/// Projected CRS in which buffer distances are metres
fn metric_crs_for(river: &RiverCenterline) -> Result<CRS> {
    if river.crs().utm_zone().is_some() {
        return Ok(river.crs().clone());
    }
    let center = centroid(river.lines())
        .ok_or_else(|| Error::EmptyInput("river centerline has no centroid".into()))?;
    let (lon, lat) = to_wgs84(center.x(), center.y(), river.crs())?;
    Ok(CRS::utm(UtmZone::from_lon_lat(lon, lat)))
}

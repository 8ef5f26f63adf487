//! CRS resolution between an index raster and its riparian zone geometry.
//!
//! Establishes one common projected CRS *before* any clip or containment
//! test runs:
//!
//! 1. If the raster carries a supported CRS it is used as-is.
//! 2. Otherwise the CRS is inferred, in priority order, from an upstream
//!    per-scene raster, from the buffer centroid (zone + hemisphere), or from
//!    the buffer centroid's zone combined with the sign of the raster's own
//!    Y bounds when the centroid sits too close to the equator to trust.
//! 3. The zone geometries are reprojected into that CRS and checked for a
//!    hemisphere mismatch: the buffer misses the raster's northings by one
//!    false northing. A mismatch is repaired either with the fixed
//!    10,000,000 m northing offset or by rebuilding the CRS from
//!    {zone, hemisphere}.
//! 4. Raster and buffer bounding boxes must overlap.

use geo::{BoundingRect, Centroid, MapCoords};
use riparia_core::{Error, Hemisphere, Raster, Result, UtmZone, CRS};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::reproject::{reproject_buffer, reproject_river, to_wgs84, Transformer};
use super::utm::FALSE_NORTHING_SOUTH;
use crate::vector::{BoundingBox, RiparianZone};

/// Below this absolute centroid latitude (degrees) the centroid's sign is not
/// trusted to pick a hemisphere; the raster's own Y bounds decide instead.
pub const EQUATORIAL_AMBIGUITY_DEG: f64 = 0.05;

/// How a detected hemisphere mismatch is repaired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HemisphereStrategy {
    /// Shift every reprojected vertex by ±10,000,000 m of northing
    #[default]
    NorthingOffset,
    /// Re-annotate the raster with the same zone in the other hemisphere and
    /// reproject the geometry again
    ExplicitCrs,
}

/// Parameters for CRS resolution
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrsParams {
    pub hemisphere_correction: HemisphereStrategy,
}

/// Where the resolved raster CRS came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CrsSource {
    /// The raster's own metadata
    Declared,
    /// An upstream per-scene raster that still carried CRS metadata
    Upstream,
    /// UTM zone and hemisphere of the buffer centroid
    BufferCentroid,
    /// Buffer-centroid zone with hemisphere from the raster's Y bounds
    RasterBounds,
}

impl CrsSource {
    /// Whether the CRS was guessed rather than read from metadata
    pub fn is_inferred(&self) -> bool {
        matches!(self, CrsSource::BufferCentroid | CrsSource::RasterBounds)
    }
}

/// Record of a hemisphere repair
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HemisphereCorrection {
    pub strategy: HemisphereStrategy,
    /// Zone the raster was labelled with before the repair
    pub labelled: UtmZone,
    /// Hemisphere the geometry actually lies in
    pub actual: Hemisphere,
    /// Northing added to every geometry vertex (0 for `ExplicitCrs`)
    pub northing_shift: f64,
}

/// Outcome of CRS resolution, kept on the report for auditing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrsResolution {
    /// CRS raster and geometries are now expressed in
    #[serde(serialize_with = "serialize_crs")]
    pub crs: CRS,
    pub source: CrsSource,
    pub hemisphere_correction: Option<HemisphereCorrection>,
}

fn serialize_crs<S: serde::Serializer>(crs: &CRS, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_str(&crs.identifier())
}

impl CrsResolution {
    /// Convert a native coordinate to WGS84 (lon, lat).
    ///
    /// Undoes a northing-offset repair first, so points sampled against the
    /// shifted buffer map back to the location the buffer describes.
    pub fn to_wgs84(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        let shift = self
            .hemisphere_correction
            .map(|c| c.northing_shift)
            .unwrap_or(0.0);
        to_wgs84(x, y - shift, &self.crs)
    }
}

/// Raster and zone geometry sharing one CRS
#[derive(Debug, Clone)]
pub struct ResolvedInputs {
    pub raster: Raster<f64>,
    pub zone: RiparianZone,
    pub resolution: CrsResolution,
}

/// Bring `raster` and `zone` into one CRS.
///
/// `upstream` is the CRS of any per-scene raster the index was derived from
/// that still carries valid metadata.
pub fn resolve_crs(
    raster: &Raster<f64>,
    upstream: Option<&CRS>,
    zone: &RiparianZone,
    params: &CrsParams,
) -> Result<ResolvedInputs> {
    if raster.is_empty() {
        return Err(Error::EmptyInput("index raster has no cells".into()));
    }
    if zone.analysis.is_empty() {
        return Err(Error::EmptyInput("analysis buffer has no polygon".into()));
    }

    let (crs, source) = match raster.crs() {
        Some(crs) if crs.is_supported() => (crs.clone(), CrsSource::Declared),
        Some(crs) => return Err(Error::UnsupportedCrs(crs.identifier())),
        None => infer_raster_crs(raster, upstream, zone)?,
    };
    if source.is_inferred() {
        warn!(crs = %crs, ?source, "raster CRS missing; inferred from geometry");
    }

    let mut resolved = reproject_zone(zone, &crs)?;
    let mut target = crs.clone();
    let mut correction = None;
    let raster_box = BoundingBox::of_raster(raster);

    if let Some(labelled) = crs.utm_zone() {
        let buffer_box = analysis_bounds(&resolved)?;
        if let Some(actual) = detect_hemisphere_mismatch(
            labelled,
            (raster_box.min_y, raster_box.max_y),
            (buffer_box.min_y, buffer_box.max_y),
        ) {
            let fix = match params.hemisphere_correction {
                HemisphereStrategy::NorthingOffset => {
                    let shift = northing_offset(labelled.hemisphere, actual);
                    resolved = shift_zone(&resolved, shift);
                    HemisphereCorrection {
                        strategy: HemisphereStrategy::NorthingOffset,
                        labelled,
                        actual,
                        northing_shift: shift,
                    }
                }
                HemisphereStrategy::ExplicitCrs => {
                    target = CRS::utm(UtmZone {
                        zone: labelled.zone,
                        hemisphere: actual,
                    });
                    resolved = reproject_zone(zone, &target)?;
                    HemisphereCorrection {
                        strategy: HemisphereStrategy::ExplicitCrs,
                        labelled,
                        actual,
                        northing_shift: 0.0,
                    }
                }
            };
            warn!(
                labelled = %fix.labelled,
                actual = %fix.actual,
                strategy = ?fix.strategy,
                shift = fix.northing_shift,
                "hemisphere mismatch between raster CRS and geometry; corrected (degraded confidence)"
            );
            correction = Some(fix);
        }
    }

    let buffer_box = analysis_bounds(&resolved)?;
    if !raster_box.intersects(&buffer_box) {
        return Err(Error::NoSpatialIntersection {
            r_min_x: raster_box.min_x,
            r_min_y: raster_box.min_y,
            r_max_x: raster_box.max_x,
            r_max_y: raster_box.max_y,
            b_min_x: buffer_box.min_x,
            b_min_y: buffer_box.min_y,
            b_max_x: buffer_box.max_x,
            b_max_y: buffer_box.max_y,
        });
    }
    debug!(crs = %target, "raster and geometry share one CRS");

    Ok(ResolvedInputs {
        raster: raster.clone().with_crs(target.clone()),
        zone: resolved,
        resolution: CrsResolution {
            crs: target,
            source,
            hemisphere_correction: correction,
        },
    })
}

/// Infer the CRS of a raster whose metadata lost it.
pub fn infer_raster_crs(
    raster: &Raster<f64>,
    upstream: Option<&CRS>,
    zone: &RiparianZone,
) -> Result<(CRS, CrsSource)> {
    if let Some(crs) = upstream.filter(|c| c.is_supported()) {
        return Ok((crs.clone(), CrsSource::Upstream));
    }

    let (lon, lat) = buffer_centroid_lon_lat(zone)?;
    let centroid_zone = UtmZone::from_lon_lat(lon, lat);

    if lat.abs() >= EQUATORIAL_AMBIGUITY_DEG {
        return Ok((CRS::utm(centroid_zone), CrsSource::BufferCentroid));
    }

    let (_, min_y, _, max_y) = raster.bounds();
    let hemisphere = if (min_y + max_y) / 2.0 < 0.0 {
        Hemisphere::South
    } else {
        Hemisphere::North
    };
    let inferred = UtmZone {
        zone: centroid_zone.zone,
        hemisphere,
    };
    Ok((CRS::utm(inferred), CrsSource::RasterBounds))
}

/// Hemisphere whose northing band the raster really uses, when the buffer
/// projected into the `labelled` zone misses the raster by one false
/// northing.
///
/// `raster_y` and `buffer_y` are (min, max) northings in the labelled zone.
/// Data whose buffer already overlaps the raster never triggers, whatever
/// the sign of its northings.
pub fn detect_hemisphere_mismatch(
    labelled: UtmZone,
    raster_y: (f64, f64),
    buffer_y: (f64, f64),
) -> Option<Hemisphere> {
    let overlaps = |dy: f64| buffer_y.0 + dy <= raster_y.1 && buffer_y.1 + dy >= raster_y.0;
    if overlaps(0.0) {
        return None;
    }

    let actual = if overlaps(-FALSE_NORTHING_SOUTH) {
        Hemisphere::North
    } else if overlaps(FALSE_NORTHING_SOUTH) {
        Hemisphere::South
    } else {
        return None;
    };
    (actual != labelled.hemisphere).then_some(actual)
}

/// Northing that moves geometry from the `labelled` hemisphere's band into
/// the `actual` one
pub fn northing_offset(labelled: Hemisphere, actual: Hemisphere) -> f64 {
    match (labelled, actual) {
        (Hemisphere::South, Hemisphere::North) => -FALSE_NORTHING_SOUTH,
        (Hemisphere::North, Hemisphere::South) => FALSE_NORTHING_SOUTH,
        _ => 0.0,
    }
}

fn buffer_centroid_lon_lat(zone: &RiparianZone) -> Result<(f64, f64)> {
    let centroid = zone
        .analysis
        .geometry()
        .centroid()
        .ok_or_else(|| Error::CrsUnresolved("analysis buffer has no centroid".into()))?;
    to_wgs84(centroid.x(), centroid.y(), zone.analysis.crs())
}

fn analysis_bounds(zone: &RiparianZone) -> Result<BoundingBox> {
    zone.analysis
        .geometry()
        .bounding_rect()
        .map(BoundingBox::from)
        .ok_or_else(|| Error::EmptyInput("analysis buffer has no extent".into()))
}

fn reproject_zone(zone: &RiparianZone, target: &CRS) -> Result<RiparianZone> {
    // Fail early on unsupported pairs rather than half-way through
    Transformer::new(zone.analysis.crs(), target)?;

    Ok(RiparianZone {
        analysis: reproject_buffer(&zone.analysis, target)?,
        exclusion: zone
            .exclusion
            .as_ref()
            .map(|b| reproject_buffer(b, target))
            .transpose()?,
        centerline: zone
            .centerline
            .as_ref()
            .map(|r| reproject_river(r, target))
            .transpose()?,
    })
}

fn shift_zone(zone: &RiparianZone, dy: f64) -> RiparianZone {
    let shift = move |c: geo::Coord<f64>| geo::Coord { x: c.x, y: c.y + dy };
    let shift_buffer = |b: &riparia_core::BufferGeometry| {
        b.with_geometry(b.geometry().map_coords(shift), b.crs().clone())
    };

    RiparianZone {
        analysis: shift_buffer(&zone.analysis),
        exclusion: zone.exclusion.as_ref().map(shift_buffer),
        centerline: zone
            .centerline
            .as_ref()
            .map(|r| r.with_lines(r.lines().map_coords(shift), r.crs().clone())),
    }
}

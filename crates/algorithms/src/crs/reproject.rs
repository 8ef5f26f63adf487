//! Coordinate and geometry reprojection between WGS84 and UTM.

use geo::{Coord, MapCoords};
use riparia_core::{BufferGeometry, Error, Result, RiverCenterline, UtmZone, CRS};

use super::utm::{utm_to_wgs84, wgs84_to_utm};

/// One side of a coordinate operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Frame {
    Geographic,
    Utm(UtmZone),
}

impl Frame {
    fn of(crs: &CRS) -> Result<Self> {
        if crs.is_geographic() {
            return Ok(Frame::Geographic);
        }
        crs.utm_zone()
            .map(Frame::Utm)
            .ok_or_else(|| Error::UnsupportedCrs(crs.identifier()))
    }
}

/// A prepared coordinate operation between two supported CRSs.
///
/// `Copy` so it can be captured by the closures `geo::MapCoords` requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transformer {
    from: Frame,
    to: Frame,
}

impl Transformer {
    /// Prepare a transform; fails with `UnsupportedCrs` for anything other
    /// than EPSG:4326 and WGS84 / UTM.
    pub fn new(from: &CRS, to: &CRS) -> Result<Self> {
        Ok(Self {
            from: Frame::of(from)?,
            to: Frame::of(to)?,
        })
    }

    /// Whether this transform leaves coordinates untouched
    pub fn is_identity(&self) -> bool {
        self.from == self.to
    }

    /// Transform one (x, y) pair; geographic coordinates are (lon, lat)
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        if self.is_identity() {
            return (x, y);
        }
        let (lon, lat) = match self.from {
            Frame::Geographic => (x, y),
            Frame::Utm(zone) => utm_to_wgs84(x, y, zone),
        };
        match self.to {
            Frame::Geographic => (lon, lat),
            Frame::Utm(zone) => wgs84_to_utm(lon, lat, zone),
        }
    }

    /// Transform every vertex of a geometry
    pub fn geometry<G>(&self, geometry: &G) -> G::Output
    where
        G: MapCoords<f64, f64>,
    {
        let op = *self;
        geometry.map_coords(move |c: Coord<f64>| {
            let (x, y) = op.apply(c.x, c.y);
            Coord { x, y }
        })
    }
}

/// Express a buffer in `target`, keeping its role
pub fn reproject_buffer(buffer: &BufferGeometry, target: &CRS) -> Result<BufferGeometry> {
    let op = Transformer::new(buffer.crs(), target)?;
    if op.is_identity() {
        return Ok(buffer.with_geometry(buffer.geometry().clone(), target.clone()));
    }
    Ok(buffer.with_geometry(op.geometry(buffer.geometry()), target.clone()))
}

/// Express a river centerline in `target`
pub fn reproject_river(river: &RiverCenterline, target: &CRS) -> Result<RiverCenterline> {
    let op = Transformer::new(river.crs(), target)?;
    if op.is_identity() {
        return Ok(river.with_lines(river.lines().clone(), target.clone()));
    }
    Ok(river.with_lines(op.geometry(river.lines()), target.clone()))
}

/// Convert a point in `crs` to WGS84 (lon, lat)
pub fn to_wgs84(x: f64, y: f64, crs: &CRS) -> Result<(f64, f64)> {
    Ok(Transformer::new(crs, &CRS::wgs84())?.apply(x, y))
}

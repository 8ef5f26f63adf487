//! Vector geometries tied to a CRS
//!
//! Geometry operations live in `riparia-algorithms`; these types only pair
//! `geo-types` geometries with the CRS their coordinates are expressed in,
//! so that no containment test can run on coordinates of unknown frame.

use crate::crs::CRS;
use geo_types::{LineString, MultiLineString, MultiPolygon, Polygon};
use serde::{Deserialize, Serialize};

/// Role a buffer polygon plays in the analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BufferRole {
    /// Area considered for degradation statistics and sampling
    Analysis,
    /// Area occupied by the watercourse itself
    RiverExclusion,
}

/// A (multi-)polygon zone of interest with its CRS
#[derive(Debug, Clone, PartialEq)]
pub struct BufferGeometry {
    geometry: MultiPolygon<f64>,
    crs: CRS,
    role: BufferRole,
}

impl BufferGeometry {
    /// Create an analysis buffer
    pub fn new(geometry: impl Into<MultiPolygon<f64>>, crs: CRS) -> Self {
        Self {
            geometry: geometry.into(),
            crs,
            role: BufferRole::Analysis,
        }
    }

    /// Create a river-exclusion buffer
    pub fn river_exclusion(geometry: impl Into<MultiPolygon<f64>>, crs: CRS) -> Self {
        Self {
            geometry: geometry.into(),
            crs,
            role: BufferRole::RiverExclusion,
        }
    }

    pub fn geometry(&self) -> &MultiPolygon<f64> {
        &self.geometry
    }

    pub fn crs(&self) -> &CRS {
        &self.crs
    }

    pub fn role(&self) -> BufferRole {
        self.role
    }

    /// True when there is no polygon with a usable exterior ring
    pub fn is_empty(&self) -> bool {
        self.geometry
            .0
            .iter()
            .all(|p: &Polygon<f64>| p.exterior().0.len() < 4)
    }

    /// Same role, new coordinates and CRS (used by reprojection)
    pub fn with_geometry(&self, geometry: MultiPolygon<f64>, crs: CRS) -> Self {
        Self {
            geometry,
            crs,
            role: self.role,
        }
    }
}

/// One or more river centerline features with their CRS
#[derive(Debug, Clone, PartialEq)]
pub struct RiverCenterline {
    lines: MultiLineString<f64>,
    crs: CRS,
    name: Option<String>,
}

impl RiverCenterline {
    pub fn new(lines: impl Into<MultiLineString<f64>>, crs: CRS) -> Self {
        Self {
            lines: lines.into(),
            crs,
            name: None,
        }
    }

    /// Builder: attach the watercourse name
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn lines(&self) -> &MultiLineString<f64> {
        &self.lines
    }

    pub fn crs(&self) -> &CRS {
        &self.crs
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// True when no feature has at least two vertices
    pub fn is_empty(&self) -> bool {
        self.lines.0.iter().all(|l: &LineString<f64>| l.0.len() < 2)
    }

    /// Same name, new coordinates and CRS (used by reprojection)
    pub fn with_lines(&self, lines: MultiLineString<f64>, crs: CRS) -> Self {
        Self {
            lines,
            crs,
            name: self.name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::polygon;

    #[test]
    fn test_buffer_roles_and_emptiness() {
        let square = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0)];
        let buffer = BufferGeometry::new(square.clone(), CRS::wgs84());
        assert_eq!(buffer.role(), BufferRole::Analysis);
        assert!(!buffer.is_empty());

        let exclusion = BufferGeometry::river_exclusion(square, CRS::wgs84());
        assert_eq!(exclusion.role(), BufferRole::RiverExclusion);

        let empty = BufferGeometry::new(MultiPolygon::<f64>::new(vec![]), CRS::wgs84());
        assert!(empty.is_empty());
    }

    #[test]
    fn test_river_emptiness() {
        let river = RiverCenterline::new(
            LineString::from(vec![(0.0, 0.0), (1.0, 1.0)]),
            CRS::wgs84(),
        )
        .named("Rio Claro");
        assert!(!river.is_empty());
        assert_eq!(river.name(), Some("Rio Claro"));

        let stub = RiverCenterline::new(LineString::from(vec![(0.0, 0.0)]), CRS::wgs84());
        assert!(stub.is_empty());
    }
}

//! Critical points and the point set that carries them

use std::collections::BTreeSet;

use geo::line_measures::Distance;
use geo::{Haversine, Point};
use serde::Serialize;

use crate::degradation::{SeverityClass, SeverityThresholds};

/// Degraded-confidence condition recorded on a report or point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PrecisionFlag {
    /// Raster and geometry disagreed on hemisphere and were repaired
    HemisphereCorrected,
    /// Raster CRS was guessed from geometry or raster bounds
    CrsInferred,
    /// No river geometry; the channel was not subtracted from the buffer
    NoRiverExclusion,
    /// No river centerline; distance to river is 0 and meaningless
    DistanceUnavailable,
    /// Sampled class fractions disagree with the raster beyond tolerance
    DistributionMismatch,
}

/// Where a point came from and how much to trust it
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Provenance {
    /// Acquisition source of the scene, e.g. "sentinel-2"
    pub source: String,
    /// Acquisition date as handed over by the raster provider
    pub acquired: Option<String>,
    pub flags: BTreeSet<PrecisionFlag>,
}

/// One sampled raster cell
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CriticalPoint {
    /// Coordinate-derived identifier, stable across runs
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Cell center in the resolved raster CRS
    pub x: f64,
    pub y: f64,
    pub value: f64,
    pub severity: SeverityClass,
    /// Straight-line distance to the nearest centerline feature, metres
    pub distance_to_river_m: f64,
    pub label: String,
    pub provenance: Provenance,
}

/// Parameters a point set was generated with, kept for auditing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationParameters {
    pub thresholds: SeverityThresholds,
    pub analysis_distance_m: Option<f64>,
    pub channel_half_width_m: Option<f64>,
    pub max_points_per_class: usize,
    pub min_spacing_m: f64,
    pub emit: Vec<SeverityClass>,
    pub seed: Option<u64>,
}

/// Sampled points partitioned by severity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointSet {
    pub critical: Vec<CriticalPoint>,
    pub moderate: Vec<CriticalPoint>,
    pub healthy: Vec<CriticalPoint>,
    pub parameters: GenerationParameters,
}

impl PointSet {
    pub fn new(parameters: GenerationParameters) -> Self {
        Self {
            critical: Vec::new(),
            moderate: Vec::new(),
            healthy: Vec::new(),
            parameters,
        }
    }

    /// Add a point to the list of its class; no-data points are dropped
    pub fn push(&mut self, point: CriticalPoint) {
        match point.severity {
            SeverityClass::Critical => self.critical.push(point),
            SeverityClass::Moderate => self.moderate.push(point),
            SeverityClass::Healthy => self.healthy.push(point),
            SeverityClass::NoData => {}
        }
    }

    pub fn by_class(&self, class: SeverityClass) -> &[CriticalPoint] {
        match class {
            SeverityClass::Critical => &self.critical,
            SeverityClass::Moderate => &self.moderate,
            SeverityClass::Healthy => &self.healthy,
            SeverityClass::NoData => &[],
        }
    }

    /// Every point, most severe class first
    pub fn all(&self) -> impl Iterator<Item = &CriticalPoint> {
        self.critical
            .iter()
            .chain(self.moderate.iter())
            .chain(self.healthy.iter())
    }

    pub fn len(&self) -> usize {
        self.critical.len() + self.moderate.len() + self.healthy.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of point pairs closer than the advisory minimum spacing.
    ///
    /// Measured as great-circle metres between WGS84 positions, so the count
    /// does not depend on the raster CRS.
    pub fn spacing_violations(&self) -> usize {
        let min = self.parameters.min_spacing_m;
        if min <= 0.0 {
            return 0;
        }
        let points: Vec<Point<f64>> = self
            .all()
            .map(|p| Point::new(p.longitude, p.latitude))
            .collect();
        let mut violations = 0;
        for (i, a) in points.iter().enumerate() {
            for b in &points[i + 1..] {
                if Haversine.distance(*a, *b) < min {
                    violations += 1;
                }
            }
        }
        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(lat: f64, lon: f64, severity: SeverityClass) -> CriticalPoint {
        CriticalPoint {
            id: format!("p{lat}_{lon}"),
            latitude: lat,
            longitude: lon,
            x: lon,
            y: lat,
            value: 0.1,
            severity,
            distance_to_river_m: 0.0,
            label: String::new(),
            provenance: Provenance::default(),
        }
    }

    fn params(min_spacing_m: f64) -> GenerationParameters {
        GenerationParameters {
            thresholds: SeverityThresholds::default(),
            analysis_distance_m: Some(200.0),
            channel_half_width_m: Some(10.0),
            max_points_per_class: 50,
            min_spacing_m,
            emit: vec![SeverityClass::Critical],
            seed: Some(7),
        }
    }

    #[test]
    fn test_partition_by_class() {
        let mut set = PointSet::new(params(100.0));
        set.push(point(0.0, 0.0, SeverityClass::Critical));
        set.push(point(10.0, 0.0, SeverityClass::Healthy));
        set.push(point(20.0, 0.0, SeverityClass::NoData));
        assert_eq!(set.len(), 2);
        assert_eq!(set.by_class(SeverityClass::Critical).len(), 1);
        assert_eq!(set.by_class(SeverityClass::Moderate).len(), 0);
        assert_eq!(set.all().next().map(|p| p.severity), Some(SeverityClass::Critical));
    }

    #[test]
    fn test_spacing_violations() {
        // On the equator 0.001° of longitude is ~111 m
        let mut set = PointSet::new(params(100.0));
        set.push(point(0.0, 0.0, SeverityClass::Critical));
        set.push(point(0.0, 0.00045, SeverityClass::Critical));
        set.push(point(0.0, 0.0027, SeverityClass::Critical));
        set.push(point(0.00089, 0.0027, SeverityClass::Moderate));
        assert_eq!(set.spacing_violations(), 2);

        let mut relaxed = set.clone();
        relaxed.parameters.min_spacing_m = 0.0;
        assert_eq!(relaxed.spacing_violations(), 0);
    }

    #[test]
    fn test_spacing_ignores_native_units() {
        // Degree-valued native coordinates 300 m apart are not a violation
        let mut set = PointSet::new(params(100.0));
        set.push(point(40.42, -3.70, SeverityClass::Critical));
        set.push(point(40.42, -3.6965, SeverityClass::Critical));
        assert!(set.all().all(|p| p.x.abs() < 180.0));
        assert_eq!(set.spacing_violations(), 0);
    }
}

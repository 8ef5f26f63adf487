//! Spatial helpers: bounding boxes and centroids

use geo::{BoundingRect, Centroid, Point, Rect};
use riparia_core::{Raster, RasterElement};

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    /// World extent of a raster
    pub fn of_raster<T: RasterElement>(raster: &Raster<T>) -> Self {
        let (min_x, min_y, max_x, max_y) = raster.bounds();
        Self { min_x, min_y, max_x, max_y }
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> (f64, f64) {
        ((self.min_x + self.max_x) / 2.0, (self.min_y + self.max_y) / 2.0)
    }

    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    /// Overlap of two boxes, if any
    pub fn intersection(&self, other: &BoundingBox) -> Option<BoundingBox> {
        if !self.intersects(other) {
            return None;
        }
        Some(BoundingBox {
            min_x: self.min_x.max(other.min_x),
            min_y: self.min_y.max(other.min_y),
            max_x: self.max_x.min(other.max_x),
            max_y: self.max_y.min(other.max_y),
        })
    }
}

impl From<Rect<f64>> for BoundingBox {
    fn from(rect: Rect<f64>) -> Self {
        Self {
            min_x: rect.min().x,
            min_y: rect.min().y,
            max_x: rect.max().x,
            max_y: rect.max().y,
        }
    }
}

/// Compute the bounding box of any geometry
pub fn bounding_box<G>(geom: &G) -> Option<BoundingBox>
where
    G: BoundingRect<f64>,
    G::Output: Into<Option<Rect<f64>>>,
{
    geom.bounding_rect().into().map(BoundingBox::from)
}

/// Compute the centroid of any geometry
pub fn centroid<G>(geom: &G) -> Option<Point<f64>>
where
    G: Centroid<Output = Option<Point<f64>>>,
{
    geom.centroid()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, MultiPolygon};
    use riparia_core::GeoTransform;

    #[test]
    fn test_bbox_intersection() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(5.0, 5.0, 15.0, 15.0);
        let c = BoundingBox::new(20.0, 20.0, 30.0, 30.0);

        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        assert_eq!(a.intersection(&b), Some(BoundingBox::new(5.0, 5.0, 10.0, 10.0)));
        assert_eq!(a.intersection(&c), None);
        assert_eq!(b.center(), (10.0, 10.0));
        assert!(a.contains_point(10.0, 0.0));
    }

    #[test]
    fn test_raster_and_geometry_boxes() {
        let raster: Raster<f64> =
            Raster::new(10, 20).with_transform(GeoTransform::new(100.0, 500.0, 10.0, -10.0));
        let bb = BoundingBox::of_raster(&raster);
        assert_eq!(bb, BoundingBox::new(100.0, 400.0, 300.0, 500.0));
        assert_eq!(bb.width(), 200.0);
        assert_eq!(bb.height(), 100.0);

        let poly = polygon![(x: 0.0, y: 0.0), (x: 4.0, y: 0.0), (x: 4.0, y: 2.0), (x: 0.0, y: 2.0)];
        let mp = MultiPolygon::new(vec![poly]);
        assert_eq!(bounding_box(&mp), Some(BoundingBox::new(0.0, 0.0, 4.0, 2.0)));
        let c = centroid(&mp).unwrap();
        assert!((c.x() - 2.0).abs() < 1e-12 && (c.y() - 1.0).abs() < 1e-12);

        let empty = MultiPolygon::<f64>::new(vec![]);
        assert_eq!(bounding_box(&empty), None);
    }
}

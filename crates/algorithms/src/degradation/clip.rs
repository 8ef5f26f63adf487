//! Polygon mask-and-crop of an index raster
//!
//! The raster is cropped to the window covering the buffer's bounding box,
//! then every cell whose center lies outside the buffer is set to NaN so it
//! drops out of all later statistics and sampling.

use geo::{Contains, Point};
use ndarray::Array2;
use riparia_core::{BufferGeometry, Error, Raster, Result};
use tracing::debug;

use crate::maybe_rayon::*;
use crate::vector::{bounding_box, BoundingBox};

/// Clip `raster` to the polygon of `buffer`.
///
/// Both must already share one CRS. Fails with `NoSpatialIntersection` when
/// the buffer's extent misses the raster entirely.
pub fn clip_to_buffer(raster: &Raster<f64>, buffer: &BufferGeometry) -> Result<Raster<f64>> {
    if let Some(crs) = raster.crs() {
        if !crs.is_equivalent(buffer.crs()) {
            return Err(Error::CrsMismatch(crs.identifier(), buffer.crs().identifier()));
        }
    }

    let raster_box = BoundingBox::of_raster(raster);
    let buffer_box = bounding_box(buffer.geometry())
        .ok_or_else(|| Error::EmptyInput("analysis buffer has no extent".into()))?;
    let overlap = raster_box
        .intersection(&buffer_box)
        .ok_or(Error::NoSpatialIntersection {
            r_min_x: raster_box.min_x,
            r_min_y: raster_box.min_y,
            r_max_x: raster_box.max_x,
            r_max_y: raster_box.max_y,
            b_min_x: buffer_box.min_x,
            b_min_y: buffer_box.min_y,
            b_max_x: buffer_box.max_x,
            b_max_y: buffer_box.max_y,
        })?;

    let (row_off, col_off, rows, cols) = pixel_window(raster, &overlap);
    if rows == 0 || cols == 0 {
        return Err(Error::InsufficientData(
            "buffer overlaps the raster by less than one cell".into(),
        ));
    }
    let cropped = raster.crop(row_off, col_off, rows, cols)?;

    let polygon = buffer.geometry();
    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for (col, out) in row_data.iter_mut().enumerate() {
                let value = cropped.data()[[row, col]];
                if cropped.is_nodata(value) {
                    continue;
                }
                let (x, y) = cropped.pixel_to_geo(col, row);
                if polygon.contains(&Point::new(x, y)) {
                    *out = value;
                }
            }
            row_data
        })
        .collect();

    let mut output = cropped;
    *output.data_mut() =
        Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))?;

    debug!(
        rows,
        cols,
        row_off,
        col_off,
        valid = output.valid_count(),
        "clipped raster to buffer"
    );
    Ok(output)
}

/// Pixel window (row_off, col_off, rows, cols) covering a world box, clamped
/// to the raster
fn pixel_window(raster: &Raster<f64>, bbox: &BoundingBox) -> (usize, usize, usize, usize) {
    let corners = [
        raster.geo_to_pixel(bbox.min_x, bbox.min_y),
        raster.geo_to_pixel(bbox.min_x, bbox.max_y),
        raster.geo_to_pixel(bbox.max_x, bbox.min_y),
        raster.geo_to_pixel(bbox.max_x, bbox.max_y),
    ];

    let (mut c0, mut c1, mut r0, mut r1) = (f64::INFINITY, f64::NEG_INFINITY, f64::INFINITY, f64::NEG_INFINITY);
    for (c, r) in corners {
        c0 = c0.min(c);
        c1 = c1.max(c);
        r0 = r0.min(r);
        r1 = r1.max(r);
    }
    if !(c0.is_finite() && c1.is_finite() && r0.is_finite() && r1.is_finite()) {
        return (0, 0, 0, 0);
    }

    let clamp = |v: f64, max: usize| v.max(0.0).min(max as f64) as usize;
    let col_start = clamp(c0.floor(), raster.cols());
    let col_end = clamp(c1.ceil(), raster.cols());
    let row_start = clamp(r0.floor(), raster.rows());
    let row_end = clamp(r1.ceil(), raster.rows());

    (
        row_start,
        col_start,
        row_end.saturating_sub(row_start),
        col_end.saturating_sub(col_start),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;
    use riparia_core::{GeoTransform, CRS};

    fn utm_raster(rows: usize, cols: usize, value: f64) -> Raster<f64> {
        Raster::filled(rows, cols, value)
            .with_transform(GeoTransform::new(500_000.0, 4_000_100.0, 10.0, -10.0))
            .with_crs(CRS::from_epsg(32630))
    }

    fn utm_buffer(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> BufferGeometry {
        BufferGeometry::new(
            polygon![
                (x: min_x, y: min_y),
                (x: max_x, y: min_y),
                (x: max_x, y: max_y),
                (x: min_x, y: max_y),
            ],
            CRS::from_epsg(32630),
        )
    }

    #[test]
    fn test_clip_full_cover_keeps_everything() {
        let raster = utm_raster(10, 10, 0.6);
        let buffer = utm_buffer(499_990.0, 3_999_990.0, 500_110.0, 4_000_110.0);
        let clipped = clip_to_buffer(&raster, &buffer).unwrap();
        assert_eq!(clipped.shape(), (10, 10));
        assert_eq!(clipped.valid_count(), 100);
        assert_eq!(clipped.transform(), raster.transform());
    }

    #[test]
    fn test_clip_crops_and_masks() {
        let raster = utm_raster(10, 10, 0.6);
        // Triangle over the top-left 5x5 cells
        let buffer = BufferGeometry::new(
            polygon![
                (x: 500_000.0, y: 4_000_100.0),
                (x: 500_050.0, y: 4_000_100.0),
                (x: 500_000.0, y: 4_000_050.0),
            ],
            CRS::from_epsg(32630),
        );
        let clipped = clip_to_buffer(&raster, &buffer).unwrap();
        assert_eq!(clipped.shape(), (5, 5));
        // Cell centers strictly below the hypotenuse: 4+3+2+1+0
        assert_eq!(clipped.valid_count(), 10);
        assert!(clipped.data()[[4, 4]].is_nan());
        assert_eq!(clipped.data()[[0, 0]], 0.6);

        let (x, y) = clipped.pixel_to_geo(0, 0);
        assert_eq!((x, y), (500_005.0, 4_000_095.0));
    }

    #[test]
    fn test_clip_drops_nodata_cells() {
        let mut raster = utm_raster(4, 4, 0.3).with_nodata(-9999.0);
        raster.set(1, 1, -9999.0).unwrap();
        let buffer = utm_buffer(499_000.0, 3_999_000.0, 501_000.0, 4_001_000.0);
        let clipped = clip_to_buffer(&raster, &buffer).unwrap();
        assert_eq!(clipped.valid_count(), 15);
    }

    #[test]
    fn test_clip_without_overlap_fails() {
        let raster = utm_raster(10, 10, 0.6);
        let buffer = utm_buffer(600_000.0, 4_000_000.0, 600_100.0, 4_000_100.0);
        let err = clip_to_buffer(&raster, &buffer).unwrap_err();
        assert!(matches!(err, Error::NoSpatialIntersection { .. }));
    }

    #[test]
    fn test_clip_rejects_crs_mismatch() {
        let raster = utm_raster(10, 10, 0.6);
        let buffer = BufferGeometry::new(
            polygon![(x: -3.0, y: 36.0), (x: -2.9, y: 36.0), (x: -2.9, y: 36.1)],
            CRS::wgs84(),
        );
        let err = clip_to_buffer(&raster, &buffer).unwrap_err();
        assert!(matches!(err, Error::CrsMismatch(_, _)));
    }
}

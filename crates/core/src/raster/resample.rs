//! Nearest-neighbour resampling between lattices

use crate::raster::{GridSpec, Raster, RasterElement};
use crate::vector::BoundingBox;
use crate::error::Result;

/// Sample `source` at every cell center of `target`.
///
/// Cells whose center falls outside the source, or on a source no-data
/// cell, are no-data in the result. The CRS is carried over unchanged.
pub fn resample_nearest<T: RasterElement>(source: &Raster<T>, target: &GridSpec) -> Raster<T> {
    if source.grid() == *target {
        return source.clone();
    }

    let mut out = Raster::<T>::nodata_on(target);
    out.set_crs(source.crs().cloned());

    for row in 0..target.rows {
        for col in 0..target.cols {
            let (x, y) = target.cell_center(row, col);
            if let Some(v) = source.sample(x, y) {
                // Indices come from `target`, which sized `out`.
                let _ = out.set(row, col, v);
            }
        }
    }

    out
}

/// Resample `source` onto square cells of `resolution` over its own extent
pub fn resample_to_resolution<T: RasterElement>(
    source: &Raster<T>,
    resolution: f64,
) -> Result<Raster<T>> {
    let (min_x, min_y, max_x, max_y) = source.bounds();
    let target = GridSpec::covering(&BoundingBox::new(min_x, min_y, max_x, max_y), resolution)?;
    Ok(resample_nearest(source, &target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::GeoTransform;

    fn ramp(rows: usize, cols: usize, cell: f64) -> Raster<f64> {
        let data = (0..rows * cols).map(|i| i as f64).collect();
        let mut r = Raster::from_vec(data, rows, cols).unwrap();
        r.set_transform(GeoTransform::north_up(0.0, rows as f64 * cell, cell));
        r
    }

    #[test]
    fn test_identity_grid_is_a_copy() {
        let src = ramp(4, 4, 10.0);
        let out = resample_nearest(&src, &src.grid());
        assert_eq!(out.data(), src.data());
    }

    #[test]
    fn test_downsample_picks_center_cell() {
        // 4x4 at 10 m -> 2x2 at 20 m; centers land on source cells (1,1), (1,3), ...
        let src = ramp(4, 4, 10.0);
        let out = resample_to_resolution(&src, 20.0).unwrap();
        assert_eq!(out.shape(), (2, 2));
        assert_eq!(out.get(0, 0).unwrap(), Some(5.0));
        assert_eq!(out.get(1, 1).unwrap(), Some(15.0));
    }

    #[test]
    fn test_nodata_and_outside_propagate() {
        let mut src = ramp(2, 2, 10.0);
        src.set_nodata_at(0, 0).unwrap();

        let target = GridSpec::new(GeoTransform::north_up(0.0, 20.0, 10.0), 2, 3);
        let out = resample_nearest(&src, &target);

        assert_eq!(out.get(0, 0).unwrap(), None);
        assert_eq!(out.get(0, 1).unwrap(), Some(1.0));
        assert_eq!(out.get(0, 2).unwrap(), None);
    }
}

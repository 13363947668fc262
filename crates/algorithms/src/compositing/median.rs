//! Per-pixel temporal median over a stack of co-registered rasters

use greenseries_core::{GridSpec, Raster, Result};

use crate::maybe_rayon::*;

/// Median of the values, averaging the two middle ones for an even count.
///
/// Sorts `values` in place; `None` for an empty slice.
pub fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

/// Reduce `stack` (all laid out on `grid`) to its per-pixel median.
///
/// No-data cells are skipped; a pixel stays no-data only when every layer
/// is no-data there.
pub fn median_stack(stack: &[Raster<f64>], grid: &GridSpec) -> Result<Raster<f64>> {
    for layer in stack {
        if layer.shape() != grid.shape() {
            let (er, ec) = grid.shape();
            let (ar, ac) = layer.shape();
            return Err(greenseries_core::Error::SizeMismatch { er, ec, ar, ac });
        }
    }

    let (rows, cols) = grid.shape();
    let cells: Vec<Option<f64>> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut buf = Vec::with_capacity(stack.len());
            let mut out = Vec::with_capacity(cols);
            for col in 0..cols {
                buf.clear();
                for layer in stack {
                    if layer.mask()[(row, col)] {
                        buf.push(layer.data()[(row, col)]);
                    }
                }
                out.push(median(&mut buf));
            }
            out
        })
        .collect();

    let mut raster = Raster::from_options(cells, rows, cols)?;
    raster.set_transform(grid.transform);
    Ok(raster)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use greenseries_core::GeoTransform;

    fn grid() -> GridSpec {
        GridSpec::new(GeoTransform::north_up(0.0, 30.0, 30.0), 1, 3)
    }

    fn layer(values: Vec<Option<f64>>) -> Raster<f64> {
        let mut r = Raster::from_options(values, 1, 3).unwrap();
        r.set_transform(grid().transform);
        r
    }

    #[test]
    fn test_median_odd_and_even() {
        assert_eq!(median(&mut [3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&mut [4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(median(&mut []), None);
    }

    #[test]
    fn test_stack_skips_nodata() {
        let stack = vec![
            layer(vec![Some(0.1), None, None]),
            layer(vec![Some(0.9), Some(0.4), None]),
            layer(vec![Some(0.3), None, None]),
        ];
        let out = median_stack(&stack, &grid()).unwrap();

        assert_relative_eq!(out.get(0, 0).unwrap().unwrap(), 0.3);
        assert_relative_eq!(out.get(0, 1).unwrap().unwrap(), 0.4);
        assert_eq!(out.get(0, 2).unwrap(), None);
    }

    #[test]
    fn test_median_resists_outlier() {
        let stack = vec![
            layer(vec![Some(0.20); 3]),
            layer(vec![Some(0.22); 3]),
            layer(vec![Some(9.0); 3]), // residual cloud
        ];
        let out = median_stack(&stack, &grid()).unwrap();
        assert_relative_eq!(out.get(0, 2).unwrap().unwrap(), 0.22);
    }

    #[test]
    fn test_empty_stack_is_nodata() {
        let out = median_stack(&[], &grid()).unwrap();
        assert!(out.is_fully_masked());
        assert_eq!(out.shape(), (1, 3));
    }
}

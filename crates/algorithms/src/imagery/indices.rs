//! Normalized-difference spectral indices
//!
//! Index rasters are single-band `Raster<f64>`; a pixel is no-data where
//! either input is no-data or the index is undefined.

use greenseries_core::{Raster, Result, Roi};

use crate::compositing::Composite;
use crate::config::IndexConfig;
use crate::error::{PipelineResult, Stage, StageContext};
use crate::maybe_rayon::*;

// ---------------------------------------------------------------------------
// Generic normalized difference
// ---------------------------------------------------------------------------

/// Compute the normalized difference between two bands:
///
/// `(band_a - band_b) / (band_a + band_b)`
///
/// Pixels where the sum is zero, where the ratio is not finite, or where
/// either band is no-data become no-data. Values are not clamped.
///
/// # Arguments
/// * `band_a` - Numerator positive band
/// * `band_b` - Numerator negative band
pub fn normalized_difference(band_a: &Raster<f64>, band_b: &Raster<f64>) -> Result<Raster<f64>> {
    band_a.check_same_grid(band_b)?;

    let (rows, cols) = band_a.shape();
    let cells: Vec<Option<f64>> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![None; cols];
            for (col, cell) in row_data.iter_mut().enumerate() {
                if !band_a.mask()[(row, col)] || !band_b.mask()[(row, col)] {
                    continue;
                }
                let a = band_a.data()[(row, col)];
                let b = band_b.data()[(row, col)];

                let sum = a + b;
                if sum == 0.0 {
                    continue;
                }
                let ratio = (a - b) / sum;
                if ratio.is_finite() {
                    *cell = Some(ratio);
                }
            }
            row_data
        })
        .collect();

    let mut out = Raster::from_options(cells, rows, cols)?;
    out.set_transform(*band_a.transform());
    out.set_crs(band_a.crs().cloned());
    Ok(out)
}

// ---------------------------------------------------------------------------
// NDVI
// ---------------------------------------------------------------------------

/// Normalized Difference Vegetation Index
///
/// `NDVI = (NIR - Red) / (NIR + Red)`
///
/// Values range from -1 to 1:
/// - Dense vegetation: 0.6 to 0.9
/// - Sparse vegetation: 0.2 to 0.5
/// - Water/clouds: -1.0 to 0.0
pub fn ndvi(nir: &Raster<f64>, red: &Raster<f64>) -> Result<Raster<f64>> {
    normalized_difference(nir, red)
}

// ---------------------------------------------------------------------------
// Composite → index
// ---------------------------------------------------------------------------

/// Derives the configured index from a composite and clips it to the region
#[derive(Debug, Clone)]
pub struct IndexCalculator {
    name: String,
    numerator: String,
    denominator: String,
}

impl IndexCalculator {
    pub fn new(
        name: impl Into<String>,
        numerator: impl Into<String>,
        denominator: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            numerator: numerator.into(),
            denominator: denominator.into(),
        }
    }

    pub fn from_config(config: &IndexConfig) -> Self {
        Self::new(&config.name, &config.numerator, &config.denominator)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Index raster on the composite grid.
    ///
    /// An empty composite gives an all no-data raster; a populated one
    /// lacking either band is a [`MissingBand`](greenseries_core::Error::MissingBand) error.
    pub fn compute(&self, composite: &Composite, roi: &Roi) -> PipelineResult<Raster<f64>> {
        if composite.is_empty() {
            let mut out = Raster::nodata_on(composite.grid());
            out.set_crs(roi.crs().cloned());
            return Ok(out);
        }

        let a = composite.band(&self.numerator).stage(Stage::Index)?;
        let b = composite.band(&self.denominator).stage(Stage::Index)?;

        let mut index = normalized_difference(a, b).stage(Stage::Index)?;
        index
            .update_mask(&roi.mask(composite.grid()))
            .stage(Stage::Index)?;
        Ok(index)
    }
}

impl Default for IndexCalculator {
    fn default() -> Self {
        Self::from_config(&IndexConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use greenseries_core::GeoTransform;

    fn make_band(values: Vec<Option<f64>>) -> Raster<f64> {
        let n = values.len();
        let mut r = Raster::from_options(values, 1, n).unwrap();
        r.set_transform(GeoTransform::north_up(0.0, 30.0, 30.0));
        r
    }

    #[test]
    fn test_ndvi_reference_value() {
        let nir = make_band(vec![Some(0.5)]);
        let red = make_band(vec![Some(0.1)]);
        let out = ndvi(&nir, &red).unwrap();
        assert_relative_eq!(out.get(0, 0).unwrap().unwrap(), 0.6667, epsilon = 1e-4);
    }

    #[test]
    fn test_zero_sum_is_nodata() {
        let nir = make_band(vec![Some(0.0), Some(0.2), Some(-0.1)]);
        let red = make_band(vec![Some(0.0), None, Some(0.1)]);
        let out = normalized_difference(&nir, &red).unwrap();
        assert_eq!(out.get(0, 0).unwrap(), None);
        assert_eq!(out.get(0, 1).unwrap(), None);
        assert_eq!(out.get(0, 2).unwrap(), None);
    }

    #[test]
    fn test_not_clamped() {
        // Negative reflectance after calibration can push the ratio past 1
        let nir = make_band(vec![Some(0.3)]);
        let red = make_band(vec![Some(-0.1)]);
        let out = normalized_difference(&nir, &red).unwrap();
        assert_relative_eq!(out.get(0, 0).unwrap().unwrap(), 2.0, epsilon = 1e-12);
    }

    fn region() -> Roi {
        use geo_types::{Geometry, Rect};
        Roi::new(Geometry::Rect(Rect::new((0.0, 0.0), (90.0, 30.0)))).unwrap()
    }

    #[test]
    fn test_empty_composite_gives_nodata_raster() {
        let grid = greenseries_core::GridSpec::new(GeoTransform::north_up(0.0, 30.0, 30.0), 1, 3);
        let out = IndexCalculator::default()
            .compute(&Composite::empty(grid), &region())
            .unwrap();
        assert_eq!(out.shape(), (1, 3));
        assert!(out.is_fully_masked());
    }

    #[test]
    fn test_missing_band_in_populated_composite() {
        let red = make_band(vec![Some(0.1); 3]);
        let grid = red.grid();
        let bands = [("SR_B4".to_string(), red)].into_iter().collect();
        let err = IndexCalculator::default()
            .compute(&Composite::new(grid, 2, bands), &region())
            .unwrap_err();
        assert_eq!(err.stage, Stage::Index);
        assert!(err.to_string().contains("SR_B5"));
    }

    #[test]
    fn test_compute_from_composite() {
        let nir = make_band(vec![Some(0.5), Some(0.3), None]);
        let red = make_band(vec![Some(0.1), Some(0.3), Some(0.1)]);
        let grid = nir.grid();
        let bands = [("SR_B5".to_string(), nir), ("SR_B4".to_string(), red)]
            .into_iter()
            .collect();
        let out = IndexCalculator::default()
            .compute(&Composite::new(grid, 1, bands), &region())
            .unwrap();
        assert_relative_eq!(out.get(0, 0).unwrap().unwrap(), 2.0 / 3.0, epsilon = 1e-12);
        assert_eq!(out.get(0, 1).unwrap(), Some(0.0));
        assert_eq!(out.get(0, 2).unwrap(), None);
    }

    #[test]
    fn test_grid_mismatch() {
        let a = make_band(vec![Some(0.1), Some(0.2)]);
        let b = make_band(vec![Some(0.1)]);
        assert!(normalized_difference(&a, &b).is_err());
    }
}

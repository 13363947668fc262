//! Main Raster type

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::raster::{GeoTransform, GridSpec, RasterElement};
use ndarray::{Array2, ArrayView2, Zip};

/// A georeferenced 2D raster grid with an explicit validity mask.
///
/// Every cell has a value and a flag; a cell whose flag is `false` is
/// "no data" regardless of the value stored underneath. Masking is
/// cumulative: [`Raster::update_mask`] can only invalidate cells.
///
/// # Example
///
/// ```ignore
/// use greenseries_core::Raster;
///
/// let mut raster: Raster<f64> = Raster::new(100, 100);
/// raster.set(10, 20, 0.42)?;
/// raster.set_nodata_at(10, 21)?;
///
/// assert_eq!(raster.get(10, 20)?, Some(0.42));
/// assert_eq!(raster.get(10, 21)?, None);
/// ```
#[derive(Debug, Clone)]
pub struct Raster<T: RasterElement> {
    /// Cell values in row-major order (row, col)
    data: Array2<T>,
    /// `true` where the cell holds a usable value
    valid: Array2<bool>,
    transform: GeoTransform,
    crs: Option<CRS>,
}

impl<T: RasterElement> Raster<T> {
    /// Create a raster filled with zeros, every cell valid
    pub fn new(rows: usize, cols: usize) -> Self {
        Self::from_array(Array2::zeros((rows, cols)))
    }

    /// Create a raster filled with a specific value, every cell valid
    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        Self::from_array(Array2::from_elem((rows, cols), value))
    }

    /// Create a raster where every cell is no-data
    pub fn nodata(rows: usize, cols: usize) -> Self {
        Self {
            data: Array2::zeros((rows, cols)),
            valid: Array2::from_elem((rows, cols), false),
            transform: GeoTransform::default(),
            crs: None,
        }
    }

    /// Create a fully masked raster laid out on `grid`
    pub fn nodata_on(grid: &GridSpec) -> Self {
        let mut raster = Self::nodata(grid.rows, grid.cols);
        raster.transform = grid.transform;
        raster
    }

    /// Create a raster from row-major values, every cell valid
    pub fn from_vec(data: Vec<T>, rows: usize, cols: usize) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::InvalidDimensions {
                width: cols,
                height: rows,
            });
        }

        let array = Array2::from_shape_vec((rows, cols), data)
            .map_err(|e| Error::Other(e.to_string()))?;

        Ok(Self::from_array(array))
    }

    /// Create a raster from row-major optional values; `None` becomes no-data
    pub fn from_options(data: Vec<Option<T>>, rows: usize, cols: usize) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::InvalidDimensions {
                width: cols,
                height: rows,
            });
        }

        let valid: Vec<bool> = data.iter().map(Option::is_some).collect();
        let values: Vec<T> = data.into_iter().map(|v| v.unwrap_or_else(T::zero)).collect();

        let mut raster = Self::from_vec(values, rows, cols)?;
        raster.valid = Array2::from_shape_vec((rows, cols), valid)
            .map_err(|e| Error::Other(e.to_string()))?;
        Ok(raster)
    }

    /// Create a raster from an ndarray, every cell valid
    pub fn from_array(data: Array2<T>) -> Self {
        let valid = Array2::from_elem(data.dim(), true);
        Self {
            data,
            valid,
            transform: GeoTransform::default(),
            crs: None,
        }
    }

    /// Create a raster from values and a validity mask of the same shape
    pub fn from_parts(data: Array2<T>, valid: Array2<bool>) -> Result<Self> {
        check_shape(data.dim(), valid.dim())?;
        Ok(Self {
            data,
            valid,
            transform: GeoTransform::default(),
            crs: None,
        })
    }

    /// Same grid and CRS, different element type, every cell no-data
    pub fn masked_like<U: RasterElement>(&self) -> Raster<U> {
        Raster {
            data: Array2::zeros(self.data.dim()),
            valid: Array2::from_elem(self.data.dim(), false),
            transform: self.transform,
            crs: self.crs.clone(),
        }
    }

    // Dimensions

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    /// Dimensions as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// Total number of cells
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the raster has no cells
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    // Data access

    /// Value at (row, col), `None` when the cell is no-data
    pub fn get(&self, row: usize, col: usize) -> Result<Option<T>> {
        self.check_index(row, col)?;
        Ok(self.valid[(row, col)].then(|| self.data[(row, col)]))
    }

    /// Set a value at (row, col) and mark the cell valid
    pub fn set(&mut self, row: usize, col: usize, value: T) -> Result<()> {
        self.check_index(row, col)?;
        self.data[(row, col)] = value;
        self.valid[(row, col)] = true;
        Ok(())
    }

    /// Mark the cell at (row, col) as no-data
    pub fn set_nodata_at(&mut self, row: usize, col: usize) -> Result<()> {
        self.check_index(row, col)?;
        self.valid[(row, col)] = false;
        Ok(())
    }

    /// Write an optional value; `None` marks the cell no-data
    pub fn put(&mut self, row: usize, col: usize, value: Option<T>) -> Result<()> {
        match value {
            Some(v) => self.set(row, col, v),
            None => self.set_nodata_at(row, col),
        }
    }

    fn check_index(&self, row: usize, col: usize) -> Result<()> {
        if row >= self.rows() || col >= self.cols() {
            return Err(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            });
        }
        Ok(())
    }

    /// Raw values, including those under the mask
    pub fn data(&self) -> &Array2<T> {
        &self.data
    }

    /// Get a view of the raw values
    pub fn view(&self) -> ArrayView2<'_, T> {
        self.data.view()
    }

    /// Validity mask (`true` = valid)
    pub fn mask(&self) -> &Array2<bool> {
        &self.valid
    }

    /// Invalidate every cell where `mask` is `false`.
    ///
    /// Cells already masked stay masked.
    pub fn update_mask(&mut self, mask: &Array2<bool>) -> Result<()> {
        check_shape(self.valid.dim(), mask.dim())?;
        Zip::from(&mut self.valid)
            .and(mask)
            .for_each(|valid, &keep| *valid &= keep);
        Ok(())
    }

    /// Apply `f` to every valid cell; no-data cells stay no-data
    pub fn map_valid<U, F>(&self, f: F) -> Raster<U>
    where
        U: RasterElement,
        F: Fn(T) -> U,
    {
        let data = Zip::from(&self.data)
            .and(&self.valid)
            .map_collect(|&v, &ok| if ok { f(v) } else { U::zero() });

        Raster {
            data,
            valid: self.valid.clone(),
            transform: self.transform,
            crs: self.crs.clone(),
        }
    }

    /// Apply `f` to every valid cell; `None` turns the cell into no-data
    pub fn filter_map_valid<U, F>(&self, f: F) -> Raster<U>
    where
        U: RasterElement,
        F: Fn(T) -> Option<U>,
    {
        let mut out = self.masked_like::<U>();
        Zip::from(&mut out.data)
            .and(&mut out.valid)
            .and(&self.data)
            .and(&self.valid)
            .for_each(|dst, dst_ok, &v, &ok| {
                if ok {
                    if let Some(u) = f(v) {
                        *dst = u;
                        *dst_ok = true;
                    }
                }
            });
        out
    }

    /// Iterate over the valid values in row-major order
    pub fn iter_valid(&self) -> impl Iterator<Item = T> + '_ {
        self.data
            .iter()
            .zip(self.valid.iter())
            .filter_map(|(&v, &ok)| ok.then_some(v))
    }

    /// Number of valid cells
    pub fn valid_count(&self) -> usize {
        self.valid.iter().filter(|&&ok| ok).count()
    }

    /// Whether every cell is no-data
    pub fn is_fully_masked(&self) -> bool {
        !self.valid.iter().any(|&ok| ok)
    }

    // Metadata

    /// Get the geotransform
    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    /// Set the geotransform
    pub fn set_transform(&mut self, transform: GeoTransform) {
        self.transform = transform;
    }

    /// Get the CRS
    pub fn crs(&self) -> Option<&CRS> {
        self.crs.as_ref()
    }

    /// Set the CRS
    pub fn set_crs(&mut self, crs: Option<CRS>) {
        self.crs = crs;
    }

    /// Lattice description of this raster
    pub fn grid(&self) -> GridSpec {
        GridSpec::new(self.transform, self.rows(), self.cols())
    }

    /// Fail unless `other` has the same dimensions and geotransform
    pub fn check_same_grid<U: RasterElement>(&self, other: &Raster<U>) -> Result<()> {
        check_shape(self.shape(), other.shape())?;
        if self.transform != other.transform {
            return Err(Error::Other(format!(
                "geotransform mismatch: {:?} vs {:?}",
                self.transform, other.transform
            )));
        }
        Ok(())
    }

    /// Cell size (assumes square cells)
    pub fn cell_size(&self) -> f64 {
        self.transform.cell_size()
    }

    /// Map bounds (min_x, min_y, max_x, max_y)
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        self.transform.bounds(self.cols(), self.rows())
    }

    /// Map coordinates of a pixel center
    pub fn pixel_to_geo(&self, col: usize, row: usize) -> (f64, f64) {
        self.transform.pixel_to_geo(col, row)
    }

    /// Map coordinates to fractional pixel coordinates
    pub fn geo_to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        self.transform.geo_to_pixel(x, y)
    }

    /// Value at a map coordinate (nearest cell), `None` outside or on no-data
    pub fn sample(&self, x: f64, y: f64) -> Option<T> {
        let (row, col) = self.transform.locate(x, y, self.rows(), self.cols())?;
        self.valid[(row, col)].then(|| self.data[(row, col)])
    }

    // Statistics

    /// Basic statistics over the valid cells
    pub fn statistics(&self) -> RasterStatistics<T> {
        let mut min: Option<T> = None;
        let mut max: Option<T> = None;
        let mut sum = 0.0;
        let mut count = 0usize;

        for value in self.iter_valid() {
            if min.map_or(true, |m| value < m) {
                min = Some(value);
            }
            if max.map_or(true, |m| value > m) {
                max = Some(value);
            }
            if let Some(v) = value.to_f64() {
                sum += v;
                count += 1;
            }
        }

        RasterStatistics {
            min,
            max,
            mean: (count > 0).then(|| sum / count as f64),
            valid_count: count,
            nodata_count: self.len() - count,
        }
    }
}

fn check_shape(expected: (usize, usize), actual: (usize, usize)) -> Result<()> {
    if expected != actual {
        return Err(Error::SizeMismatch {
            er: expected.0,
            ec: expected.1,
            ar: actual.0,
            ac: actual.1,
        });
    }
    Ok(())
}

/// Basic statistics for a raster
#[derive(Debug, Clone)]
pub struct RasterStatistics<T> {
    pub min: Option<T>,
    pub max: Option<T>,
    pub mean: Option<f64>,
    pub valid_count: usize,
    pub nodata_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raster_creation() {
        let raster: Raster<f32> = Raster::new(100, 200);
        assert_eq!(raster.rows(), 100);
        assert_eq!(raster.cols(), 200);
        assert_eq!(raster.valid_count(), 100 * 200);
    }

    #[test]
    fn test_raster_access() {
        let mut raster: Raster<f64> = Raster::new(10, 10);
        raster.set(5, 5, 42.0).unwrap();
        raster.set_nodata_at(5, 6).unwrap();
        assert_eq!(raster.get(5, 5).unwrap(), Some(42.0));
        assert_eq!(raster.get(5, 6).unwrap(), None);
        assert!(raster.get(10, 0).is_err());
    }

    #[test]
    fn test_zero_is_not_nodata() {
        let raster: Raster<f64> = Raster::filled(2, 2, 0.0);
        assert_eq!(raster.get(0, 0).unwrap(), Some(0.0));
        assert!(!raster.is_fully_masked());
    }

    #[test]
    fn test_update_mask_is_cumulative() {
        let mut raster: Raster<f64> = Raster::filled(1, 3, 1.0);
        raster.set_nodata_at(0, 0).unwrap();

        let keep = Array2::from_shape_vec((1, 3), vec![true, false, true]).unwrap();
        raster.update_mask(&keep).unwrap();

        assert_eq!(raster.get(0, 0).unwrap(), None);
        assert_eq!(raster.get(0, 1).unwrap(), None);
        assert_eq!(raster.get(0, 2).unwrap(), Some(1.0));
    }

    #[test]
    fn test_update_mask_shape_mismatch() {
        let mut raster: Raster<f64> = Raster::new(2, 2);
        let keep = Array2::from_elem((3, 2), true);
        assert!(matches!(
            raster.update_mask(&keep),
            Err(Error::SizeMismatch { .. })
        ));
    }

    #[test]
    fn test_filter_map_valid() {
        let raster = Raster::from_options(vec![Some(1.0), None, Some(0.0)], 1, 3).unwrap();
        let inv = raster.filter_map_valid(|v: f64| (v != 0.0).then(|| 1.0 / v));
        assert_eq!(inv.get(0, 0).unwrap(), Some(1.0));
        assert_eq!(inv.get(0, 1).unwrap(), None);
        assert_eq!(inv.get(0, 2).unwrap(), None);
    }

    #[test]
    fn test_raster_statistics() {
        let mut raster: Raster<f32> = Raster::new(10, 10);
        for i in 0..10 {
            for j in 0..10 {
                raster.set(i, j, (i * 10 + j) as f32).unwrap();
            }
        }
        raster.set_nodata_at(9, 9).unwrap();

        let stats = raster.statistics();
        assert_eq!(stats.min, Some(0.0));
        assert_eq!(stats.max, Some(98.0));
        assert_eq!(stats.valid_count, 99);
        assert_eq!(stats.nodata_count, 1);
    }

    #[test]
    fn test_statistics_all_masked() {
        let raster: Raster<f64> = Raster::nodata(3, 3);
        let stats = raster.statistics();
        assert_eq!(stats.mean, None);
        assert_eq!(stats.valid_count, 0);
    }
}

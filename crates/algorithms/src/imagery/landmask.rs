//! Static land/water mask
//!
//! Built once from a classification raster (the Hansen `datamask` layer in
//! the default setup) and then only read, so it can be shared between
//! periods behind an `Arc`.

use ndarray::{Array2, Zip};
use greenseries_core::raster::GeoTransform;
use greenseries_core::{GridSpec, Image, LandCoverSource, Raster, Result};
use tracing::debug;

use crate::config::LandMaskConfig;

/// Boolean land grid: `true` where the classification equals the land code
#[derive(Debug, Clone)]
pub struct LandWaterMask {
    land: Array2<bool>,
    transform: GeoTransform,
}

impl LandWaterMask {
    /// Classify `raster`: the land code is land, every other code and
    /// no-data is not.
    pub fn from_classification(raster: &Raster<f64>, land_value: f64) -> Self {
        let land = Zip::from(raster.data())
            .and(raster.mask())
            .map_collect(|&class, &valid| valid && class == land_value);

        Self {
            land,
            transform: *raster.transform(),
        }
    }

    /// Read the classification from `source` and classify it
    pub fn load<S>(source: &S, config: &LandMaskConfig) -> Result<Self>
    where
        S: LandCoverSource + ?Sized,
    {
        let raster = source.load()?;
        let mask = Self::from_classification(&raster, config.land_value);
        let (rows, cols) = mask.shape();
        debug!(
            "land mask '{}': {} land cells of {}x{}",
            config.band,
            mask.land_count(),
            rows,
            cols
        );
        Ok(mask)
    }

    pub fn shape(&self) -> (usize, usize) {
        self.land.dim()
    }

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    /// Number of land cells
    pub fn land_count(&self) -> usize {
        self.land.iter().filter(|&&l| l).count()
    }

    /// Land status at a map coordinate; outside the mask extent is not land
    pub fn is_land(&self, x: f64, y: f64) -> bool {
        let (rows, cols) = self.land.dim();
        self.transform
            .locate(x, y, rows, cols)
            .is_some_and(|cell| self.land[cell])
    }

    /// Land mask sampled at every cell center of `grid`
    pub fn mask_for(&self, grid: &GridSpec) -> Array2<bool> {
        Array2::from_shape_fn(grid.shape(), |(row, col)| {
            let (x, y) = grid.cell_center(row, col);
            self.is_land(x, y)
        })
    }

    /// Mask water and out-of-extent pixels in every band of `image`
    pub fn apply(&self, mut image: Image) -> Result<Image> {
        let Some(grid) = image.grid() else {
            return Ok(image);
        };
        let mask = self.mask_for(&grid);
        image.update_mask(&mask)?;
        Ok(image)
    }
}

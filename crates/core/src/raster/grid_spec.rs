//! Raster lattice descriptions

use crate::error::{Error, Result};
use crate::raster::GeoTransform;
use crate::vector::BoundingBox;
use serde::{Deserialize, Serialize};

/// Dimensions plus geotransform: everything needed to lay a raster out
/// without its cell values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    pub transform: GeoTransform,
    pub rows: usize,
    pub cols: usize,
}

impl GridSpec {
    pub fn new(transform: GeoTransform, rows: usize, cols: usize) -> Self {
        Self { transform, rows, cols }
    }

    /// North-up grid of square `resolution` cells whose upper-left corner is
    /// the upper-left corner of `bbox` and which covers all of it.
    pub fn covering(bbox: &BoundingBox, resolution: f64) -> Result<Self> {
        if !resolution.is_finite() || resolution <= 0.0 {
            return Err(Error::InvalidParameter {
                name: "resolution",
                value: resolution.to_string(),
                reason: "must be a positive, finite cell size".into(),
            });
        }

        // Tolerate float noise so a 1000 m extent at 100 m is 10 cells, not 11.
        let count = |extent: f64| ((extent / resolution) - 1e-9).ceil().max(1.0) as usize;

        Ok(Self {
            transform: GeoTransform::north_up(bbox.min_x, bbox.max_y, resolution),
            rows: count(bbox.height()),
            cols: count(bbox.width()),
        })
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Map coordinates of the cell center
    pub fn cell_center(&self, row: usize, col: usize) -> (f64, f64) {
        self.transform.pixel_to_geo(col, row)
    }

    /// Map extent of the lattice
    pub fn bounds(&self) -> BoundingBox {
        let (min_x, min_y, max_x, max_y) = self.transform.bounds(self.cols, self.rows);
        BoundingBox::new(min_x, min_y, max_x, max_y)
    }
}

//! Reduction of an index raster to one value over the region of interest

use greenseries_core::{Error, GridSpec, Raster, Result, Roi};

use crate::config::AggregationConfig;
use crate::statistics::Reducer;

/// Outcome of a regional reduction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionSummary {
    /// `None` when no valid pixel fell inside the region
    pub value: Option<f64>,
    /// Number of analysis cells that contributed
    pub valid_pixels: usize,
}

/// Region statistic at a fixed analysis resolution.
///
/// The index raster is sampled (nearest neighbour) at the centres of a grid
/// of `resolution` cells laid over the region bounds. Cells centred inside
/// the region with a valid sample are reduced.
#[derive(Debug, Clone)]
pub struct RegionAggregator {
    resolution: f64,
    reducer: Reducer,
}

impl RegionAggregator {
    pub fn new(resolution: f64, reducer: Reducer) -> Result<Self> {
        if !resolution.is_finite() || resolution <= 0.0 {
            return Err(Error::InvalidParameter {
                name: "resolution",
                value: resolution.to_string(),
                reason: "aggregation needs a positive, finite cell size".into(),
            });
        }
        Ok(Self { resolution, reducer })
    }

    pub fn from_config(config: &AggregationConfig) -> Result<Self> {
        Self::new(config.resolution, config.reducer)
    }

    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    pub fn reducer(&self) -> Reducer {
        self.reducer
    }

    pub fn aggregate(&self, index: &Raster<f64>, roi: &Roi) -> Result<RegionSummary> {
        let grid = GridSpec::covering(&roi.bounds(), self.resolution)?;

        let mut values = Vec::new();
        for row in 0..grid.rows {
            for col in 0..grid.cols {
                let (x, y) = grid.cell_center(row, col);
                if !roi.contains(x, y) {
                    continue;
                }
                if let Some(v) = index.sample(x, y) {
                    values.push(v);
                }
            }
        }

        Ok(RegionSummary {
            valid_pixels: values.len(),
            value: self.reducer.reduce(&mut values),
        })
    }
}

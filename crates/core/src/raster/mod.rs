//! Raster data structures and operations

mod element;
mod geotransform;
mod grid;
mod resample;
mod grid_spec;

pub use element::RasterElement;
pub use geotransform::GeoTransform;
pub use grid::{Raster, RasterStatistics};
pub use resample::{resample_nearest, resample_to_resolution};
pub use grid_spec::GridSpec;

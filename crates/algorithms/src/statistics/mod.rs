//! Statistical reductions of index rasters
//!
//! - **reducer**: mean, median, min and max over pixel values
//! - **region**: one value per region of interest at an analysis resolution

mod reducer;
mod region;

pub use reducer::Reducer;
pub use region::{RegionAggregator, RegionSummary};

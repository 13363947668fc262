//! Temporal compositing
//!
//! - Median reduction of co-registered raster stacks
//! - Monthly composites over a region of interest

mod compositor;
mod median;

pub use compositor::{Composite, PeriodCompositor};
pub use median::{median, median_stack};

//! Cell value types

use num_traits::{NumCast, Zero};
use std::fmt::Debug;

/// Numeric types a [`Raster`](crate::Raster) can hold.
///
/// Validity lives in the raster's mask, so an element carries no no-data
/// sentinel of its own; `zero()` is what sits under masked cells.
pub trait RasterElement:
    Copy + Debug + PartialOrd + NumCast + Zero + Send + Sync + 'static
{
    /// Lossless-where-possible conversion used by statistics and I/O
    fn to_f64(self) -> Option<f64> {
        NumCast::from(self)
    }
}

impl RasterElement for u8 {}
impl RasterElement for u16 {}
impl RasterElement for u32 {}
impl RasterElement for i16 {}
impl RasterElement for i32 {}
impl RasterElement for f32 {}
impl RasterElement for f64 {}

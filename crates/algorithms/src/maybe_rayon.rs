//! Rayon or sequential execution, chosen by the `parallel` feature.
//!
//! Call sites always write `.into_par_iter()`; without the feature that
//! resolves to `into_iter()` and the rest of the chain (`map`, `flat_map`,
//! `collect`) runs on the standard `Iterator` methods. Both paths collect
//! in input order.
#[cfg(feature = "parallel")]
pub use rayon::prelude::*;

#[cfg(not(feature = "parallel"))]
mod sequential {
    pub trait IntoParallelIterator {
        type Iter: Iterator<Item = Self::Item>;
        type Item;
        fn into_par_iter(self) -> Self::Iter;
    }

    impl<I: IntoIterator> IntoParallelIterator for I {
        type Iter = I::IntoIter;
        type Item = I::Item;
        fn into_par_iter(self) -> Self::Iter {
            self.into_iter()
        }
    }
}

#[cfg(not(feature = "parallel"))]
pub use sequential::*;

//! Rayon or sequential iteration behind one import.
//!
//! With the `parallel` feature this is `rayon::prelude`. Without it,
//! `into_par_iter()` falls back to `into_iter()`, so the rest of a chain
//! (`.enumerate()`, `.flat_map()`, `.collect()`) resolves to `Iterator`.
//! Used for per-row raster passes and for fanning out batch units.
#[cfg(feature = "parallel")]
pub use rayon::prelude::*;

#[cfg(not(feature = "parallel"))]
mod sequential {
    /// Sequential stand-in for `rayon::prelude::IntoParallelIterator`
    pub trait IntoParallelIterator {
        type Iter;
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

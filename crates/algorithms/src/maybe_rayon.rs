//! Rayon compatibility layer.
//!
//! With the `parallel` feature (default) this re-exports rayon's prelude.
//! Without it, a sequential stand-in provides the same `into_par_iter()`
//! entry point, so call sites compile unchanged and simply run on one
//! thread.

#[cfg(feature = "parallel")]
pub use rayon::prelude::*;

#[cfg(not(feature = "parallel"))]
mod sequential {
    /// Sequential stand-in for rayon's `IntoParallelIterator`.
    ///
    /// `into_par_iter()` resolves to plain `into_iter()`, after which the
    /// rest of the chain uses the standard `Iterator` methods.
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

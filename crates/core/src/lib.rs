//! # demflow Core
//!
//! Core types and I/O for the demflow terrain-analysis engine.
//!
//! This crate provides:
//! - `Grid`: dense f64 value grid with affine georeferencing and a NaN
//!   no-data sentinel
//! - `GeoTransform`: rotation-free affine transform (origin + signed cell sizes)
//! - `Path`, `Node`, `Edge`, `StreamNetwork`: vector-side data model
//! - I/O for ASCII grids, single-band GeoTIFF and GeoJSON line export

pub mod error;
pub mod io;
pub mod raster;
pub mod vector;

pub use error::{Error, Result};
pub use raster::{GeoTransform, Grid};
pub use vector::{Edge, Node, Path, StreamNetwork};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::raster::{GeoTransform, Grid};
    pub use crate::vector::{Edge, Node, Path, StreamNetwork};
    pub use crate::Algorithm;
}

/// Core trait for demflow algorithms.
///
/// Every analysis step is a pure transformation: it reads its input,
/// allocates a fresh output and never mutates shared state. The trait
/// gives tool registries and the CLI a uniform handle on the engines.
pub trait Algorithm {
    /// Input type for the algorithm
    type Input;
    /// Output type for the algorithm
    type Output;
    /// Parameters controlling algorithm behavior
    type Params: Default;
    /// Error type for algorithm execution
    type Error: std::error::Error;

    /// Returns the algorithm name
    fn name(&self) -> &'static str;

    /// Returns a description of what the algorithm does
    fn description(&self) -> &'static str;

    /// Execute the algorithm
    fn execute(
        &self,
        input: Self::Input,
        params: Self::Params,
    ) -> std::result::Result<Self::Output, Self::Error>;

    /// Execute with default parameters
    fn execute_default(&self, input: Self::Input) -> std::result::Result<Self::Output, Self::Error> {
        self.execute(input, Self::Params::default())
    }
}

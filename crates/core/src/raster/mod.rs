//! Raster data structures and coordinate semantics

mod geotransform;
mod grid;

pub use geotransform::GeoTransform;
pub use grid::{Grid, GridStatistics};

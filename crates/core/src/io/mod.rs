//! I/O for grids, paths and drainage networks

pub mod ascii;
pub mod geojson;
pub mod geotiff;

pub use ascii::{read_ascii_grid, read_ascii_grid_from, write_ascii_grid};
pub use geojson::{write_network_geojson, write_path_geojson};
pub use geotiff::{read_geotiff, write_geotiff};

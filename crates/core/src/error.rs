//! Error types for demflow

use thiserror::Error;

/// Main error type for demflow operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid grid dimensions: {rows}x{cols}")]
    InvalidDimensions { rows: usize, cols: usize },

    #[error("index out of bounds: ({row}, {col}) in grid of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("coordinate ({x}, {y}) is outside the grid extent")]
    OutOfExtent { x: f64, y: f64 },

    #[error("grid has no cells")]
    EmptyGrid,

    #[error("grid has no valid cells")]
    NoValidCells,

    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("{0}")]
    Other(String),
}

/// Result type alias for demflow operations
pub type Result<T> = std::result::Result<T, Error>;

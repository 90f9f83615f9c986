//! Error types for thalweg

use thiserror::Error;

/// Main error type for thalweg operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Index out of bounds: ({row}, {col}) in raster of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Raster size mismatch: expected ({er}, {ec}), got ({ar}, {ac})")]
    SizeMismatch { er: usize, ec: usize, ar: usize, ac: usize },

    #[error("Invalid flow-direction code {code} at masked cell ({row}, {col})")]
    InvalidDirectionCode { row: usize, col: usize, code: u8 },

    #[error("Watershed mask has no outlet: no masked cell drains off the mask")]
    NoOutlet,

    #[error("Flow network did not drain after {iterations} passes: direction cycle suspected")]
    CycleDetected { iterations: usize },

    #[error("{0}")]
    Other(String),
}

/// Result type alias for thalweg operations
pub type Result<T> = std::result::Result<T, Error>;

//! Error types for pixscatter-filter

use thiserror::Error;

/// Errors that can occur during filtering operations
#[derive(Debug, Error)]
pub enum FilterError {
    /// Core library error
    #[error("core error: {0}")]
    Core(#[from] pixscatter_core::Error),

    /// Invalid kernel
    #[error("invalid kernel: {0}")]
    InvalidKernel(String),

    /// Unknown catalog kernel name
    #[error("unknown kernel '{0}'")]
    UnknownKernel(String),

    /// Source and destination planes differ in size
    #[error("plane size mismatch: source {}x{}, destination {}x{}", .src.0, .src.1, .dst.0, .dst.1)]
    SizeMismatch { src: (u32, u32), dst: (u32, u32) },
}

/// Result type for filter operations
pub type FilterResult<T> = Result<T, FilterError>;

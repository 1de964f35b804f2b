//! I/O error types
//!
//! Provides a unified error type for raster load/save. Decoder failures,
//! filesystem failures and core-library errors all map into `IoError` so
//! callers only need to handle one error type.

use std::path::PathBuf;

use thiserror::Error;

/// Error type for raster I/O operations.
#[derive(Error, Debug)]
pub enum IoError {
    /// Standard I/O error (file not found, permission denied, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Opening or creating a file failed
    #[error("cannot access '{}': {source}", .path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The bitmap variant is not supported
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The bitmap data is structurally invalid
    #[error("invalid image data: {0}")]
    InvalidData(String),

    /// An error from the core library (e.g. dimension checks)
    #[error("core error: {0}")]
    Core(#[from] pixscatter_core::Error),
}

/// Convenience alias for I/O results.
pub type IoResult<T> = Result<T, IoError>;

//! Error types for the distributed pipeline

use thiserror::Error;

/// Errors raised by a distributed run
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Core library error
    #[error("core error: {0}")]
    Core(#[from] pixscatter_core::Error),

    /// Raster load/save error
    #[error("I/O error: {0}")]
    Io(#[from] pixscatter_io::IoError),

    /// Convolution error
    #[error("filter error: {0}")]
    Filter(#[from] pixscatter_filter::FilterError),

    /// Transport error
    #[error("communication error: {0}")]
    Comm(#[from] pixscatter_comm::CommError),

    /// A launch environment variable holds an unusable value
    #[error("invalid launch setting {name}={value}: {reason}")]
    Launch {
        name: &'static str,
        value: String,
        reason: String,
    },

    /// The root announced that the run is cancelled
    #[error("run aborted by rank 0")]
    Aborted,
}

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

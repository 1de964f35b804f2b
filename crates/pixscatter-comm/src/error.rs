//! Error types for pixscatter-comm
//!
//! Every transport failure is fatal to the run. The variants say which
//! peer or which collective failed so the log names the culprit, but no
//! caller is expected to retry.

use thiserror::Error;

/// Errors raised by partitioning and by the transports
#[derive(Debug, Error)]
pub enum CommError {
    /// Core library error
    #[error("core error: {0}")]
    Core(#[from] pixscatter_core::Error),

    /// Thread spawn failure in the in-process world
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The requested row split is degenerate
    #[error("invalid partition: {0}")]
    InvalidPartition(String),

    /// Rank outside `0..size`
    #[error("rank {rank} out of range for world of size {size}")]
    InvalidRank { rank: usize, size: usize },

    /// The peer went away before the transfer completed
    #[error("rank {peer} disconnected")]
    Disconnected { peer: usize },

    /// Messages arrived out of collective order
    #[error("expected {expected:?} from rank {peer}, got {actual:?}")]
    UnexpectedTag {
        peer: usize,
        expected: crate::Tag,
        actual: crate::Tag,
    },

    /// A slice had the wrong number of elements
    #[error("length mismatch: expected {expected} elements, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// Bytes on the wire could not be decoded
    #[error("malformed message: {0}")]
    Malformed(String),

    /// Data only the root can supply was missing
    #[error("rank {rank} is the root but supplied no {what}")]
    MissingRootData { rank: usize, what: &'static str },

    /// A rank's thread panicked
    #[error("rank {rank} panicked")]
    RankPanicked { rank: usize },

    /// The MPI transport cannot be used
    #[error("MPI unavailable: {0}")]
    MpiUnavailable(&'static str),
}

/// Result type for communication operations
pub type CommResult<T> = Result<T, CommError>;

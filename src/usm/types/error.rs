//! Custom error types for the usm-demux crate.

use thiserror::Error;

use super::models::{Boundary, FourCc, StreamKey};

/// The primary error type for all operations in this crate.
#[derive(Debug, Error)]
pub enum UsmError {
    /// An error originating from I/O operations.
    #[error("I/O error: {0:?}")]
    Io(#[from] std::io::Error),

    /// The `CRID` start marker does not occur anywhere in the input.
    #[error("No USM container data found: start marker {marker} is absent")]
    MissingContainerMarker { marker: FourCc },

    /// Fewer bytes remain than the fixed-width block fields require.
    #[error("Truncated block header at offset {offset:#x}: need {needed} bytes, only {available} remain")]
    TruncatedBlock {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// The declared block size would run past the end of the input.
    #[error("Block {tag} at offset {offset:#x} declares {declared_size} bytes, exceeding buffer length {buffer_len}")]
    BlockExceedsBuffer {
        tag: FourCc,
        offset: usize,
        declared_size: u32,
        buffer_len: usize,
    },

    /// A block tag outside the recognized set was found and could not be skipped.
    #[error("Unrecognized block tag {tag} at offset {offset:#x}")]
    UnrecognizedTag { tag: FourCc, offset: usize },

    /// A reassembled stream lacks one of the markers delimiting its payload.
    #[error("Stream {key} has no {boundary} boundary marker")]
    MissingBoundaryMarker { key: StreamKey, boundary: Boundary },
}

impl UsmError {
    /// Returns `true` for errors that abort the whole demux run.
    ///
    /// Boundary failures only drop the affected stream.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, UsmError::MissingBoundaryMarker { .. })
    }
}

/// A convenience `Result` type alias using the crate's `UsmError` type.
pub type Result<T> = std::result::Result<T, UsmError>;

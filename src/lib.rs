//! # usm-demux
//!
//! A demultiplexer for USM movie containers.
//! Extracts MPEG-2 video (`.m2v`), alpha channel (`.alp`) and ADX audio
//! (`.adx`) elementary streams from a fully buffered container.
pub mod usm;

// Re-export the main types for convenience
pub use usm::{
    BlockDescriptor,
    BlockScanner,
    BlockTag,
    Boundary,
    DemuxOptions,
    DemuxReport,
    DroppedStream,
    ExtractedStream,
    FileSink,
    Result,
    ScanSummary,
    StreamCounts,
    StreamKey,
    StreamKind,
    StreamSink,
    UnknownTagPolicy,
    UsmDemuxer,
    UsmError,
    DEFAULT_RESYNC_LIMIT,
};

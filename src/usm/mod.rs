//! Core USM demultiplexer module.
//!
//! Processing runs in three stages over a fully buffered container:
//!
//! 1. [`scanner`]: walks the blocks from the first `CRID` marker
//! 2. [`accumulator`]: concatenates block payloads per stream
//! 3. [`finalizer`]: cuts each stream down to the bytes between its markers
//!
//! [`UsmDemuxer`] drives all three; [`sink`] writes the results.

pub mod accumulator;
pub mod demuxer;
pub mod finalizer;
pub mod format;
pub mod scanner;
pub mod sink;
pub mod types;
mod utils;

pub use demuxer::UsmDemuxer;
pub use scanner::BlockScanner;
pub use sink::{FileSink, StreamSink};
pub use types::error::{Result, UsmError};
pub use types::models::*;
pub use types::options::{DemuxOptions, UnknownTagPolicy, DEFAULT_RESYNC_LIMIT};

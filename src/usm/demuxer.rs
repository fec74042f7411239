use std::fs;
use std::path::Path;

use log::info;

use super::accumulator::StreamAccumulator;
use super::finalizer;
use super::scanner::BlockScanner;
use super::types::error::Result;
use super::types::models::{DemuxReport, ScanSummary};
use super::types::options::DemuxOptions;

/// Splits USM containers into their elementary streams.
///
/// The container is processed in one pass over an in-memory buffer:
/// blocks are scanned, their payloads accumulated per stream, and each
/// stream is then cut down to the bytes between its markers.
#[derive(Debug, Clone, Default)]
pub struct UsmDemuxer {
    options: DemuxOptions,
}

impl UsmDemuxer {
    pub fn new(options: DemuxOptions) -> Self {
        Self { options }
    }

    /// Reads a whole file and demultiplexes it.
    ///
    /// Output names are derived from `path` itself, so `movie.usm` yields
    /// `movie.usm.m2v`, `movie.usm.adx` and so on.
    ///
    /// # Errors
    /// Returns an error if:
    /// - The file cannot be read
    /// - No `CRID` marker is present
    /// - A block is truncated, oversized, or carries an unknown tag that
    ///   cannot be skipped
    pub fn demux_file(&self, path: impl AsRef<Path>) -> Result<DemuxReport> {
        let path = path.as_ref();
        info!("Opening USM file: {}", path.display());
        let data = fs::read(path)?;
        self.demux(&data, path)
    }

    /// Demultiplexes an in-memory container.
    ///
    /// `base_name` is the prefix of every output file name. Fatal errors are
    /// returned before any stream is finalized; streams missing their
    /// markers end up in [`DemuxReport::dropped`].
    pub fn demux(&self, data: &[u8], base_name: impl AsRef<Path>) -> Result<DemuxReport> {
        let mut scanner = BlockScanner::new(data, &self.options)?;
        let mut accumulator = StreamAccumulator::new();
        let mut summary = ScanSummary {
            start_offset: scanner.start_offset(),
            ..Default::default()
        };

        for block in scanner.by_ref() {
            let block = block?;
            *summary.blocks_by_tag.entry(block.tag).or_insert(0) += 1;
            summary.payload_bytes += accumulator.push(data, &block);
        }
        summary.skipped_bytes = scanner.skipped_bytes();

        let counts = accumulator.counts();
        info!(
            "Scanned {} blocks: {} streams ({} video, {} audio, {} alpha), {} payload bytes",
            summary.total_blocks(),
            counts.total(),
            counts.video,
            counts.audio,
            counts.alpha,
            summary.payload_bytes
        );

        let (streams, dropped) =
            finalizer::finalize(accumulator.into_streams(), &counts, base_name.as_ref());

        Ok(DemuxReport {
            streams,
            dropped,
            counts,
            summary,
        })
    }
}

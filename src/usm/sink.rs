//! Destinations for extracted elementary streams.

use std::fs;
use std::path::{Path, PathBuf};

use super::types::error::Result;
use super::types::models::{DemuxReport, ExtractedStream};

/// Receives finalized streams.
pub trait StreamSink {
    /// Stores one stream and returns where it went.
    fn write_stream(&mut self, stream: &ExtractedStream) -> Result<PathBuf>;
}

/// Writes each stream to its derived file name.
///
/// With an output directory set, only the file name component is kept and
/// the file is placed in that directory instead of next to the input.
#[derive(Debug, Clone, Default)]
pub struct FileSink {
    output_dir: Option<PathBuf>,
}

impl FileSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: Some(dir.into()),
        }
    }

    /// Final location of a stream named `file_name`.
    pub fn destination(&self, file_name: &Path) -> PathBuf {
        match (&self.output_dir, file_name.file_name()) {
            (Some(dir), Some(name)) => dir.join(name),
            _ => file_name.to_path_buf(),
        }
    }
}

impl StreamSink for FileSink {
    fn write_stream(&mut self, stream: &ExtractedStream) -> Result<PathBuf> {
        let path = self.destination(&stream.file_name);
        if let Some(dir) = &self.output_dir {
            fs::create_dir_all(dir)?;
        }
        fs::write(&path, &stream.payload)?;
        Ok(path)
    }
}

impl DemuxReport {
    /// Hands every extracted stream to `sink`, in report order.
    ///
    /// Returns the destinations written.
    pub fn write_all(&self, sink: &mut impl StreamSink) -> Result<Vec<PathBuf>> {
        let mut written = Vec::with_capacity(self.streams.len());
        for stream in &self.streams {
            written.push(sink.write_stream(stream)?);
        }
        Ok(written)
    }
}

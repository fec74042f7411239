//! Per-stream reassembly of block payloads.

use std::collections::HashMap;

use log::debug;

use super::types::models::{BlockDescriptor, StreamCounts, StreamKey};

/// Append-only buffers keyed by stream, in first-seen order.
#[derive(Debug, Default)]
pub struct StreamAccumulator {
    streams: Vec<(StreamKey, Vec<u8>)>,
    index: HashMap<StreamKey, usize>,
    counts: StreamCounts,
}

impl StreamAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes the payload of `block` (a range into `data`) to its stream.
    ///
    /// Stream-bearing blocks register their key even when they carry no
    /// payload. Returns the number of bytes appended.
    pub fn push(&mut self, data: &[u8], block: &BlockDescriptor) -> usize {
        let Some(key) = block.stream_key() else {
            return 0;
        };
        let buffer = self.buffer_mut(key);
        buffer.extend_from_slice(&data[block.payload.clone()]);
        block.payload_len()
    }

    fn buffer_mut(&mut self, key: StreamKey) -> &mut Vec<u8> {
        let idx = match self.index.get(&key) {
            Some(&idx) => idx,
            None => {
                debug!("New stream {}", key);
                self.counts.increment(key.kind());
                self.streams.push((key, Vec::new()));
                self.index.insert(key, self.streams.len() - 1);
                self.streams.len() - 1
            }
        };
        &mut self.streams[idx].1
    }

    pub fn counts(&self) -> StreamCounts {
        self.counts
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    pub fn get(&self, key: StreamKey) -> Option<&[u8]> {
        self.index.get(&key).map(|&idx| self.streams[idx].1.as_slice())
    }

    /// Hands over the buffers, in the order their streams were first seen.
    pub fn into_streams(self) -> Vec<(StreamKey, Vec<u8>)> {
        self.streams
    }
}

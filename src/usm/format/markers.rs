//! Marker sequences delimiting the payload inside a reassembled stream.
//!
//! Each marker is an ASCII label padded with spaces to 16 bytes, then
//! fifteen `=` and a NUL, 32 bytes in total.

use crate::usm::types::models::Boundary;
use crate::usm::utils::find_subslice;
use std::ops::Range;

pub const MARKER_LEN: usize = 32;

pub const HEADER_END: &[u8; MARKER_LEN] = b"#HEADER END     ===============\0";
pub const METADATA_END: &[u8; MARKER_LEN] = b"#METADATA END   ===============\0";
pub const CONTENTS_END: &[u8; MARKER_LEN] = b"#CONTENTS END   ===============\0";

/// Byte positions of the markers found in a stream buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MarkerOffsets {
    pub header_end: Option<usize>,
    pub metadata_end: Option<usize>,
    pub contents_end: Option<usize>,
}

impl MarkerOffsets {
    /// Searches `buffer` for the first occurrence of each marker.
    pub fn find(buffer: &[u8]) -> Self {
        Self {
            header_end: find_subslice(buffer, HEADER_END),
            metadata_end: find_subslice(buffer, METADATA_END),
            contents_end: find_subslice(buffer, CONTENTS_END),
        }
    }

    /// The payload window: just past the later of the header/metadata
    /// markers, up to the contents marker.
    pub fn payload_window(&self) -> Result<Range<usize>, Boundary> {
        let start = self
            .header_end
            .max(self.metadata_end)
            .ok_or(Boundary::Header)?
            + MARKER_LEN;
        match self.contents_end {
            Some(end) if end >= start => Ok(start..end),
            _ => Err(Boundary::Contents),
        }
    }
}

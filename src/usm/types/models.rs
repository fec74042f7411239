//! Core data structures for USM container components.
//!
//! This module defines the fundamental types used throughout the library:
//! - Block tags and the descriptors produced by the scanner
//! - Stream identities (kind + channel) and per-kind counts
//! - The extracted streams and summary returned to callers

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;
use std::path::PathBuf;

use super::error::UsmError;

/// Four raw tag bytes, displayed as escaped ASCII.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FourCc(pub [u8; 4]);

impl fmt::Display for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.0.escape_ascii())
    }
}

/// Block tags recognized by the scanner.
///
/// Only `Video`, `Audio` and `Alpha` carry stream payload; the rest are
/// container metadata and are skipped whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BlockTag {
    /// `CRID`, the container start / stream directory block.
    Crid,
    /// `@ALP`
    Alpha,
    /// `@SFV`
    Video,
    /// `@SFA`
    Audio,
    /// `@SBT`, subtitles.
    Subtitle,
    /// `@CUE`
    Cue,
}

impl BlockTag {
    pub const ALL: [BlockTag; 6] = [
        BlockTag::Crid,
        BlockTag::Alpha,
        BlockTag::Video,
        BlockTag::Audio,
        BlockTag::Subtitle,
        BlockTag::Cue,
    ];

    /// The four bytes identifying this tag in the container.
    pub const fn magic(self) -> [u8; 4] {
        match self {
            BlockTag::Crid => *b"CRID",
            BlockTag::Alpha => *b"@ALP",
            BlockTag::Video => *b"@SFV",
            BlockTag::Audio => *b"@SFA",
            BlockTag::Subtitle => *b"@SBT",
            BlockTag::Cue => *b"@CUE",
        }
    }

    pub fn from_magic(bytes: [u8; 4]) -> Option<Self> {
        Self::ALL.into_iter().find(|tag| tag.magic() == bytes)
    }

    /// The stream kind carried by this tag, if it is stream-bearing.
    pub fn stream_kind(self) -> Option<StreamKind> {
        match self {
            BlockTag::Video => Some(StreamKind::Video),
            BlockTag::Audio => Some(StreamKind::Audio),
            BlockTag::Alpha => Some(StreamKind::Alpha),
            BlockTag::Crid | BlockTag::Subtitle | BlockTag::Cue => None,
        }
    }
}

impl fmt::Display for BlockTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.magic().escape_ascii())
    }
}

/// Kind of elementary stream carried by a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StreamKind {
    Video,
    Audio,
    Alpha,
}

impl StreamKind {
    pub fn tag(self) -> BlockTag {
        match self {
            StreamKind::Video => BlockTag::Video,
            StreamKind::Audio => BlockTag::Audio,
            StreamKind::Alpha => BlockTag::Alpha,
        }
    }

    /// File extension of the extracted elementary stream.
    ///
    /// - Video: MPEG-2 elementary stream (`m2v`)
    /// - Audio: ADX (`adx`)
    /// - Alpha: raw alpha channel (`alp`)
    pub fn extension(self) -> &'static str {
        match self {
            StreamKind::Video => "m2v",
            StreamKind::Audio => "adx",
            StreamKind::Alpha => "alp",
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamKind::Video => write!(f, "video"),
            StreamKind::Audio => write!(f, "audio"),
            StreamKind::Alpha => write!(f, "alpha"),
        }
    }
}

/// Identity of one logical output stream.
///
/// The payload is the channel byte; only audio blocks carry a non-zero one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StreamKey {
    Video(u8),
    Audio(u8),
    Alpha(u8),
}

impl StreamKey {
    pub fn new(kind: StreamKind, channel: u8) -> Self {
        match kind {
            StreamKind::Video => StreamKey::Video(channel),
            StreamKind::Audio => StreamKey::Audio(channel),
            StreamKind::Alpha => StreamKey::Alpha(channel),
        }
    }

    pub fn kind(self) -> StreamKind {
        match self {
            StreamKey::Video(_) => StreamKind::Video,
            StreamKey::Audio(_) => StreamKind::Audio,
            StreamKey::Alpha(_) => StreamKind::Alpha,
        }
    }

    pub fn channel(self) -> u8 {
        match self {
            StreamKey::Video(c) | StreamKey::Audio(c) | StreamKey::Alpha(c) => c,
        }
    }

    /// The tag bytes of this stream's kind read as a little-endian `u32`.
    pub fn tag_id(self) -> u32 {
        u32::from_le_bytes(self.kind().tag().magic())
    }

    /// Numeric id used in multi-stream output names.
    ///
    /// [`tag_id`](Self::tag_id) OR'd with the channel. This reproduces the
    /// names earlier USM tools gave to the same streams. Channels that differ
    /// only in bits already set in the tag share an id.
    pub fn numeric_id(self) -> u32 {
        self.tag_id() | u32::from(self.channel())
    }
}

impl fmt::Display for StreamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} #{}", self.kind(), self.channel())
    }
}

/// Which payload delimiter a stream was missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    /// Neither `#HEADER END` nor `#METADATA END` was found.
    Header,
    /// `#CONTENTS END` was absent, or only occurs before the payload start.
    Contents,
}

impl fmt::Display for Boundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Boundary::Header => write!(f, "header/metadata end"),
            Boundary::Contents => write!(f, "contents end"),
        }
    }
}

/// A block decoded at a given offset.
///
/// Computed per scan step and not retained by the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockDescriptor {
    /// Absolute offset of the tag.
    pub offset: usize,
    pub tag: BlockTag,
    /// Length of the block body following the size field.
    pub declared_size: u32,
    pub header_padding: u16,
    pub footer_padding: u16,
    /// Channel byte; zero for anything but audio.
    pub stream_sub_id: u8,
    /// Absolute range of the trimmed payload. Empty when the block carries none.
    pub payload: Range<usize>,
}

impl BlockDescriptor {
    /// Size of the tag and size fields preceding the block body.
    pub const PREAMBLE_LEN: usize = 8;

    pub fn stream_key(&self) -> Option<StreamKey> {
        self.tag
            .stream_kind()
            .map(|kind| StreamKey::new(kind, self.stream_sub_id))
    }

    /// Offset of the block following this one.
    pub fn next_offset(&self) -> usize {
        self.offset + Self::PREAMBLE_LEN + self.declared_size as usize
    }

    pub fn payload_len(&self) -> usize {
        self.payload.len()
    }
}

/// Number of distinct stream keys observed per kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamCounts {
    pub video: usize,
    pub audio: usize,
    pub alpha: usize,
}

impl StreamCounts {
    pub fn for_kind(&self, kind: StreamKind) -> usize {
        match kind {
            StreamKind::Video => self.video,
            StreamKind::Audio => self.audio,
            StreamKind::Alpha => self.alpha,
        }
    }

    pub(crate) fn increment(&mut self, kind: StreamKind) {
        match kind {
            StreamKind::Video => self.video += 1,
            StreamKind::Audio => self.audio += 1,
            StreamKind::Alpha => self.alpha += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.video + self.audio + self.alpha
    }
}

/// Statistics gathered while scanning a container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// Offset of the first `CRID` marker.
    pub start_offset: usize,
    pub blocks_by_tag: BTreeMap<BlockTag, usize>,
    /// Payload bytes appended to stream buffers.
    pub payload_bytes: usize,
    /// Bytes stepped over while resynchronizing after unknown tags.
    pub skipped_bytes: usize,
}

impl ScanSummary {
    pub fn total_blocks(&self) -> usize {
        self.blocks_by_tag.values().sum()
    }

    pub fn blocks(&self, tag: BlockTag) -> usize {
        self.blocks_by_tag.get(&tag).copied().unwrap_or(0)
    }
}

/// A finalized elementary stream ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedStream {
    pub key: StreamKey,
    /// Destination derived from the base name, kind and stream counts.
    pub file_name: PathBuf,
    pub payload: Vec<u8>,
}

/// A stream that was reassembled but could not be sliced.
#[derive(Debug)]
pub struct DroppedStream {
    pub key: StreamKey,
    pub reason: UsmError,
}

/// Result of demultiplexing one container.
#[derive(Debug, Default)]
pub struct DemuxReport {
    pub streams: Vec<ExtractedStream>,
    pub dropped: Vec<DroppedStream>,
    pub counts: StreamCounts,
    pub summary: ScanSummary,
}

impl DemuxReport {
    pub fn stream(&self, key: StreamKey) -> Option<&ExtractedStream> {
        self.streams.iter().find(|s| s.key == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_round_trip_through_magic() {
        for tag in BlockTag::ALL {
            assert_eq!(BlockTag::from_magic(tag.magic()), Some(tag));
        }
        assert_eq!(BlockTag::from_magic(*b"@XYZ"), None);
    }

    #[test]
    fn only_stream_tags_have_a_kind() {
        assert_eq!(BlockTag::Video.stream_kind(), Some(StreamKind::Video));
        assert_eq!(BlockTag::Audio.stream_kind(), Some(StreamKind::Audio));
        assert_eq!(BlockTag::Alpha.stream_kind(), Some(StreamKind::Alpha));
        assert_eq!(BlockTag::Crid.stream_kind(), None);
        assert_eq!(BlockTag::Subtitle.stream_kind(), None);
        assert_eq!(BlockTag::Cue.stream_kind(), None);
    }

    #[test]
    fn numeric_id_combines_tag_and_channel() {
        // "@SFA" little-endian is 0x41465340
        assert_eq!(StreamKey::Audio(0).numeric_id(), 0x4146_5340);
        assert_eq!(StreamKey::Audio(1).numeric_id(), 0x4146_5341);
        assert_eq!(StreamKey::Video(0).numeric_id(), 0x5646_5340);
        assert_eq!(StreamKey::Alpha(0).numeric_id(), 0x504c_4140);
        assert_eq!(StreamKey::Audio(0x40).numeric_id(), StreamKey::Audio(0).numeric_id());
        assert_eq!(StreamKey::Audio(0x40).tag_id(), 0x4146_5340);
    }

    #[test]
    fn keys_of_different_kinds_never_collide() {
        assert_ne!(StreamKey::Audio(0), StreamKey::Video(0));
        assert_ne!(StreamKey::Audio(0), StreamKey::Audio(0x40));
    }

    #[test]
    fn four_cc_escapes_non_ascii() {
        assert_eq!(FourCc(*b"@SFV").to_string(), "\"@SFV\"");
        assert_eq!(FourCc([0, b'A', 0xff, b'B']).to_string(), "\"\\x00A\\xffB\"");
    }
}

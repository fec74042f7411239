//! Sequential block iteration over a buffered container.
//!
//! [`BlockScanner`] starts at the first `CRID` marker and yields one
//! [`BlockDescriptor`] per recognized block until the end of the buffer.
//! Unknown tags are handled according to the configured
//! [`UnknownTagPolicy`].
//!
//! # Example
//! ```
//! # use usm_demux::{BlockScanner, DemuxOptions};
//! let mut data = b"CRID".to_vec();
//! data.extend_from_slice(&0u32.to_be_bytes());
//! let blocks: Vec<_> = BlockScanner::new(&data, &DemuxOptions::default())
//!     .unwrap()
//!     .collect::<Result<_, _>>()
//!     .unwrap();
//! assert_eq!(blocks.len(), 1);
//! ```

use log::{debug, warn};

use super::format::block;
use super::types::error::{Result, UsmError};
use super::types::models::{BlockDescriptor, BlockTag, FourCc};
use super::types::options::{DemuxOptions, UnknownTagPolicy};
use super::utils;

/// Iterator over the blocks of a container.
///
/// Yields `Result<BlockDescriptor>`. After the first error the iterator is
/// exhausted.
pub struct BlockScanner<'a> {
    data: &'a [u8],
    offset: usize,
    start_offset: usize,
    policy: UnknownTagPolicy,
    skipped_bytes: usize,
    finished: bool,
}

impl<'a> BlockScanner<'a> {
    /// Positions a scanner at the first `CRID` marker in `data`.
    ///
    /// # Errors
    /// `MissingContainerMarker` if the marker does not occur.
    pub fn new(data: &'a [u8], options: &DemuxOptions) -> Result<Self> {
        let magic = BlockTag::Crid.magic();
        let start_offset = utils::find_subslice(data, &magic).ok_or(
            UsmError::MissingContainerMarker {
                marker: FourCc(magic),
            },
        )?;
        debug!("Container starts at offset {:#x}", start_offset);

        Ok(Self {
            data,
            offset: start_offset,
            start_offset,
            policy: options.tag_policy,
            skipped_bytes: 0,
            finished: false,
        })
    }

    /// Offset of the first `CRID` marker.
    pub fn start_offset(&self) -> usize {
        self.start_offset
    }

    /// Bytes stepped over so far while resynchronizing.
    pub fn skipped_bytes(&self) -> usize {
        self.skipped_bytes
    }

    fn step(&mut self) -> Result<Option<BlockDescriptor>> {
        loop {
            if self.offset >= self.data.len() {
                return Ok(None);
            }

            let magic = utils::read_tag(self.data, self.offset)?;
            if let Some(tag) = BlockTag::from_magic(magic) {
                let descriptor = block::decode(self.data, self.offset, tag)?;
                self.offset = descriptor.next_offset();
                return Ok(Some(descriptor));
            }

            let max_skip = match self.policy {
                UnknownTagPolicy::Strict => {
                    return Err(UsmError::UnrecognizedTag {
                        tag: FourCc(magic),
                        offset: self.offset,
                    })
                }
                UnknownTagPolicy::Resync { max_skip } => max_skip,
            };

            match self.resync(max_skip) {
                Some(next) => {
                    warn!(
                        "Unrecognized tag {} at {:#x}, resynchronized at {:#x}",
                        FourCc(magic),
                        self.offset,
                        next
                    );
                    self.skipped_bytes += next - self.offset;
                    self.offset = next;
                }
                None if self.offset.saturating_add(max_skip) >= self.last_tag_offset() => {
                    warn!(
                        "Unrecognized tag {} at {:#x}, ignoring {} trailing bytes",
                        FourCc(magic),
                        self.offset,
                        self.data.len() - self.offset
                    );
                    self.skipped_bytes += self.data.len() - self.offset;
                    self.offset = self.data.len();
                }
                None => {
                    return Err(UsmError::UnrecognizedTag {
                        tag: FourCc(magic),
                        offset: self.offset,
                    })
                }
            }
        }
    }

    /// Last offset at which a complete tag could still start.
    fn last_tag_offset(&self) -> usize {
        self.data.len().saturating_sub(4)
    }

    /// Finds the next recognized tag within `max_skip` bytes after the
    /// current offset.
    fn resync(&self, max_skip: usize) -> Option<usize> {
        let limit = self
            .offset
            .saturating_add(max_skip)
            .min(self.last_tag_offset());
        (self.offset + 1..=limit).find(|&pos| {
            let mut magic = [0u8; 4];
            magic.copy_from_slice(&self.data[pos..pos + 4]);
            BlockTag::from_magic(magic).is_some()
        })
    }
}

impl Iterator for BlockScanner<'_> {
    type Item = Result<BlockDescriptor>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.step() {
            Ok(Some(descriptor)) => Some(Ok(descriptor)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_block(tag: &[u8; 4], body: &[u8]) -> Vec<u8> {
        let mut out = tag.to_vec();
        out.extend_from_slice(&(body.len() as u32).to_be_bytes());
        out.extend_from_slice(body);
        out
    }

    fn scan(data: &[u8], options: &DemuxOptions) -> Result<Vec<BlockDescriptor>> {
        BlockScanner::new(data, options)?.collect()
    }

    #[test]
    fn starts_at_first_crid_and_walks_every_block() {
        let mut data = b"garbage".to_vec();
        data.extend(raw_block(b"CRID", &[0; 16]));
        data.extend(raw_block(b"@SFV", &[0, 0, 0, 0, 1, 2, 3, 4]));
        data.extend(raw_block(b"@CUE", &[9; 5]));

        let blocks = scan(&data, &DemuxOptions::default()).unwrap();
        let tags: Vec<_> = blocks.iter().map(|b| b.tag).collect();
        assert_eq!(tags, vec![BlockTag::Crid, BlockTag::Video, BlockTag::Cue]);
        assert_eq!(blocks[0].offset, 7);
        assert_eq!(blocks[1].payload, 39..47);
    }

    #[test]
    fn missing_crid_is_fatal() {
        let data = raw_block(b"@SFV", &[0; 8]);
        assert!(matches!(
            BlockScanner::new(&data, &DemuxOptions::default()),
            Err(UsmError::MissingContainerMarker { .. })
        ));
    }

    #[test]
    fn strict_policy_rejects_unknown_tags() {
        let mut data = raw_block(b"CRID", &[]);
        data.extend(raw_block(b"JUNK", &[0; 4]));
        let err = scan(&data, &DemuxOptions::new().strict()).unwrap_err();
        assert!(matches!(err, UsmError::UnrecognizedTag { offset: 8, .. }));
    }

    #[test]
    fn resync_skips_to_next_known_tag() {
        let mut data = raw_block(b"CRID", &[]);
        data.extend_from_slice(b"\x01\x02\x03");
        data.extend(raw_block(b"@SBT", &[7; 2]));

        let mut scanner = BlockScanner::new(&data, &DemuxOptions::default()).unwrap();
        let first = scanner.next().unwrap().unwrap();
        let second = scanner.next().unwrap().unwrap();
        assert_eq!(first.tag, BlockTag::Crid);
        assert_eq!(second.tag, BlockTag::Subtitle);
        assert_eq!(second.offset, 11);
        assert!(scanner.next().is_none());
        assert_eq!(scanner.skipped_bytes(), 3);
    }

    #[test]
    fn resync_gives_up_past_the_limit() {
        let mut data = raw_block(b"CRID", &[]);
        data.extend_from_slice(&[0xAA; 32]);
        data.extend(raw_block(b"@SBT", &[]));
        let err = scan(&data, &DemuxOptions::new().resync_limit(16)).unwrap_err();
        assert!(matches!(err, UsmError::UnrecognizedTag { offset: 8, .. }));

        let blocks = scan(&data, &DemuxOptions::new().resync_limit(32)).unwrap();
        assert_eq!(blocks.len(), 2);
    }

    #[test]
    fn trailing_garbage_ends_the_scan() {
        let mut data = raw_block(b"CRID", &[]);
        data.extend_from_slice(&[0xAA; 10]);
        let blocks = scan(&data, &DemuxOptions::default()).unwrap();
        assert_eq!(blocks.len(), 1);
    }

    #[test]
    fn short_trailing_bytes_are_truncated() {
        let mut data = raw_block(b"CRID", &[]);
        data.extend_from_slice(b"@S");
        let err = scan(&data, &DemuxOptions::default()).unwrap_err();
        assert!(matches!(err, UsmError::TruncatedBlock { offset: 8, needed: 4, available: 2 }));
    }

    #[test]
    fn scanner_is_fused_after_an_error() {
        let mut data = raw_block(b"CRID", &[]);
        data.extend_from_slice(b"@SFV\xff\xff\xff\xff");
        let mut scanner = BlockScanner::new(&data, &DemuxOptions::default()).unwrap();
        assert!(scanner.next().unwrap().is_ok());
        assert!(matches!(
            scanner.next(),
            Some(Err(UsmError::BlockExceedsBuffer { .. }))
        ));
        assert!(scanner.next().is_none());
    }
}

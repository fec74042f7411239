//! # Block Layout
//!
//! Every USM block starts with the same preamble:
//!
//! ```text
//! [4 bytes] tag ("CRID", "@SFV", "@SFA", "@ALP", "@SBT", "@CUE")
//! [4 bytes] body length (big-endian u32)
//! [N bytes] body
//! ```
//!
//! Stream-bearing blocks (`@SFV`, `@SFA`, `@ALP`) begin their body with:
//!
//! ```text
//! [2 bytes] header padding  (big-endian u16, at block offset +8)
//! [2 bytes] footer padding  (big-endian u16, at block offset +10)
//! [1 byte ] channel number  (at block offset +12, only read for audio)
//! ```
//!
//! The stream payload is the body minus `header padding` bytes at the front
//! and `footer padding` bytes at the back.

use log::trace;

use crate::usm::types::error::{Result, UsmError};
use crate::usm::types::models::{BlockDescriptor, BlockTag, FourCc, StreamKind};
use crate::usm::utils;

const SIZE_OFFSET: usize = 4;
const HEADER_PADDING_OFFSET: usize = 8;
const FOOTER_PADDING_OFFSET: usize = 10;
const CHANNEL_OFFSET: usize = 12;

/// Decodes the block at `offset`, whose tag has already been recognized.
///
/// # Errors
/// - `TruncatedBlock` if a fixed-width field lies past the end of `data`
/// - `BlockExceedsBuffer` if the declared body runs past the end of `data`
pub fn decode(data: &[u8], offset: usize, tag: BlockTag) -> Result<BlockDescriptor> {
    let declared_size = utils::read_u32_be(data, offset, offset + SIZE_OFFSET)?;
    let base = offset + BlockDescriptor::PREAMBLE_LEN;

    let block_end = base.checked_add(declared_size as usize);
    if block_end.map_or(true, |end| end > data.len()) {
        return Err(UsmError::BlockExceedsBuffer {
            tag: FourCc(tag.magic()),
            offset,
            declared_size,
            buffer_len: data.len(),
        });
    }

    let mut descriptor = BlockDescriptor {
        offset,
        tag,
        declared_size,
        header_padding: 0,
        footer_padding: 0,
        stream_sub_id: 0,
        payload: base..base,
    };

    let Some(kind) = tag.stream_kind() else {
        trace!("Skipping {} block at {:#x} ({} bytes)", tag, offset, declared_size);
        return Ok(descriptor);
    };

    descriptor.header_padding = utils::read_u16_be(data, offset, offset + HEADER_PADDING_OFFSET)?;
    descriptor.footer_padding = utils::read_u16_be(data, offset, offset + FOOTER_PADDING_OFFSET)?;
    if kind == StreamKind::Audio {
        descriptor.stream_sub_id = utils::read_u8(data, offset, offset + CHANNEL_OFFSET)?;
    }

    let padding = u32::from(descriptor.header_padding) + u32::from(descriptor.footer_padding);
    if padding < declared_size {
        let start = base + descriptor.header_padding as usize;
        let end = base + declared_size as usize - descriptor.footer_padding as usize;
        descriptor.payload = start..end;
    }

    trace!(
        "{} block at {:#x}: size={}, padding=({}, {}), channel={}, payload={} bytes",
        tag,
        offset,
        declared_size,
        descriptor.header_padding,
        descriptor.footer_padding,
        descriptor.stream_sub_id,
        descriptor.payload.len()
    );

    Ok(descriptor)
}

//! Low-level byte reading utilities

use byteorder::{BigEndian, ByteOrder};
use super::types::error::{Result, UsmError};

/// Borrow `len` bytes at `offset`, failing with `TruncatedBlock` if the
/// buffer ends first. `block_offset` is the start of the block being decoded.
pub fn field_at(data: &[u8], block_offset: usize, offset: usize, len: usize) -> Result<&[u8]> {
    match offset.checked_add(len) {
        Some(end) if end <= data.len() => Ok(&data[offset..end]),
        _ => Err(UsmError::TruncatedBlock {
            offset: block_offset,
            needed: offset.saturating_add(len) - block_offset,
            available: data.len().saturating_sub(block_offset),
        }),
    }
}

/// Read a 4-byte tag.
pub fn read_tag(data: &[u8], offset: usize) -> Result<[u8; 4]> {
    let bytes = field_at(data, offset, offset, 4)?;
    Ok([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// Read a big-endian u32. Used for block sizes.
pub fn read_u32_be(data: &[u8], block_offset: usize, offset: usize) -> Result<u32> {
    Ok(BigEndian::read_u32(field_at(data, block_offset, offset, 4)?))
}

/// Read a big-endian u16. Used for padding lengths.
pub fn read_u16_be(data: &[u8], block_offset: usize, offset: usize) -> Result<u16> {
    Ok(BigEndian::read_u16(field_at(data, block_offset, offset, 2)?))
}

pub fn read_u8(data: &[u8], block_offset: usize, offset: usize) -> Result<u8> {
    Ok(field_at(data, block_offset, offset, 1)?[0])
}

/// Position of the first occurrence of `needle` in `haystack`.
pub fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

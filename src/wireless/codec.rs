//! Field Codec
//!
//! Bounds-checked readers for the fixed-width fields and tagged parameters
//! found in radiotap and 802.11 headers.

use std::ops::Range;

use super::error::{AnalysisError, Result};
use super::ieee80211::MacAddr;

/// Read two bytes big-endian at `offset`.
pub fn read_u16_be(buffer: &[u8], offset: usize) -> Result<u16> {
    match offset.checked_add(2).and_then(|end| buffer.get(offset..end)) {
        Some(b) => Ok(u16::from_be_bytes([b[0], b[1]])),
        None => Err(AnalysisError::malformed(format!(
            "u16 at offset {} past end of {}-byte buffer",
            offset,
            buffer.len()
        ))),
    }
}

/// Read a 48-bit hardware address at `offset`, most significant byte first.
pub fn read_mac(buffer: &[u8], offset: usize) -> Result<MacAddr> {
    if offset.checked_add(6).map_or(true, |end| end > buffer.len()) {
        return Err(AnalysisError::malformed(format!(
            "address at offset {} past end of {}-byte buffer",
            offset,
            buffer.len()
        )));
    }

    let mut value = 0u64;
    for step in (0..6).step_by(2) {
        value = (value << 16) | read_u16_be(buffer, offset + step)? as u64;
    }
    Ok(MacAddr::new(value))
}

/// Render an address as `aa:bb:cc:dd:ee:ff`.
pub fn format_mac(address: u64) -> String {
    let b = address.to_be_bytes();
    format!(
        "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
        b[2], b[3], b[4], b[5], b[6], b[7]
    )
}

/// Walk `(type, length, value)` records starting at `start_offset` and return
/// the value range of the first record of type `tag_id`.
///
/// A record whose header or value would run past the end of `buffer` ends the
/// walk with [`AnalysisError::TagNotFound`].
pub fn find_tagged_parameter(buffer: &[u8], start_offset: usize, tag_id: u8) -> Result<Range<usize>> {
    let mut rest = buffer.get(start_offset..).unwrap_or_default();
    let mut pos = start_offset;

    while let [tag_type, tag_len, tail @ ..] = rest {
        let tag_len = *tag_len as usize;
        if tag_len > tail.len() {
            break;
        }

        let value = pos + 2..pos + 2 + tag_len;
        if *tag_type == tag_id {
            return Ok(value);
        }

        rest = &tail[tag_len..];
        pos = value.end;
    }

    Err(AnalysisError::TagNotFound { tag: tag_id })
}

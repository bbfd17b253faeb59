//! Radiotap Header Parser
//!
//! Reads the capture-metadata header that precedes every 802.11 frame in a
//! monitor-mode capture: its length, and the received signal strength.
//!
//! Reference: https://www.radiotap.org/

use super::error::{AnalysisError, Result};

/// Radiotap present flags
pub mod flags {
    pub const TSFT: u32 = 1 << 0;
    pub const FLAGS: u32 = 1 << 1;
    pub const RATE: u32 = 1 << 2;
    pub const CHANNEL: u32 = 1 << 3;
    pub const FHSS: u32 = 1 << 4;
    pub const DBM_ANTSIGNAL: u32 = 1 << 5;
    pub const EXT: u32 = 1 << 31;
}

/// Minimum radiotap header: version, pad, length, one present word
pub const MIN_HEADER_LEN: usize = 8;

/// Parsed radiotap header
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RadiotapHeader {
    /// Header version (always 0)
    pub version: u8,
    /// Total header length including fields
    pub length: u16,
    /// First present-flags word
    pub present_flags: u32,
}

impl RadiotapHeader {
    /// Offset of the 802.11 header within the captured frame
    pub fn len(&self) -> usize {
        self.length as usize
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }
}

/// Parse the fixed part of the radiotap header.
pub fn parse_radiotap(data: &[u8]) -> Result<RadiotapHeader> {
    if data.len() < MIN_HEADER_LEN {
        return Err(AnalysisError::malformed(format!(
            "{} bytes is too short for a radiotap header",
            data.len()
        )));
    }

    let version = data[0];
    if version != 0 {
        return Err(AnalysisError::malformed(format!(
            "unsupported radiotap version {}",
            version
        )));
    }

    let length = u16::from_le_bytes([data[2], data[3]]);
    let present_flags = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);

    if (length as usize) < MIN_HEADER_LEN || length as usize > data.len() {
        return Err(AnalysisError::malformed(format!(
            "radiotap length {} does not fit {}-byte frame",
            length,
            data.len()
        )));
    }

    Ok(RadiotapHeader {
        version,
        length,
        present_flags,
    })
}

/// Signal byte at a fixed offset inside the header.
///
/// Most capture drivers emit a fixed field layout, so the signal lands at the
/// same position in every frame. Absent when `offset` is outside the header.
pub fn signal_at(data: &[u8], header: &RadiotapHeader, offset: usize) -> Option<i8> {
    if offset < header.len() {
        data.get(offset).map(|&b| b as i8)
    } else {
        None
    }
}

/// Signal located by walking the present flags up to the dBm antenna
/// signal field.
pub fn signal_from_fields(data: &[u8], header: &RadiotapHeader) -> Option<i8> {
    let present = header.present_flags;
    if present & flags::DBM_ANTSIGNAL == 0 {
        return None;
    }

    let end = header.len().min(data.len());

    // Fields start after the last present word
    let mut pos = 4;
    loop {
        if pos + 4 > end {
            return None;
        }
        let word = u32::from_le_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]]);
        pos += 4;
        if word & flags::EXT == 0 {
            break;
        }
    }

    // (flag, size, alignment) of every field that precedes the signal
    const PRECEDING: [(u32, usize, usize); 5] = [
        (flags::TSFT, 8, 8),
        (flags::FLAGS, 1, 1),
        (flags::RATE, 1, 1),
        (flags::CHANNEL, 4, 2),
        (flags::FHSS, 2, 1),
    ];

    for (flag, size, align) in PRECEDING {
        if present & flag != 0 {
            pos = align_up(pos, align) + size;
        }
    }

    if pos < end {
        Some(data[pos] as i8)
    } else {
        None
    }
}

fn align_up(offset: usize, align: usize) -> usize {
    (offset + align - 1) & !(align - 1)
}

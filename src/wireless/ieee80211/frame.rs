//! 802.11 Frame Structure
//!
//! Frame control decoding and the hardware address type.

use serde::{Serialize, Serializer};

use crate::wireless::codec::format_mac;

/// Hardware address, 48 bits held in the low bits of a `u64`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct MacAddr(u64);

impl MacAddr {
    pub const BROADCAST: MacAddr = MacAddr(0xffff_ffff_ffff);

    pub const fn new(value: u64) -> Self {
        Self(value & 0xffff_ffff_ffff)
    }

    pub fn octets(&self) -> [u8; 6] {
        let b = self.0.to_be_bytes();
        [b[2], b[3], b[4], b[5], b[6], b[7]]
    }
}

impl std::fmt::Display for MacAddr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&format_mac(self.0))
    }
}

impl Serialize for MacAddr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Frame type (2 bits)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameType {
    Management = 0,
    Control = 1,
    Data = 2,
    Extension = 3,
}

impl From<u8> for FrameType {
    fn from(val: u8) -> Self {
        match val & 0x03 {
            0 => FrameType::Management,
            1 => FrameType::Control,
            2 => FrameType::Data,
            _ => FrameType::Extension,
        }
    }
}

pub const SUBTYPE_BEACON: u8 = 0x08;
pub const SUBTYPE_CTS: u8 = 0x0c;
pub const SUBTYPE_ACK: u8 = 0x0d;

/// First byte of the frame control field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameControl {
    /// Protocol version (should be 0)
    pub protocol_version: u8,
    /// Frame type
    pub frame_type: FrameType,
    /// Raw 4-bit subtype
    pub subtype: u8,
}

impl FrameControl {
    pub fn parse(fc0: u8) -> Self {
        Self {
            protocol_version: fc0 & 0x03,
            frame_type: FrameType::from((fc0 >> 2) & 0x03),
            subtype: (fc0 >> 4) & 0x0f,
        }
    }

    pub fn is_beacon(&self) -> bool {
        self.frame_type == FrameType::Management && self.subtype == SUBTYPE_BEACON
    }

    /// CTS and ACK carry only a receiver address.
    pub fn lacks_source(&self) -> bool {
        self.frame_type == FrameType::Control
            && matches!(self.subtype, SUBTYPE_CTS | SUBTYPE_ACK)
    }
}

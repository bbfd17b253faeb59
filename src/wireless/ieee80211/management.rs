//! 802.11 Management Frame Fields
//!
//! Beacon information elements: SSID and DS parameter set (channel).

use crate::wireless::codec::find_tagged_parameter;
use crate::wireless::error::{AnalysisError, Result};

/// Fixed beacon body before the tagged parameters: timestamp, interval, capability
pub const BEACON_FIXED_LEN: usize = 12;

/// Management MAC header without HT control
pub const MGMT_HEADER_LEN: usize = 24;

/// Information Element (IE) types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ElementId {
    Ssid = 0,
    DsParameter = 3,
}

/// SSID and channel advertised by a beacon
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeaconFields {
    /// Raw SSID bytes, up to 255, not necessarily UTF-8
    pub ssid: Vec<u8>,
    /// Current channel from the DS parameter set
    pub channel: u8,
}

impl BeaconFields {
    /// Extract SSID and channel from a beacon whose tagged parameters begin
    /// `tags_offset` bytes into `frame` (the 802.11 header onward).
    pub fn parse(frame: &[u8], tags_offset: usize) -> Result<Self> {
        let ssid = find_tagged_parameter(frame, tags_offset, ElementId::Ssid as u8)?;
        let ds = find_tagged_parameter(frame, tags_offset, ElementId::DsParameter as u8)?;

        // An empty DS parameter set carries no channel
        let channel = match frame.get(ds.start) {
            Some(&ch) if !ds.is_empty() => ch,
            _ => {
                return Err(AnalysisError::TagNotFound {
                    tag: ElementId::DsParameter as u8,
                })
            }
        };

        Ok(Self {
            ssid: frame[ssid].to_vec(),
            channel,
        })
    }
}

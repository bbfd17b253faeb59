//! Frame Decoder
//!
//! Turns one captured buffer (radiotap header + 802.11 frame) into a
//! [`DecodedFrame`].

use crate::config::AnalyzerConfig;

use super::codec::read_mac;
use super::error::{AnalysisError, Result};
use super::ieee80211::{BeaconFields, FrameControl, MacAddr};
use super::radiotap::{parse_radiotap, signal_at, signal_from_fields};

const DESTINATION_OFFSET: usize = 4;
const SOURCE_OFFSET: usize = 10;

/// How the classifier should treat a frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameKind {
    /// CTS/ACK: receiver only
    ControlNoSource,
    /// Beacon, with its SSID/channel or the tag that was missing
    Beacon(Result<BeaconFields>),
    /// Data and everything else
    Data,
}

/// One decoded frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    pub kind: FrameKind,
    pub destination: MacAddr,
    /// Absent for CTS/ACK
    pub source: Option<MacAddr>,
    /// Received signal in dBm
    pub rssi: Option<i8>,
    /// Original length on the wire, used for byte accounting
    pub length: u32,
}

/// Stateless frame decoder
#[derive(Debug, Clone)]
pub struct FrameDecoder {
    rssi_offset: Option<usize>,
    beacon_tags_offset: usize,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new(&AnalyzerConfig::default())
    }
}

impl FrameDecoder {
    pub fn new(config: &AnalyzerConfig) -> Self {
        Self {
            rssi_offset: config.rssi_offset,
            beacon_tags_offset: config.beacon_tags_offset,
        }
    }

    /// Decode one frame. `captured_len` is the frame's length on the wire.
    pub fn decode(&self, data: &[u8], captured_len: u32) -> Result<DecodedFrame> {
        let radiotap = parse_radiotap(data)?;

        let rssi = match self.rssi_offset {
            Some(offset) => signal_at(data, &radiotap, offset),
            None => signal_from_fields(data, &radiotap),
        };

        let mac = &data[radiotap.len()..];
        let Some(&fc0) = mac.first() else {
            return Err(AnalysisError::malformed("no 802.11 header after radiotap"));
        };
        let frame_control = FrameControl::parse(fc0);

        let destination = read_mac(mac, DESTINATION_OFFSET)?;

        let (kind, source) = if frame_control.lacks_source() {
            (FrameKind::ControlNoSource, None)
        } else {
            let source = read_mac(mac, SOURCE_OFFSET)?;
            if frame_control.is_beacon() {
                let fields = BeaconFields::parse(mac, self.beacon_tags_offset);
                (FrameKind::Beacon(fields), Some(source))
            } else {
                (FrameKind::Data, Some(source))
            }
        };

        Ok(DecodedFrame {
            kind,
            destination,
            source,
            rssi,
            length: captured_len,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// 25-byte radiotap header with the signal byte at offset 22
    pub(crate) fn radiotap(rssi: i8) -> Vec<u8> {
        let mut rt = vec![0u8; 25];
        rt[2] = 25;
        rt[22] = rssi as u8;
        rt
    }

    pub(crate) fn beacon(src: u64, rssi: i8, ssid: &[u8], channel: u8) -> Vec<u8> {
        let mut frame = radiotap(rssi);
        let mut mac = vec![0u8; 36];
        mac[0] = 0x80;
        mac[4..10].copy_from_slice(&MacAddr::BROADCAST.octets());
        mac[10..16].copy_from_slice(&MacAddr::new(src).octets());
        mac[16..22].copy_from_slice(&MacAddr::new(src).octets());
        mac.push(0);
        mac.push(ssid.len() as u8);
        mac.extend_from_slice(ssid);
        mac.extend_from_slice(&[1, 1, 0x82, 3, 1, channel]);
        frame.extend_from_slice(&mac);
        frame
    }

    pub(crate) fn data(src: u64, dst: u64) -> Vec<u8> {
        let mut frame = radiotap(-60);
        let mut mac = vec![0u8; 24];
        mac[0] = 0x08;
        mac[4..10].copy_from_slice(&MacAddr::new(dst).octets());
        mac[10..16].copy_from_slice(&MacAddr::new(src).octets());
        frame.extend_from_slice(&mac);
        frame.extend_from_slice(&[0xaa; 16]);
        frame
    }

    pub(crate) fn ack(dst: u64) -> Vec<u8> {
        let mut frame = radiotap(-60);
        let mut mac = vec![0u8; 10];
        mac[0] = 0xd4;
        mac[4..10].copy_from_slice(&MacAddr::new(dst).octets());
        frame.extend_from_slice(&mac);
        frame
    }

    #[test]
    fn test_decode_beacon() {
        let raw = beacon(0x0011_2233_4455, -48, b"Home", 11);
        let frame = FrameDecoder::default().decode(&raw, 120).unwrap();

        assert_eq!(frame.source, Some(MacAddr::new(0x0011_2233_4455)));
        assert_eq!(frame.destination, MacAddr::BROADCAST);
        assert_eq!(frame.rssi, Some(-48));
        assert_eq!(frame.length, 120);
        match frame.kind {
            FrameKind::Beacon(Ok(fields)) => {
                assert_eq!(fields.ssid, b"Home");
                assert_eq!(fields.channel, 11);
            }
            other => panic!("unexpected kind {:?}", other),
        }
    }

    #[test]
    fn test_decode_beacon_missing_tags() {
        let mut raw = beacon(1, -48, b"x", 6);
        // Drop the DS parameter set
        raw.truncate(raw.len() - 3);
        let frame = FrameDecoder::default().decode(&raw, 80).unwrap();
        assert_eq!(
            frame.kind,
            FrameKind::Beacon(Err(AnalysisError::TagNotFound { tag: 3 }))
        );
    }

    #[test]
    fn test_decode_data() {
        let raw = data(0xa, 0xb);
        let frame = FrameDecoder::default().decode(&raw, 1500).unwrap();
        assert_eq!(frame.kind, FrameKind::Data);
        assert_eq!(frame.source, Some(MacAddr::new(0xa)));
        assert_eq!(frame.destination, MacAddr::new(0xb));
        assert_eq!(frame.rssi, Some(-60));
    }

    #[test]
    fn test_decode_ack_has_no_source() {
        let raw = ack(0xb);
        let frame = FrameDecoder::default().decode(&raw, 14).unwrap();
        assert_eq!(frame.kind, FrameKind::ControlNoSource);
        assert_eq!(frame.source, None);
        assert_eq!(frame.destination, MacAddr::new(0xb));
    }

    #[test]
    fn test_decode_truncated_header() {
        let mut raw = data(0xa, 0xb);
        raw.truncate(25 + 12);
        assert!(matches!(
            FrameDecoder::default().decode(&raw, 37),
            Err(AnalysisError::MalformedFrame { .. })
        ));

        let raw = radiotap(-60);
        assert!(FrameDecoder::default().decode(&raw, 25).is_err());
    }

    #[test]
    fn test_decode_radiotap_overrun() {
        let mut raw = data(0xa, 0xb);
        raw[2] = 0xff;
        raw[3] = 0x01;
        assert!(matches!(
            FrameDecoder::default().decode(&raw, 100),
            Err(AnalysisError::MalformedFrame { .. })
        ));
    }

    #[test]
    fn test_decode_rssi_from_present_flags() {
        let config = AnalyzerConfig {
            rssi_offset: None,
            ..Default::default()
        };
        let mut raw = data(0xa, 0xb);
        // DBM_ANTSIGNAL only: signal is the first field byte
        raw[4] = 0x20;
        raw[8] = (-71i8) as u8;
        let frame = FrameDecoder::new(&config).decode(&raw, 100).unwrap();
        assert_eq!(frame.rssi, Some(-71));
    }
}

//! Capture File Reader
//!
//! Reads radiotap-encapsulated 802.11 frames from a pcap/pcapng file.
//! Uses pcap for file access.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::{debug, warn};

/// One frame as stored in the capture file
#[derive(Debug, Clone)]
pub struct RawFrame {
    /// Captured bytes, radiotap header included
    pub data: Vec<u8>,
    /// Length of the frame on the wire
    pub captured_len: u32,
    /// Capture timestamp since the epoch
    pub timestamp: Duration,
}

/// Capture errors
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("PCAP error: {0}")]
    Pcap(#[from] pcap::Error),
}

/// Offline capture over one file
pub struct CaptureFile {
    path: PathBuf,
    cap: pcap::Capture<pcap::Offline>,
    frames_read: u64,
}

impl CaptureFile {
    /// Open a capture file. A link type other than radiotap is reported but
    /// the file is still read.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let cap = pcap::Capture::from_file(&path)
            .with_context(|| format!("Failed to open capture file {}", path.display()))?;

        let linktype = cap.get_datalink();
        if linktype != pcap::Linktype::IEEE802_11_RADIOTAP {
            warn!(
                "{}: link type {} is not 802.11 radiotap, frames will likely be malformed",
                path.display(),
                linktype.get_name().unwrap_or_else(|_| linktype.0.to_string())
            );
        }

        Ok(Self {
            path,
            cap,
            frames_read: 0,
        })
    }

    /// Frames returned so far
    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }

    /// Next frame, or `None` at end of file
    pub fn next_frame(&mut self) -> std::result::Result<Option<RawFrame>, CaptureError> {
        match self.cap.next_packet() {
            Ok(packet) => {
                self.frames_read += 1;
                let ts = packet.header.ts;
                Ok(Some(RawFrame {
                    data: packet.data.to_vec(),
                    captured_len: packet.header.len,
                    timestamp: Duration::new(ts.tv_sec as u64, (ts.tv_usec as u32).saturating_mul(1000)),
                }))
            }
            Err(pcap::Error::NoMorePackets) => {
                debug!("{}: end of file after {} frames", self.path.display(), self.frames_read);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl Iterator for CaptureFile {
    type Item = std::result::Result<RawFrame, CaptureError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_frame().transpose()
    }
}

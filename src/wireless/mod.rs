//! 802.11 Air Quality Analysis
//!
//! This module turns captured radiotap/802.11 frames into a picture of the
//! wireless neighbourhood:
//! - Access points with SSID, channel and signal strength
//! - Users and the access point they talk to
//! - Per-entity rx/tx byte accounting
//! - Per-channel traffic and interference
//!
//! Frames are read from pcap files; live capture is not supported.

pub mod capture;
pub mod channel;
pub mod codec;
pub mod decoder;
pub mod error;
pub mod ieee80211;
pub mod radiotap;
pub mod registry;
pub mod session;

pub use capture::{CaptureError, CaptureFile, RawFrame};
pub use channel::{attenuation_coefficient, rank_by_signal, Channel, ChannelReport};
pub use codec::{find_tagged_parameter, format_mac};
pub use decoder::{DecodedFrame, FrameDecoder, FrameKind};
pub use error::AnalysisError;
pub use ieee80211::{BeaconFields, FrameControl, FrameType, MacAddr};
pub use radiotap::RadiotapHeader;
pub use registry::{Entity, EntityId, EntityRegistry, Role};
pub use session::{Analysis, Session, SessionStats};

//! Classifier
//!
//! A [`Session`] is one analysis run: it owns the entity registry and the
//! frame counter, decodes each captured frame, infers roles from who talks
//! to whom, and accumulates byte counters. Frames from several capture files
//! are fed into the same session one after another.

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::AnalyzerConfig;

use super::channel::ChannelReport;
use super::decoder::{DecodedFrame, FrameDecoder, FrameKind};
use super::error::Result;
use super::ieee80211::{BeaconFields, MacAddr};
use super::registry::{EntityId, EntityRegistry, Role};

/// Per-run counters, including every recovered failure
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    /// Buffers handed to the session
    pub frames_seen: u64,
    /// Frames that decoded (the frame counter)
    pub frames_decoded: u64,
    pub malformed_frames: u64,
    /// Beacons lacking SSID or channel tags
    pub missing_tags: u64,
    /// Addresses refused because the registry was full
    pub capacity_exceeded: u64,
    pub beacons: u64,
    pub data_frames: u64,
    pub control_frames: u64,
    /// Bytes credited to receivers of CTS/ACK frames
    pub control_bytes: u64,
    /// Capture files that ended with a read error
    pub partial_files: u64,
}

/// Result of a finished run
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    #[serde(serialize_with = "serialize_registry")]
    pub registry: EntityRegistry,
    pub channels: ChannelReport,
    pub stats: SessionStats,
}

fn serialize_registry<S: serde::Serializer>(
    registry: &EntityRegistry,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_seq(registry.iter().map(|(_, e)| e))
}

/// One analysis run
#[derive(Debug)]
pub struct Session {
    decoder: FrameDecoder,
    registry: EntityRegistry,
    frame_counter: u64,
    stats: SessionStats,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(&AnalyzerConfig::default())
    }
}

impl Session {
    pub fn new(config: &AnalyzerConfig) -> Self {
        Self {
            decoder: FrameDecoder::new(config),
            registry: EntityRegistry::new(config.capacity),
            frame_counter: 0,
            stats: SessionStats::default(),
        }
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Frames decoded so far
    pub fn frame_counter(&self) -> u64 {
        self.frame_counter
    }

    /// Feed a sequence of `(bytes, captured_length)` frames in capture order.
    /// Per-frame failures are counted and skipped.
    pub fn ingest<I, B>(&mut self, frames: I)
    where
        I: IntoIterator<Item = (B, u32)>,
        B: AsRef<[u8]>,
    {
        for (data, len) in frames {
            let _ = self.process_frame(data.as_ref(), len);
        }
    }

    /// Decode and classify one frame.
    ///
    /// The error, if any, has already been counted in [`SessionStats`]; a
    /// beacon with missing tags still counts as processed.
    pub fn process_frame(&mut self, data: &[u8], captured_len: u32) -> Result<()> {
        self.stats.frames_seen += 1;

        let frame = match self.decoder.decode(data, captured_len) {
            Ok(frame) => frame,
            Err(e) => {
                self.stats.malformed_frames += 1;
                debug!("Skipping frame {}: {}", self.stats.frames_seen, e);
                return Err(e);
            }
        };

        self.frame_counter += 1;
        self.stats.frames_decoded = self.frame_counter;
        self.classify(&frame)
    }

    /// Apply one decoded frame to the registry
    pub fn classify(&mut self, frame: &DecodedFrame) -> Result<()> {
        match (&frame.kind, frame.source) {
            (FrameKind::Beacon(fields), Some(source)) => {
                self.stats.beacons += 1;
                self.handle_beacon(source, fields, frame.rssi)
            }
            (FrameKind::Data, Some(source)) => {
                self.stats.data_frames += 1;
                self.handle_data(source, frame.destination, frame.length)
            }
            _ => {
                self.stats.control_frames += 1;
                self.handle_receiver_only(frame.destination, frame.length)
            }
        }
    }

    /// Record a capture file that ended early. Frames already ingested from
    /// it stay in the session.
    pub fn mark_partial_file(&mut self) {
        self.stats.partial_files += 1;
    }

    /// Turn the session into its final result
    pub fn finish(self) -> Analysis {
        let channels = ChannelReport::compute(&self.registry);
        Analysis {
            registry: self.registry,
            channels,
            stats: self.stats,
        }
    }

    fn register(&mut self, address: MacAddr) -> Result<EntityId> {
        self.registry.get_or_create(address).map_err(|e| {
            self.stats.capacity_exceeded += 1;
            if self.stats.capacity_exceeded == 1 {
                warn!(
                    "Entity registry full ({} entities), results may be incomplete",
                    self.registry.capacity()
                );
            } else {
                debug!("No room for {}, dropping its traffic", address);
            }
            e
        })
    }

    fn handle_receiver_only(&mut self, destination: MacAddr, length: u32) -> Result<()> {
        let dst = self.register(destination)?;
        self.registry.get_mut(dst).rx_bytes += length as u64;
        self.stats.control_bytes += length as u64;
        Ok(())
    }

    fn handle_beacon(
        &mut self,
        source: MacAddr,
        fields: &Result<BeaconFields>,
        rssi: Option<i8>,
    ) -> Result<()> {
        let ap = self.register(source)?;
        if self.registry.promote_to_access_point(ap, self.frame_counter) {
            debug!("{} is an access point (frame {})", source, self.frame_counter);
        }

        let entity = self.registry.get_mut(ap);
        entity.beacon_count += 1;

        match fields {
            Ok(fields) => {
                if entity.is_access_point() && entity.populate_from_beacon(fields, rssi) {
                    debug!(
                        "{} broadcasts {:?} on channel {}",
                        source,
                        entity.ssid_lossy(),
                        entity.channel
                    );
                }
                Ok(())
            }
            Err(e) => {
                self.stats.missing_tags += 1;
                debug!("Beacon from {} unusable: {}", source, e);
                Err(e.clone())
            }
        }
    }

    fn handle_data(&mut self, source: MacAddr, destination: MacAddr, length: u32) -> Result<()> {
        let src = self.register(source);
        let dst = self.register(destination);
        let (src, dst) = match (src, dst) {
            (Ok(src), Ok(dst)) => (src, dst),
            (Err(e), _) | (_, Err(e)) => return Err(e),
        };

        let src_role = self.registry.get(src).role;
        let dst_role = self.registry.get(dst).role;

        // Only an access point talking to an unknown peer says anything about
        // association; every other pairing leaves roles alone.
        match (src_role, dst_role) {
            (Role::AccessPoint, Role::Unknown) => {
                self.registry.promote_to_user(dst, source, self.frame_counter);
                debug!("{} is a user of {}", destination, source);
            }
            (Role::Unknown, Role::AccessPoint) => {
                self.registry.promote_to_user(src, destination, self.frame_counter);
                debug!("{} is a user of {}", source, destination);
            }
            _ => {}
        }

        self.registry.get_mut(src).tx_bytes += length as u64;
        self.registry.get_mut(dst).rx_bytes += length as u64;
        Ok(())
    }
}

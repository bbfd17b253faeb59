//! Channel Model
//!
//! Aggregates access point traffic per 2.4GHz channel. Besides raw traffic,
//! each channel gets a "usage" figure: traffic scaled down by how weak the
//! AP's signal is, plus a share of the usage of the three channels on either
//! side, since 2.4GHz channels overlap.

use serde::Serialize;
use tracing::debug;

use super::registry::{EntityId, EntityRegistry};

/// Channels 1-12
pub const CHANNEL_COUNT: u8 = 12;

/// Neighbouring channels on each side that receive bleed
pub const BLEED_DISTANCE: u8 = 3;

/// RSSI at or below which an AP contributes nothing
pub const RSSI_FLOOR_DBM: f64 = -110.0;

/// Span from the floor up to full contribution (-40 dBm)
pub const RSSI_SPAN_DB: f64 = 70.0;

/// One 2.4GHz channel
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Channel {
    pub number: u8,
    /// rx + tx bytes of access points on this channel
    pub traffic: u64,
    /// Signal-weighted traffic including bleed from neighbours
    pub usage: u64,
    /// Access points on this channel, registration order
    pub access_points: Vec<EntityId>,
}

/// All twelve channels of one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelReport {
    pub channels: Vec<Channel>,
    /// Largest usage of any channel, at least 1
    pub max_usage: u64,
}

impl Default for ChannelReport {
    fn default() -> Self {
        Self {
            channels: (1..=CHANNEL_COUNT)
                .map(|number| Channel {
                    number,
                    ..Default::default()
                })
                .collect(),
            max_usage: 1,
        }
    }
}

/// Weight of an AP's traffic given its signal; 1.0 when the signal is unknown
pub fn attenuation_coefficient(rssi: Option<i8>) -> f64 {
    match rssi {
        Some(rssi) => ((rssi as f64 - RSSI_FLOOR_DBM) / RSSI_SPAN_DB).clamp(0.0, 1.0),
        None => 1.0,
    }
}

impl ChannelReport {
    /// Build the channel view from a finished registry
    pub fn compute(registry: &EntityRegistry) -> Self {
        let mut report = Self::default();

        for (id, ap) in registry.access_points() {
            if !(1..=CHANNEL_COUNT).contains(&ap.channel) {
                debug!("{} on channel {} is outside the 2.4GHz plan", ap.address, ap.channel);
                continue;
            }

            let total = ap.total_bytes();
            let attenuated = (total as f64 * attenuation_coefficient(ap.signal_strength)) as u64;

            let own = report.slot_mut(ap.channel);
            own.traffic += total;
            own.usage += attenuated;
            own.access_points.push(id);

            report.bleed(ap.channel, attenuated);
        }

        report.max_usage = report
            .channels
            .iter()
            .map(|c| c.usage)
            .max()
            .unwrap_or(0)
            .max(1);

        report
    }

    /// Spread `attenuated` onto neighbours, halving, then quartering, then
    /// dividing by sixteen as distance grows
    fn bleed(&mut self, channel: u8, attenuated: u64) {
        let mut factor = 2u64;
        for distance in 1..=BLEED_DISTANCE {
            let share = attenuated / factor;
            if channel > distance {
                self.slot_mut(channel - distance).usage += share;
            }
            if channel + distance <= CHANNEL_COUNT {
                self.slot_mut(channel + distance).usage += share;
            }
            factor *= factor;
        }
    }

    fn slot_mut(&mut self, number: u8) -> &mut Channel {
        &mut self.channels[(number - 1) as usize]
    }

    /// Channel by number (1-12)
    pub fn channel(&self, number: u8) -> Option<&Channel> {
        number
            .checked_sub(1)
            .and_then(|i| self.channels.get(i as usize))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Channel> {
        self.channels.iter()
    }
}

/// Access points ordered by descending signal strength; unknown signal sorts
/// last, ties keep registration order
pub fn rank_by_signal(registry: &EntityRegistry) -> Vec<EntityId> {
    let mut ranked: Vec<(EntityId, Option<i8>)> = registry
        .access_points()
        .map(|(id, ap)| (id, ap.signal_strength))
        .collect();

    // Stable: equal keys keep registration order
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.into_iter().map(|(id, _)| id).collect()
}

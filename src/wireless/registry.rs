//! Entity Registry
//!
//! Tracks every hardware address seen during a run, what role it plays, and
//! how many bytes it sent and received. Entities live in an arena and are
//! referred to by [`EntityId`]; the registry never holds two entities with
//! the same address and never grows past its capacity.

use std::collections::HashMap;

use serde::Serialize;

use super::error::{AnalysisError, Result};
use super::ieee80211::{BeaconFields, MacAddr};

/// Default maximum number of tracked entities
pub const DEFAULT_CAPACITY: usize = 250;

/// Stable handle into the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct EntityId(usize);

/// Network role of an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Unknown,
    AccessPoint,
    User,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Unknown => write!(f, "unknown"),
            Role::AccessPoint => write!(f, "access point"),
            Role::User => write!(f, "user"),
        }
    }
}

/// One radio entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entity {
    pub address: MacAddr,
    pub role: Role,
    /// For a user, the access point it talks to
    pub peer_address: Option<MacAddr>,
    /// For an access point, channel 1-12; 0 until learned
    pub channel: u8,
    #[serde(serialize_with = "serialize_ssid")]
    pub ssid: Vec<u8>,
    pub rx_bytes: u64,
    pub tx_bytes: u64,
    pub beacon_count: u64,
    /// dBm from the beacon that populated this access point
    pub signal_strength: Option<i8>,
    /// Frame counter value when the role was confirmed
    pub first_seen_index: u64,
}

fn serialize_ssid<S: serde::Serializer>(ssid: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&String::from_utf8_lossy(ssid))
}

impl Entity {
    pub fn new(address: MacAddr) -> Self {
        Self {
            address,
            role: Role::Unknown,
            peer_address: None,
            channel: 0,
            ssid: Vec::new(),
            rx_bytes: 0,
            tx_bytes: 0,
            beacon_count: 0,
            signal_strength: None,
            first_seen_index: 0,
        }
    }

    pub fn is_access_point(&self) -> bool {
        self.role == Role::AccessPoint
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }

    /// rx + tx
    pub fn total_bytes(&self) -> u64 {
        self.rx_bytes + self.tx_bytes
    }

    pub fn ssid_lossy(&self) -> String {
        String::from_utf8_lossy(&self.ssid).into_owned()
    }

    /// Fill the access point record from its first usable beacon.
    /// Returns false when the channel was already learned.
    pub fn populate_from_beacon(&mut self, fields: &BeaconFields, signal: Option<i8>) -> bool {
        if self.channel != 0 {
            return false;
        }
        self.ssid = fields.ssid.clone();
        self.channel = fields.channel;
        self.signal_strength = signal;
        true
    }
}

/// Fixed-capacity entity store
#[derive(Debug, Clone)]
pub struct EntityRegistry {
    entities: Vec<Entity>,
    by_address: HashMap<MacAddr, EntityId>,
    capacity: usize,
}

impl Default for EntityRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl EntityRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            entities: Vec::with_capacity(capacity.min(1024)),
            by_address: HashMap::new(),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entities.len() >= self.capacity
    }

    /// Find the entity with this address
    pub fn lookup(&self, address: MacAddr) -> Option<EntityId> {
        self.by_address.get(&address).copied()
    }

    /// Return the existing entity or register a new Unknown one
    pub fn get_or_create(&mut self, address: MacAddr) -> Result<EntityId> {
        if let Some(id) = self.lookup(address) {
            return Ok(id);
        }

        if self.is_full() {
            return Err(AnalysisError::CapacityExceeded {
                capacity: self.capacity,
            });
        }

        let id = EntityId(self.entities.len());
        self.entities.push(Entity::new(address));
        self.by_address.insert(address, id);
        Ok(id)
    }

    pub fn get(&self, id: EntityId) -> &Entity {
        &self.entities[id.0]
    }

    pub fn get_mut(&mut self, id: EntityId) -> &mut Entity {
        &mut self.entities[id.0]
    }

    /// Entity by address
    pub fn find(&self, address: MacAddr) -> Option<&Entity> {
        self.lookup(address).map(|id| self.get(id))
    }

    /// Unknown -> AccessPoint. Returns whether the role changed.
    pub fn promote_to_access_point(&mut self, id: EntityId, frame_index: u64) -> bool {
        let entity = self.get_mut(id);
        if entity.role != Role::Unknown {
            return false;
        }
        entity.role = Role::AccessPoint;
        entity.first_seen_index = frame_index;
        true
    }

    /// Unknown -> User associated with `peer`. Returns whether the role changed.
    pub fn promote_to_user(&mut self, id: EntityId, peer: MacAddr, frame_index: u64) -> bool {
        let entity = self.get_mut(id);
        if entity.role != Role::Unknown {
            return false;
        }
        entity.role = Role::User;
        entity.peer_address = Some(peer);
        entity.first_seen_index = frame_index;
        true
    }

    /// All entities in registration order
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.entities.iter().enumerate().map(|(i, e)| (EntityId(i), e))
    }

    pub fn access_points(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.iter().filter(|(_, e)| e.is_access_point())
    }

    /// Users whose peer is `ap`
    pub fn users_of(&self, ap: MacAddr) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.iter()
            .filter(move |(_, e)| e.is_user() && e.peer_address == Some(ap))
    }

    pub fn total_rx_bytes(&self) -> u64 {
        self.entities.iter().map(|e| e.rx_bytes).sum()
    }

    pub fn total_tx_bytes(&self) -> u64 {
        self.entities.iter().map(|e| e.tx_bytes).sum()
    }
}

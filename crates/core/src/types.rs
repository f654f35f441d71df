//! Core types for the chronik action log
//!
//! This module defines the foundational types:
//! - WorldId: Unique identifier for a simulated world
//! - BlockPos / Location: 3D integer coordinates and their world binding
//! - Causer: the identity responsible for an occurrence (player, entity, none)
//! - ActionId: monotonic identifier assigned by storage on insert
//! - Category: coarse classification used for broad filtering

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a simulated world
///
/// A WorldId is a wrapper around a UUID v4. Worlds are created by the host
/// runtime; the engine only ever compares and hashes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorldId(Uuid);

impl WorldId {
    /// Create a new random WorldId using UUID v4
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a WorldId from raw bytes
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    /// Parse a WorldId from a string representation
    ///
    /// Accepts standard UUID format (with or without hyphens).
    /// Returns None if the string is not a valid UUID.
    pub fn from_string(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }
}

impl Default for WorldId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for WorldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(Uuid);

impl PlayerId {
    /// Create a new random PlayerId using UUID v4
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a PlayerId from raw bytes
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    /// Parse a PlayerId from a string representation
    pub fn from_string(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }
}

impl Default for PlayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reference to a non-player entity (mob, falling block, primed TNT, ...)
///
/// Entity ids are only unique within a world for the lifetime of the entity;
/// the type name keeps records meaningful after the entity is gone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityRef {
    /// Entity type name as reported by the host runtime (e.g. "creeper")
    pub entity_type: String,
    /// Runtime entity id
    pub entity_id: u64,
}

impl EntityRef {
    /// Create a new entity reference
    pub fn new(entity_type: impl Into<String>, entity_id: u64) -> Self {
        Self {
            entity_type: entity_type.into(),
            entity_id,
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.entity_type, self.entity_id)
    }
}

/// The identity responsible for an occurrence
///
/// `Environment` covers occurrences with no actor at all (decay, natural
/// fire spread, fluid flow without a triggering entity).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Causer {
    /// A player did it
    Player(PlayerId),
    /// A non-player entity did it
    Entity(EntityRef),
    /// Nobody did it; the world itself
    Environment,
}

impl Causer {
    /// Convenience constructor for a player causer
    pub fn player(id: PlayerId) -> Self {
        Causer::Player(id)
    }

    /// Convenience constructor for an entity causer
    pub fn entity(entity_type: impl Into<String>, entity_id: u64) -> Self {
        Causer::Entity(EntityRef::new(entity_type, entity_id))
    }

    /// Returns the player id if this causer is a player
    pub fn as_player(&self) -> Option<PlayerId> {
        match self {
            Causer::Player(id) => Some(*id),
            _ => None,
        }
    }
}

impl fmt::Display for Causer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Causer::Player(id) => write!(f, "player:{}", id),
            Causer::Entity(e) => write!(f, "entity:{}", e),
            Causer::Environment => write!(f, "environment"),
        }
    }
}

/// 3D integer block coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockPos {
    /// East-west axis
    pub x: i32,
    /// Vertical axis
    pub y: i32,
    /// North-south axis
    pub z: i32,
}

impl BlockPos {
    /// Create a new block position
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// A block position bound to its world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Location {
    /// World the position lives in
    pub world: WorldId,
    /// Position inside the world
    pub pos: BlockPos,
}

impl Location {
    /// Create a new location
    pub fn new(world: WorldId, pos: BlockPos) -> Self {
        Self { world, pos }
    }

    /// Create a location from raw coordinates
    pub fn at(world: WorldId, x: i32, y: i32, z: i32) -> Self {
        Self {
            world,
            pos: BlockPos::new(x, y, z),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.world, self.pos)
    }
}

/// Opaque monotonic identifier for a stored action record
///
/// Assigned by the storage adapter on insert. Unique and immutable once
/// assigned; ordering follows insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActionId(u64);

impl ActionId {
    /// Wrap a raw id value (storage adapters only)
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw id value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Coarse classification of action kinds
///
/// Used for broad filtering ("everything water did here") and for the
/// per-category recording toggles in the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Block placed, broken or mutated by a player
    Block,
    /// Player lifecycle and player-scoped actions
    Player,
    /// Non-player entities acting on the world
    Entity,
    /// Actor-less world processes (decay, growth)
    Environment,
    /// Water flow effects
    Water,
    /// Lava flow effects
    Lava,
    /// Fire and ignition effects
    Fire,
}

impl Category {
    /// All categories, in filter display order
    pub const ALL: [Category; 7] = [
        Category::Block,
        Category::Player,
        Category::Entity,
        Category::Environment,
        Category::Water,
        Category::Lava,
        Category::Fire,
    ];

    /// Stable lowercase name, matching the serde representation
    pub fn name(&self) -> &'static str {
        match self {
            Category::Block => "block",
            Category::Player => "player",
            Category::Entity => "entity",
            Category::Environment => "environment",
            Category::Water => "water",
            Category::Lava => "lava",
            Category::Fire => "fire",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

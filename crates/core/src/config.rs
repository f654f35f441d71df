//! Engine configuration via `chronik.toml`
//!
//! A plain serde value object. Loading, watching and hot-reloading files is
//! the embedding application's job; the engine only evaluates the current
//! config on every occurrence, so swapping in a new value takes effect
//! immediately.
//!
//! The attach horizon deserves a note: merging is only meaningful inside a
//! bounded window, otherwise a new occurrence could attach to an arbitrarily
//! old, logically unrelated record. The window defaults to 120 seconds and
//! can be overridden per kind under `[attach.per_kind_secs]`.

use crate::error::{Error, Result};
use crate::types::Category;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Config file name conventionally placed in the data directory.
pub const CONFIG_FILE_NAME: &str = "chronik.toml";

fn default_true() -> bool {
    true
}

/// Per-category recording toggles
///
/// A disabled category short-circuits every kind in it before any storage
/// I/O happens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryToggles {
    /// Record player block changes
    #[serde(default = "default_true")]
    pub block: bool,
    /// Record player lifecycle actions
    #[serde(default = "default_true")]
    pub player: bool,
    /// Record entity actions
    #[serde(default = "default_true")]
    pub entity: bool,
    /// Record actor-less world processes
    #[serde(default = "default_true")]
    pub environment: bool,
    /// Record water flow effects
    #[serde(default = "default_true")]
    pub water: bool,
    /// Record lava flow effects
    #[serde(default = "default_true")]
    pub lava: bool,
    /// Record fire and ignition effects
    #[serde(default = "default_true")]
    pub fire: bool,
}

impl Default for CategoryToggles {
    fn default() -> Self {
        Self {
            block: true,
            player: true,
            entity: true,
            environment: true,
            water: true,
            lava: true,
            fire: true,
        }
    }
}

impl CategoryToggles {
    /// Whether recording is enabled for a category
    pub fn allows(&self, category: Category) -> bool {
        match category {
            Category::Block => self.block,
            Category::Player => self.player,
            Category::Entity => self.entity,
            Category::Environment => self.environment,
            Category::Water => self.water,
            Category::Lava => self.lava,
            Category::Fire => self.fire,
        }
    }
}

fn default_horizon_secs() -> u64 {
    120
}

fn default_lookup_depth() -> usize {
    8
}

/// Bounds for the merge decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachConfig {
    /// Attach time horizon in seconds; occurrences further apart than this
    /// never merge
    #[serde(default = "default_horizon_secs")]
    pub horizon_secs: u64,
    /// Per-kind horizon overrides, keyed by kind key
    #[serde(default)]
    pub per_kind_secs: BTreeMap<String, u64>,
    /// How many recent records per effective key the most-recent lookup may
    /// examine
    #[serde(default = "default_lookup_depth")]
    pub lookup_depth: usize,
}

impl Default for AttachConfig {
    fn default() -> Self {
        Self {
            horizon_secs: default_horizon_secs(),
            per_kind_secs: BTreeMap::new(),
            lookup_depth: default_lookup_depth(),
        }
    }
}

impl AttachConfig {
    /// Attach horizon for a kind, honoring per-kind overrides
    pub fn horizon_for(&self, kind: &str) -> Duration {
        let secs = self
            .per_kind_secs
            .get(kind)
            .copied()
            .unwrap_or(self.horizon_secs);
        Duration::seconds(secs as i64)
    }
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    10
}

/// Bounded retry/backoff for transient storage failures on the write path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries after the first attempt; 0 disables retrying
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Base backoff delay, doubled per attempt
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

impl RetryConfig {
    /// Backoff delay before the given retry attempt (0-based)
    pub fn delay_for(&self, attempt: u32) -> std::time::Duration {
        let factor = 1u64 << attempt.min(16);
        std::time::Duration::from_millis(self.base_delay_ms.saturating_mul(factor))
    }
}

/// Engine configuration
///
/// # Example
///
/// ```toml
/// [categories]
/// entity = false
///
/// disabled_kinds = ["noteblock-change"]
///
/// [attach]
/// horizon_secs = 120
/// lookup_depth = 8
///
/// [attach.per_kind_secs]
/// "player-quit" = 300
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChronikConfig {
    /// Per-category recording toggles
    #[serde(default)]
    pub categories: CategoryToggles,
    /// Individually disabled kinds, keyed by kind key
    #[serde(default)]
    pub disabled_kinds: BTreeSet<String>,
    /// Merge decision bounds
    #[serde(default)]
    pub attach: AttachConfig,
    /// Write-path retry policy
    #[serde(default)]
    pub retry: RetryConfig,
}

impl ChronikConfig {
    /// Whether occurrences of a kind should currently be recorded
    pub fn records(&self, kind: &str, category: Category) -> bool {
        self.categories.allows(category) && !self.disabled_kinds.contains(kind)
    }

    /// Parse a config from TOML text
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: ChronikConfig = toml::from_str(text)?;
        if config.attach.lookup_depth == 0 {
            return Err(Error::InvalidConfig(
                "attach.lookup_depth must be at least 1".to_string(),
            ));
        }
        Ok(config)
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Chronik action log configuration

# Per-category recording toggles (all true by default).
[categories]
# block = true
# player = true
# entity = true
# environment = true
# water = true
# lava = true
# fire = true

# Individually disabled kinds.
# disabled_kinds = ["noteblock-change"]

[attach]
# Attach time horizon in seconds. Occurrences further apart than this
# never merge into one record.
horizon_secs = 120
# How many recent records per effective key the merge lookup may examine.
lookup_depth = 8

# Per-kind horizon overrides.
# [attach.per_kind_secs]
# "player-quit" = 300

[retry]
# Bounded backoff for transient storage failures on append/update.
max_retries = 3
base_delay_ms = 10
"#
    }
}

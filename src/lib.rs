//! Chronik - embedded action-logging and retroactive-query engine for
//! simulated worlds
//!
//! Every discrete state change in a live world (block placed, block flushed
//! away, entity killed, player quit, ...) is captured as a structured action
//! record. Bursts of related occurrences fold into one human-meaningful
//! record at ingestion time, and everything is retrievable later through
//! multi-dimensional filters for display or rollback tooling.
//!
//! # Quick Start
//!
//! ```
//! use chronik::{kinds, BlockState, Chronik, Location, Lookup, PlayerId, WorldId};
//! use chrono::Utc;
//!
//! # fn main() -> chronik::Result<()> {
//! let chronik = Chronik::new()?;
//! let world = WorldId::new();
//! let player = PlayerId::new();
//!
//! // Ingest an occurrence reported by the host runtime
//! chronik.record(kinds::block::break_by(
//!     player,
//!     Location::at(world, 14, 64, -3),
//!     BlockState::of("stone"),
//!     Utc::now(),
//! ))?;
//!
//! // Look it back up
//! let found = chronik.lookup(&Lookup::in_world(world))?.count();
//! assert_eq!(found, 1);
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! Occurrences flow through the kind catalog (classification and payload
//! mapping), the [`Recorder`] (online merge-or-insert against the most
//! recent compatible record) and into the storage adapter; the
//! [`QueryEngine`] reads back through secondary indexes. The [`Chronik`]
//! handle bundles all of it over the embedded in-memory store.

#![warn(missing_docs)]
#![warn(clippy::all)]

use std::sync::Arc;

pub use chronik_core::{
    ActionDraft, ActionId, ActionRecord, ActionStore, AttachConfig, BlockPos, BlockState,
    Category, CategoryToggles, Causer, ChronikConfig, EffectiveKey, EntityRef, Error, Location,
    PlayerId, RecordPatch, Result, RetryConfig, Value, WorldId,
};
pub use chronik_engine::{
    kinds, rollback_order, ActionKind, ActionRegistry, BlockFilter, BlockSignature, Ingest,
    KeyScope, Lookup, LookupResults, Occurrence, Order, QueryEngine, Recorder, Region,
};
pub use chronik_storage::MemoryStore;

/// The engine bundled over the embedded in-memory store
pub struct Chronik {
    registry: Arc<ActionRegistry>,
    recorder: Recorder<MemoryStore>,
    query: QueryEngine<MemoryStore>,
}

impl Chronik {
    /// Create an engine with the builtin kind catalog and default config
    pub fn new() -> Result<Self> {
        Self::with_config(ChronikConfig::default())
    }

    /// Create an engine with a specific configuration
    pub fn with_config(config: ChronikConfig) -> Result<Self> {
        let registry = Arc::new(ActionRegistry::builtin()?);
        let store = Arc::new(MemoryStore::new());
        Ok(Self {
            registry: Arc::clone(&registry),
            recorder: Recorder::new(registry, Arc::clone(&store), config),
            query: QueryEngine::new(store),
        })
    }

    /// Ingest one occurrence; see [`Recorder::record`]
    pub fn record(&self, occurrence: Occurrence) -> Result<Ingest> {
        self.recorder.record(occurrence)
    }

    /// Dispatch-safe ingestion; see [`Recorder::ingest`]
    pub fn ingest(&self, occurrence: Occurrence) {
        self.recorder.ingest(occurrence)
    }

    /// Run a lookup; see [`QueryEngine::lookup`]
    pub fn lookup(&self, spec: &Lookup) -> Result<LookupResults<MemoryStore>> {
        self.query.lookup(spec)
    }

    /// The kind catalog
    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    /// Current configuration
    pub fn config(&self) -> Arc<ChronikConfig> {
        self.recorder.config()
    }

    /// Swap in a new configuration; takes effect for the next occurrence
    pub fn set_config(&self, config: ChronikConfig) {
        self.recorder.set_config(config)
    }

    /// The underlying store
    pub fn store(&self) -> &Arc<MemoryStore> {
        self.recorder.store()
    }
}

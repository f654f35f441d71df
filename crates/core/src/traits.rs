//! Storage adapter contract
//!
//! Durable append + indexed lookup of action records. The engine talks to
//! storage exclusively through `ActionStore`, so the concrete engine (the
//! embedded in-memory store, or an external database adapter) is swappable.
//!
//! ## Contract
//!
//! - `append` assigns the id and makes the record visible to every read
//!   issued after it returns (read-your-writes)
//! - `update` is a compare-and-swap on the record's version; a concurrent
//!   writer surfaces as `VersionMismatch`, a vanished record as `NotFound`
//! - `most_recent` is the bounded merge-candidate lookup: it examines at
//!   most `depth` recent records for the effective key and nothing older
//!   than `now - horizon`
//! - `scan` enumerates candidate ids from one secondary index, pruned by
//!   time and ordered by timestamp; the caller applies residual predicates
//!   while fetching lazily

use crate::error::Result;
use crate::record::{ActionDraft, ActionRecord, RecordPatch};
use crate::types::{ActionId, Causer, Location, WorldId};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Kind-specific grouping key used to find a mergeable prior record
///
/// Block-scoped kinds group by the affected location, player-scoped kinds by
/// the causer, and cause-scoped kinds (ignitions) by the source of the
/// effect rather than the block it hit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectiveKey {
    /// Same affected location merges
    Location(Location),
    /// Same causer merges, wherever it happened
    Causer(Causer),
    /// Same effect source merges
    Source(Location),
}

/// Which secondary index a scan walks
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexSelect {
    /// The per-world time index
    World(WorldId),
    /// The per-kind time index, merged across the given kinds
    Kinds(Vec<String>),
    /// The per-causer time index
    Causer(Causer),
}

/// An index scan, pruned by time and ordered by timestamp
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanPlan {
    /// Index to walk
    pub index: IndexSelect,
    /// Inclusive lower bound, microseconds since epoch
    pub from_micros: i64,
    /// Exclusive upper bound, microseconds since epoch
    pub to_micros: i64,
    /// Ascending timestamp order instead of the default descending
    pub ascending: bool,
}

/// Durable append + indexed lookup of action records
pub trait ActionStore: Send + Sync {
    /// Append a new record, assigning its id
    ///
    /// The effective key is stored alongside the record to feed the
    /// `most_recent` lookup.
    fn append(&self, key: EffectiveKey, draft: ActionDraft) -> Result<ActionRecord>;

    /// Merge-patch an existing record, guarded by its version
    ///
    /// Returns the updated record. Fails with `NotFound` if the id is
    /// absent and `VersionMismatch` if another writer got there first.
    fn update(&self, id: ActionId, expected_version: u64, patch: &RecordPatch)
        -> Result<ActionRecord>;

    /// Most recently stored record of the kind at the effective key
    ///
    /// Bounded two ways: at most `depth` recent records are examined, and
    /// records older than `now - horizon` are never returned. Returns the
    /// record together with its current version for a subsequent CAS.
    fn most_recent(
        &self,
        kind: &str,
        key: &EffectiveKey,
        horizon: Duration,
        now: DateTime<Utc>,
        depth: usize,
    ) -> Result<Option<(ActionRecord, u64)>>;

    /// Fetch a record by id
    fn fetch(&self, id: ActionId) -> Result<Option<ActionRecord>>;

    /// Enumerate candidate ids from a secondary index
    fn scan(&self, plan: &ScanPlan) -> Result<Vec<ActionId>>;

    /// Number of stored records
    fn len(&self) -> usize;

    /// True when nothing is stored
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Convert a timestamp to the index representation
pub fn to_micros(ts: DateTime<Utc>) -> i64 {
    ts.timestamp_micros()
}

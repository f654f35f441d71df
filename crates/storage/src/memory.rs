//! Embedded in-memory reference engine for the storage adapter
//!
//! DashMap-sharded primary table plus time-ordered secondary indexes.
//!
//! # Design
//!
//! - `records`: DashMap keyed by ActionId, the primary table. Each entry
//!   carries a monotonically increasing version for CAS updates.
//! - Secondary indexes: per-world, per-kind and per-causer BTreeSets of
//!   `(timestamp_micros, id)`, supporting time-range scans in either order.
//! - `recent`: per `(kind, effective key)` deque of recent entries, newest
//!   first, feeding the bounded most-recent lookup in O(depth).
//!
//! # Thread Safety
//!
//! All maps are DashMaps; operations lock only the touched shard, so
//! unrelated worlds, kinds and causers never contend. Index fix-ups after a
//! merge run outside the primary-table lock; scans re-check every predicate
//! against the fetched record, so a briefly stale index entry can only cost
//! a wasted fetch, never a wrong result.

use chronik_core::error::{Error, Result};
use chronik_core::record::{ActionDraft, ActionRecord, RecordPatch};
use chronik_core::traits::{to_micros, ActionStore, EffectiveKey, IndexSelect, ScanPlan};
use chronik_core::types::{ActionId, Causer, WorldId};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use rustc_hash::FxHasher;
use std::collections::{BTreeSet, VecDeque};
use std::hash::BuildHasherDefault;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

type FxDashMap<K, V> = DashMap<K, V, BuildHasherDefault<FxHasher>>;

/// Capacity bound of the per-key recent deque
///
/// This is storage capacity, not the merge lookup bound; the lookup bound
/// (`attach.lookup_depth`) is configuration and must stay at or below this.
const RECENT_CAPACITY: usize = 32;

/// Primary table entry
#[derive(Debug, Clone)]
struct Stored {
    record: ActionRecord,
    version: u64,
    key: EffectiveKey,
}

/// Sharded in-memory `ActionStore`
///
/// # Example
///
/// ```ignore
/// use chronik_storage::MemoryStore;
/// use std::sync::Arc;
///
/// let store = Arc::new(MemoryStore::new());
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Id allocator; first assigned id is 1
    next_id: AtomicU64,
    /// Primary table, FxHash for O(1) id lookups
    records: FxDashMap<ActionId, Stored>,
    /// (timestamp, id) per world
    by_world: DashMap<WorldId, BTreeSet<(i64, ActionId)>>,
    /// (timestamp, id) per kind
    by_kind: DashMap<String, BTreeSet<(i64, ActionId)>>,
    /// (timestamp, id) per causer
    by_causer: DashMap<Causer, BTreeSet<(i64, ActionId)>>,
    /// Newest-first recent entries per (kind, effective key)
    recent: DashMap<(String, EffectiveKey), VecDeque<(i64, ActionId)>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn index_insert(&self, record: &ActionRecord, micros: i64) {
        self.by_world
            .entry(record.location.world)
            .or_default()
            .insert((micros, record.id));
        self.by_kind
            .entry(record.kind.clone())
            .or_default()
            .insert((micros, record.id));
        self.by_causer
            .entry(record.causer.clone())
            .or_default()
            .insert((micros, record.id));
    }

    /// Move a record's index entries after its timestamp changed
    fn index_move(&self, record: &ActionRecord, old_micros: i64, new_micros: i64) {
        if old_micros == new_micros {
            return;
        }
        if let Some(mut set) = self.by_world.get_mut(&record.location.world) {
            set.remove(&(old_micros, record.id));
            set.insert((new_micros, record.id));
        }
        if let Some(mut set) = self.by_kind.get_mut(&record.kind) {
            set.remove(&(old_micros, record.id));
            set.insert((new_micros, record.id));
        }
        if let Some(mut set) = self.by_causer.get_mut(&record.causer) {
            set.remove(&(old_micros, record.id));
            set.insert((new_micros, record.id));
        }
    }

    fn recent_push(&self, kind: &str, key: &EffectiveKey, micros: i64, id: ActionId) {
        let mut deque = self
            .recent
            .entry((kind.to_string(), key.clone()))
            .or_default();
        deque.push_front((micros, id));
        deque.truncate(RECENT_CAPACITY);
    }

    /// Reposition an id at the front of its recent deque with a fresh timestamp
    fn recent_refresh(&self, kind: &str, key: &EffectiveKey, micros: i64, id: ActionId) {
        if let Some(mut deque) = self.recent.get_mut(&(kind.to_string(), key.clone())) {
            deque.retain(|(_, entry)| *entry != id);
            deque.push_front((micros, id));
            deque.truncate(RECENT_CAPACITY);
        }
    }

    fn range_scan(
        set: &BTreeSet<(i64, ActionId)>,
        from_micros: i64,
        to_micros: i64,
    ) -> Vec<(i64, ActionId)> {
        use std::ops::Bound::{Excluded, Included};
        if from_micros >= to_micros {
            return Vec::new();
        }
        set.range((
            Included((from_micros, ActionId::from_raw(0))),
            Excluded((to_micros, ActionId::from_raw(0))),
        ))
        .copied()
        .collect()
    }
}

impl ActionStore for MemoryStore {
    fn append(&self, key: EffectiveKey, draft: ActionDraft) -> Result<ActionRecord> {
        let id = ActionId::from_raw(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let record = ActionRecord::from_draft(id, draft);
        let micros = to_micros(record.timestamp);

        self.records.insert(
            id,
            Stored {
                record: record.clone(),
                version: 1,
                key: key.clone(),
            },
        );
        self.index_insert(&record, micros);
        self.recent_push(&record.kind, &key, micros, id);
        trace!(id = %record.id, kind = %record.kind, "appended record");
        Ok(record)
    }

    fn update(
        &self,
        id: ActionId,
        expected_version: u64,
        patch: &RecordPatch,
    ) -> Result<ActionRecord> {
        let (record, key, old_micros, new_micros) = {
            let mut entry = self.records.get_mut(&id).ok_or(Error::NotFound(id))?;
            if entry.version != expected_version {
                return Err(Error::VersionMismatch {
                    expected: expected_version,
                    actual: entry.version,
                });
            }
            let old_micros = to_micros(entry.record.timestamp);
            entry.record.apply(patch);
            entry.version += 1;
            (
                entry.record.clone(),
                entry.key.clone(),
                old_micros,
                to_micros(entry.record.timestamp),
            )
        };

        self.index_move(&record, old_micros, new_micros);
        self.recent_refresh(&record.kind, &key, new_micros, id);
        trace!(id = %record.id, attached_count = record.attached_count, "merged record");
        Ok(record)
    }

    fn most_recent(
        &self,
        kind: &str,
        key: &EffectiveKey,
        horizon: Duration,
        now: DateTime<Utc>,
        depth: usize,
    ) -> Result<Option<(ActionRecord, u64)>> {
        let cutoff = to_micros(now - horizon);
        let candidate = self
            .recent
            .get(&(kind.to_string(), key.clone()))
            .and_then(|deque| {
                deque
                    .iter()
                    .take(depth)
                    .find(|(micros, _)| *micros >= cutoff)
                    .map(|(_, id)| *id)
            });

        let Some(id) = candidate else {
            return Ok(None);
        };
        // Re-check against the primary table; the deque entry may lag a merge.
        match self.records.get(&id) {
            Some(stored) if to_micros(stored.record.timestamp) >= cutoff => {
                Ok(Some((stored.record.clone(), stored.version)))
            }
            _ => Ok(None),
        }
    }

    fn fetch(&self, id: ActionId) -> Result<Option<ActionRecord>> {
        Ok(self.records.get(&id).map(|stored| stored.record.clone()))
    }

    fn scan(&self, plan: &ScanPlan) -> Result<Vec<ActionId>> {
        let mut entries = match &plan.index {
            IndexSelect::World(world) => self
                .by_world
                .get(world)
                .map(|set| Self::range_scan(&set, plan.from_micros, plan.to_micros))
                .unwrap_or_default(),
            IndexSelect::Causer(causer) => self
                .by_causer
                .get(causer)
                .map(|set| Self::range_scan(&set, plan.from_micros, plan.to_micros))
                .unwrap_or_default(),
            IndexSelect::Kinds(kinds) => {
                let mut merged = Vec::new();
                for kind in kinds {
                    if let Some(set) = self.by_kind.get(kind) {
                        merged.extend(Self::range_scan(&set, plan.from_micros, plan.to_micros));
                    }
                }
                merged.sort_unstable();
                merged
            }
        };

        if !plan.ascending {
            entries.reverse();
        }
        Ok(entries.into_iter().map(|(_, id)| id).collect())
    }

    fn len(&self) -> usize {
        self.records.len()
    }
}

//! The attachment engine
//!
//! For every occurrence, decide online whether it folds into the most
//! recent compatible record or starts a new one.
//!
//! # Algorithm
//!
//! 1. Resolve the kind and evaluate activation against the live config;
//!    disabled kinds short-circuit before any storage I/O.
//! 2. Look up the most recently stored record of the same kind at the same
//!    effective key, bounded by the configured horizon and lookup depth.
//! 3. Ask the kind's attach predicate. Attachable: fold via a CAS update
//!    (count, timestamp, kind merge rule). Not attachable: append a fresh
//!    record.
//!
//! # Concurrency
//!
//! The read-decide-write sequence is the critical section. It is serialized
//! per effective key through a striped lock table, so unrelated locations,
//! players and sources proceed fully in parallel. The storage update is
//! additionally version-guarded: a writer outside the key lock (another
//! process on shared storage) surfaces as `VersionMismatch` and the merge is
//! re-read and retried a bounded number of times. A record that vanishes
//! mid-merge (`NotFound`, e.g. a concurrent purge) falls back to a fresh
//! insert. Transient storage failures back off and retry per the retry
//! config; the occurrence is never dropped because of contention.

use crate::occurrence::Occurrence;
use crate::registry::{ActionKind, ActionRegistry};
use chronik_core::config::ChronikConfig;
use chronik_core::error::{Error, Result};
use chronik_core::traits::{ActionStore, EffectiveKey};
use chronik_core::types::ActionId;
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tracing::{debug, warn};

/// Outcome of ingesting one occurrence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ingest {
    /// A fresh record was appended
    Inserted(ActionId),
    /// The occurrence folded into an existing record
    Attached(ActionId),
    /// The kind is disabled by configuration; nothing was stored
    Skipped,
}

impl Ingest {
    /// The touched record id, unless the occurrence was skipped
    pub fn id(&self) -> Option<ActionId> {
        match self {
            Ingest::Inserted(id) | Ingest::Attached(id) => Some(*id),
            Ingest::Skipped => None,
        }
    }
}

/// Online aggregation of occurrences into action records
pub struct Recorder<S> {
    registry: Arc<ActionRegistry>,
    store: Arc<S>,
    config: RwLock<Arc<ChronikConfig>>,
    /// Per-(kind, effective key) serialization of the read-decide-write
    /// sequence. Entries are tiny and live for the lifetime of the key.
    locks: DashMap<(&'static str, EffectiveKey), Arc<Mutex<()>>>,
}

impl<S: ActionStore> Recorder<S> {
    /// Create a recorder over a registry and store
    pub fn new(registry: Arc<ActionRegistry>, store: Arc<S>, config: ChronikConfig) -> Self {
        Self {
            registry,
            store,
            config: RwLock::new(Arc::new(config)),
            locks: DashMap::new(),
        }
    }

    /// The underlying store
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Current configuration
    pub fn config(&self) -> Arc<ChronikConfig> {
        self.config.read().clone()
    }

    /// Swap in a new configuration; takes effect for the next occurrence
    pub fn set_config(&self, config: ChronikConfig) {
        *self.config.write() = Arc::new(config);
    }

    /// Ingest one occurrence
    ///
    /// Returns the outcome on success. Fails with `UnknownKind` for an
    /// unregistered kind and with storage errors once retries are
    /// exhausted. A kind disabled by configuration is not an error; it
    /// yields `Ingest::Skipped`.
    pub fn record(&self, occurrence: Occurrence) -> Result<Ingest> {
        let kind = self.registry.resolve(occurrence.kind)?;
        let config = self.config();
        if !kind.is_active(&config) {
            debug!(kind = kind.key, "kind disabled, skipping occurrence");
            return Ok(Ingest::Skipped);
        }

        let key = kind.effective_key(&occurrence);
        let lock = self
            .locks
            .entry((kind.key, key.clone()))
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock();
        self.record_locked(kind, key, occurrence, &config)
    }

    /// Dispatch-safe ingestion
    ///
    /// Never propagates: failures are logged and the occurrence is dropped,
    /// so a storage hiccup cannot abort the host runtime's event dispatch.
    pub fn ingest(&self, occurrence: Occurrence) {
        let kind = occurrence.kind;
        if let Err(error) = self.record(occurrence) {
            warn!(kind, %error, "dropping occurrence");
        }
    }

    fn record_locked(
        &self,
        kind: &ActionKind,
        key: EffectiveKey,
        occurrence: Occurrence,
        config: &ChronikConfig,
    ) -> Result<Ingest> {
        let horizon = config.attach.horizon_for(kind.key);
        let depth = config.attach.lookup_depth;

        let mut cas_attempts = 0u32;
        loop {
            let candidate = self.with_retry(config, || {
                self.store
                    .most_recent(kind.key, &key, horizon, occurrence.timestamp, depth)
            })?;

            let Some((existing, version)) = candidate else {
                break;
            };
            if !kind.can_attach(config, &occurrence, &existing) {
                break;
            }

            let patch = kind.merge_patch(&occurrence, &existing);
            match self.with_retry(config, || self.store.update(existing.id, version, &patch)) {
                Ok(updated) => {
                    debug!(
                        kind = kind.key,
                        id = %updated.id,
                        attached_count = updated.attached_count,
                        "attached occurrence"
                    );
                    return Ok(Ingest::Attached(updated.id));
                }
                // An outside writer moved the record; re-read and retry
                Err(Error::VersionMismatch { .. }) if cas_attempts < config.retry.max_retries => {
                    cas_attempts += 1;
                    continue;
                }
                // Contended beyond bounds or vanished mid-merge: insert fresh
                Err(Error::VersionMismatch { .. }) | Err(Error::NotFound(_)) => break,
                Err(error) => return Err(error),
            }
        }

        let draft = occurrence.into_draft(kind.category);
        let record = self.with_retry(config, || self.store.append(key.clone(), draft.clone()))?;
        debug!(kind = kind.key, id = %record.id, "inserted record");
        Ok(Ingest::Inserted(record.id))
    }

    /// Bounded backoff around one storage operation
    fn with_retry<T>(&self, config: &ChronikConfig, mut op: impl FnMut() -> Result<T>) -> Result<T> {
        let mut attempt = 0u32;
        loop {
            match op() {
                Err(error) if error.is_transient() && attempt < config.retry.max_retries => {
                    warn!(%error, attempt, "transient storage failure, backing off");
                    std::thread::sleep(config.retry.delay_for(attempt));
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinds::{self, keys};
    use chronik_core::types::{Location, PlayerId, WorldId};
    use chronik_core::value::BlockState;
    use chronik_storage::testing::FlakyStore;
    use chronik_storage::MemoryStore;
    use chrono::{Duration, Utc};

    fn recorder() -> Recorder<MemoryStore> {
        Recorder::new(
            Arc::new(ActionRegistry::builtin().unwrap()),
            Arc::new(MemoryStore::new()),
            ChronikConfig::default(),
        )
    }

    fn flaky_recorder() -> Recorder<FlakyStore<MemoryStore>> {
        Recorder::new(
            Arc::new(ActionRegistry::builtin().unwrap()),
            Arc::new(FlakyStore::new(MemoryStore::new())),
            ChronikConfig::default(),
        )
    }

    #[test]
    fn test_burst_folds_into_one_record() {
        let recorder = recorder();
        let at = Location::at(WorldId::new(), 4, 64, 4);
        let base = Utc::now();

        let first = recorder
            .record(kinds::flow::water_break_at(at, BlockState::of("sand"), base))
            .unwrap();
        let Ingest::Inserted(id) = first else {
            panic!("first occurrence must insert");
        };

        for i in 1..5 {
            let outcome = recorder
                .record(kinds::flow::water_break_at(
                    at,
                    BlockState::of("sand"),
                    base + Duration::milliseconds(i * 100),
                ))
                .unwrap();
            assert_eq!(outcome, Ingest::Attached(id));
        }

        let record = recorder.store().fetch(id).unwrap().unwrap();
        assert_eq!(record.attached_count, 5);
        assert_eq!(recorder.store().len(), 1);
    }

    #[test]
    fn test_non_attachable_kind_inserts_every_time() {
        let recorder = recorder();
        let at = Location::at(WorldId::new(), 4, 64, 4);
        let base = Utc::now();
        let enderman = chronik_core::types::EntityRef::new("enderman", 3);

        for i in 0..4 {
            let outcome = recorder
                .record(kinds::entity::block_change(
                    enderman.clone(),
                    at,
                    BlockState::of("grass"),
                    BlockState::of("air"),
                    base + Duration::seconds(i),
                ))
                .unwrap();
            assert!(matches!(outcome, Ingest::Inserted(_)));
        }
        assert_eq!(recorder.store().len(), 4);
    }

    #[test]
    fn test_unknown_kind_is_an_error() {
        let recorder = recorder();
        let occ = Occurrence::new(
            "no-such-kind",
            Utc::now(),
            Location::at(WorldId::new(), 0, 0, 0),
        );
        assert!(matches!(recorder.record(occ), Err(Error::UnknownKind(_))));
    }

    #[test]
    fn test_ingest_swallows_errors() {
        let recorder = recorder();
        let occ = Occurrence::new(
            "no-such-kind",
            Utc::now(),
            Location::at(WorldId::new(), 0, 0, 0),
        );
        recorder.ingest(occ);
        assert_eq!(recorder.store().len(), 0);
    }

    #[test]
    fn test_disabled_kind_skips_before_storage() {
        let recorder = recorder();
        let mut config = ChronikConfig::default();
        config.disabled_kinds.insert(keys::WATER_BREAK.to_string());
        recorder.set_config(config);

        let at = Location::at(WorldId::new(), 4, 64, 4);
        let outcome = recorder
            .record(kinds::flow::water_break_at(at, BlockState::of("sand"), Utc::now()))
            .unwrap();
        assert_eq!(outcome, Ingest::Skipped);
        assert_eq!(outcome.id(), None);
        assert_eq!(recorder.store().len(), 0);

        // Re-enabling takes effect immediately
        recorder.set_config(ChronikConfig::default());
        assert!(matches!(
            recorder
                .record(kinds::flow::water_break_at(at, BlockState::of("sand"), Utc::now()))
                .unwrap(),
            Ingest::Inserted(_)
        ));
    }

    #[test]
    fn test_quit_attaches_per_player() {
        let recorder = recorder();
        let world = WorldId::new();
        let p = PlayerId::new();
        let q = PlayerId::new();
        let base = Utc::now();

        let first = recorder
            .record(kinds::player::quit(p, Location::at(world, 0, 64, 0), None, base))
            .unwrap();
        let second = recorder
            .record(kinds::player::quit(
                p,
                Location::at(world, 9, 64, 9),
                None,
                base + Duration::seconds(30),
            ))
            .unwrap();
        assert_eq!(second, Ingest::Attached(first.id().unwrap()));

        let other = recorder
            .record(kinds::player::quit(
                q,
                Location::at(world, 0, 64, 0),
                None,
                base + Duration::seconds(31),
            ))
            .unwrap();
        assert!(matches!(other, Ingest::Inserted(_)));
        assert_eq!(recorder.store().len(), 2);
    }

    #[test]
    fn test_window_boundary_on_both_sides() {
        let recorder = recorder();
        let at = Location::at(WorldId::new(), 8, 64, 8);
        let player = PlayerId::new();
        let base = Utc::now();
        let repeater = |delay: u8| BlockState::new("repeater", delay << 2);

        let first = recorder
            .record(kinds::interact::repeater_change_by(
                player,
                at,
                repeater(0),
                repeater(1),
                base,
            ))
            .unwrap();

        // 119s: inside the 2-minute window, attaches
        let near = recorder
            .record(kinds::interact::repeater_change_by(
                player,
                at,
                repeater(1),
                repeater(2),
                base + Duration::seconds(119),
            ))
            .unwrap();
        assert_eq!(near, Ingest::Attached(first.id().unwrap()));

        // 121s after the refreshed timestamp: outside, fresh record
        let far = recorder
            .record(kinds::interact::repeater_change_by(
                player,
                at,
                repeater(2),
                repeater(3),
                base + Duration::seconds(119 + 121),
            ))
            .unwrap();
        assert!(matches!(far, Ingest::Inserted(_)));
    }

    #[test]
    fn test_transient_failures_are_retried() {
        let recorder = flaky_recorder();
        let at = Location::at(WorldId::new(), 4, 64, 4);
        recorder.store().fail_writes(2);

        let outcome = recorder
            .record(kinds::flow::water_break_at(at, BlockState::of("sand"), Utc::now()))
            .unwrap();
        assert!(matches!(outcome, Ingest::Inserted(_)));
        assert_eq!(recorder.store().len(), 1);
    }

    #[test]
    fn test_retry_exhaustion_surfaces() {
        let recorder = flaky_recorder();
        let at = Location::at(WorldId::new(), 4, 64, 4);
        // Default policy: 1 attempt + 3 retries; 5 armed failures exhaust it
        recorder.store().fail_writes(5);

        let err = recorder
            .record(kinds::flow::water_break_at(at, BlockState::of("sand"), Utc::now()))
            .unwrap_err();
        assert!(err.is_transient());
        assert_eq!(recorder.store().len(), 0);
    }

    #[test]
    fn test_concurrent_same_key_never_double_inserts() {
        let recorder = Arc::new(recorder());
        let world = WorldId::new();
        let at = Location::at(world, 7, 64, 7);
        let base = Utc::now();

        let threads: Vec<_> = (0..8)
            .map(|i| {
                let recorder = Arc::clone(&recorder);
                std::thread::spawn(move || {
                    recorder
                        .record(kinds::flow::water_break_at(
                            at,
                            BlockState::of("sand"),
                            base + Duration::milliseconds(i),
                        ))
                        .unwrap()
                })
            })
            .collect();

        let outcomes: Vec<Ingest> = threads.into_iter().map(|t| t.join().unwrap()).collect();
        let inserts = outcomes
            .iter()
            .filter(|o| matches!(o, Ingest::Inserted(_)))
            .count();
        assert_eq!(inserts, 1, "exactly one occurrence may start the record");
        assert_eq!(recorder.store().len(), 1);

        let id = outcomes[0].id().unwrap();
        let record = recorder.store().fetch(id).unwrap().unwrap();
        assert_eq!(record.attached_count, 8);
    }

    #[test]
    fn test_unrelated_keys_do_not_merge() {
        let recorder = recorder();
        let world = WorldId::new();
        let base = Utc::now();

        recorder
            .record(kinds::flow::water_break_at(
                Location::at(world, 1, 64, 1),
                BlockState::of("sand"),
                base,
            ))
            .unwrap();
        recorder
            .record(kinds::flow::water_break_at(
                Location::at(world, 2, 64, 1),
                BlockState::of("sand"),
                base,
            ))
            .unwrap();
        assert_eq!(recorder.store().len(), 2);
    }
}

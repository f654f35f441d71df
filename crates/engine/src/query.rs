//! Retroactive lookups over stored action records
//!
//! A `Lookup` is the caller-built filter specification: world, optional
//! region, time range, kind and category allow-lists, an independent
//! excluded-kind set, optional causer, optional block signatures. The query
//! engine validates it, picks the secondary index that prunes the largest
//! candidate set first (causer, then kinds, then world), scans it
//! time-pruned, and hands back a lazy sequence that fetches and filters one
//! record at a time.
//!
//! An empty result is a valid empty sequence. A malformed specification
//! fails fast with `InvalidQuery` before storage is touched; storage faults
//! surface as errors from `lookup` itself, never as silently empty results.

use chronik_core::error::{Error, Result};
use chronik_core::record::ActionRecord;
use chronik_core::traits::{to_micros, ActionStore, IndexSelect, ScanPlan};
use chronik_core::types::{ActionId, BlockPos, Category, Causer, WorldId};
use chronik_core::value::{BlockState, Value};
use chrono::{DateTime, Utc};
use smallvec::SmallVec;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Spatial bound of a lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Region {
    /// Inclusive axis-aligned cuboid
    Cuboid {
        /// Minimum corner (inclusive)
        min: BlockPos,
        /// Maximum corner (inclusive)
        max: BlockPos,
    },
    /// Cube of side `2 * radius + 1` centered on a block
    Radius {
        /// Center block
        center: BlockPos,
        /// Blocks in every axis direction
        radius: u32,
    },
}

impl Region {
    /// Cuboid spanning two arbitrary corners
    pub fn cuboid(a: BlockPos, b: BlockPos) -> Self {
        Region::Cuboid {
            min: BlockPos::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: BlockPos::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    /// Cube around a center block
    pub fn radius(center: BlockPos, radius: u32) -> Self {
        Region::Radius { center, radius }
    }

    /// Whether a position falls inside, bounds inclusive
    pub fn contains(&self, pos: BlockPos) -> bool {
        match self {
            Region::Cuboid { min, max } => {
                (min.x..=max.x).contains(&pos.x)
                    && (min.y..=max.y).contains(&pos.y)
                    && (min.z..=max.z).contains(&pos.z)
            }
            Region::Radius { center, radius } => {
                let r = *radius as i64;
                i64::from(pos.x - center.x).abs() <= r
                    && i64::from(pos.y - center.y).abs() <= r
                    && i64::from(pos.z - center.z).abs() <= r
            }
        }
    }
}

/// Result ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    /// Oldest first (rollback replay order is the reverse of this)
    Ascending,
    /// Newest first, the default
    Descending,
}

/// One material/data signature a block filter accepts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockSignature {
    /// Material name to match
    pub material: String,
    /// Exact data value, or any when None
    pub data: Option<u8>,
}

impl BlockSignature {
    /// Match any data value of a material
    pub fn material(material: impl Into<String>) -> Self {
        Self {
            material: material.into(),
            data: None,
        }
    }

    /// Match one exact material/data pair
    pub fn with_data(material: impl Into<String>, data: u8) -> Self {
        Self {
            material: material.into(),
            data: Some(data),
        }
    }

    fn matches(&self, state: &BlockState) -> bool {
        self.material == state.material && self.data.map_or(true, |data| data == state.data)
    }
}

/// Restrict results to records whose subjects match given block signatures
///
/// Rollback tooling uses this to restore only specific material types. A
/// record matches when any signature matches its before or after subject.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockFilter {
    signatures: SmallVec<[BlockSignature; 4]>,
}

impl BlockFilter {
    /// Empty filter; matches nothing until signatures are added
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a signature
    pub fn include(mut self, signature: BlockSignature) -> Self {
        self.signatures.push(signature);
        self
    }

    /// True when no signatures were added
    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }

    fn matches_subject(&self, subject: &Value) -> bool {
        BlockState::from_value(subject)
            .map(|state| self.signatures.iter().any(|sig| sig.matches(&state)))
            .unwrap_or(false)
    }

    fn matches_record(&self, record: &ActionRecord) -> bool {
        self.matches_subject(&record.subject_before) || self.matches_subject(&record.subject_after)
    }
}

/// Caller-built filter specification, consumed once by `QueryEngine::lookup`
#[derive(Debug, Clone)]
pub struct Lookup {
    world: WorldId,
    region: Option<Region>,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    kinds: Option<BTreeSet<String>>,
    excluded_kinds: BTreeSet<String>,
    categories: Option<BTreeSet<Category>>,
    causer: Option<Causer>,
    blocks: Option<BlockFilter>,
    order: Order,
    limit: Option<usize>,
}

impl Lookup {
    /// Lookup over a whole world and all of time, newest first
    pub fn in_world(world: WorldId) -> Self {
        Self {
            world,
            region: None,
            from: DateTime::<Utc>::MIN_UTC,
            to: DateTime::<Utc>::MAX_UTC,
            kinds: None,
            excluded_kinds: BTreeSet::new(),
            categories: None,
            causer: None,
            blocks: None,
            order: Order::Descending,
            limit: None,
        }
    }

    /// Restrict to a spatial region
    pub fn within(mut self, region: Region) -> Self {
        self.region = Some(region);
        self
    }

    /// Restrict to `[from, to)`
    pub fn between(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    /// Restrict to records at or after `from`
    pub fn since(mut self, from: DateTime<Utc>) -> Self {
        self.from = from;
        self
    }

    /// Restrict to records before `to` (exclusive)
    pub fn until(mut self, to: DateTime<Utc>) -> Self {
        self.to = to;
        self
    }

    /// Allow only the given kinds
    pub fn kinds<I, K>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        self.kinds = Some(kinds.into_iter().map(Into::into).collect());
        self
    }

    /// Exclude a kind, independently of the allow-list
    pub fn exclude_kind(mut self, kind: impl Into<String>) -> Self {
        self.excluded_kinds.insert(kind.into());
        self
    }

    /// Allow only the given categories
    pub fn categories<I>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = Category>,
    {
        self.categories = Some(categories.into_iter().collect());
        self
    }

    /// Restrict to one causer, exact identity match
    pub fn by(mut self, causer: Causer) -> Self {
        self.causer = Some(causer);
        self
    }

    /// Restrict to records matching block signatures
    pub fn blocks(mut self, filter: BlockFilter) -> Self {
        self.blocks = Some(filter);
        self
    }

    /// Oldest first instead of the default newest first
    pub fn ascending(mut self) -> Self {
        self.order = Order::Ascending;
        self
    }

    /// Stop after `limit` matches
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// The kinds that remain allowed after exclusion, if an allow-list is set
    fn effective_kinds(&self) -> Option<Vec<String>> {
        self.kinds.as_ref().map(|allowed| {
            allowed
                .iter()
                .filter(|kind| !self.excluded_kinds.contains(*kind))
                .cloned()
                .collect()
        })
    }

    /// Fail fast on malformed specifications
    fn validate(&self) -> Result<()> {
        if self.from > self.to {
            return Err(Error::InvalidQuery(format!(
                "time range starts after it ends: {} > {}",
                self.from, self.to
            )));
        }
        if let Some(effective) = self.effective_kinds() {
            if effective.is_empty() {
                return Err(Error::InvalidQuery(
                    "kind allow-list is empty after exclusions".to_string(),
                ));
            }
        }
        if let Some(blocks) = &self.blocks {
            if blocks.is_empty() {
                return Err(Error::InvalidQuery(
                    "block filter carries no signatures".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Whether a fetched record satisfies every residual predicate
    fn matches(&self, record: &ActionRecord) -> bool {
        if record.location.world != self.world {
            return false;
        }
        if let Some(region) = &self.region {
            if !region.contains(record.location.pos) {
                return false;
            }
        }
        if record.timestamp < self.from || record.timestamp >= self.to {
            return false;
        }
        if self.excluded_kinds.contains(&record.kind) {
            return false;
        }
        if let Some(kinds) = &self.kinds {
            if !kinds.contains(&record.kind) {
                return false;
            }
        }
        if let Some(categories) = &self.categories {
            if !categories.contains(&record.category) {
                return false;
            }
        }
        if let Some(causer) = &self.causer {
            if record.causer != *causer {
                return false;
            }
        }
        if let Some(blocks) = &self.blocks {
            if !blocks.matches_record(record) {
                return false;
            }
        }
        true
    }

    /// Pick the index that prunes the most, then let `matches` do the rest
    fn plan(&self) -> ScanPlan {
        let index = if let Some(causer) = &self.causer {
            IndexSelect::Causer(causer.clone())
        } else if let Some(effective) = self.effective_kinds() {
            IndexSelect::Kinds(effective)
        } else {
            IndexSelect::World(self.world)
        };
        ScanPlan {
            index,
            from_micros: to_micros(self.from),
            to_micros: to_micros(self.to),
            ascending: self.order == Order::Ascending,
        }
    }
}

/// Read-only lookups over an action store
pub struct QueryEngine<S> {
    store: Arc<S>,
}

impl<S: ActionStore> QueryEngine<S> {
    /// Create a query engine over a store
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Run a lookup
    ///
    /// Validates the specification, scans the chosen index once, and
    /// returns the lazy result sequence. Abandoning the sequence early is
    /// always safe.
    pub fn lookup(&self, spec: &Lookup) -> Result<LookupResults<S>> {
        spec.validate()?;
        let candidates = self.store.scan(&spec.plan())?;
        Ok(LookupResults {
            store: Arc::clone(&self.store),
            spec: spec.clone(),
            candidates,
            cursor: 0,
            yielded: 0,
        })
    }
}

/// Lazy sequence of matching records
///
/// Records are fetched and filtered one candidate at a time; a display that
/// stops after ten matches never fetches the eleventh. The candidate set is
/// pinned at lookup time, so `restart` replays the same sequence once more
/// without touching the index again.
pub struct LookupResults<S> {
    store: Arc<S>,
    spec: Lookup,
    candidates: Vec<ActionId>,
    cursor: usize,
    yielded: usize,
}

impl<S> LookupResults<S> {
    /// Number of index candidates (records still get filtered on iteration)
    pub fn candidate_count(&self) -> usize {
        self.candidates.len()
    }

    /// Rewind to the start of the pinned candidate set
    pub fn restart(mut self) -> Self {
        self.cursor = 0;
        self.yielded = 0;
        self
    }
}

impl<S: ActionStore> Iterator for LookupResults<S> {
    type Item = ActionRecord;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(limit) = self.spec.limit {
            if self.yielded >= limit {
                return None;
            }
        }
        while self.cursor < self.candidates.len() {
            let id = self.candidates[self.cursor];
            self.cursor += 1;
            // A candidate that vanished mid-iteration is just skipped
            let Ok(Some(record)) = self.store.fetch(id) else {
                continue;
            };
            if self.spec.matches(&record) {
                self.yielded += 1;
                return Some(record);
            }
        }
        None
    }
}

/// Helper for rollback-style consumers: the subjects to replay, newest first
///
/// Not a state mutation engine; it merely orders what a restore routine
/// would walk.
pub fn rollback_order(results: LookupResults<impl ActionStore>) -> Vec<ActionRecord> {
    let mut records: Vec<ActionRecord> = results.collect();
    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
    records
}

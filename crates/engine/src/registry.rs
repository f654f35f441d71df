//! Action kind registry
//!
//! A fixed catalog mapping each stable kind key to its descriptor. The
//! descriptor bundles everything per-kind behavior needs: activation against
//! the live config, the attach predicate, the merge rule, the grouping
//! scope and the category. Built once at startup from the compiled-in kinds
//! and immutable afterwards; there is no dynamic kind loading.

use crate::occurrence::Occurrence;
use chronik_core::config::ChronikConfig;
use chronik_core::error::{Error, Result};
use chronik_core::record::{ActionRecord, RecordPatch};
use chronik_core::traits::EffectiveKey;
use chronik_core::types::Category;
use std::collections::HashMap;

/// Which grouping key a kind merges under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyScope {
    /// Merge candidates share the affected location
    Location,
    /// Merge candidates share the causer
    Causer,
    /// Merge candidates share the effect source
    Source,
}

/// Activation predicate against the live configuration
pub type ActiveFn = fn(&ChronikConfig) -> bool;

/// Attach predicate: may this occurrence fold into the existing record?
///
/// Both are guaranteed to be of the same kind and effective key; the
/// predicate only decides the kind-specific tie-breaks (same material, same
/// player, time window).
pub type AttachFn = fn(&ChronikConfig, &Occurrence, &ActionRecord) -> bool;

/// Merge rule: the patch folding an occurrence into the existing record
pub type MergeFn = fn(&Occurrence, &ActionRecord) -> RecordPatch;

/// Descriptor of one action kind
#[derive(Debug, Clone)]
pub struct ActionKind {
    /// Stable key, e.g. "water-break"
    pub key: &'static str,
    /// Coarse classification
    pub category: Category,
    /// Grouping scope for merge lookups
    pub scope: KeyScope,
    /// Activation predicate
    pub active: ActiveFn,
    /// Attach predicate
    pub attach: AttachFn,
    /// Merge rule
    pub merge: MergeFn,
}

impl ActionKind {
    /// Whether this kind should currently be recorded
    pub fn is_active(&self, config: &ChronikConfig) -> bool {
        (self.active)(config)
    }

    /// Whether the occurrence may fold into the existing record
    pub fn can_attach(
        &self,
        config: &ChronikConfig,
        occurrence: &Occurrence,
        existing: &ActionRecord,
    ) -> bool {
        (self.attach)(config, occurrence, existing)
    }

    /// Build the merge patch for the occurrence
    pub fn merge_patch(&self, occurrence: &Occurrence, existing: &ActionRecord) -> RecordPatch {
        (self.merge)(occurrence, existing)
    }

    /// The effective key grouping this occurrence with merge candidates
    pub fn effective_key(&self, occurrence: &Occurrence) -> EffectiveKey {
        match self.scope {
            KeyScope::Location => EffectiveKey::Location(occurrence.location),
            KeyScope::Causer => EffectiveKey::Causer(occurrence.causer.clone()),
            KeyScope::Source => {
                EffectiveKey::Source(occurrence.source.unwrap_or(occurrence.location))
            }
        }
    }
}

/// Immutable catalog of registered action kinds
#[derive(Debug, Default)]
pub struct ActionRegistry {
    kinds: HashMap<&'static str, ActionKind>,
}

impl ActionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the full compiled-in catalog
    pub fn builtin() -> Result<Self> {
        let mut registry = Self::new();
        for kind in crate::kinds::catalog() {
            registry.register(kind)?;
        }
        Ok(registry)
    }

    /// Register a kind descriptor
    ///
    /// Fails with `DuplicateKind` if the key is already taken; a duplicate
    /// is a startup-time conflict and should abort the embedding process.
    pub fn register(&mut self, kind: ActionKind) -> Result<()> {
        if self.kinds.contains_key(kind.key) {
            return Err(Error::DuplicateKind(kind.key.to_string()));
        }
        self.kinds.insert(kind.key, kind);
        Ok(())
    }

    /// Resolve a kind key to its descriptor
    pub fn resolve(&self, key: &str) -> Result<&ActionKind> {
        self.kinds
            .get(key)
            .ok_or_else(|| Error::UnknownKind(key.to_string()))
    }

    /// Whether a key is registered
    pub fn contains(&self, key: &str) -> bool {
        self.kinds.contains_key(key)
    }

    /// All registered kind keys
    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.kinds.keys().copied()
    }

    /// All kind keys in a category
    pub fn keys_in(&self, category: Category) -> Vec<&'static str> {
        self.kinds
            .values()
            .filter(|kind| kind.category == category)
            .map(|kind| kind.key)
            .collect()
    }

    /// Number of registered kinds
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// True when no kinds are registered
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinds;
    use chronik_core::types::{Causer, Location, PlayerId, WorldId};
    use chrono::Utc;

    fn dummy(key: &'static str, scope: KeyScope) -> ActionKind {
        ActionKind {
            key,
            category: Category::Block,
            scope,
            active: |_| true,
            attach: |_, _, _| false,
            merge: |occ, _| RecordPatch::count_only(occ.timestamp),
        }
    }

    #[test]
    fn test_register_and_resolve() {
        let mut registry = ActionRegistry::new();
        registry.register(dummy("x-test", KeyScope::Location)).unwrap();
        assert!(registry.contains("x-test"));
        assert_eq!(registry.resolve("x-test").unwrap().key, "x-test");
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut registry = ActionRegistry::new();
        registry.register(dummy("x-test", KeyScope::Location)).unwrap();
        let err = registry.register(dummy("x-test", KeyScope::Causer)).unwrap_err();
        assert!(matches!(err, Error::DuplicateKind(_)));
        // The first registration survives
        assert_eq!(registry.resolve("x-test").unwrap().scope, KeyScope::Location);
    }

    #[test]
    fn test_resolve_unknown_fails() {
        let registry = ActionRegistry::new();
        assert!(matches!(
            registry.resolve("no-such-kind"),
            Err(Error::UnknownKind(_))
        ));
    }

    #[test]
    fn test_builtin_catalog_registers_every_kind() {
        let registry = ActionRegistry::builtin().unwrap();
        assert_eq!(registry.len(), kinds::catalog().len());
        assert!(registry.contains(kinds::keys::WATER_BREAK));
        assert!(registry.contains(kinds::keys::PLAYER_QUIT));
    }

    #[test]
    fn test_effective_key_follows_scope() {
        let world = WorldId::new();
        let player = Causer::player(PlayerId::new());
        let at = Location::at(world, 1, 2, 3);
        let source = Location::at(world, 1, 3, 3);
        let occ = Occurrence::new("x-test", Utc::now(), at)
            .with_causer(player.clone())
            .with_source(source);

        let by_location = dummy("a", KeyScope::Location);
        let by_causer = dummy("b", KeyScope::Causer);
        let by_source = dummy("c", KeyScope::Source);
        assert_eq!(by_location.effective_key(&occ), EffectiveKey::Location(at));
        assert_eq!(by_causer.effective_key(&occ), EffectiveKey::Causer(player));
        assert_eq!(by_source.effective_key(&occ), EffectiveKey::Source(source));
    }

    #[test]
    fn test_source_scope_falls_back_to_location() {
        let at = Location::at(WorldId::new(), 1, 2, 3);
        let occ = Occurrence::new("x-test", Utc::now(), at);
        let by_source = dummy("c", KeyScope::Source);
        assert_eq!(by_source.effective_key(&occ), EffectiveKey::Source(at));
    }

    #[test]
    fn test_keys_in_category() {
        let registry = ActionRegistry::builtin().unwrap();
        let water = registry.keys_in(Category::Water);
        assert!(water.contains(&kinds::keys::WATER_BREAK));
        assert!(!water.contains(&kinds::keys::PLAYER_QUIT));
    }
}

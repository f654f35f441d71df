//! The compiled-in action kind catalog
//!
//! One module per family. Each family defines its kind descriptors and the
//! occurrence constructors mapping host-runtime state into payloads; the
//! shared attach predicates and merge rules live here.
//!
//! Attach rules are deliberately per-kind. A fluid break only folds into a
//! record flushing the same material; a repeater change only folds into the
//! same player fiddling within the configured window; an entity changing a
//! block never folds at all. Without these merges a single burst (a hundred
//! sand blocks flooded away, a repeater flicked fifty times) would explode
//! into a record per occurrence.

pub mod block;
pub mod entity;
pub mod flow;
pub mod ignite;
pub mod interact;
pub mod player;

use crate::occurrence::Occurrence;
use crate::registry::ActionKind;
use chronik_core::config::ChronikConfig;
use chronik_core::record::{ActionRecord, RecordPatch};
use chronik_core::value::BlockState;

/// Stable kind keys
pub mod keys {
    /// Player broke a block
    pub const BLOCK_BREAK: &str = "block-break";
    /// Player placed a block
    pub const BLOCK_PLACE: &str = "block-place";
    /// Water flushed a block away
    pub const WATER_BREAK: &str = "water-break";
    /// Water solidified into a block
    pub const WATER_FORM: &str = "water-form";
    /// Lava destroyed a block
    pub const LAVA_BREAK: &str = "lava-break";
    /// Lava solidified into a block
    pub const LAVA_FORM: &str = "lava-form";
    /// Lava set a block on fire
    pub const LAVA_IGNITE: &str = "lava-ignite";
    /// Lightning set a block on fire
    pub const LIGHTNING_IGNITE: &str = "lightning-ignite";
    /// Player changed a repeater's delay
    pub const REPEATER_CHANGE: &str = "repeater-change";
    /// Player changed a note block's pitch
    pub const NOTEBLOCK_CHANGE: &str = "noteblock-change";
    /// Player joined the server
    pub const PLAYER_JOIN: &str = "player-join";
    /// Player left the server
    pub const PLAYER_QUIT: &str = "player-quit";
    /// Entity changed a block
    pub const ENTITY_CHANGE: &str = "entity-change";
    /// Entity got killed
    pub const ENTITY_KILL: &str = "entity-kill";
}

/// The full compiled-in catalog
pub fn catalog() -> Vec<ActionKind> {
    let mut kinds = Vec::new();
    kinds.extend(block::kinds());
    kinds.extend(flow::kinds());
    kinds.extend(ignite::kinds());
    kinds.extend(interact::kinds());
    kinds.extend(player::kinds());
    kinds.extend(entity::kinds());
    kinds
}

// === Shared attach predicates ===

/// Never fold; every occurrence gets its own record
pub(crate) fn never_attach(_: &ChronikConfig, _: &Occurrence, _: &ActionRecord) -> bool {
    false
}

/// Occurrence and record are close enough in time, per the kind's horizon
pub(crate) fn within_window(
    config: &ChronikConfig,
    occurrence: &Occurrence,
    existing: &ActionRecord,
) -> bool {
    let window = config.attach.horizon_for(occurrence.kind);
    let gap = occurrence.timestamp - existing.timestamp;
    gap.abs() < window
}

/// Same causer identity
pub(crate) fn same_causer(occurrence: &Occurrence, existing: &ActionRecord) -> bool {
    occurrence.causer == existing.causer
}

/// Both subjects-before parse as blocks of the same material
pub(crate) fn same_before_material(occurrence: &Occurrence, existing: &ActionRecord) -> bool {
    match (
        BlockState::from_value(&occurrence.subject_before),
        BlockState::from_value(&existing.subject_before),
    ) {
        (Some(a), Some(b)) => a.material == b.material,
        _ => false,
    }
}

/// Same before AND after materials (the full block-change signature)
pub(crate) fn same_block_change(occurrence: &Occurrence, existing: &ActionRecord) -> bool {
    let after = match (
        BlockState::from_value(&occurrence.subject_after),
        BlockState::from_value(&existing.subject_after),
    ) {
        (Some(a), Some(b)) => a.material == b.material,
        _ => false,
    };
    after && same_before_material(occurrence, existing)
}

// === Shared merge rules ===

/// Count the occurrence and refresh the timestamp, nothing else
pub(crate) fn merge_count_only(occurrence: &Occurrence, _: &ActionRecord) -> RecordPatch {
    RecordPatch::count_only(occurrence.timestamp)
}

/// The latest occurrence's after-state wins
pub(crate) fn merge_latest_after(occurrence: &Occurrence, _: &ActionRecord) -> RecordPatch {
    RecordPatch {
        timestamp: occurrence.timestamp,
        subject_after: Some(occurrence.subject_after.clone()),
        additional: None,
    }
}

/// The latest occurrence's extra fields win
pub(crate) fn merge_latest_additional(occurrence: &Occurrence, _: &ActionRecord) -> RecordPatch {
    RecordPatch {
        timestamp: occurrence.timestamp,
        subject_after: None,
        additional: Some(occurrence.additional.clone()),
    }
}

/// Build a record directly from an occurrence, for attach-rule tests
#[cfg(test)]
pub(crate) fn record_of(
    occurrence: &Occurrence,
    category: chronik_core::types::Category,
) -> ActionRecord {
    use chronik_core::record::ActionDraft;
    use chronik_core::types::ActionId;

    let draft = ActionDraft {
        kind: occurrence.kind.to_string(),
        category,
        timestamp: occurrence.timestamp,
        location: occurrence.location,
        causer: occurrence.causer.clone(),
        subject_before: occurrence.subject_before.clone(),
        subject_after: occurrence.subject_after.clone(),
        additional: occurrence.additional.clone(),
    };
    ActionRecord::from_draft(ActionId::from_raw(1), draft)
}

//! Ignition actions
//!
//! Fire starting from lava or lightning. Ignitions group by the source of
//! the effect rather than the block that caught fire: one lava pool setting
//! the forest alight is one record.

use super::{keys, merge_count_only, within_window};
use crate::occurrence::Occurrence;
use crate::registry::{ActionKind, KeyScope};
use chronik_core::config::ChronikConfig;
use chronik_core::record::ActionRecord;
use chronik_core::types::{Category, Location};
use chronik_core::value::BlockState;
use chrono::{DateTime, Utc};

/// Kinds of this family
pub(crate) fn kinds() -> Vec<ActionKind> {
    vec![lava_ignite(), lightning_ignite()]
}

fn lava_ignite() -> ActionKind {
    ActionKind {
        key: keys::LAVA_IGNITE,
        category: Category::Fire,
        scope: KeyScope::Source,
        active: lava_ignite_active,
        attach: attach_within_window,
        merge: merge_count_only,
    }
}

fn lightning_ignite() -> ActionKind {
    ActionKind {
        key: keys::LIGHTNING_IGNITE,
        category: Category::Fire,
        scope: KeyScope::Source,
        active: lightning_ignite_active,
        attach: attach_within_window,
        merge: merge_count_only,
    }
}

fn lava_ignite_active(config: &ChronikConfig) -> bool {
    config.records(keys::LAVA_IGNITE, Category::Fire)
}

fn lightning_ignite_active(config: &ChronikConfig) -> bool {
    config.records(keys::LIGHTNING_IGNITE, Category::Fire)
}

fn attach_within_window(
    config: &ChronikConfig,
    occurrence: &Occurrence,
    existing: &ActionRecord,
) -> bool {
    within_window(config, occurrence, existing)
}

/// Lava set the block at `at` on fire
pub fn lava_ignite_at(at: Location, source: Location, when: DateTime<Utc>) -> Occurrence {
    Occurrence::new(keys::LAVA_IGNITE, when, at)
        .with_subjects(BlockState::of("air").to_value(), BlockState::of("fire").to_value())
        .with_source(source)
}

/// A lightning strike set the block at `at` on fire
pub fn lightning_ignite_at(at: Location, when: DateTime<Utc>) -> Occurrence {
    Occurrence::new(keys::LIGHTNING_IGNITE, when, at)
        .with_subjects(BlockState::of("air").to_value(), BlockState::of("fire").to_value())
}

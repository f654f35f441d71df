//! Player block interactions
//!
//! Repeated fiddling with the same mechanism folds into one record when the
//! same player keeps at it within the window; the final state wins, so a
//! repeater flicked fifty times reads as one delay change.

use super::{keys, merge_latest_after, same_causer, within_window};
use crate::occurrence::Occurrence;
use crate::registry::{ActionKind, KeyScope};
use chronik_core::config::ChronikConfig;
use chronik_core::record::ActionRecord;
use chronik_core::types::{Category, Causer, Location, PlayerId};
use chronik_core::value::BlockState;
use chrono::{DateTime, Utc};

/// Kinds of this family
pub(crate) fn kinds() -> Vec<ActionKind> {
    vec![repeater_change(), noteblock_change()]
}

fn repeater_change() -> ActionKind {
    ActionKind {
        key: keys::REPEATER_CHANGE,
        category: Category::Block,
        scope: KeyScope::Location,
        active: repeater_change_active,
        attach: attach_same_player_in_window,
        merge: merge_latest_after,
    }
}

fn noteblock_change() -> ActionKind {
    ActionKind {
        key: keys::NOTEBLOCK_CHANGE,
        category: Category::Block,
        scope: KeyScope::Location,
        active: noteblock_change_active,
        attach: attach_same_player_in_window,
        merge: merge_latest_after,
    }
}

fn repeater_change_active(config: &ChronikConfig) -> bool {
    config.records(keys::REPEATER_CHANGE, Category::Block)
}

fn noteblock_change_active(config: &ChronikConfig) -> bool {
    config.records(keys::NOTEBLOCK_CHANGE, Category::Block)
}

fn attach_same_player_in_window(
    config: &ChronikConfig,
    occurrence: &Occurrence,
    existing: &ActionRecord,
) -> bool {
    same_causer(occurrence, existing) && within_window(config, occurrence, existing)
}

/// A player changed a repeater's delay
pub fn repeater_change_by(
    player: PlayerId,
    at: Location,
    old: BlockState,
    new: BlockState,
    when: DateTime<Utc>,
) -> Occurrence {
    Occurrence::new(keys::REPEATER_CHANGE, when, at)
        .with_causer(Causer::player(player))
        .with_subjects(old.to_value(), new.to_value())
}

/// A player changed a note block's pitch
pub fn noteblock_change_by(
    player: PlayerId,
    at: Location,
    old: BlockState,
    new: BlockState,
    when: DateTime<Utc>,
) -> Occurrence {
    Occurrence::new(keys::NOTEBLOCK_CHANGE, when, at)
        .with_causer(Causer::player(player))
        .with_subjects(old.to_value(), new.to_value())
}

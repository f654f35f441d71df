//! Player block actions
//!
//! Breaking and placing. Two occurrences fold into one record when the same
//! player performs the same block change at the same location within the
//! configured window, so digging a sand column reads as one action.

use super::{keys, merge_latest_after, same_block_change, same_causer, within_window};
use crate::occurrence::Occurrence;
use crate::registry::{ActionKind, KeyScope};
use chronik_core::config::ChronikConfig;
use chronik_core::record::ActionRecord;
use chronik_core::types::{Category, Causer, Location, PlayerId};
use chronik_core::value::BlockState;
use chrono::{DateTime, Utc};

/// Kinds of this family
pub(crate) fn kinds() -> Vec<ActionKind> {
    vec![block_break(), block_place()]
}

fn block_break() -> ActionKind {
    ActionKind {
        key: keys::BLOCK_BREAK,
        category: Category::Block,
        scope: KeyScope::Location,
        active: block_break_active,
        attach: attach_same_player_change,
        merge: merge_latest_after,
    }
}

fn block_place() -> ActionKind {
    ActionKind {
        key: keys::BLOCK_PLACE,
        category: Category::Block,
        scope: KeyScope::Location,
        active: block_place_active,
        attach: attach_same_player_change,
        merge: merge_latest_after,
    }
}

fn block_break_active(config: &ChronikConfig) -> bool {
    config.records(keys::BLOCK_BREAK, Category::Block)
}

fn block_place_active(config: &ChronikConfig) -> bool {
    config.records(keys::BLOCK_PLACE, Category::Block)
}

fn attach_same_player_change(
    config: &ChronikConfig,
    occurrence: &Occurrence,
    existing: &ActionRecord,
) -> bool {
    same_causer(occurrence, existing)
        && same_block_change(occurrence, existing)
        && within_window(config, occurrence, existing)
}

/// A player broke a block
pub fn break_by(
    player: PlayerId,
    at: Location,
    broken: BlockState,
    when: DateTime<Utc>,
) -> Occurrence {
    Occurrence::new(keys::BLOCK_BREAK, when, at)
        .with_causer(Causer::player(player))
        .with_subjects(broken.to_value(), BlockState::of("air").to_value())
}

/// A player placed a block over the previous state
pub fn place_by(
    player: PlayerId,
    at: Location,
    replaced: BlockState,
    placed: BlockState,
    when: DateTime<Utc>,
) -> Occurrence {
    Occurrence::new(keys::BLOCK_PLACE, when, at)
        .with_causer(Causer::player(player))
        .with_subjects(replaced.to_value(), placed.to_value())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinds::record_of;
    use chronik_core::types::WorldId;
    use chrono::Duration;

    #[test]
    fn test_break_by_maps_subjects() {
        let at = Location::at(WorldId::new(), 3, 60, 3);
        let occ = break_by(PlayerId::new(), at, BlockState::of("stone"), Utc::now());
        assert_eq!(occ.kind, keys::BLOCK_BREAK);
        assert_eq!(
            BlockState::from_value(&occ.subject_before).unwrap().material,
            "stone"
        );
        assert_eq!(
            BlockState::from_value(&occ.subject_after).unwrap().material,
            "air"
        );
    }

    #[test]
    fn test_same_player_same_change_attaches() {
        let config = ChronikConfig::default();
        let at = Location::at(WorldId::new(), 3, 60, 3);
        let player = PlayerId::new();
        let base = Utc::now();
        let first = break_by(player, at, BlockState::of("sand"), base);
        let existing = record_of(&first, Category::Block);

        let again = break_by(player, at, BlockState::of("sand"), base + Duration::seconds(5));
        assert!((block_break().attach)(&config, &again, &existing));
    }

    #[test]
    fn test_different_player_never_attaches() {
        let config = ChronikConfig::default();
        let at = Location::at(WorldId::new(), 3, 60, 3);
        let base = Utc::now();
        let existing = record_of(
            &break_by(PlayerId::new(), at, BlockState::of("sand"), base),
            Category::Block,
        );
        let other = break_by(PlayerId::new(), at, BlockState::of("sand"), base);
        assert!(!(block_break().attach)(&config, &other, &existing));
    }

    #[test]
    fn test_different_material_never_attaches() {
        let config = ChronikConfig::default();
        let at = Location::at(WorldId::new(), 3, 60, 3);
        let player = PlayerId::new();
        let base = Utc::now();
        let existing = record_of(
            &break_by(player, at, BlockState::of("sand"), base),
            Category::Block,
        );
        let gravel = break_by(player, at, BlockState::of("gravel"), base);
        assert!(!(block_break().attach)(&config, &gravel, &existing));
    }

    #[test]
    fn test_place_merge_keeps_latest_after() {
        let at = Location::at(WorldId::new(), 3, 60, 3);
        let player = PlayerId::new();
        let base = Utc::now();
        let first = place_by(player, at, BlockState::of("air"), BlockState::of("dirt"), base);
        let existing = record_of(&first, Category::Block);

        let second = place_by(
            player,
            at,
            BlockState::of("air"),
            BlockState::of("dirt"),
            base + Duration::seconds(1),
        );
        let patch = block_place().merge_patch(&second, &existing);
        assert_eq!(patch.subject_after, Some(second.subject_after.clone()));
        assert_eq!(patch.timestamp, second.timestamp);
    }
}

//! Fluid flow actions
//!
//! Water and lava breaking or forming blocks. A flow break folds into the
//! prior record only when the same material got flushed, which is what makes
//! "5 sand blocks got flushed away" one record instead of five.

use super::{keys, merge_count_only, merge_latest_after, same_before_material};
use crate::occurrence::Occurrence;
use crate::registry::{ActionKind, KeyScope};
use chronik_core::config::ChronikConfig;
use chronik_core::record::ActionRecord;
use chronik_core::types::{Category, Location};
use chronik_core::value::BlockState;
use chrono::{DateTime, Utc};

/// Kinds of this family
pub(crate) fn kinds() -> Vec<ActionKind> {
    vec![water_break(), water_form(), lava_break(), lava_form()]
}

fn water_break() -> ActionKind {
    ActionKind {
        key: keys::WATER_BREAK,
        category: Category::Water,
        scope: KeyScope::Location,
        active: water_break_active,
        attach: attach_same_flushed,
        merge: merge_count_only,
    }
}

fn water_form() -> ActionKind {
    ActionKind {
        key: keys::WATER_FORM,
        category: Category::Water,
        scope: KeyScope::Location,
        active: water_form_active,
        attach: attach_same_flushed,
        merge: merge_latest_after,
    }
}

fn lava_break() -> ActionKind {
    ActionKind {
        key: keys::LAVA_BREAK,
        category: Category::Lava,
        scope: KeyScope::Location,
        active: lava_break_active,
        attach: attach_same_flushed,
        merge: merge_count_only,
    }
}

fn lava_form() -> ActionKind {
    ActionKind {
        key: keys::LAVA_FORM,
        category: Category::Lava,
        scope: KeyScope::Location,
        active: lava_form_active,
        attach: attach_same_flushed,
        merge: merge_latest_after,
    }
}

fn water_break_active(config: &ChronikConfig) -> bool {
    config.records(keys::WATER_BREAK, Category::Water)
}

fn water_form_active(config: &ChronikConfig) -> bool {
    config.records(keys::WATER_FORM, Category::Water)
}

fn lava_break_active(config: &ChronikConfig) -> bool {
    config.records(keys::LAVA_BREAK, Category::Lava)
}

fn lava_form_active(config: &ChronikConfig) -> bool {
    config.records(keys::LAVA_FORM, Category::Lava)
}

fn attach_same_flushed(
    _: &ChronikConfig,
    occurrence: &Occurrence,
    existing: &ActionRecord,
) -> bool {
    same_before_material(occurrence, existing)
}

/// Water flushed a block away
pub fn water_break_at(at: Location, flushed: BlockState, when: DateTime<Utc>) -> Occurrence {
    Occurrence::new(keys::WATER_BREAK, when, at)
        .with_subjects(flushed.to_value(), BlockState::of("water").to_value())
}

/// Lava destroyed a block
pub fn lava_break_at(at: Location, destroyed: BlockState, when: DateTime<Utc>) -> Occurrence {
    Occurrence::new(keys::LAVA_BREAK, when, at)
        .with_subjects(destroyed.to_value(), BlockState::of("lava").to_value())
}

/// Water solidified into a block (e.g. obsidian, cobblestone)
pub fn water_form_at(
    at: Location,
    previous: BlockState,
    formed: BlockState,
    when: DateTime<Utc>,
) -> Occurrence {
    Occurrence::new(keys::WATER_FORM, when, at).with_subjects(previous.to_value(), formed.to_value())
}

/// Lava solidified into a block
pub fn lava_form_at(
    at: Location,
    previous: BlockState,
    formed: BlockState,
    when: DateTime<Utc>,
) -> Occurrence {
    Occurrence::new(keys::LAVA_FORM, when, at).with_subjects(previous.to_value(), formed.to_value())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinds::record_of;
    use chronik_core::types::WorldId;
    use chrono::Duration;

    #[test]
    fn test_water_break_category() {
        assert_eq!(water_break().category, Category::Water);
        assert_eq!(lava_break().category, Category::Lava);
    }

    #[test]
    fn test_same_material_attaches() {
        let config = ChronikConfig::default();
        let at = Location::at(WorldId::new(), 10, 64, 10);
        let base = Utc::now();
        let existing = record_of(
            &water_break_at(at, BlockState::of("sand"), base),
            Category::Water,
        );
        let next = water_break_at(at, BlockState::of("sand"), base + Duration::milliseconds(200));
        assert!(water_break().can_attach(&config, &next, &existing));
    }

    #[test]
    fn test_different_material_does_not_attach() {
        let config = ChronikConfig::default();
        let at = Location::at(WorldId::new(), 10, 64, 10);
        let base = Utc::now();
        let existing = record_of(
            &water_break_at(at, BlockState::of("sand"), base),
            Category::Water,
        );
        let gravel = water_break_at(at, BlockState::of("gravel"), base);
        assert!(!water_break().can_attach(&config, &gravel, &existing));
    }

    #[test]
    fn test_break_merge_only_counts() {
        let at = Location::at(WorldId::new(), 10, 64, 10);
        let base = Utc::now();
        let existing = record_of(
            &water_break_at(at, BlockState::of("sand"), base),
            Category::Water,
        );
        let next = water_break_at(at, BlockState::of("sand"), base + Duration::seconds(1));
        let patch = water_break().merge_patch(&next, &existing);
        assert!(patch.subject_after.is_none());
        assert!(patch.additional.is_none());
        assert_eq!(patch.timestamp, next.timestamp);
    }

    #[test]
    fn test_form_merge_keeps_latest_after() {
        let at = Location::at(WorldId::new(), 10, 64, 10);
        let base = Utc::now();
        let existing = record_of(
            &lava_form_at(at, BlockState::of("water"), BlockState::of("obsidian"), base),
            Category::Lava,
        );
        let next = lava_form_at(
            at,
            BlockState::of("water"),
            BlockState::of("cobblestone"),
            base + Duration::seconds(2),
        );
        let patch = lava_form().merge_patch(&next, &existing);
        assert_eq!(patch.subject_after, Some(next.subject_after.clone()));
    }
}

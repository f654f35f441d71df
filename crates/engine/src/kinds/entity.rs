//! Entity actions
//!
//! Entities changing blocks and entities getting killed. Neither kind ever
//! folds; an enderman moving two blocks is two records, two deaths are two
//! records.

use super::{keys, merge_count_only, never_attach};
use crate::occurrence::Occurrence;
use crate::registry::{ActionKind, KeyScope};
use chronik_core::config::ChronikConfig;
use chronik_core::types::{Category, Causer, EntityRef, Location};
use chronik_core::value::{BlockState, Value};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Kinds of this family
pub(crate) fn kinds() -> Vec<ActionKind> {
    vec![entity_change(), entity_kill()]
}

fn entity_change() -> ActionKind {
    ActionKind {
        key: keys::ENTITY_CHANGE,
        category: Category::Entity,
        scope: KeyScope::Location,
        active: entity_change_active,
        attach: never_attach,
        merge: merge_count_only,
    }
}

fn entity_kill() -> ActionKind {
    ActionKind {
        key: keys::ENTITY_KILL,
        category: Category::Entity,
        scope: KeyScope::Location,
        active: entity_kill_active,
        attach: never_attach,
        merge: merge_count_only,
    }
}

fn entity_change_active(config: &ChronikConfig) -> bool {
    config.records(keys::ENTITY_CHANGE, Category::Entity)
}

fn entity_kill_active(config: &ChronikConfig) -> bool {
    config.records(keys::ENTITY_KILL, Category::Entity)
}

/// An entity changed a block
pub fn block_change(
    entity: EntityRef,
    at: Location,
    old: BlockState,
    new: BlockState,
    when: DateTime<Utc>,
) -> Occurrence {
    Occurrence::new(keys::ENTITY_CHANGE, when, at)
        .with_causer(Causer::Entity(entity))
        .with_subjects(old.to_value(), new.to_value())
}

/// An entity got killed
///
/// The victim goes into the subject, the damage cause into `additional`.
pub fn kill(
    killer: Causer,
    at: Location,
    victim: EntityRef,
    cause: &str,
    when: DateTime<Utc>,
) -> Occurrence {
    let mut subject = BTreeMap::new();
    subject.insert(
        "entity_type".to_string(),
        Value::Text(victim.entity_type.clone()),
    );
    subject.insert("entity_id".to_string(), Value::Int(victim.entity_id as i64));

    Occurrence::new(keys::ENTITY_KILL, when, at)
        .with_causer(killer)
        .with_subjects(Value::Map(subject), Value::Null)
        .with_additional("cause", Value::from(cause))
}

//! Player lifecycle actions
//!
//! Joins and quits group by the player rather than by location; repeated
//! quits by the same player fold into one record, joins never fold.

use super::{keys, merge_latest_additional, never_attach, same_causer};
use crate::occurrence::Occurrence;
use crate::registry::{ActionKind, KeyScope};
use chronik_core::config::ChronikConfig;
use chronik_core::record::ActionRecord;
use chronik_core::types::{Category, Causer, Location, PlayerId};
use chronik_core::value::Value;
use chrono::{DateTime, Utc};

/// Kinds of this family
pub(crate) fn kinds() -> Vec<ActionKind> {
    vec![player_join(), player_quit()]
}

fn player_join() -> ActionKind {
    ActionKind {
        key: keys::PLAYER_JOIN,
        category: Category::Player,
        scope: KeyScope::Causer,
        active: player_join_active,
        attach: never_attach,
        merge: merge_latest_additional,
    }
}

fn player_quit() -> ActionKind {
    ActionKind {
        key: keys::PLAYER_QUIT,
        category: Category::Player,
        scope: KeyScope::Causer,
        active: player_quit_active,
        attach: attach_same_player,
        merge: merge_latest_additional,
    }
}

fn player_join_active(config: &ChronikConfig) -> bool {
    config.records(keys::PLAYER_JOIN, Category::Player)
}

fn player_quit_active(config: &ChronikConfig) -> bool {
    config.records(keys::PLAYER_QUIT, Category::Player)
}

fn attach_same_player(
    _: &ChronikConfig,
    occurrence: &Occurrence,
    existing: &ActionRecord,
) -> bool {
    same_causer(occurrence, existing)
}

/// A player joined the server at `at`
pub fn join(player: PlayerId, at: Location, when: DateTime<Utc>) -> Occurrence {
    Occurrence::new(keys::PLAYER_JOIN, when, at).with_causer(Causer::player(player))
}

/// A player left the server at `at`
pub fn quit(
    player: PlayerId,
    at: Location,
    reason: Option<&str>,
    when: DateTime<Utc>,
) -> Occurrence {
    let occ = Occurrence::new(keys::PLAYER_QUIT, when, at).with_causer(Causer::player(player));
    match reason {
        Some(reason) => occ.with_additional("reason", Value::from(reason)),
        None => occ,
    }
}

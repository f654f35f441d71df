//! Action records: the persisted, possibly-aggregated log entries
//!
//! An `ActionRecord` is one logged occurrence, or several folded into one.
//! After creation only a merge may touch it, and a merge may only change
//! `subject_after`, `additional`, `attached_count` and `timestamp`. The
//! `RecordPatch` type is the entire mutation vocabulary the storage adapter
//! accepts, so the frozen fields cannot change by construction.

use crate::types::{ActionId, Category, Causer, Location};
use crate::value::Value;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A record as handed to the storage adapter, before an id is assigned
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDraft {
    /// Stable key of the kind that produced this record
    pub kind: String,
    /// Coarse classification of the kind
    pub category: Category,
    /// Instant of the occurrence
    pub timestamp: DateTime<Utc>,
    /// Where it happened
    pub location: Location,
    /// Who did it
    pub causer: Causer,
    /// Kind-interpreted state before the occurrence
    pub subject_before: Value,
    /// Kind-interpreted state after the occurrence
    pub subject_after: Value,
    /// Kind-specific extra fields (damage cause, quit reason, ...)
    pub additional: BTreeMap<String, Value>,
}

/// One logged occurrence, or several folded into one record
///
/// `attached_count` starts at 1 and counts every occurrence merged into the
/// record; `timestamp` always reflects the latest of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    /// Storage-assigned identifier, unique and immutable
    pub id: ActionId,
    /// Stable key of the kind that produced this record
    pub kind: String,
    /// Coarse classification of the kind
    pub category: Category,
    /// Instant of the latest merged occurrence
    pub timestamp: DateTime<Utc>,
    /// Where it happened
    pub location: Location,
    /// Who did it
    pub causer: Causer,
    /// Kind-interpreted state before the first occurrence
    pub subject_before: Value,
    /// Kind-interpreted state after the latest occurrence
    pub subject_after: Value,
    /// Kind-specific extra fields
    pub additional: BTreeMap<String, Value>,
    /// Number of occurrences folded into this record
    pub attached_count: u32,
}

impl ActionRecord {
    /// Materialize a draft under a freshly assigned id
    pub fn from_draft(id: ActionId, draft: ActionDraft) -> Self {
        Self {
            id,
            kind: draft.kind,
            category: draft.category,
            timestamp: draft.timestamp,
            location: draft.location,
            causer: draft.causer,
            subject_before: draft.subject_before,
            subject_after: draft.subject_after,
            additional: draft.additional,
            attached_count: 1,
        }
    }

    /// Apply a merge patch
    ///
    /// Only the mergeable fields change; the patch carries the timestamp of
    /// the occurrence being folded in.
    pub fn apply(&mut self, patch: &RecordPatch) {
        self.attached_count = self.attached_count.saturating_add(1);
        self.timestamp = patch.timestamp;
        if let Some(after) = &patch.subject_after {
            self.subject_after = after.clone();
        }
        if let Some(additional) = &patch.additional {
            self.additional = additional.clone();
        }
    }

    /// True once at least one other occurrence has been folded in
    pub fn has_attached(&self) -> bool {
        self.attached_count > 1
    }
}

/// The closed mutation vocabulary for merging an occurrence into a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordPatch {
    /// Timestamp of the newly folded occurrence
    pub timestamp: DateTime<Utc>,
    /// Replacement for `subject_after`, if the kind's merge rule updates it
    pub subject_after: Option<Value>,
    /// Replacement for `additional`, if the kind's merge rule updates it
    pub additional: Option<BTreeMap<String, Value>>,
}

impl RecordPatch {
    /// A patch that only counts the occurrence and refreshes the timestamp
    pub fn count_only(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            subject_after: None,
            additional: None,
        }
    }
}

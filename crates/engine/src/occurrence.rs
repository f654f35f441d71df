//! Raw occurrences as reported by the host runtime
//!
//! An `Occurrence` is the typed notification the host runtime hands the
//! engine: one discrete state change, not yet classified, merged or stored.
//! The per-kind constructor functions in [`crate::kinds`] are the mapping
//! layer from host state to occurrence payloads; nothing else should build
//! occurrences by hand.

use chronik_core::record::ActionDraft;
use chronik_core::types::{Category, Causer, Location};
use chronik_core::value::Value;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// One raw event from the host runtime
#[derive(Debug, Clone, PartialEq)]
pub struct Occurrence {
    /// Stable key of the kind this occurrence belongs to
    pub kind: &'static str,
    /// Instant of the occurrence
    pub timestamp: DateTime<Utc>,
    /// Where it happened
    pub location: Location,
    /// Who did it
    pub causer: Causer,
    /// Kind-interpreted state before
    pub subject_before: Value,
    /// Kind-interpreted state after
    pub subject_after: Value,
    /// Kind-specific extra fields
    pub additional: BTreeMap<String, Value>,
    /// Source of the effect, for kinds grouped by cause (ignitions)
    pub source: Option<Location>,
}

impl Occurrence {
    /// Start a bare occurrence; the kind constructors fill in the rest
    pub fn new(kind: &'static str, timestamp: DateTime<Utc>, location: Location) -> Self {
        Self {
            kind,
            timestamp,
            location,
            causer: Causer::Environment,
            subject_before: Value::Null,
            subject_after: Value::Null,
            additional: BTreeMap::new(),
            source: None,
        }
    }

    /// Set the causer
    pub fn with_causer(mut self, causer: Causer) -> Self {
        self.causer = causer;
        self
    }

    /// Set before/after subjects
    pub fn with_subjects(mut self, before: Value, after: Value) -> Self {
        self.subject_before = before;
        self.subject_after = after;
        self
    }

    /// Add one extra field
    pub fn with_additional(mut self, field: impl Into<String>, value: Value) -> Self {
        self.additional.insert(field.into(), value);
        self
    }

    /// Set the effect source
    pub fn with_source(mut self, source: Location) -> Self {
        self.source = Some(source);
        self
    }

    /// Turn into a storage draft under the kind's category
    pub(crate) fn into_draft(self, category: Category) -> ActionDraft {
        ActionDraft {
            kind: self.kind.to_string(),
            category,
            timestamp: self.timestamp,
            location: self.location,
            causer: self.causer,
            subject_before: self.subject_before,
            subject_after: self.subject_after,
            additional: self.additional,
        }
    }
}

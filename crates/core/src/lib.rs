//! Core types and traits for the chronik action log
//!
//! This crate defines the foundational types used throughout the system:
//! - WorldId / PlayerId / EntityRef / Causer: identities
//! - BlockPos / Location: world coordinates
//! - ActionId / Category: record identity and coarse classification
//! - Value / BlockState: kind-interpreted structured payloads
//! - ActionDraft / ActionRecord / RecordPatch: the record data model
//! - ChronikConfig: recording toggles, attach bounds, retry policy
//! - ActionStore / EffectiveKey / ScanPlan: the storage adapter contract
//! - Error: error type hierarchy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod record;
pub mod traits;
pub mod types;
pub mod value;

// Re-export commonly used types and traits
pub use config::{AttachConfig, CategoryToggles, ChronikConfig, RetryConfig, CONFIG_FILE_NAME};
pub use error::{Error, Result};
pub use record::{ActionDraft, ActionRecord, RecordPatch};
pub use traits::{to_micros, ActionStore, EffectiveKey, IndexSelect, ScanPlan};
pub use types::{ActionId, BlockPos, Category, Causer, EntityRef, Location, PlayerId, WorldId};
pub use value::{BlockState, Value};

//! The chronik engine: kind catalog, attachment and queries
//!
//! This crate turns raw occurrences into aggregated action records and
//! answers retroactive lookups over them:
//! - `kinds`: the compiled-in action kind catalog with per-kind attach and
//!   merge rules, and the occurrence constructors mapping host state in
//! - `ActionRegistry`: the immutable kind key → descriptor catalog
//! - `Recorder`: the attachment engine deciding merge-vs-insert online
//! - `QueryEngine` / `Lookup`: multi-predicate retroactive queries

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod kinds;
mod occurrence;
mod query;
mod recorder;
mod registry;

pub use occurrence::Occurrence;
pub use query::{
    rollback_order, BlockFilter, BlockSignature, Lookup, LookupResults, Order, QueryEngine, Region,
};
pub use recorder::{Ingest, Recorder};
pub use registry::{ActionKind, ActionRegistry, ActiveFn, AttachFn, KeyScope, MergeFn};

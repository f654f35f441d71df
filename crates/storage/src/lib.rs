//! Storage engines for the chronik action log
//!
//! The embedded reference engine is `MemoryStore`: DashMap-sharded primary
//! table with time-ordered secondary indexes per world, kind and causer,
//! plus a bounded recent-entry index per effective key for merge lookups.
//!
//! External persistence engines implement `chronik_core::ActionStore` and
//! plug in behind the same trait.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod memory;
pub mod testing;

pub use memory::MemoryStore;

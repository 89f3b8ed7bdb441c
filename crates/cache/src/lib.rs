//! Entry cache for localns
//!
//! Synthesized file entries are expensive because each one carries a
//! signature. This crate keeps them in a bounded LRU keyed by local path and
//! hands them back only while their version still matches the file on disk.

pub mod entry_cache;
pub mod stats;

pub use entry_cache::{EntryCache, Lookup};
pub use stats::{CacheStatistics, StatsCollector};

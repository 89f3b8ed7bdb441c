//! Cache statistics tracking and reporting

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of entry cache activity
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStatistics {
    pub hits: u64,
    pub misses: u64,
    /// Entries removed because their version no longer matched
    pub stale_removals: u64,
    /// Entries pushed out by capacity pressure
    pub evictions: u64,
    pub inserts: u64,
    pub len: usize,
    pub capacity: usize,
}

/// Lock-free counters behind [`CacheStatistics`]
#[derive(Debug, Default)]
pub struct StatsCollector {
    hits: AtomicU64,
    misses: AtomicU64,
    stale_removals: AtomicU64,
    evictions: AtomicU64,
    inserts: AtomicU64,
}

impl StatsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stale(&self) {
        self.stale_removals.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_insert(&self) {
        self.inserts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self, len: usize, capacity: usize) -> CacheStatistics {
        CacheStatistics {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            stale_removals: self.stale_removals.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            inserts: self.inserts.load(Ordering::Relaxed),
            len,
            capacity,
        }
    }
}

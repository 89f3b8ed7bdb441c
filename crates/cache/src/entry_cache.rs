//! Bounded LRU of synthesized entries keyed by local path.
//!
//! Validity is decided by version equality alone; there is no time-based
//! expiry. LRU eviction is independent of that check: an evicted entry is
//! simply rebuilt on its next lookup.

use crate::stats::{CacheStatistics, StatsCollector};
use localns_core::{Entry, Error, Result, Version};
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Outcome of a version-checked lookup
#[derive(Debug, Clone)]
pub enum Lookup {
    /// Cached entry whose version matches
    Fresh(Arc<Entry>),
    /// A slot existed with another version and has been removed
    Stale,
    Missing,
}

/// Concurrency-safe entry cache.
///
/// Every operation runs under a single lock, so per-key behaviour is
/// linearizable and readers only ever see whole entries.
pub struct EntryCache {
    slots: Mutex<LruCache<PathBuf, Arc<Entry>>>,
    stats: StatsCollector,
    capacity: usize,
}

impl EntryCache {
    pub fn new(capacity: usize) -> Result<Self> {
        let cap = NonZeroUsize::new(capacity)
            .ok_or_else(|| Error::configuration("entry cache capacity must be non-zero"))?;
        Ok(Self {
            slots: Mutex::new(LruCache::new(cap)),
            stats: StatsCollector::new(),
            capacity,
        })
    }

    /// Look up `path`, accepting the slot only if it carries `version`.
    ///
    /// A slot with any other version is removed before returning
    /// [`Lookup::Stale`].
    pub fn lookup(&self, path: &Path, version: Version) -> Lookup {
        let mut slots = self.slots.lock();
        let cached_version = match slots.get(path) {
            Some(entry) if entry.version == version => {
                self.stats.record_hit();
                return Lookup::Fresh(Arc::clone(entry));
            }
            Some(entry) => entry.version,
            None => {
                self.stats.record_miss();
                return Lookup::Missing;
            }
        };
        slots.pop(path);
        drop(slots);

        self.stats.record_miss();
        self.stats.record_stale();
        tracing::debug!(
            path = %path.display(),
            cached = ?cached_version,
            current = ?version,
            "removed stale entry"
        );
        Lookup::Stale
    }

    /// Fetch without a version check, refreshing recency
    pub fn get(&self, path: &Path) -> Option<Arc<Entry>> {
        self.slots.lock().get(path).cloned()
    }

    /// Store `entry` for `path`.
    ///
    /// A slot already holding a newer version wins; this keeps a slow
    /// builder from replacing a fresher entry built concurrently.
    pub fn insert(&self, path: PathBuf, entry: Arc<Entry>) {
        let mut slots = self.slots.lock();
        if let Some(existing) = slots.peek(&path) {
            if existing.version > entry.version {
                return;
            }
        }
        self.stats.record_insert();
        if let Some((evicted, _)) = slots.push(path.clone(), entry) {
            if evicted != path {
                self.stats.record_eviction();
                tracing::trace!(path = %evicted.display(), "evicted entry");
            }
        }
    }

    /// Drop the slot for `path` whatever its version
    pub fn remove(&self, path: &Path) -> Option<Arc<Entry>> {
        self.slots.lock().pop(path)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.slots.lock().contains(path)
    }

    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn statistics(&self) -> CacheStatistics {
        self.stats.snapshot(self.len(), self.capacity)
    }
}

impl std::fmt::Debug for EntryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryCache")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use localns_core::{Attribute, ErrorKind, Packing, PathName, SignatureBuf, UserName};
    use std::thread;

    fn entry(name: &str, version: Version) -> Arc<Entry> {
        Arc::new(Entry {
            name: PathName::from(name),
            signed_name: PathName::from(name),
            link: None,
            attr: Attribute::None,
            packing: Packing::Plain,
            version,
            writer: UserName::new("u").unwrap(),
            content: None,
            signature: SignatureBuf::zeroed(),
            complete: true,
        })
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = EntryCache::new(0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Invalid);
    }

    #[test]
    fn test_version_checked_lookup() {
        let cache = EntryCache::new(4).unwrap();
        let path = PathBuf::from("/r/doc");
        let v1 = Version::new(100, 0);
        let v2 = Version::new(101, 0);

        assert!(matches!(cache.lookup(&path, v1), Lookup::Missing));

        let e = entry("u/doc", v1);
        cache.insert(path.clone(), Arc::clone(&e));
        match cache.lookup(&path, v1) {
            Lookup::Fresh(hit) => assert!(Arc::ptr_eq(&hit, &e)),
            other => panic!("expected fresh entry, got {other:?}"),
        }

        assert!(matches!(cache.lookup(&path, v2), Lookup::Stale));
        assert!(!cache.contains(&path));

        let stats = cache.statistics();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.stale_removals, 1);
        assert_eq!(stats.len, 0);
    }

    #[test]
    fn test_lru_eviction() {
        let cache = EntryCache::new(2).unwrap();
        let v = Version::new(1, 0);
        cache.insert(PathBuf::from("/r/a"), entry("u/a", v));
        cache.insert(PathBuf::from("/r/b"), entry("u/b", v));

        // Touch a so b becomes least recently used
        assert!(cache.get(Path::new("/r/a")).is_some());
        cache.insert(PathBuf::from("/r/c"), entry("u/c", v));

        assert!(cache.contains(Path::new("/r/a")));
        assert!(!cache.contains(Path::new("/r/b")));
        assert!(cache.contains(Path::new("/r/c")));
        assert_eq!(cache.statistics().evictions, 1);
    }

    #[test]
    fn test_replacing_same_key_is_not_an_eviction() {
        let cache = EntryCache::new(2).unwrap();
        let path = PathBuf::from("/r/a");
        cache.insert(path.clone(), entry("u/a", Version::new(1, 0)));
        cache.insert(path.clone(), entry("u/a", Version::new(2, 0)));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.statistics().evictions, 0);
        assert_eq!(cache.get(&path).unwrap().version, Version::new(2, 0));
    }

    #[test]
    fn test_older_entry_does_not_replace_newer() {
        let cache = EntryCache::new(2).unwrap();
        let path = PathBuf::from("/r/a");
        cache.insert(path.clone(), entry("u/a", Version::new(5, 0)));
        cache.insert(path.clone(), entry("u/a", Version::new(4, 0)));
        assert_eq!(cache.get(&path).unwrap().version, Version::new(5, 0));
    }

    #[test]
    fn test_remove_invalidates_any_version() {
        let cache = EntryCache::new(2).unwrap();
        let path = PathBuf::from("/r/a");
        let v5 = Version::new(5, 0);
        cache.insert(path.clone(), entry("u/a", v5));

        let removed = cache.remove(&path).unwrap();
        assert_eq!(removed.version, v5);
        assert!(cache.is_empty());
        assert!(cache.remove(&path).is_none());
        assert!(matches!(cache.lookup(&path, v5), Lookup::Missing));

        // With the newer slot gone an older version may be cached again
        let v4 = Version::new(4, 0);
        cache.insert(path.clone(), entry("u/a", v4));
        assert!(matches!(cache.lookup(&path, v4), Lookup::Fresh(_)));
        assert_eq!(cache.statistics().evictions, 0);
    }

    #[test]
    fn test_concurrent_access() {
        let cache = Arc::new(EntryCache::new(64).unwrap());
        let v = Version::new(7, 0);

        thread::scope(|s| {
            for t in 0..8 {
                let cache = Arc::clone(&cache);
                s.spawn(move || {
                    for i in 0..200 {
                        let path = PathBuf::from(format!("/r/f{}", (i + t) % 32));
                        match cache.lookup(&path, v) {
                            Lookup::Fresh(e) => assert_eq!(e.version, v),
                            _ => cache.insert(path, entry("u/f", v)),
                        }
                    }
                });
            }
        });

        let stats = cache.statistics();
        assert_eq!(stats.hits + stats.misses, 8 * 200);
        assert!(cache.len() <= 32);
        assert_eq!(stats.evictions, 0);
    }
}

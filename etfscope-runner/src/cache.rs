//! Explicit time-to-live caches owned by the caller.
//!
//! Nothing here is global: a batch run builds a [`HistoryStore`], hands it to
//! whoever needs bars, and drops it when done.

use std::collections::HashMap;
use std::hash::Hash;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use etfscope_core::PriceBar;

use crate::loader::{load_history_csv, LoadError};

/// Map whose entries expire `ttl` after insertion.
///
/// The `*_at` variants take the current instant explicitly so expiry can be
/// driven deterministically.
#[derive(Debug, Clone)]
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: HashMap<K, (Instant, V)>,
}

impl<K: Eq + Hash, V: Clone> TtlCache<K, V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    pub fn get_at(&self, key: &K, now: Instant) -> Option<V> {
        let (stored, value) = self.entries.get(key)?;
        if now.saturating_duration_since(*stored) < self.ttl {
            Some(value.clone())
        } else {
            None
        }
    }

    pub fn insert(&mut self, key: K, value: V) {
        self.insert_at(key, value, Instant::now());
    }

    pub fn insert_at(&mut self, key: K, value: V, now: Instant) {
        self.entries.insert(key, (now, value));
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.entries.remove(key).map(|(_, v)| v)
    }

    /// Drop expired entries; returns how many were removed.
    pub fn purge_expired_at(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        let ttl = self.ttl;
        self.entries
            .retain(|_, (stored, _)| now.saturating_duration_since(*stored) < ttl);
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Entries held, expired or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Cache hit/miss counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Loads history files once per TTL and shares the bars.
///
/// Safe to share across worker threads.
#[derive(Debug)]
pub struct HistoryStore {
    inner: Mutex<StoreState>,
}

#[derive(Debug)]
struct StoreState {
    cache: TtlCache<PathBuf, Arc<Vec<PriceBar>>>,
    stats: CacheStats,
}

impl HistoryStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(StoreState {
                cache: TtlCache::new(ttl),
                stats: CacheStats::default(),
            }),
        }
    }

    pub fn load(&self, path: &Path) -> Result<Arc<Vec<PriceBar>>, LoadError> {
        if let Some(bars) = self.lock().lookup(path) {
            return Ok(bars);
        }
        // Parse outside the lock; two threads racing on one path both load.
        let bars = Arc::new(load_history_csv(path)?);
        self.lock().cache.insert(path.to_path_buf(), Arc::clone(&bars));
        Ok(bars)
    }

    pub fn stats(&self) -> CacheStats {
        self.lock().stats
    }

    pub fn clear(&self) {
        self.lock().cache.clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl StoreState {
    fn lookup(&mut self, path: &Path) -> Option<Arc<Vec<PriceBar>>> {
        let hit = self.cache.get(&path.to_path_buf());
        if hit.is_some() {
            self.stats.hits += 1;
        } else {
            self.stats.misses += 1;
        }
        hit
    }
}

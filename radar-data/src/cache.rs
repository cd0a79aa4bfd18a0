use parking_lot::Mutex;
use radar_core::TimeSeries;
use serde::Serialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::debug;

/// Cache key for one collected window of history.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SeriesKey {
    pub symbol: String,
    pub interval: String,
    pub days: u32,
}

impl SeriesKey {
    pub fn label(&self) -> String {
        format!("{}_{}_{}", self.symbol, self.interval, self.days)
    }
}

struct CacheEntry {
    series: TimeSeries,
    created_at: Instant,
}

struct CacheInner {
    entries: HashMap<SeriesKey, CacheEntry>,
    /// Access order, least-recently-used first. Keys appear exactly once.
    order: Vec<SeriesKey>,
}

/// Bounded in-memory series cache.
///
/// Two independent eviction rules: strict LRU once `maxsize` is exceeded, and
/// a TTL checked lazily on lookup. Whichever triggers first wins. All
/// bookkeeping happens under one lock with no await points inside, so a
/// lookup-plus-promotion is atomic with respect to other tasks.
pub struct SeriesCache {
    inner: Mutex<CacheInner>,
    maxsize: usize,
    ttl: Duration,
}

impl SeriesCache {
    pub fn new(maxsize: usize, ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                order: Vec::new(),
            }),
            maxsize,
            ttl,
        }
    }

    /// A hit refreshes the entry's LRU position. Entries past their TTL are
    /// evicted here and reported as a miss.
    pub fn get(&self, key: &SeriesKey) -> Option<TimeSeries> {
        let mut inner = self.inner.lock();

        let created_at = inner.entries.get(key)?.created_at;
        if created_at.elapsed() >= self.ttl {
            inner.entries.remove(key);
            inner.order.retain(|k| k != key);
            debug!("expired cached series {}", key.label());
            return None;
        }

        inner.order.retain(|k| k != key);
        inner.order.push(key.clone());
        inner.entries.get(key).map(|entry| entry.series.clone())
    }

    pub fn insert(&self, key: SeriesKey, series: TimeSeries) {
        let mut inner = self.inner.lock();

        let replaced = inner
            .entries
            .insert(
                key.clone(),
                CacheEntry {
                    series,
                    created_at: Instant::now(),
                },
            )
            .is_some();
        if replaced {
            inner.order.retain(|k| k != &key);
        }
        inner.order.push(key);

        if inner.entries.len() > self.maxsize && !inner.order.is_empty() {
            let oldest = inner.order.remove(0);
            inner.entries.remove(&oldest);
            debug!(
                "evicted least-recently-used series {} (cache size: {})",
                oldest.label(),
                inner.entries.len()
            );
        }
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        CacheStats {
            size: inner.entries.len(),
            maxsize: self.maxsize,
            ttl_secs: self.ttl.as_secs(),
            keys: inner.order.iter().map(SeriesKey::label).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub maxsize: usize,
    pub ttl_secs: u64,
    pub keys: Vec<String>,
}

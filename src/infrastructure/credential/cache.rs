//! Epoch-bucketed credential cache
//!
//! Entries are stamped with the time bucket they were fetched under and are
//! treated as absent once the bucket advances, so every request within one
//! validity period observes identical cache state and the first request after
//! a boundary is guaranteed a fresh store fetch. Staleness is bounded by the
//! validity period; there is no per-entry timer and no background sweep.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::sync::RwLock;

use crate::domain::CredentialRecord;

/// Cached lookup result. `None` records a confirmed miss so repeated probes
/// with an unknown token do not hammer the store within one bucket.
type CachedLookup = Option<CredentialRecord>;

#[derive(Debug, Clone)]
struct CacheEntry {
    lookup: CachedLookup,
    epoch: u64,
    last_access: u64,
}

#[derive(Debug, Default)]
struct CacheInner {
    entries: HashMap<String, CacheEntry>,
    // monotonic access clock for LRU eviction
    tick: u64,
}

/// Process-local cache mapping key hashes to credential records
#[derive(Debug)]
pub struct CredentialCache {
    validity_secs: u64,
    capacity: usize,
    inner: RwLock<CacheInner>,
}

impl CredentialCache {
    pub fn new(validity_secs: u64, capacity: usize) -> Self {
        Self {
            validity_secs: validity_secs.max(1),
            capacity: capacity.max(1),
            inner: RwLock::new(CacheInner::default()),
        }
    }

    /// The bucket a timestamp falls into
    pub fn epoch_at(&self, now_unix: u64) -> u64 {
        now_unix / self.validity_secs
    }

    /// Look up a hash, honoring the current bucket
    pub async fn get(&self, key_hash: &str) -> Option<CachedLookup> {
        self.get_at(key_hash, unix_now()).await
    }

    /// Cache a lookup result under the current bucket
    pub async fn insert(&self, key_hash: &str, lookup: CachedLookup) {
        self.insert_at(key_hash, lookup, unix_now()).await
    }

    pub async fn get_at(&self, key_hash: &str, now_unix: u64) -> Option<CachedLookup> {
        let epoch = self.epoch_at(now_unix);
        let mut inner = self.inner.write().await;
        inner.tick += 1;
        let tick = inner.tick;

        match inner.entries.get_mut(key_hash) {
            Some(entry) if entry.epoch == epoch => {
                entry.last_access = tick;
                Some(entry.lookup.clone())
            }
            // stale bucket: treated as absent, overwritten on next insert
            _ => None,
        }
    }

    pub async fn insert_at(&self, key_hash: &str, lookup: CachedLookup, now_unix: u64) {
        let epoch = self.epoch_at(now_unix);
        let mut inner = self.inner.write().await;
        inner.tick += 1;
        let tick = inner.tick;

        inner.entries.insert(
            key_hash.to_string(),
            CacheEntry {
                lookup,
                epoch,
                last_access: tick,
            },
        );

        if inner.entries.len() > self.capacity {
            evict_lru(&mut inner.entries);
        }
    }

    /// Drop every entry. Coarse-grained on purpose: any external credential
    /// mutation (revoke, rotate, limit change) clears the whole table rather
    /// than chasing individual keys.
    pub async fn invalidate_all(&self) {
        let mut inner = self.inner.write().await;
        inner.entries.clear();
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn evict_lru(entries: &mut HashMap<String, CacheEntry>) {
    if let Some(oldest) = entries
        .iter()
        .min_by_key(|(_, e)| e.last_access)
        .map(|(k, _)| k.clone())
    {
        entries.remove(&oldest);
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

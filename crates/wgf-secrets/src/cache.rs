//! In-memory cache of derived keys.

use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::deriver::DerivedKey;

/// Default number of derived keys kept in memory.
pub const DEFAULT_CACHE_SIZE: usize = 8;

/// Diagnostics reported by [`DerivedKeyCache::status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStatus {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that had to derive.
    pub misses: u64,
    /// Maximum number of entries.
    pub max_size: usize,
    /// Entries currently held.
    pub current_size: usize,
}

/// Cache key: a fingerprint of the derivation inputs, never the inputs themselves.
pub type Fingerprint = [u8; 32];

#[derive(Debug, Default)]
struct Inner {
    /// Most recently used entry first.
    entries: VecDeque<(Fingerprint, DerivedKey)>,
    hits: u64,
    misses: u64,
}

/// Least-recently-used cache of derived keys.
#[derive(Debug)]
pub struct DerivedKeyCache {
    max_size: usize,
    inner: Mutex<Inner>,
}

impl DerivedKeyCache {
    /// Creates a cache holding at most `max_size` keys.
    #[must_use]
    pub fn new(max_size: usize) -> Self {
        Self {
            max_size,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Returns the cached key for `fingerprint`, deriving and caching it on a miss.
    ///
    /// `derive` runs under the cache lock, so concurrent callers never derive
    /// the same key twice.
    ///
    /// # Errors
    ///
    /// Returns whatever `derive` fails with; nothing is cached then.
    pub fn get_or_try_insert_with<E, F>(&self, fingerprint: Fingerprint, derive: F) -> Result<DerivedKey, E>
    where
        F: FnOnce() -> Result<DerivedKey, E>,
    {
        let mut inner = self.inner.lock();

        if let Some(position) = inner.entries.iter().position(|(f, _)| *f == fingerprint) {
            inner.hits += 1;
            if let Some(entry) = inner.entries.remove(position) {
                let key = entry.1.clone();
                inner.entries.push_front(entry);
                return Ok(key);
            }
        }

        inner.misses += 1;
        let key = derive()?;
        if self.max_size > 0 {
            inner.entries.push_front((fingerprint, key.clone()));
            inner.entries.truncate(self.max_size);
        }
        Ok(key)
    }

    /// Drops every cached key and resets the statistics.
    pub fn clear(&self) {
        *self.inner.lock() = Inner::default();
    }

    /// Reports hit/miss counters and occupancy.
    #[must_use]
    pub fn status(&self) -> CacheStatus {
        let inner = self.inner.lock();
        CacheStatus {
            hits: inner.hits,
            misses: inner.misses,
            max_size: self.max_size,
            current_size: inner.entries.len(),
        }
    }
}

impl Default for DerivedKeyCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_SIZE)
    }
}

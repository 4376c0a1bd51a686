//! Generic associative cache with fixed per-entry TTL
//!
//! Every entry expires a fixed duration after its insertion (not after last
//! access). Expiry is enforced lazily: queries check the deadline, so an
//! expired entry is invisible even before a sweep physically removes it.
//! Both enforcement paths compare against the same deadline, so they agree
//! at any given instant.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Map from keys to values where entries expire `ttl` after insertion.
///
/// Mutation is serialized internally; callers never lock around it. `put` on
/// an existing key replaces the value and restarts that entry's TTL.
#[derive(Debug)]
pub struct ExpiringCache<K, V> {
    ttl: Duration,
    entries: Mutex<HashMap<K, Entry<V>>>,
}

#[derive(Debug)]
struct Entry<V> {
    value: V,
    expires_at: Instant,
}

impl<V> Entry<V> {
    #[inline]
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

impl<K: Eq + Hash, V> ExpiringCache<K, V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Insert or replace; the entry's expiry becomes now + TTL.
    pub fn put(&self, key: K, value: V) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(
                key,
                Entry {
                    value,
                    expires_at: Instant::now() + self.ttl,
                },
            );
        }
    }

    /// Get a clone of the value if present and not expired.
    ///
    /// An expired-but-unswept entry behaves as absent and is dropped here.
    pub fn get(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        let Ok(mut entries) = self.entries.lock() else {
            return None;
        };
        let now = Instant::now();
        match entries.get(key) {
            Some(entry) if !entry.is_expired(now) => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// True if the key maps to a live (unexpired) entry
    pub fn contains_key(&self, key: &K) -> bool {
        let Ok(entries) = self.entries.lock() else {
            return false;
        };
        let now = Instant::now();
        entries.get(key).is_some_and(|e| !e.is_expired(now))
    }

    /// True if any live entry holds this value
    pub fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        let Ok(entries) = self.entries.lock() else {
            return false;
        };
        let now = Instant::now();
        entries
            .values()
            .any(|e| !e.is_expired(now) && e.value == *value)
    }

    /// Remove an entry, returning its value if it was still live
    pub fn remove(&self, key: &K) -> Option<V> {
        let Ok(mut entries) = self.entries.lock() else {
            return None;
        };
        let now = Instant::now();
        entries
            .remove(key)
            .filter(|e| !e.is_expired(now))
            .map(|e| e.value)
    }

    /// Count of live entries; expired-but-unswept entries are not counted
    pub fn len(&self) -> usize {
        let Ok(entries) = self.entries.lock() else {
            return 0;
        };
        let now = Instant::now();
        entries.values().filter(|e| !e.is_expired(now)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Physically remove every expired entry; returns how many were dropped.
    ///
    /// Queries never observe a difference from this (expiry is by deadline);
    /// it only releases memory.
    pub fn purge_expired(&self) -> usize {
        let Ok(mut entries) = self.entries.lock() else {
            return 0;
        };
        let now = Instant::now();
        let before = entries.len();
        entries.retain(|_, e| !e.is_expired(now));
        before - entries.len()
    }
}

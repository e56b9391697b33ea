//! Generic TTL map with get-or-set semantics.
//!
//! Backs the alert loop's dedupe cache: a naive lock-free map with lazy
//! expiry on access, built on `DashMap` for concurrent keyed state.

use std::hash::Hash;
use std::time::{Duration, Instant};

use dashmap::DashMap;

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

/// A concurrency-safe map where entries expire after a TTL.
///
/// Expiry is lazy: an expired entry is only removed (and treated as absent)
/// the next time it is looked up or inserted over.
pub struct TtlMap<K, V> {
    inner: DashMap<K, Entry<V>>,
}

impl<K, V> Default for TtlMap<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> TtlMap<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self {
            inner: DashMap::new(),
        }
    }

    /// Inserts `value` under `key` with the given TTL unless a live (non-expired)
    /// entry already exists. Returns `true` if a live entry already existed
    /// (the dedupe-hit case), `false` if this call inserted a fresh entry.
    pub fn get_or_set(&self, key: K, value: V, ttl: Duration) -> bool
    where
        V: Clone,
    {
        let now = Instant::now();

        if let Some(entry) = self.inner.get(&key) {
            if entry.expires_at > now {
                return true;
            }
        }

        self.inner.insert(
            key,
            Entry {
                value,
                expires_at: now + ttl,
            },
        );
        false
    }

    /// Removes all expired entries. Not required for correctness (lookups
    /// self-heal), but bounds memory for dedupe keys that stop recurring.
    pub fn sweep(&self) {
        let now = Instant::now();
        self.inner.retain(|_, entry| entry.expires_at > now);
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn first_insert_reports_no_existing_entry() {
        let map: TtlMap<&str, ()> = TtlMap::new();
        let existed = map.get_or_set("a", (), Duration::from_secs(60));
        assert!(!existed);
    }

    #[test]
    fn repeat_insert_within_ttl_reports_existing_entry() {
        let map: TtlMap<&str, ()> = TtlMap::new();
        assert!(!map.get_or_set("a", (), Duration::from_secs(60)));
        assert!(map.get_or_set("a", (), Duration::from_secs(60)));
    }

    #[test]
    fn expired_entry_is_treated_as_absent() {
        let map: TtlMap<&str, ()> = TtlMap::new();
        assert!(!map.get_or_set("a", (), Duration::from_millis(10)));
        sleep(Duration::from_millis(30));
        assert!(!map.get_or_set("a", (), Duration::from_secs(60)));
    }
}

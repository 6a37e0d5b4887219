// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A generic find-or-create cache with per-key creation locks.

use crate::config::EvictionPolicy;
use crate::error::ResourceError;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Counters of one keyed cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    /// Lookups that found a value.
    pub hits: u64,
    /// Lookups that had to create.
    pub misses: u64,
    /// Successful creations.
    pub creations: u64,
    /// Entries dropped by eviction.
    pub evictions: u64,
    /// Entries currently held.
    pub entries: usize,
}

/// Counters of every cache in a [`ResourceProvider`](super::ResourceProvider).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResourceCacheStats {
    /// Graphics pipelines.
    pub graphics_pipelines: CacheStats,
    /// Depth/stencil states.
    pub depth_stencil_states: CacheStats,
    /// Samplers.
    pub samplers: CacheStats,
    /// Wrapped backend textures.
    pub wrapped_textures: CacheStats,
}

struct Slot<V> {
    value: Mutex<Option<Arc<V>>>,
    last_use: AtomicU64,
}

struct CacheState<K, V> {
    slots: HashMap<K, Arc<Slot<V>>>,
    clock: u64,
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    creations: AtomicU64,
    evictions: AtomicU64,
}

/// Maps keys to shared values, creating each value at most once.
///
/// Lookups take the map lock only to find or insert the key's slot, then take the
/// slot's own lock to read or create the value. Callers racing on one key wait for a
/// single creation; callers on different keys never wait for each other's creation.
/// A failed creation leaves the slot empty so the next caller retries.
pub(crate) struct KeyedCache<K, V> {
    label: &'static str,
    policy: EvictionPolicy,
    state: Mutex<CacheState<K, V>>,
    counters: Counters,
}

impl<K, V> KeyedCache<K, V>
where
    K: Hash + Eq + Clone,
{
    pub(crate) fn new(label: &'static str, policy: EvictionPolicy) -> Self {
        Self {
            label,
            policy,
            state: Mutex::new(CacheState {
                slots: HashMap::new(),
                clock: 0,
            }),
            counters: Counters::default(),
        }
    }

    pub(crate) fn find_or_create<F>(&self, key: &K, create: F) -> Result<Arc<V>, ResourceError>
    where
        F: FnOnce() -> Result<V, ResourceError>,
    {
        let slot = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            state.clock += 1;
            let now = state.clock;
            let slot = state
                .slots
                .entry(key.clone())
                .or_insert_with(|| {
                    Arc::new(Slot {
                        value: Mutex::new(None),
                        last_use: AtomicU64::new(now),
                    })
                })
                .clone();
            slot.last_use.store(now, Ordering::Relaxed);
            slot
        };

        let created = {
            let mut value = slot.value.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(existing) = value.as_ref() {
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(existing.clone());
            }
            self.counters.misses.fetch_add(1, Ordering::Relaxed);
            log::debug!("{} cache miss; creating", self.label);
            match create() {
                Ok(created) => {
                    let created = Arc::new(created);
                    self.counters.creations.fetch_add(1, Ordering::Relaxed);
                    *value = Some(created.clone());
                    created
                }
                Err(e) => {
                    drop(value);
                    self.discard_empty_slot(key, &slot);
                    return Err(e);
                }
            }
        };

        self.enforce_policy();
        Ok(created)
    }

    /// Removes the slot a failed creation left behind, unless another caller already
    /// holds it and will retry.
    fn discard_empty_slot(&self, key: &K, slot: &Arc<Slot<V>>) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let still_ours = state.slots.get(key).is_some_and(|current| Arc::ptr_eq(current, slot));
        // One reference from the map, one from the caller.
        let shared = Arc::strong_count(slot) > 2;
        let empty = slot.value.try_lock().is_ok_and(|value| value.is_none());
        if still_ours && !shared && empty {
            state.slots.remove(key);
        }
    }

    /// Drops the entry for `key`, returning whether one was cached. A value still
    /// referenced elsewhere stays alive with its holders.
    pub(crate) fn remove(&self, key: &K) -> bool {
        let slot = self
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .slots
            .remove(key);
        let Some(slot) = slot else {
            return false;
        };
        let value = slot.value.lock().unwrap_or_else(PoisonError::into_inner).take();
        log::debug!("{} cache dropped an entry on request", self.label);
        drop(value);
        true
    }

    fn enforce_policy(&self) {
        if let EvictionPolicy::Bounded { max_entries } = self.policy {
            self.evict_down_to(max_entries);
        }
    }

    /// Drops every entry nothing outside the cache references.
    pub(crate) fn purge_unreferenced(&self) -> usize {
        self.evict_down_to(0)
    }

    /// Removes least recently used, unreferenced entries until at most `limit` remain.
    /// Entries in use or under construction are never removed. Values are dropped
    /// after the map lock is released, since dropping calls into the backend.
    fn evict_down_to(&self, limit: usize) -> usize {
        let evicted: Vec<Arc<V>> = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if state.slots.len() <= limit {
                return 0;
            }

            let mut candidates: Vec<(u64, K)> = state
                .slots
                .iter()
                .filter(|(_, slot)| Arc::strong_count(slot) == 1)
                .filter_map(|(key, slot)| {
                    let value = slot.value.try_lock().ok()?;
                    let unreferenced = value.as_ref().map_or(true, |v| Arc::strong_count(v) == 1);
                    unreferenced.then(|| (slot.last_use.load(Ordering::Relaxed), key.clone()))
                })
                .collect();
            candidates.sort_by_key(|(last_use, _)| *last_use);

            let excess = state.slots.len() - limit;
            let mut evicted = Vec::new();
            for (_, key) in candidates.into_iter().take(excess) {
                if let Some(slot) = state.slots.remove(&key) {
                    let value = slot.value.lock().unwrap_or_else(PoisonError::into_inner).take();
                    evicted.extend(value);
                }
            }
            evicted
        };

        let count = evicted.len();
        if count > 0 {
            self.counters.evictions.fetch_add(count as u64, Ordering::Relaxed);
            log::debug!("{} cache evicted {count} entries", self.label);
        }
        drop(evicted);
        count
    }

    pub(crate) fn len(&self) -> usize {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).slots.len()
    }

    pub(crate) fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            creations: self.counters.creations.load(Ordering::Relaxed),
            evictions: self.counters.evictions.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }
}

impl<K, V> fmt::Debug for KeyedCache<K, V>
where
    K: Hash + Eq + Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyedCache")
            .field("label", &self.label)
            .field("policy", &self.policy)
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Barrier;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn same_key_returns_the_same_value() {
        let cache: KeyedCache<u32, String> = KeyedCache::new("test", EvictionPolicy::RetainAll);
        let a = cache.find_or_create(&1, || Ok("one".to_string())).unwrap();
        let b = cache.find_or_create(&1, || Ok("uno".to_string())).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(*b, "one");
        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses, stats.creations), (1, 1, 1));
    }

    #[test]
    fn failures_are_not_cached() {
        let cache: KeyedCache<u32, u32> = KeyedCache::new("test", EvictionPolicy::RetainAll);
        let err = cache.find_or_create(&7, || Err(ResourceError::OutOfMemory));
        assert_eq!(err, Err(ResourceError::OutOfMemory));
        assert_eq!(cache.len(), 0, "a failed creation leaves no empty slot behind");
        let value = cache.find_or_create(&7, || Ok(49)).unwrap();
        assert_eq!(*value, 49);
        assert_eq!(cache.stats().creations, 1);
    }

    #[test]
    fn concurrent_callers_share_one_creation() {
        let cache: Arc<KeyedCache<u32, u32>> = Arc::new(KeyedCache::new("test", EvictionPolicy::RetainAll));
        let creations = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let creations = Arc::clone(&creations);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    cache
                        .find_or_create(&3, || {
                            creations.fetch_add(1, Ordering::SeqCst);
                            thread::sleep(Duration::from_millis(20));
                            Ok(9)
                        })
                        .unwrap()
                })
            })
            .collect();
        let values: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(creations.load(Ordering::SeqCst), 1);
        assert!(values.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }

    #[test]
    fn repeated_failures_do_not_accumulate_entries() {
        let cache: KeyedCache<u32, u32> = KeyedCache::new("test", EvictionPolicy::RetainAll);
        for key in 0..16 {
            assert!(cache.find_or_create(&key, || Err(ResourceError::OutOfMemory)).is_err());
        }
        let stats = cache.stats();
        assert_eq!((stats.misses, stats.creations, stats.entries), (16, 0, 0));
    }

    #[test]
    fn removed_entries_are_created_again() {
        let cache: KeyedCache<u32, u32> = KeyedCache::new("test", EvictionPolicy::RetainAll);
        let first = cache.find_or_create(&5, || Ok(5)).unwrap();
        assert!(cache.remove(&5));
        assert!(!cache.remove(&5));
        assert_eq!(cache.len(), 0);

        let second = cache.find_or_create(&5, || Ok(5)).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(cache.stats().creations, 2);
    }

    #[test]
    fn bounded_policy_keeps_live_values() {
        let cache: KeyedCache<u32, u32> = KeyedCache::new("test", EvictionPolicy::Bounded { max_entries: 2 });
        let held = cache.find_or_create(&0, || Ok(0)).unwrap();
        for key in 1..6 {
            cache.find_or_create(&key, || Ok(key)).unwrap();
        }
        assert_eq!(cache.len(), 2);
        let again = cache.find_or_create(&0, || Ok(100)).unwrap();
        assert!(Arc::ptr_eq(&held, &again));
        assert!(cache.stats().evictions >= 3);
    }

    #[test]
    fn bounded_policy_evicts_least_recently_used() {
        let cache: KeyedCache<u32, u32> = KeyedCache::new("test", EvictionPolicy::Bounded { max_entries: 2 });
        cache.find_or_create(&1, || Ok(1)).unwrap();
        cache.find_or_create(&2, || Ok(2)).unwrap();
        cache.find_or_create(&1, || Ok(1)).unwrap();
        cache.find_or_create(&3, || Ok(3)).unwrap();

        let before = cache.stats().creations;
        cache.find_or_create(&1, || Ok(1)).unwrap();
        assert_eq!(cache.stats().creations, before, "key 1 was recently used and must survive");
        cache.find_or_create(&2, || Ok(2)).unwrap();
        assert_eq!(cache.stats().creations, before + 1, "key 2 was the eviction victim");
    }

    #[test]
    fn purge_drops_only_unreferenced_entries() {
        let cache: KeyedCache<u32, u32> = KeyedCache::new("test", EvictionPolicy::RetainAll);
        let _held = cache.find_or_create(&1, || Ok(1)).unwrap();
        cache.find_or_create(&2, || Ok(2)).unwrap();
        assert_eq!(cache.purge_unreferenced(), 1);
        assert_eq!(cache.len(), 1);
    }
}

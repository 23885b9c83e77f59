//! In-memory cache tier with cost-weighted LRU eviction.
//!
//! The tier enforces two ceilings: a maximum entry count and a maximum total
//! cost in bytes. Either ceiling being exceeded by an insertion evicts
//! least-recently-used entries until both hold again.
//!
//! # Concurrency
//!
//! Lookups take a read lock and never block each other; mutation takes the
//! write lock. Access recency is a per-entry atomic sequence number bumped
//! under the read lock, and hit/miss counters are atomics, so a `get` never
//! takes a mutex. The cost ceiling itself is atomic because the pressure
//! monitor adjusts it while inserts are accounting against it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Instant;

use tracing::debug;

use crate::cache::config::MemoryCacheConfig;
use crate::cache::entry::CacheEntry;
use crate::cache::stats::CacheStats;
use crate::cache::types::CacheKey;

/// One cached entry plus its accounting state.
struct Slot {
    /// Cached entry, shared with callers.
    entry: Arc<CacheEntry>,
    /// Cost charged against the tier ceiling.
    cost: u64,
    /// Recency sequence number; larger is more recent.
    last_used: AtomicU64,
}

/// In-memory cache for imaging artifacts.
///
/// Provides fast access to recently used entries with LRU eviction when
/// either the entry-count or the cost ceiling is exceeded.
pub struct MemoryCache {
    /// Cache storage.
    slots: RwLock<HashMap<CacheKey, Slot>>,
    /// Maximum number of entries.
    max_entries: usize,
    /// Maximum total cost in bytes. Mutated by the pressure monitor.
    cost_ceiling: AtomicU64,
    /// Current total cost in bytes.
    current_cost: AtomicU64,
    /// Monotonic sequence source for recency tracking.
    clock: AtomicU64,
    /// Hit counter.
    hits: AtomicU64,
    /// Miss counter.
    misses: AtomicU64,
    /// Eviction counter.
    evictions: AtomicU64,
    /// Construction time, for statistics uptime.
    created_at: Instant,
}

impl MemoryCache {
    /// Create a new memory cache with the given ceilings.
    pub fn new(config: MemoryCacheConfig) -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
            max_entries: config.max_entries,
            cost_ceiling: AtomicU64::new(config.max_cost_bytes),
            current_cost: AtomicU64::new(0),
            clock: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            created_at: Instant::now(),
        }
    }

    /// Get a cached entry.
    ///
    /// Returns `Some(entry)` on a hit, `None` on a miss - never an error.
    /// Updates access recency and statistics on a hit.
    pub fn get(&self, key: &CacheKey) -> Option<Arc<CacheEntry>> {
        let slots = self.slots.read().unwrap();

        if let Some(slot) = slots.get(key) {
            let tick = self.clock.fetch_add(1, Ordering::Relaxed) + 1;
            slot.last_used.store(tick, Ordering::Relaxed);
            self.hits.fetch_add(1, Ordering::Relaxed);

            Some(Arc::clone(&slot.entry))
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            None
        }
    }

    /// Insert an entry, evicting as needed to respect both ceilings.
    ///
    /// Inserting under an existing key replaces the previous entry and
    /// adjusts the cost accounting by the delta. An entry whose cost alone
    /// exceeds the ceiling is admitted and then immediately evicted, leaving
    /// the tier empty rather than over ceiling.
    pub fn set(&self, key: CacheKey, entry: Arc<CacheEntry>, cost: u64) {
        let mut slots = self.slots.write().unwrap();

        let tick = self.clock.fetch_add(1, Ordering::Relaxed) + 1;
        let slot = Slot {
            entry,
            cost,
            last_used: AtomicU64::new(tick),
        };

        if let Some(old) = slots.insert(key, slot) {
            self.current_cost.fetch_sub(old.cost, Ordering::Relaxed);
        }
        self.current_cost.fetch_add(cost, Ordering::Relaxed);

        self.evict_over_ceilings(&mut slots);
    }

    /// Evict all entries.
    ///
    /// Used by the pressure monitor on a critical signal.
    pub fn remove_all(&self) {
        let mut slots = self.slots.write().unwrap();
        let dropped = slots.len();
        slots.clear();
        self.current_cost.store(0, Ordering::Relaxed);
        self.evictions.fetch_add(dropped as u64, Ordering::Relaxed);

        debug!(dropped = dropped, "memory tier cleared");
    }

    /// Adjust the cost ceiling, evicting immediately if the tier is now
    /// over it.
    pub fn set_cost_ceiling(&self, max_cost_bytes: u64) {
        self.cost_ceiling.store(max_cost_bytes, Ordering::Relaxed);

        let mut slots = self.slots.write().unwrap();
        self.evict_over_ceilings(&mut slots);
    }

    /// Current cost ceiling in bytes.
    pub fn cost_ceiling(&self) -> u64 {
        self.cost_ceiling.load(Ordering::Relaxed)
    }

    /// Maximum number of entries.
    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Current number of entries.
    pub fn entry_count(&self) -> usize {
        self.slots.read().unwrap().len()
    }

    /// Current total cost in bytes.
    pub fn cost_bytes(&self) -> u64 {
        self.current_cost.load(Ordering::Relaxed)
    }

    /// Get a statistics snapshot.
    pub fn stats(&self) -> CacheStats {
        let mut stats = CacheStats::new();
        stats.memory_hits = self.hits.load(Ordering::Relaxed);
        stats.memory_misses = self.misses.load(Ordering::Relaxed);
        stats.memory_evictions = self.evictions.load(Ordering::Relaxed);
        stats.update_memory_size(self.cost_bytes(), self.entry_count());
        stats.created_at = self.created_at;
        stats
    }

    /// Evict least-recently-used entries until both ceilings hold.
    ///
    /// Eviction order is the recency sequence, so the policy is
    /// deterministic for a given operation sequence.
    fn evict_over_ceilings(&self, slots: &mut HashMap<CacheKey, Slot>) {
        let ceiling = self.cost_ceiling.load(Ordering::Relaxed);

        let over = |slots: &HashMap<CacheKey, Slot>, cost: u64| {
            slots.len() > self.max_entries || cost > ceiling
        };

        if !over(slots, self.current_cost.load(Ordering::Relaxed)) {
            return;
        }

        let mut order: Vec<(CacheKey, u64, u64)> = slots
            .iter()
            .map(|(k, s)| (k.clone(), s.last_used.load(Ordering::Relaxed), s.cost))
            .collect();
        order.sort_by_key(|(_, tick, _)| *tick);

        let mut evicted = 0u64;
        for (key, _, cost) in order {
            if !over(slots, self.current_cost.load(Ordering::Relaxed)) {
                break;
            }

            slots.remove(&key);
            self.current_cost.fetch_sub(cost, Ordering::Relaxed);
            evicted += 1;
        }

        if evicted > 0 {
            self.evictions.fetch_add(evicted, Ordering::Relaxed);

            debug!(
                evicted = evicted,
                cost = self.current_cost.load(Ordering::Relaxed),
                ceiling = ceiling,
                "memory tier eviction"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::entry::{ImageMetadata, WindowLevel};

    fn test_config(max_entries: usize, max_cost_bytes: u64) -> MemoryCacheConfig {
        MemoryCacheConfig {
            max_entries,
            max_cost_bytes,
        }
    }

    fn test_entry(cost: usize) -> Arc<CacheEntry> {
        Arc::new(CacheEntry::new(
            ImageMetadata {
                rows: 512,
                columns: 512,
                modality: "CT".to_string(),
                bits_allocated: 16,
                pixel_spacing: None,
                study_instance_uid: "1".to_string(),
                series_instance_uid: "1.1".to_string(),
                sop_instance_uid: "1.1.1".to_string(),
            },
            Some(vec![0u8; cost]),
            None,
            WindowLevel {
                center: 40.0,
                width: 400.0,
            },
        ))
    }

    fn key(i: u32) -> CacheKey {
        CacheKey::new(format!("instance:{}", i))
    }

    #[test]
    fn test_memory_cache_new() {
        let cache = MemoryCache::new(test_config(50, 1_000_000));
        assert_eq!(cache.cost_ceiling(), 1_000_000);
        assert_eq!(cache.max_entries(), 50);
        assert_eq!(cache.entry_count(), 0);
        assert_eq!(cache.cost_bytes(), 0);
    }

    #[test]
    fn test_memory_cache_set_and_get() {
        let cache = MemoryCache::new(test_config(50, 1_000_000));
        let entry = test_entry(100);

        cache.set(key(1), Arc::clone(&entry), 100);

        let retrieved = cache.get(&key(1)).unwrap();
        assert_eq!(*retrieved, *entry);
        assert_eq!(cache.entry_count(), 1);
        assert_eq!(cache.cost_bytes(), 100);
    }

    #[test]
    fn test_memory_cache_miss() {
        let cache = MemoryCache::new(test_config(50, 1_000_000));
        assert!(cache.get(&key(1)).is_none());
    }

    #[test]
    fn test_memory_cache_replace_adjusts_cost() {
        let cache = MemoryCache::new(test_config(50, 1_000_000));

        cache.set(key(1), test_entry(1000), 1000);
        assert_eq!(cache.cost_bytes(), 1000);

        cache.set(key(1), test_entry(400), 400);
        assert_eq!(cache.cost_bytes(), 400);
        assert_eq!(cache.entry_count(), 1);
    }

    #[test]
    fn test_memory_cache_evicts_least_recently_used_on_cost() {
        let cache = MemoryCache::new(test_config(50, 2500));

        cache.set(key(1), test_entry(1000), 1000);
        cache.set(key(2), test_entry(1000), 1000);
        cache.set(key(3), test_entry(1000), 1000);

        assert!(cache.get(&key(1)).is_none(), "oldest entry evicted");
        assert!(cache.get(&key(2)).is_some());
        assert!(cache.get(&key(3)).is_some());
        assert!(cache.cost_bytes() <= 2500);
    }

    #[test]
    fn test_memory_cache_get_updates_recency() {
        let cache = MemoryCache::new(test_config(50, 2500));

        cache.set(key(1), test_entry(1000), 1000);
        cache.set(key(2), test_entry(1000), 1000);

        // Touch key 1 so key 2 becomes the eviction candidate
        cache.get(&key(1));

        cache.set(key(3), test_entry(1000), 1000);

        assert!(cache.get(&key(1)).is_some(), "recently accessed survives");
        assert!(cache.get(&key(2)).is_none(), "stale entry evicted");
        assert!(cache.get(&key(3)).is_some());
    }

    #[test]
    fn test_memory_cache_entry_count_ceiling() {
        let cache = MemoryCache::new(test_config(2, 1_000_000));

        cache.set(key(1), test_entry(10), 10);
        cache.set(key(2), test_entry(10), 10);
        cache.set(key(3), test_entry(10), 10);

        assert_eq!(cache.entry_count(), 2);
        assert!(cache.get(&key(1)).is_none());
        assert!(cache.get(&key(2)).is_some());
        assert!(cache.get(&key(3)).is_some());
    }

    #[test]
    fn test_memory_cache_oversized_entry_does_not_stay() {
        let cache = MemoryCache::new(test_config(50, 1000));

        // Entry alone exceeds the ceiling: admitted then evicted, the
        // aggregate never settles above the ceiling
        cache.set(key(1), test_entry(5000), 5000);

        assert_eq!(cache.entry_count(), 0);
        assert_eq!(cache.cost_bytes(), 0);
    }

    #[test]
    fn test_memory_cache_remove_all() {
        let cache = MemoryCache::new(test_config(50, 1_000_000));

        cache.set(key(1), test_entry(100), 100);
        cache.set(key(2), test_entry(100), 100);

        cache.remove_all();

        assert_eq!(cache.entry_count(), 0);
        assert_eq!(cache.cost_bytes(), 0);
        assert!(cache.get(&key(1)).is_none());
    }

    #[test]
    fn test_memory_cache_lowering_ceiling_evicts_immediately() {
        let cache = MemoryCache::new(test_config(50, 4000));

        for i in 1..=4 {
            cache.set(key(i), test_entry(1000), 1000);
        }
        assert_eq!(cache.entry_count(), 4);

        cache.set_cost_ceiling(2000);

        assert!(cache.cost_bytes() <= 2000);
        assert_eq!(cache.entry_count(), 2);
        // The two most recent remain
        assert!(cache.get(&key(3)).is_some());
        assert!(cache.get(&key(4)).is_some());
    }

    #[test]
    fn test_memory_cache_raising_ceiling_keeps_entries() {
        let cache = MemoryCache::new(test_config(50, 2000));

        cache.set(key(1), test_entry(1000), 1000);
        cache.set_cost_ceiling(4000);

        assert_eq!(cache.entry_count(), 1);
        assert_eq!(cache.cost_ceiling(), 4000);
    }

    #[test]
    fn test_memory_cache_statistics() {
        let cache = MemoryCache::new(test_config(50, 1_000_000));

        cache.set(key(1), test_entry(100), 100);
        cache.get(&key(1));
        cache.get(&key(1));
        cache.get(&key(2));

        let stats = cache.stats();
        assert_eq!(stats.memory_hits, 2);
        assert_eq!(stats.memory_misses, 1);
        assert_eq!(stats.memory_cost_bytes, 100);
        assert_eq!(stats.memory_entry_count, 1);
    }

    #[test]
    fn test_memory_cache_eviction_statistics() {
        let cache = MemoryCache::new(test_config(50, 1500));

        for i in 1..=3 {
            cache.set(key(i), test_entry(1000), 1000);
        }

        let stats = cache.stats();
        assert!(stats.memory_evictions > 0);
    }

    #[test]
    fn test_memory_cache_concurrent_reads() {
        let cache = Arc::new(MemoryCache::new(test_config(50, 1_000_000)));
        cache.set(key(1), test_entry(100), 100);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        assert!(cache.get(&key(1)).is_some());
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(cache.stats().memory_hits, 800);
    }
}

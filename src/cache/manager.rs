//! Two-tier cache facade.
//!
//! `TieredCache` coordinates the memory and disk tiers:
//!
//! 1. `store` writes the memory tier synchronously and forwards the entry
//!    to the disk tier fire-and-forget, so the caller never waits on disk.
//! 2. `retrieve` checks memory first (fast: sub-millisecond), then disk;
//!    a disk hit is promoted into memory so the next lookup is fast.
//! 3. The pressure monitor throttles or clears the memory tier from
//!    host signals; the disk tier is unaffected by pressure.
//!
//! The cache is an explicit instance constructed once at application start
//! and handed to collaborators - there is no global shared instance.
//!
//! # Example
//!
//! ```ignore
//! use slicecache::cache::{CacheConfig, CacheKey, TieredCache};
//!
//! let cache = TieredCache::start(CacheConfig::new()).await?;
//!
//! cache.store(key.clone(), entry);
//!
//! if let Some(entry) = cache.retrieve(&key).await {
//!     // Hit: serve the cached artifact
//! }
//! ```

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::cache::config::CacheConfig;
use crate::cache::disk::DiskCache;
use crate::cache::entry::CacheEntry;
use crate::cache::memory::MemoryCache;
use crate::cache::pressure::{PressureMonitor, PressureSignal};
use crate::cache::stats::{CacheStatistics, CacheStats};
use crate::cache::types::{CacheError, CacheKey};

/// Capacity of the pressure signal channel. Signals are tiny and rare;
/// a small buffer only has to absorb bursts while the monitor task runs.
const PRESSURE_CHANNEL_CAPACITY: usize = 16;

/// Two-tier cache for imaging artifacts.
pub struct TieredCache {
    /// Memory tier (Tier 1: fast).
    memory: Arc<MemoryCache>,
    /// Disk tier (Tier 2: persistent).
    disk: Arc<DiskCache>,
    /// Pressure monitor driving the memory tier.
    monitor: PressureMonitor,
    /// Pressure signal source handed to the host binding.
    signals: broadcast::Sender<PressureSignal>,
}

impl TieredCache {
    /// Start a tiered cache from the given configuration.
    ///
    /// Opens the disk tier (creating its directory, rebuilding the recency
    /// index, trimming to the ceiling) and starts the pressure monitor.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the cache
    /// directory cannot be prepared.
    pub async fn start(config: CacheConfig) -> Result<Self, CacheError> {
        config.validate()?;

        let memory = Arc::new(MemoryCache::new(config.memory.clone()));
        let disk = Arc::new(DiskCache::open(config.disk.clone()).await?);

        let (signals, receiver) = broadcast::channel(PRESSURE_CHANNEL_CAPACITY);
        let monitor = PressureMonitor::start(Arc::clone(&memory), config.pressure.clone(), receiver);

        info!(
            memory_entries = config.memory.max_entries,
            memory_cost = config.memory.max_cost_bytes,
            disk_bytes = config.disk.max_size_bytes,
            dir = %disk.cache_dir().display(),
            "tiered cache started"
        );

        Ok(Self {
            memory,
            disk,
            monitor,
            signals,
        })
    }

    /// Store an entry under a key.
    ///
    /// The memory tier is written before this returns, so a `retrieve` for
    /// the same key issued afterwards on the same logical thread observes
    /// the entry. The disk write happens in the background; its failure is
    /// logged and swallowed because the memory tier holds the authoritative
    /// copy for the session.
    ///
    /// Must be called from within a tokio runtime (the disk leg is spawned
    /// onto it).
    pub fn store(&self, key: CacheKey, entry: CacheEntry) {
        let entry = Arc::new(entry);
        let cost = entry.estimated_cost();

        self.memory.set(key.clone(), Arc::clone(&entry), cost);

        let disk = Arc::clone(&self.disk);
        tokio::spawn(async move {
            if let Err(e) = disk.store(&key, &entry).await {
                warn!(key = %key, error = %e, "disk cache write failed, entry remains memory-only");
            }
        });
    }

    /// Retrieve an entry by key.
    ///
    /// Checks the memory tier first; on a miss, the disk tier. A disk hit
    /// is promoted into the memory tier before returning. Returns `None`
    /// only when both tiers miss - never an error.
    pub async fn retrieve(&self, key: &CacheKey) -> Option<Arc<CacheEntry>> {
        if let Some(entry) = self.memory.get(key) {
            return Some(entry);
        }

        if let Some(entry) = self.disk.retrieve(key).await {
            let cost = entry.estimated_cost();
            self.memory.set(key.clone(), Arc::clone(&entry), cost);
            return Some(entry);
        }

        None
    }

    /// Signal source for the host's pressure binding.
    ///
    /// The production binding forwards OS memory-pressure and low-memory
    /// notifications into this sender; tests publish synthetic signals.
    pub fn pressure_sender(&self) -> broadcast::Sender<PressureSignal> {
        self.signals.clone()
    }

    /// Get combined cache statistics.
    pub fn stats(&self) -> CacheStatistics {
        let memory_stats = self.memory.stats();
        let disk_stats = self.disk.stats();

        let combined = CacheStats {
            memory_hits: memory_stats.memory_hits,
            memory_misses: memory_stats.memory_misses,
            memory_cost_bytes: memory_stats.memory_cost_bytes,
            memory_entry_count: memory_stats.memory_entry_count,
            memory_evictions: memory_stats.memory_evictions,
            disk_hits: disk_stats.disk_hits,
            disk_misses: disk_stats.disk_misses,
            disk_size_bytes: disk_stats.disk_size_bytes,
            disk_entry_count: disk_stats.disk_entry_count,
            disk_evictions: disk_stats.disk_evictions,
            disk_writes: disk_stats.disk_writes,
            disk_write_failures: disk_stats.disk_write_failures,
            pressure_warnings: self.monitor.warnings(),
            pressure_clears: self.monitor.clears(),
            created_at: memory_stats.created_at.min(disk_stats.created_at),
        };

        CacheStatistics::from_stats(&combined)
    }

    /// Get formatted statistics string.
    pub fn format_stats(&self) -> String {
        self.stats().format()
    }

    /// Memory tier entry count.
    pub fn memory_entry_count(&self) -> usize {
        self.memory.entry_count()
    }

    /// Memory tier aggregate cost in bytes.
    pub fn memory_cost_bytes(&self) -> u64 {
        self.memory.cost_bytes()
    }

    /// Memory tier cost ceiling in bytes (reflects any active throttle).
    pub fn memory_cost_ceiling(&self) -> u64 {
        self.memory.cost_ceiling()
    }

    /// Disk tier entry count.
    pub fn disk_entry_count(&self) -> usize {
        self.disk.entry_count()
    }

    /// Disk tier aggregate size in bytes.
    pub fn disk_size_bytes(&self) -> u64 {
        self.disk.size_bytes()
    }

    /// Shut down the cache, stopping the pressure monitor task.
    ///
    /// In-flight background disk writes are left to complete on the
    /// runtime; they do not depend on the monitor.
    pub async fn shutdown(self) {
        self.monitor.shutdown().await;
        info!("tiered cache shut down");
    }
}

//! In-memory access-recency index for the disk tier.
//!
//! The index tracks every persisted entry with its size and last access
//! time, so the size-enforcement sweep can pick least-recently-accessed
//! victims without walking the cache directory on every write.
//!
//! # Lifecycle
//!
//! The index is ephemeral (in-memory only):
//! - Rebuilt from disk on startup via `populate_from_disk()`, using file
//!   mtime as the initial access-time approximation
//! - Kept in sync via `record()`, `touch()`, `remove()` during operations

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use dashmap::DashMap;

use crate::cache::path::filename_to_key;
use crate::cache::types::CacheKey;
use crate::time::system_time_to_instant;

/// Minimal per-entry tracking state.
#[derive(Debug, Clone)]
pub struct IndexedEntry {
    /// Size of the persisted entry file in bytes.
    pub size_bytes: u64,
    /// Last access time (updated on store and retrieve).
    pub last_accessed: Instant,
}

/// Statistics from populating the index from disk.
#[derive(Debug, Default)]
pub struct PopulateStats {
    /// Number of files successfully indexed.
    pub files_indexed: u64,
    /// Number of files skipped (not parseable as cache entries).
    pub skipped_unparseable: u64,
    /// Total size in bytes.
    pub total_bytes: u64,
}

/// Thread-safe access-recency index for persisted entries.
///
/// Uses `DashMap` for concurrent access and atomics for size tracking.
pub struct LruIndex {
    /// Map from cache key to tracking state.
    entries: DashMap<CacheKey, IndexedEntry>,
    /// Total size of all tracked entries.
    total_size: AtomicU64,
    /// Base cache directory scanned by `populate_from_disk`.
    cache_dir: PathBuf,
}

impl LruIndex {
    /// Create a new empty index for the given cache directory.
    pub fn new(cache_dir: PathBuf) -> Self {
        Self {
            entries: DashMap::new(),
            total_size: AtomicU64::new(0),
            cache_dir,
        }
    }

    /// Record a new entry or update an existing one.
    pub fn record(&self, key: &CacheKey, size: u64) {
        let state = IndexedEntry {
            size_bytes: size,
            last_accessed: Instant::now(),
        };

        if let Some(old) = self.entries.insert(key.clone(), state) {
            if size > old.size_bytes {
                self.total_size
                    .fetch_add(size - old.size_bytes, Ordering::Relaxed);
            } else {
                self.total_size
                    .fetch_sub(old.size_bytes - size, Ordering::Relaxed);
            }
        } else {
            self.total_size.fetch_add(size, Ordering::Relaxed);
        }
    }

    /// Update the access time for an existing entry.
    ///
    /// Does nothing if the key is not tracked.
    pub fn touch(&self, key: &CacheKey) {
        if let Some(mut entry) = self.entries.get_mut(key) {
            entry.last_accessed = Instant::now();
        }
    }

    /// Remove an entry from the index.
    ///
    /// Returns the removed state, or `None` if the key was not tracked.
    pub fn remove(&self, key: &CacheKey) -> Option<IndexedEntry> {
        if let Some((_, state)) = self.entries.remove(key) {
            self.total_size
                .fetch_sub(state.size_bytes, Ordering::Relaxed);
            Some(state)
        } else {
            None
        }
    }

    /// Check if a key is tracked.
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    /// All tracked entries sorted by last access time, oldest first.
    ///
    /// This is the eviction order for the size-enforcement sweep.
    pub fn entries_by_age(&self) -> Vec<(CacheKey, IndexedEntry)> {
        let mut entries: Vec<_> = self
            .entries
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();

        entries.sort_by_key(|(_, state)| state.last_accessed);
        entries
    }

    /// All tracked keys, in no particular order.
    pub fn keys(&self) -> Vec<CacheKey> {
        self.entries.iter().map(|e| e.key().clone()).collect()
    }

    /// Drop all tracked entries.
    pub fn clear(&self) {
        self.entries.clear();
        self.total_size.store(0, Ordering::Relaxed);
    }

    /// Total size of all tracked entries in bytes.
    pub fn total_size(&self) -> u64 {
        self.total_size.load(Ordering::Relaxed)
    }

    /// Number of tracked entries.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Populate the index from existing entry files on disk.
    ///
    /// Scans the cache directory and adds an entry for each valid file,
    /// using file mtime as the initial access-time approximation. Should be
    /// called once at startup.
    pub async fn populate_from_disk(&self) -> std::io::Result<PopulateStats> {
        let mut stats = PopulateStats::default();

        if !self.cache_dir.exists() {
            return Ok(stats);
        }

        let mut dir = tokio::fs::read_dir(&self.cache_dir).await?;

        while let Some(dir_entry) = dir.next_entry().await? {
            let path = dir_entry.path();

            let metadata = match tokio::fs::metadata(&path).await {
                Ok(m) if m.is_file() => m,
                _ => continue,
            };

            let filename = match path.file_name().and_then(|n| n.to_str()) {
                Some(f) => f,
                None => {
                    stats.skipped_unparseable += 1;
                    continue;
                }
            };

            let key = match filename_to_key(filename) {
                Some(k) => k,
                None => {
                    stats.skipped_unparseable += 1;
                    continue;
                }
            };

            let last_accessed = metadata
                .modified()
                .ok()
                .and_then(system_time_to_instant)
                .unwrap_or_else(Instant::now);

            let size = metadata.len();

            self.entries.insert(
                key,
                IndexedEntry {
                    size_bytes: size,
                    last_accessed,
                },
            );

            self.total_size.fetch_add(size, Ordering::Relaxed);
            stats.files_indexed += 1;
            stats.total_bytes += size;

            // Yield periodically so a large directory scan cooperates with
            // the runtime
            if stats.files_indexed % 100 == 0 {
                tokio::task::yield_now().await;
            }
        }

        tracing::debug!(
            files = stats.files_indexed,
            skipped = stats.skipped_unparseable,
            total_size = stats.total_bytes,
            "recency index populated from disk"
        );

        Ok(stats)
    }
}

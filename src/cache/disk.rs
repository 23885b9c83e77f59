//! Disk cache tier with atomic writes and least-recently-accessed eviction.
//!
//! Entries are persisted one file per key under the cache directory, named
//! by a reversible encoding of the key and containing the durable entry
//! envelope. Writes go through a temp-file-then-rename so a concurrent read
//! of the same key sees the old bytes, the new bytes, or a miss - never a
//! torn file.
//!
//! # Concurrency
//!
//! All writes for a cache-directory instance serialize through one write
//! lane, so the size-enforcement sweep always sees a settled directory.
//! Reads run concurrently with each other and with writes to other keys.
//!
//! # Eviction
//!
//! After every store the tier enforces its size ceiling, deleting
//! least-recently-accessed entries until the aggregate is at or below the
//! ceiling. Access recency lives in an in-memory index (rebuilt from file
//! mtimes at startup) so enforcement does not rescan the directory on every
//! write.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use crate::cache::codec;
use crate::cache::config::DiskCacheConfig;
use crate::cache::entry::CacheEntry;
use crate::cache::lru_index::LruIndex;
use crate::cache::path::entry_path;
use crate::cache::stats::CacheStats;
use crate::cache::types::{CacheError, CacheKey};

/// Disk cache for persistent storage of imaging artifacts.
pub struct DiskCache {
    /// Cache directory root.
    cache_dir: PathBuf,
    /// Maximum total size in bytes.
    max_size_bytes: u64,
    /// Access-recency index over persisted entries.
    index: LruIndex,
    /// Serializes all writes and sweeps for this directory.
    write_lane: tokio::sync::Mutex<()>,
    /// Statistics.
    stats: Mutex<CacheStats>,
}

impl DiskCache {
    /// Open a disk cache, creating the directory if needed.
    ///
    /// Rebuilds the recency index from existing entry files (file mtime as
    /// the initial access time) and enforces the size ceiling once, so a
    /// directory left over the ceiling by a previous session is trimmed
    /// before new entries arrive.
    pub async fn open(config: DiskCacheConfig) -> Result<Self, CacheError> {
        tokio::fs::create_dir_all(&config.cache_dir).await?;

        let cache = Self {
            cache_dir: config.cache_dir.clone(),
            max_size_bytes: config.max_size_bytes,
            index: LruIndex::new(config.cache_dir),
            write_lane: tokio::sync::Mutex::new(()),
            stats: Mutex::new(CacheStats::new()),
        };

        let populated = cache.index.populate_from_disk().await?;

        {
            let _lane = cache.write_lane.lock().await;
            cache.enforce_max_size().await;
        }

        info!(
            dir = %cache.cache_dir.display(),
            max_bytes = cache.max_size_bytes,
            entries = populated.files_indexed,
            size = populated.total_bytes,
            "disk cache opened"
        );

        Ok(cache)
    }

    /// Persist an entry, overwriting any prior file for the key.
    ///
    /// Serializes the entry, writes it atomically, then enforces the size
    /// ceiling. Failures are returned so the caller can log them; the
    /// tiered manager swallows them because the memory tier already holds
    /// the authoritative copy.
    pub async fn store(&self, key: &CacheKey, entry: &CacheEntry) -> Result<(), CacheError> {
        match self.store_inner(key, entry).await {
            Ok(()) => Ok(()),
            Err(e) => {
                if let Ok(mut stats) = self.stats.lock() {
                    stats.record_disk_write_failure();
                }
                Err(e)
            }
        }
    }

    async fn store_inner(&self, key: &CacheKey, entry: &CacheEntry) -> Result<(), CacheError> {
        let bytes = codec::encode(entry)?;
        let path = entry_path(&self.cache_dir, key);
        let temp_path = path.with_extension("tmp");

        let _lane = self.write_lane.lock().await;

        tokio::fs::write(&temp_path, &bytes).await?;
        tokio::fs::rename(&temp_path, &path).await?;

        self.index.record(key, bytes.len() as u64);

        if let Ok(mut stats) = self.stats.lock() {
            stats.record_disk_write();
            stats.update_disk_size(self.index.total_size(), self.index.entry_count());
        }

        self.enforce_max_size().await;

        Ok(())
    }

    /// Read an entry back from disk.
    ///
    /// Returns `None` for absent and for corrupt files - a corrupt entry is
    /// a cache miss, never an error. Corrupt files are deleted so they are
    /// not re-read on every lookup. A hit refreshes the entry's access
    /// recency.
    pub async fn retrieve(&self, key: &CacheKey) -> Option<Arc<CacheEntry>> {
        let path = entry_path(&self.cache_dir, key);

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Index may lag a deletion from another session
                self.index.remove(key);
                self.record_miss();
                return None;
            }
            Err(e) => {
                warn!(key = %key, error = %e, "disk cache read failed, treating as miss");
                self.record_miss();
                return None;
            }
        };

        match codec::decode(&bytes) {
            Ok(entry) => {
                self.index.touch(key);

                if let Ok(mut stats) = self.stats.lock() {
                    stats.record_disk_hit();
                }

                Some(Arc::new(entry))
            }
            Err(e) => {
                warn!(key = %key, error = %e, "corrupt cache entry, treating as miss");
                self.index.remove(key);
                let _ = tokio::fs::remove_file(&path).await;
                self.record_miss();
                None
            }
        }
    }

    /// Delete all persisted entries.
    pub async fn remove_all(&self) -> Result<(), CacheError> {
        let _lane = self.write_lane.lock().await;

        for key in self.index.keys() {
            let path = entry_path(&self.cache_dir, &key);
            let _ = tokio::fs::remove_file(&path).await;
        }

        self.index.clear();

        if let Ok(mut stats) = self.stats.lock() {
            stats.update_disk_size(0, 0);
        }

        Ok(())
    }

    /// Current total size of persisted entries in bytes.
    pub fn size_bytes(&self) -> u64 {
        self.index.total_size()
    }

    /// Current number of persisted entries.
    pub fn entry_count(&self) -> usize {
        self.index.entry_count()
    }

    /// Maximum total size in bytes.
    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_bytes
    }

    /// Cache directory root.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.lock().unwrap();
        stats.update_disk_size(self.index.total_size(), self.index.entry_count());
        stats.clone()
    }

    fn record_miss(&self) {
        if let Ok(mut stats) = self.stats.lock() {
            stats.record_disk_miss();
        }
    }

    /// Delete least-recently-accessed entries until the aggregate size is
    /// at or below the ceiling.
    ///
    /// Callers must hold the write lane so the sweep sees a settled
    /// directory.
    async fn enforce_max_size(&self) {
        if self.index.total_size() <= self.max_size_bytes {
            return;
        }

        let size_before = self.index.total_size();
        let mut evicted = 0u64;
        let mut freed = 0u64;

        for (key, state) in self.index.entries_by_age() {
            if self.index.total_size() <= self.max_size_bytes {
                break;
            }

            let path = entry_path(&self.cache_dir, &key);
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {
                    self.index.remove(&key);
                    evicted += 1;
                    freed += state.size_bytes;
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    // Already gone; drop the stale index entry
                    self.index.remove(&key);
                }
                Err(e) => {
                    debug!(key = %key, error = %e, "failed to delete entry during eviction");
                }
            }
        }

        if let Ok(mut stats) = self.stats.lock() {
            stats.record_disk_eviction(evicted);
            stats.update_disk_size(self.index.total_size(), self.index.entry_count());
        }

        info!(
            evicted = evicted,
            freed = freed,
            size_before = size_before,
            size_after = self.index.total_size(),
            limit = self.max_size_bytes,
            "disk cache eviction sweep"
        );
    }
}

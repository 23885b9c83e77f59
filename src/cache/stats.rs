//! Cache statistics tracking and reporting.

use std::time::Instant;

/// Cache statistics for monitoring and debugging.
#[derive(Debug, Clone)]
pub struct CacheStats {
    // Memory tier metrics
    pub memory_hits: u64,
    pub memory_misses: u64,
    pub memory_cost_bytes: u64,
    pub memory_entry_count: usize,
    pub memory_evictions: u64,

    // Disk tier metrics
    pub disk_hits: u64,
    pub disk_misses: u64,
    pub disk_size_bytes: u64,
    pub disk_entry_count: usize,
    pub disk_evictions: u64,
    pub disk_writes: u64,
    pub disk_write_failures: u64,

    // Pressure metrics
    pub pressure_warnings: u64,
    pub pressure_clears: u64,

    // Timing
    pub created_at: Instant,
}

impl Default for CacheStats {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheStats {
    /// Create a new statistics tracker.
    pub fn new() -> Self {
        Self {
            memory_hits: 0,
            memory_misses: 0,
            memory_cost_bytes: 0,
            memory_entry_count: 0,
            memory_evictions: 0,
            disk_hits: 0,
            disk_misses: 0,
            disk_size_bytes: 0,
            disk_entry_count: 0,
            disk_evictions: 0,
            disk_writes: 0,
            disk_write_failures: 0,
            pressure_warnings: 0,
            pressure_clears: 0,
            created_at: Instant::now(),
        }
    }

    /// Calculate memory tier hit rate (0.0 to 1.0).
    pub fn memory_hit_rate(&self) -> f64 {
        let total = self.memory_hits + self.memory_misses;
        if total == 0 {
            0.0
        } else {
            self.memory_hits as f64 / total as f64
        }
    }

    /// Calculate disk tier hit rate (0.0 to 1.0).
    pub fn disk_hit_rate(&self) -> f64 {
        let total = self.disk_hits + self.disk_misses;
        if total == 0 {
            0.0
        } else {
            self.disk_hits as f64 / total as f64
        }
    }

    /// Calculate overall hit rate (0.0 to 1.0).
    ///
    /// Includes both memory and disk hits. A disk miss is a full miss
    /// because the disk tier is only consulted after a memory miss.
    pub fn overall_hit_rate(&self) -> f64 {
        let hits = self.memory_hits + self.disk_hits;
        let total = hits + self.disk_misses;
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }

    /// Get the uptime duration since statistics started.
    pub fn uptime(&self) -> std::time::Duration {
        self.created_at.elapsed()
    }

    /// Record a memory tier hit.
    pub fn record_memory_hit(&mut self) {
        self.memory_hits += 1;
    }

    /// Record a memory tier miss.
    pub fn record_memory_miss(&mut self) {
        self.memory_misses += 1;
    }

    /// Record a disk tier hit.
    pub fn record_disk_hit(&mut self) {
        self.disk_hits += 1;
    }

    /// Record a disk tier miss.
    pub fn record_disk_miss(&mut self) {
        self.disk_misses += 1;
    }

    /// Record memory tier evictions.
    pub fn record_memory_eviction(&mut self, count: u64) {
        self.memory_evictions += count;
    }

    /// Record disk tier evictions.
    pub fn record_disk_eviction(&mut self, count: u64) {
        self.disk_evictions += count;
    }

    /// Record a successful disk write.
    pub fn record_disk_write(&mut self) {
        self.disk_writes += 1;
    }

    /// Record a failed disk write.
    pub fn record_disk_write_failure(&mut self) {
        self.disk_write_failures += 1;
    }

    /// Update memory tier size metrics.
    pub fn update_memory_size(&mut self, cost_bytes: u64, entry_count: usize) {
        self.memory_cost_bytes = cost_bytes;
        self.memory_entry_count = entry_count;
    }

    /// Update disk tier size metrics.
    pub fn update_disk_size(&mut self, size_bytes: u64, entry_count: usize) {
        self.disk_size_bytes = size_bytes;
        self.disk_entry_count = entry_count;
    }
}

/// Snapshot of cache statistics for reporting.
#[derive(Debug, Clone)]
pub struct CacheStatistics {
    pub stats: CacheStats,
    pub memory_hit_rate_percent: f64,
    pub disk_hit_rate_percent: f64,
    pub overall_hit_rate_percent: f64,
    pub uptime_secs: u64,
}

impl CacheStatistics {
    /// Create a statistics snapshot from current stats.
    pub fn from_stats(stats: &CacheStats) -> Self {
        Self {
            stats: stats.clone(),
            memory_hit_rate_percent: stats.memory_hit_rate() * 100.0,
            disk_hit_rate_percent: stats.disk_hit_rate() * 100.0,
            overall_hit_rate_percent: stats.overall_hit_rate() * 100.0,
            uptime_secs: stats.uptime().as_secs(),
        }
    }

    /// Format statistics as a human-readable string.
    pub fn format(&self) -> String {
        let stats = &self.stats;

        format!(
            r#"SliceCache Statistics

MEMORY TIER
  Entries:     {}
  Cost:        {:.2} MB
  Hits:        {}
  Misses:      {}
  Hit Rate:    {:.1}%
  Evictions:   {}

DISK TIER
  Entries:     {}
  Size:        {:.2} GB
  Hits:        {}
  Misses:      {}
  Hit Rate:    {:.1}%
  Writes:      {}
  Failures:    {}
  Evictions:   {}

PRESSURE
  Warnings:    {}
  Clears:      {}

OVERALL
  Hit Rate:    {:.1}%
  Uptime:      {}s
"#,
            stats.memory_entry_count,
            stats.memory_cost_bytes as f64 / (1024.0 * 1024.0),
            stats.memory_hits,
            stats.memory_misses,
            self.memory_hit_rate_percent,
            stats.memory_evictions,
            stats.disk_entry_count,
            stats.disk_size_bytes as f64 / (1024.0 * 1024.0 * 1024.0),
            stats.disk_hits,
            stats.disk_misses,
            self.disk_hit_rate_percent,
            stats.disk_writes,
            stats.disk_write_failures,
            stats.disk_evictions,
            stats.pressure_warnings,
            stats.pressure_clears,
            self.overall_hit_rate_percent,
            self.uptime_secs,
        )
    }
}

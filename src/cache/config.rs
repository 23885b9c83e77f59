//! Configuration types for the cache system.

use std::path::PathBuf;
use std::time::Duration;

use crate::cache::types::CacheError;

/// Memory tier configuration.
#[derive(Debug, Clone)]
pub struct MemoryCacheConfig {
    /// Maximum number of entries (default: 50).
    pub max_entries: usize,
    /// Maximum total cost in bytes (default: 200 MiB).
    pub max_cost_bytes: u64,
}

impl Default for MemoryCacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 50,
            max_cost_bytes: 200 * 1024 * 1024, // 200 MiB
        }
    }
}

/// Disk tier configuration.
#[derive(Debug, Clone)]
pub struct DiskCacheConfig {
    /// Cache directory root.
    pub cache_dir: PathBuf,
    /// Maximum total size on disk in bytes (default: 2 GiB).
    pub max_size_bytes: u64,
}

impl Default for DiskCacheConfig {
    fn default() -> Self {
        let cache_dir = dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("slicecache");

        Self {
            cache_dir,
            max_size_bytes: 2 * 1024 * 1024 * 1024, // 2 GiB
        }
    }
}

/// Pressure monitor configuration.
#[derive(Debug, Clone)]
pub struct PressureConfig {
    /// Factor applied to the memory cost ceiling on a warning signal
    /// (default: 0.5).
    pub throttle_factor: f64,
    /// Delay before the throttled ceiling is restored (default: 30s).
    pub restore_delay: Duration,
}

impl Default for PressureConfig {
    fn default() -> Self {
        Self {
            throttle_factor: 0.5,
            restore_delay: Duration::from_secs(30),
        }
    }
}

/// Complete cache system configuration.
#[derive(Debug, Clone, Default)]
pub struct CacheConfig {
    /// Memory tier configuration.
    pub memory: MemoryCacheConfig,
    /// Disk tier configuration.
    pub disk: DiskCacheConfig,
    /// Pressure monitor configuration.
    pub pressure: PressureConfig,
}

impl CacheConfig {
    /// Create a configuration with all defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the memory tier entry-count ceiling.
    pub fn with_memory_entries(mut self, max_entries: usize) -> Self {
        self.memory.max_entries = max_entries;
        self
    }

    /// Set the memory tier cost ceiling in bytes.
    pub fn with_memory_cost(mut self, max_cost_bytes: u64) -> Self {
        self.memory.max_cost_bytes = max_cost_bytes;
        self
    }

    /// Set the disk tier size ceiling in bytes.
    pub fn with_disk_size(mut self, max_size_bytes: u64) -> Self {
        self.disk.max_size_bytes = max_size_bytes;
        self
    }

    /// Set the cache directory.
    pub fn with_cache_dir(mut self, dir: PathBuf) -> Self {
        self.disk.cache_dir = dir;
        self
    }

    /// Set the pressure-warning throttle factor.
    pub fn with_throttle_factor(mut self, factor: f64) -> Self {
        self.pressure.throttle_factor = factor;
        self
    }

    /// Set the throttle restoration delay.
    pub fn with_restore_delay(mut self, delay: Duration) -> Self {
        self.pressure.restore_delay = delay;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), CacheError> {
        if self.memory.max_entries == 0 {
            return Err(CacheError::InvalidConfig(
                "memory entry ceiling must be at least 1".to_string(),
            ));
        }
        if self.memory.max_cost_bytes == 0 {
            return Err(CacheError::InvalidConfig(
                "memory cost ceiling must be nonzero".to_string(),
            ));
        }
        if self.disk.max_size_bytes == 0 {
            return Err(CacheError::InvalidConfig(
                "disk size ceiling must be nonzero".to_string(),
            ));
        }
        if !(self.pressure.throttle_factor > 0.0 && self.pressure.throttle_factor <= 1.0) {
            return Err(CacheError::InvalidConfig(format!(
                "throttle factor must be in (0, 1], got {}",
                self.pressure.throttle_factor
            )));
        }
        Ok(())
    }
}

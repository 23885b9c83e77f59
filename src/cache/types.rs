//! Core types for the cache system.

use std::fmt;

use thiserror::Error;

use crate::cache::entry::WindowLevel;

/// Cache key uniquely identifying a cached artifact.
///
/// The key is an opaque string. Two requests that would produce
/// byte-identical artifacts must map to the same key; requests that could
/// differ must map to different keys. [`CacheKey::for_rendering`] derives a
/// key from the parameters that determine a rendered frame.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Create a cache key from an already-derived identifier.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Derive the key for a rendered frame.
    ///
    /// Combines the source instance identity with the rendering parameters
    /// that determine the output bytes: frame index and window/level. The
    /// derivation is deterministic, so repeated requests for the same frame
    /// under the same display settings share one cache slot.
    pub fn for_rendering(instance_uid: &str, frame_index: u32, window_level: WindowLevel) -> Self {
        Self(format!(
            "{}:{}:{}:{}",
            instance_uid, frame_index, window_level.center, window_level.width
        ))
    }

    /// The key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CacheKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

/// Cache-related errors.
///
/// None of these are fatal to the surrounding application: a cache that
/// cannot read or write simply degrades to "nothing cached" and the producer
/// recomputes the artifact.
#[derive(Debug, Error)]
pub enum CacheError {
    /// I/O error during cache operations
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Entry could not be encoded or decoded
    #[error("cache entry codec error: {0}")]
    Codec(String),

    /// Invalid cache configuration
    #[error("invalid cache configuration: {0}")]
    InvalidConfig(String),
}

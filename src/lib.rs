//! SliceCache - tiered caching for medical image artifacts
//!
//! This library provides a two-tier (memory + disk) cache for large,
//! expensive-to-recompute imaging artifacts: rendered bitmaps, raw pixel
//! buffers, and the display parameters they were produced under.
//!
//! # High-Level API
//!
//! Most callers only need the [`cache::TieredCache`] facade:
//!
//! ```ignore
//! use slicecache::cache::{CacheConfig, CacheEntry, CacheKey, TieredCache, WindowLevel};
//!
//! let cache = TieredCache::start(CacheConfig::new()).await?;
//!
//! let key = CacheKey::for_rendering(&instance_uid, frame, window_level);
//! cache.store(key.clone(), entry);
//!
//! if let Some(entry) = cache.retrieve(&key).await {
//!     // Serve the cached artifact
//! } else {
//!     // Miss - re-decode / re-render and store
//! }
//! ```

pub mod cache;
pub mod config;
pub mod logging;
pub mod time;

/// Version of the SliceCache library.
///
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

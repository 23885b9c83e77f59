//! Key-to-path mapping for the disk tier.
//!
//! Cache keys are opaque strings that may contain characters unsafe for
//! filenames. The mapping base64-encodes the key bytes (URL-safe alphabet,
//! no padding), so it is deterministic, collision-free for distinct keys,
//! filesystem-safe on all platforms, and reversible.

use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};

use crate::cache::types::CacheKey;

/// File extension for persisted cache entries.
pub const ENTRY_EXTENSION: &str = "entry";

/// Convert a cache key to its filename.
pub fn key_to_filename(key: &CacheKey) -> String {
    format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(key.as_str().as_bytes()),
        ENTRY_EXTENSION
    )
}

/// Parse a filename back to a cache key.
///
/// Returns `None` for files that are not cache entries (wrong extension,
/// invalid encoding).
pub fn filename_to_key(filename: &str) -> Option<CacheKey> {
    let encoded = filename.strip_suffix(&format!(".{}", ENTRY_EXTENSION))?;
    let bytes = URL_SAFE_NO_PAD.decode(encoded).ok()?;
    let key = String::from_utf8(bytes).ok()?;
    Some(CacheKey::new(key))
}

/// Full path of the entry file for a key under a cache directory.
pub fn entry_path(cache_dir: &Path, key: &CacheKey) -> PathBuf {
    cache_dir.join(key_to_filename(key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_to_filename_is_filesystem_safe() {
        let key = CacheKey::new("1.2.840.10008/frame:3:40.5:400");
        let filename = key_to_filename(&key);

        assert!(filename.ends_with(".entry"));
        assert!(!filename.contains('/'));
        assert!(!filename.contains(':'));
    }

    #[test]
    fn test_key_to_filename_deterministic() {
        let key = CacheKey::new("same-key");

        assert_eq!(key_to_filename(&key), key_to_filename(&key));
    }

    #[test]
    fn test_distinct_keys_distinct_filenames() {
        let a = key_to_filename(&CacheKey::new("instance:1"));
        let b = key_to_filename(&CacheKey::new("instance:2"));

        assert_ne!(a, b);
    }

    #[test]
    fn test_filename_round_trip() {
        let key = CacheKey::new("1.2.840:7:40:400");
        let filename = key_to_filename(&key);

        assert_eq!(filename_to_key(&filename), Some(key));
    }

    #[test]
    fn test_filename_to_key_rejects_foreign_files() {
        assert_eq!(filename_to_key("readme.txt"), None);
        assert_eq!(filename_to_key("not base64!.entry"), None);
        assert_eq!(filename_to_key(""), None);
    }

    #[test]
    fn test_entry_path_under_cache_dir() {
        let key = CacheKey::new("instance:1");
        let path = entry_path(Path::new("/tmp/cache"), &key);

        assert_eq!(path.parent().unwrap(), Path::new("/tmp/cache"));
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            key_to_filename(&key)
        );
    }
}

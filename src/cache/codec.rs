//! Durable encoding of cache entries.
//!
//! Entries are written to disk as a small envelope: a magic tag, a format
//! version byte, and a bincode payload. The envelope lets `decode` reject
//! foreign or truncated files as corrupt instead of misinterpreting them;
//! corrupt entries are treated as cache misses by the disk tier, never as
//! errors.

use crate::cache::entry::CacheEntry;
use crate::cache::types::CacheError;

/// Tag identifying a cache entry file.
const MAGIC: [u8; 4] = *b"SLCE";

/// Current envelope format version.
const FORMAT_VERSION: u8 = 1;

/// Encode an entry into its durable byte representation.
pub fn encode(entry: &CacheEntry) -> Result<Vec<u8>, CacheError> {
    let payload = bincode::serialize(entry).map_err(|e| CacheError::Codec(e.to_string()))?;

    let mut buf = Vec::with_capacity(MAGIC.len() + 1 + payload.len());
    buf.extend_from_slice(&MAGIC);
    buf.push(FORMAT_VERSION);
    buf.extend_from_slice(&payload);
    Ok(buf)
}

/// Decode an entry from its durable byte representation.
///
/// Fails on unknown magic, unknown version, truncation, or a payload that
/// does not deserialize. Callers downgrade every failure to a miss.
pub fn decode(bytes: &[u8]) -> Result<CacheEntry, CacheError> {
    if bytes.len() < MAGIC.len() + 1 {
        return Err(CacheError::Codec("entry file truncated".to_string()));
    }

    if bytes[..MAGIC.len()] != MAGIC {
        return Err(CacheError::Codec("not a cache entry file".to_string()));
    }

    let version = bytes[MAGIC.len()];
    if version != FORMAT_VERSION {
        return Err(CacheError::Codec(format!(
            "unsupported entry format version {}",
            version
        )));
    }

    bincode::deserialize(&bytes[MAGIC.len() + 1..]).map_err(|e| CacheError::Codec(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::entry::{ImageMetadata, WindowLevel};

    fn test_entry() -> CacheEntry {
        CacheEntry::new(
            ImageMetadata {
                rows: 256,
                columns: 256,
                modality: "MR".to_string(),
                bits_allocated: 16,
                pixel_spacing: None,
                study_instance_uid: "1.2.3".to_string(),
                series_instance_uid: "1.2.3.4".to_string(),
                sop_instance_uid: "1.2.3.4.5".to_string(),
            },
            Some(vec![1, 2, 3, 4]),
            Some(vec![9, 8, 7]),
            WindowLevel {
                center: 300.0,
                width: 600.0,
            },
        )
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let entry = test_entry();
        let bytes = encode(&entry).unwrap();
        let decoded = decode(&bytes).unwrap();

        assert_eq!(decoded, entry);
    }

    #[test]
    fn test_encode_starts_with_magic_and_version() {
        let bytes = encode(&test_entry()).unwrap();

        assert_eq!(&bytes[..4], b"SLCE");
        assert_eq!(bytes[4], FORMAT_VERSION);
    }

    #[test]
    fn test_decode_rejects_truncated_input() {
        assert!(decode(b"SLC").is_err());
        assert!(decode(b"").is_err());
    }

    #[test]
    fn test_decode_rejects_wrong_magic() {
        let mut bytes = encode(&test_entry()).unwrap();
        bytes[0] = b'X';

        assert!(decode(&bytes).is_err());
    }

    #[test]
    fn test_decode_rejects_unknown_version() {
        let mut bytes = encode(&test_entry()).unwrap();
        bytes[4] = 99;

        assert!(decode(&bytes).is_err());
    }

    #[test]
    fn test_decode_rejects_corrupt_payload() {
        let mut bytes = encode(&test_entry()).unwrap();
        bytes.truncate(bytes.len() / 2);

        assert!(decode(&bytes).is_err());
    }
}

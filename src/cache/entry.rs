//! Cache entry value model.
//!
//! A [`CacheEntry`] bundles one imaging artifact with the metadata needed to
//! validate or reconstruct it. Entries are immutable once constructed;
//! replacement is modeled as overwrite-by-key, and the in-memory tier shares
//! entries behind `Arc` so promotion never copies pixel buffers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Display window/level pair a rendered image was produced under.
///
/// Part of the entry's identity: the same source pixels rendered under a
/// different window/level are a different artifact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowLevel {
    /// Window center in modality units.
    pub center: f64,
    /// Window width in modality units.
    pub width: f64,
}

/// Structural description of the source image.
///
/// Opaque to the cache: stored and returned unchanged, never interpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageMetadata {
    /// Image height in pixels.
    pub rows: u32,
    /// Image width in pixels.
    pub columns: u32,
    /// Modality string (e.g. "CT", "MR").
    pub modality: String,
    /// Bits allocated per stored pixel.
    pub bits_allocated: u16,
    /// Physical pixel spacing in mm (row, column), if known.
    pub pixel_spacing: Option<(f64, f64)>,
    /// Study identifier.
    pub study_instance_uid: String,
    /// Series identifier.
    pub series_instance_uid: String,
    /// Instance identifier.
    pub sop_instance_uid: String,
}

/// One cached imaging artifact.
///
/// At least one of `rendered_image` (encoded, display-ready bitmap bytes)
/// and `pixel_data` (raw decoded pixel bytes) is expected to be populated by
/// the producer; the cache stores whichever are present and returns them
/// unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Source image description, passed through unchanged.
    pub metadata: ImageMetadata,
    /// Encoded bitmap bytes, post-rendering.
    pub rendered_image: Option<Vec<u8>>,
    /// Raw decoded pixel bytes, pre-rendering.
    pub pixel_data: Option<Vec<u8>>,
    /// Window/level the rendered image was produced under.
    pub window_level: WindowLevel,
    /// Creation time. Informational only; eviction uses access recency.
    pub created_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Create a new entry stamped with the current time.
    pub fn new(
        metadata: ImageMetadata,
        rendered_image: Option<Vec<u8>>,
        pixel_data: Option<Vec<u8>>,
        window_level: WindowLevel,
    ) -> Self {
        Self {
            metadata,
            rendered_image,
            pixel_data,
            window_level,
            created_at: Utc::now(),
        }
    }

    /// Cost of this entry for memory-tier accounting, in bytes.
    ///
    /// Derived, not stored: the sum of the byte lengths of the optional
    /// buffers. Metadata is not counted; it is negligible next to pixel data.
    pub fn estimated_cost(&self) -> u64 {
        let rendered = self.rendered_image.as_ref().map_or(0, Vec::len);
        let raw = self.pixel_data.as_ref().map_or(0, Vec::len);
        (rendered + raw) as u64
    }
}

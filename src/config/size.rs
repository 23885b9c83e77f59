//! Human-readable size parsing and formatting (e.g., "2GB", "500MB").

use thiserror::Error;

/// Error parsing a size string.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid size '{input}' - expected format like '2GB', '500MB', or '1024KB'")]
pub struct SizeParseError {
    input: String,
}

impl SizeParseError {
    fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }
}

/// Parse a human-readable size string into bytes.
///
/// Supports:
/// - Bare numbers (treated as bytes)
/// - KB/K suffix (1024 bytes)
/// - MB/M suffix (1024² bytes)
/// - GB/G suffix (1024³ bytes)
/// - Case-insensitive
/// - Whitespace tolerant
///
/// # Examples
///
/// ```
/// use slicecache::config::parse_size;
///
/// assert_eq!(parse_size("1024").unwrap(), 1024);
/// assert_eq!(parse_size("1KB").unwrap(), 1024);
/// assert_eq!(parse_size("2GB").unwrap(), 2 * 1024 * 1024 * 1024);
/// assert_eq!(parse_size("200mb").unwrap(), 200 * 1024 * 1024);
/// ```
pub fn parse_size(s: &str) -> Result<u64, SizeParseError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(SizeParseError::new(s));
    }

    let upper = s.to_uppercase();

    let (num_str, multiplier) = if upper.ends_with("GB") || upper.ends_with('G') {
        let suffix_len = if upper.ends_with("GB") { 2 } else { 1 };
        (s[..s.len() - suffix_len].trim(), 1024_u64 * 1024 * 1024)
    } else if upper.ends_with("MB") || upper.ends_with('M') {
        let suffix_len = if upper.ends_with("MB") { 2 } else { 1 };
        (s[..s.len() - suffix_len].trim(), 1024_u64 * 1024)
    } else if upper.ends_with("KB") || upper.ends_with('K') {
        let suffix_len = if upper.ends_with("KB") { 2 } else { 1 };
        (s[..s.len() - suffix_len].trim(), 1024_u64)
    } else if upper.ends_with('B') {
        (s[..s.len() - 1].trim(), 1)
    } else {
        (s, 1)
    };

    num_str
        .parse::<u64>()
        .map(|n| n * multiplier)
        .map_err(|_| SizeParseError::new(s))
}

/// Format a byte count as a human-readable string.
///
/// # Examples
///
/// ```
/// use slicecache::config::format_size;
///
/// assert_eq!(format_size(512), "512 B");
/// assert_eq!(format_size(2048), "2.0 KB");
/// assert_eq!(format_size(200 * 1024 * 1024), "200.0 MB");
/// ```
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;
    const GB: u64 = 1024 * 1024 * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

//! Configuration helpers shared across the crate.

mod size;

pub use size::{format_size, parse_size, SizeParseError};

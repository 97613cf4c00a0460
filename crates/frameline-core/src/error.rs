//! Error types for Frameline core.

use thiserror::Error;

/// Errors from constructing or combining time values.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeError {
    #[error("time values must be non-negative (start {start}, end {end})")]
    Negative { start: i64, end: i64 },

    #[error("span end {end} precedes start {start}")]
    Inverted { start: i64, end: i64 },

    #[error("tick arithmetic overflowed")]
    Overflow,
}

/// Result type alias for core time operations.
pub type Result<T, E = TimeError> = std::result::Result<T, E>;

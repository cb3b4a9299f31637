//! Error types for formatting operations
//!
//! Malformed or hostile input is never an error: it is repaired or pruned.
//! A `FormatError` always means the pipeline itself gave up, which callers
//! should tell apart from an empty (`Ok("")`) result.

use thiserror::Error;

/// Errors that can occur while formatting post text
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    /// Element nesting exceeded the configured maximum depth
    #[error("Formatting failed: nesting depth {depth} exceeds maximum {max_depth}")]
    TooDeep { depth: usize, max_depth: usize },
    /// Formatting exceeded the configured time budget
    #[error("Formatting failed: timeout exceeded")]
    Timeout,
    /// The parser or serializer failed unexpectedly
    #[error("Formatting failed: internal error: {0}")]
    Internal(String),
}

impl FormatError {
    /// Stable numeric code, for hosts that log or report errors by number
    pub fn code(&self) -> u32 {
        match self {
            FormatError::TooDeep { .. } => 4,
            FormatError::Timeout => 3,
            FormatError::Internal(_) => 99,
        }
    }
}

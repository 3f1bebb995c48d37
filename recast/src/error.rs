//! Error types for the translation engine
//!
//! This module provides error handling using the `thiserror` crate.
//! Errors are categorized by where a request fails: compiling the find
//! pattern, expanding the replacement, validating the request, consuming the
//! suggestion service's output, or running the scan under a budget.

use thiserror::Error;

/// The main error type for the engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The host engine rejected the find pattern
    #[error("invalid pattern: {0}")]
    InvalidPattern(String),

    /// The translated template references a group the pattern lacks
    #[error("invalid replacement: {0}")]
    InvalidReplacement(String),

    /// The request itself cannot be served
    #[error("unsupported input: {0}")]
    UnsupportedInput(String),

    /// The pattern suggestion service returned nothing usable
    #[error("upstream failure: {0}")]
    UpstreamFailure(String),

    /// The host engine aborted a scan after exhausting its budget
    #[error("execution limit reached: {0}")]
    ExecutionLimit(String),
}

/// Fieldless discriminant of [`Error`], for mapping onto transport responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidPattern,
    InvalidReplacement,
    UnsupportedInput,
    UpstreamFailure,
    ExecutionLimit,
}

impl Error {
    /// Get the kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidPattern(_) => ErrorKind::InvalidPattern,
            Error::InvalidReplacement(_) => ErrorKind::InvalidReplacement,
            Error::UnsupportedInput(_) => ErrorKind::UnsupportedInput,
            Error::UpstreamFailure(_) => ErrorKind::UpstreamFailure,
            Error::ExecutionLimit(_) => ErrorKind::ExecutionLimit,
        }
    }

    /// Get the diagnostic message without the kind prefix
    pub fn message(&self) -> &str {
        match self {
            Error::InvalidPattern(msg)
            | Error::InvalidReplacement(msg)
            | Error::UnsupportedInput(msg)
            | Error::UpstreamFailure(msg)
            | Error::ExecutionLimit(msg) => msg,
        }
    }

    /// Prefix the message with where the error happened, keeping the kind
    pub fn with_context(self, context: &str) -> Self {
        let wrap = |msg: String| format!("{context}: {msg}");
        match self {
            Error::InvalidPattern(msg) => Error::InvalidPattern(wrap(msg)),
            Error::InvalidReplacement(msg) => Error::InvalidReplacement(wrap(msg)),
            Error::UnsupportedInput(msg) => Error::UnsupportedInput(wrap(msg)),
            Error::UpstreamFailure(msg) => Error::UpstreamFailure(wrap(msg)),
            Error::ExecutionLimit(msg) => Error::ExecutionLimit(wrap(msg)),
        }
    }
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, Error>;

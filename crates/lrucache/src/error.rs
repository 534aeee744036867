//! Error types for lrucache

use std::fmt;

/// Result type alias for fallible cache operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors reported by the cache engine
///
/// Both variants signal a caller precondition that did not hold. Nothing is
/// partially applied when one is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The key passed to a value-returning lookup is not cached
    KeyNotFound,

    /// Statistics were requested while no statistics sink is attached
    NotMonitoring,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::KeyNotFound => write!(f, "Key not found"),
            Error::NotMonitoring => write!(f, "Cache is not being monitored"),
        }
    }
}

impl std::error::Error for Error {}

/// Error returned by [`LruCache::check_invariants`](crate::LruCache::check_invariants)
/// when the hash index, recency sequence and last-accessed slot disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantError(String);

impl InvariantError {
    /// Creates a new `InvariantError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for InvariantError {}

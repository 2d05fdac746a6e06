//! Error type shared by both map engines.

use thiserror::Error;

/// Errors reported by [`OrderedMap`](crate::OrderedMap) operations.
///
/// A failed operation never leaves the map partially modified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    #[error("key already present")]
    DuplicateKey,
    #[error("key not found")]
    KeyNotFound,
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

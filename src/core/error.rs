//! Crate-wide error type.

use thiserror::Error;

/// Errors produced by the graph assembly pipeline.
#[derive(Error, Debug)]
pub enum Error {
    /// A query that requires data was made against an empty storage.
    #[error("empty storage: {0}")]
    EmptyStorage(&'static str),

    /// A registry lookup failed. Indicates incomplete wiring, not a
    /// transient condition; callers must not retry.
    #[error("not found: {0}")]
    NotFound(String),

    /// A malformed numeric or structural input.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A vertex or payload had a different type than the consumer expected.
    /// Fatal: indicates an upstream wiring or allocation bug.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Shorthand for a `NotFound` with a formatted message.
    pub fn not_found(what: impl Into<String>) -> Self {
        Error::NotFound(what.into())
    }
}

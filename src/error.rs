//! Error types
//!
//! Every failure is surfaced to the immediate caller; nothing is retried
//! internally.

use thiserror::Error;

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, PoolError>;

/// Errors produced by the pool, acquisition and materialization paths
#[derive(Debug, Error)]
pub enum PoolError {
    /// A required payload or stream reference was absent
    #[error("argument missing: {0}")]
    ArgumentMissing(&'static str),

    /// A source stream reported a cursor outside its declared bounds
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// A computed length does not fit a single buffer
    #[error("arithmetic overflow: {0}")]
    Overflow(&'static str),

    /// The shared pool manager could not be built
    #[error("pool manager construction failed: {0}")]
    Construction(String),

    /// A stream would grow past the pool's maximum stream length
    #[error("stream capacity exceeded: requested {requested} bytes (max {max})")]
    CapacityExceeded {
        /// Requested length in bytes
        requested: u64,
        /// Configured maximum
        max: u64,
    },

    /// Cancellation was signalled while copying a source
    #[error("operation cancelled")]
    Cancelled,

    /// I/O error from a source stream or a pooled stream
    #[error("I/O error: {0}")]
    Io(#[source] std::io::Error),
}

impl PoolError {
    /// Build an `InvalidState` for a cursor past the end of a stream
    pub(crate) fn position_out_of_bounds(position: u64, len: u64) -> Self {
        PoolError::InvalidState(format!(
            "stream position {} is out of bounds (length {})",
            position, len
        ))
    }
}

/// Unwraps pool errors that travelled through a `std::io` trait impl
impl From<std::io::Error> for PoolError {
    fn from(err: std::io::Error) -> Self {
        if !err.get_ref().is_some_and(|inner| inner.is::<PoolError>()) {
            return PoolError::Io(err);
        }

        let kind = err.kind();
        match err.into_inner().map(|inner| inner.downcast::<PoolError>()) {
            Some(Ok(pool_err)) => *pool_err,
            Some(Err(inner)) => PoolError::Io(std::io::Error::new(kind, inner)),
            None => PoolError::Io(kind.into()),
        }
    }
}

/// Lets pool errors surface through the `std::io` trait impls
impl From<PoolError> for std::io::Error {
    fn from(err: PoolError) -> Self {
        match err {
            PoolError::Io(e) => e,
            other => std::io::Error::new(std::io::ErrorKind::Other, other),
        }
    }
}

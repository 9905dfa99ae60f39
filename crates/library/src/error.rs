//! Library Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction. Rename failures have their own kinds in
//! [`rename::error`](crate::rename::error).

use derive_more::{Display, Error};

/// A library error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// A lookup or update via [`renamarr_cache::Repository`] failed.
    #[display("library cache operation failed")]
    Cache,
    /// The configured storage roots are unusable.
    #[display("storage roots are invalid")]
    Storage,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Cache)
    }
}

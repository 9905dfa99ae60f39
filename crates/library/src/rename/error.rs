//! Error types for the [`rename`](super) module.
//!
//! Uses [`exn`] for automatic location tracking and error tree construction.
//! Only [`PatternNotFound`](ErrorKind::PatternNotFound),
//! [`NoFilesSelected`](ErrorKind::NoFilesSelected) and dependency failures
//! while loading a batch abort a whole task; every other kind fails a single
//! file and ends up as a message in the
//! [`BatchReport`](super::BatchReport).

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A rename error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for rename operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies the origin of a rename failure.
///
/// ### Batch Errors
/// - [`ErrorKind::PatternNotFound`]
/// - [`ErrorKind::NoFilesSelected`]
///
/// ### Per-file Errors
/// - [`ErrorKind::NoFilePath`]
/// - [`ErrorKind::RootNotFound`]
/// - [`ErrorKind::InvalidDestination`]
/// - [`ErrorKind::SourceFileMissing`]
/// - [`ErrorKind::DestinationOccupied`]
/// - [`ErrorKind::DirectoryCreateFailed`]
/// - [`ErrorKind::RenameFailed`]
/// - [`ErrorKind::SidecarMoveFailed`]
///
/// ### Dependency Errors
/// - [`ErrorKind::Cache`]
/// - [`ErrorKind::Storage`]
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("naming pattern not found: {_0}")]
    PatternNotFound(#[error(not(source))] i64),
    #[display("no files selected")]
    NoFilesSelected,
    #[display("file {_0} has no path")]
    NoFilePath(#[error(not(source))] i64),
    #[display("no storage root contains {}", _0.display())]
    RootNotFound(#[error(not(source))] PathBuf),
    /// The rendered pattern is empty or climbs out of its base directory.
    #[display("rendered path is not a valid relative path: {_0}")]
    InvalidDestination(#[error(not(source))] String),
    #[display("source file not found: {}", _0.display())]
    SourceFileMissing(#[error(not(source))] PathBuf),
    /// A different file already sits at the destination.
    #[display("destination already exists: {}", _0.display())]
    DestinationOccupied(#[error(not(source))] PathBuf),
    #[display("cannot create directory: {}", _0.display())]
    DirectoryCreateFailed(#[error(not(source))] PathBuf),
    #[display("cannot rename file: {}", _0.display())]
    RenameFailed(#[error(not(source))] PathBuf),
    #[display("cannot move sidecar file: {}", _0.display())]
    SidecarMoveFailed(#[error(not(source))] PathBuf),
    /// A lookup via [`renamarr_cache::Repository`] failed.
    #[display("library cache operation failed")]
    Cache,
    /// A filesystem check failed, or the storage roots are unusable.
    #[display("storage operation failed")]
    Storage,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::DirectoryCreateFailed(_) | Self::RenameFailed(_) | Self::Cache | Self::Storage)
    }
}

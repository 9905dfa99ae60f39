//! Moving files to their canonical paths.
//!
//! [`RenameExecutor`] handles one batch of files against one pattern. Files
//! are processed strictly one after another: concurrent renames into the same
//! directory tree could race on directory creation and destination checks.
//! A failing file never aborts the batch; it is recorded in the
//! [`BatchReport`] and the next file is processed.
//!
//! [`RenameFilesTask`] is the deferred unit of work wrapping the executor:
//! it loads the pattern and files from the cache, runs the batch and commits
//! every moved file back.

pub mod error;
mod executor;
mod report;
mod task;

pub use self::executor::{Base, RenameExecutor};
pub use self::report::{BatchReport, MAX_REPORTED_ERRORS, RenamedFile};
pub use self::task::RenameFilesTask;
use crate::rename::error::Result;
use renamarr_naming::models::MediaFile;

/// The outcome of (successfully) processing a single file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// The file was moved; `file` carries its new path and cleared flag.
    Renamed { from: String, file: MediaFile },
    /// The file was flagged but already sits at its canonical path; only the
    /// flag was cleared.
    AlreadyCorrect(MediaFile),
    /// The file was not flagged for renaming; nothing was done.
    Skipped(i64),
}
impl Action {
    /// The file as it must be persisted, if it changed.
    pub fn updated_file(&self) -> Option<&MediaFile> {
        match self {
            Self::Renamed { file, .. } | Self::AlreadyCorrect(file) => Some(file),
            Self::Skipped(_) => None,
        }
    }
}

/// Progress events emitted by [`RenameExecutor::rename_stream`].
///
/// Events follow a strict ordering:
/// 1. [`Started`](Self::Started): exactly once, with the number of files.
/// 2. [`Processed`](Self::Processed): once per file, in input order.
/// 3. [`Complete`](Self::Complete): exactly once.
#[derive(Debug)]
pub enum RenameEvent {
    Started(u64),
    Processed { file_id: i64, result: Result<Action> },
    Complete,
}

//! Filesystem access used when moving media files.
//!
//! Only the handful of operations a rename needs are exposed. All paths are
//! absolute; implementations reject relative ones with
//! [`InvalidPath`](crate::error::ErrorKind::InvalidPath).

mod local;
#[cfg(feature = "mock")]
mod mock;

pub use self::local::LocalFilesystem;
#[cfg(feature = "mock")]
pub use self::mock::MockFilesystem;
use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Asynchronous filesystem operations.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// # use renamarr_storage::{Filesystem, error::Result};
/// # async fn example(fs: &dyn Filesystem) -> Result<()> {
/// let from = Path::new("/music/incoming/track.flac");
/// let to = Path::new("/music/Artist/Album/01 - Track.flac");
/// if fs.exists(from).await? {
///     fs.create_dir_all(to.parent().unwrap()).await?;
///     fs.rename(from, to).await?;
/// }
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait Filesystem: Send + Sync {
    /// Check if a file or directory exists.
    async fn exists(&self, path: &Path) -> Result<bool>;

    /// Create a directory and any missing parents. Succeeds if the directory
    /// already exists.
    async fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Move a file. Atomic when both paths are on the same filesystem.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the source
    /// does not exist.
    ///
    /// # Notes
    /// - Parent directories of `to` are **not** created.
    /// - An existing file at `to` is overwritten; callers check first.
    async fn rename(&self, from: &Path, to: &Path) -> Result<()>;
}

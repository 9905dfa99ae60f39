//! In-memory filesystem for testing.

use crate::error::{ErrorKind, Result};
use crate::fs::Filesystem;
use crate::path::normalize_absolute;
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::io::Error as IoError;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

#[derive(Default)]
struct State {
    files: BTreeSet<PathBuf>,
    dirs: BTreeSet<PathBuf>,
    failing_renames: BTreeSet<PathBuf>,
    failing_dirs: BTreeSet<PathBuf>,
}
impl State {
    fn add_dirs(&mut self, path: &Path) {
        for ancestor in path.ancestors() {
            self.dirs.insert(ancestor.to_path_buf());
        }
    }
}

/// In-memory filesystem for testing.
///
/// Tracks a set of file paths and the directories containing them, behind a
/// [`RwLock`] so all trait methods work on `&self`. Like a real filesystem,
/// a rename fails when the destination's parent directory is missing.
/// Failures can be injected per path.
///
/// # Examples
///
/// ```
/// use renamarr_storage::fs::{Filesystem, MockFilesystem};
/// use std::path::Path;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let fs = MockFilesystem::with_files(["/music/in/a.flac"]);
/// assert!(fs.exists(Path::new("/music/in")).await?);
///
/// fs.create_dir_all(Path::new("/music/A")).await?;
/// fs.rename(Path::new("/music/in/a.flac"), Path::new("/music/A/a.flac")).await?;
/// assert!(fs.exists(Path::new("/music/A/a.flac")).await?);
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct MockFilesystem {
    state: RwLock<State>,
}

impl MockFilesystem {
    /// Create a mock filesystem pre-populated with files (and their parent
    /// directories).
    ///
    /// Panics if any path is not absolute. If test setup is wrong, then test
    /// should not pass.
    pub fn with_files(files: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        let mut state = State::default();
        for path in files {
            let path = path.into();
            let Ok(normalized) = normalize_absolute(&path) else {
                panic!("MockFilesystem::with_files: invalid path {}", path.display());
            };
            if let Some(parent) = normalized.parent() {
                state.add_dirs(parent);
            }
            state.files.insert(normalized);
        }
        Self { state: RwLock::new(state) }
    }

    /// Make every rename from or to `path` fail with an I/O error.
    pub async fn fail_rename(&self, path: impl Into<PathBuf>) {
        self.state.write().await.failing_renames.insert(path.into());
    }

    /// Make creating `path` (or anything below it) fail with an I/O error.
    pub async fn fail_create_dir(&self, path: impl Into<PathBuf>) {
        self.state.write().await.failing_dirs.insert(path.into());
    }

    /// Snapshot of all file paths, sorted.
    pub async fn files(&self) -> Vec<PathBuf> {
        self.state.read().await.files.iter().cloned().collect()
    }
}

#[async_trait]
impl Filesystem for MockFilesystem {
    async fn exists(&self, path: &Path) -> Result<bool> {
        let path = normalize_absolute(path)?;
        let state = self.state.read().await;
        Ok(state.files.contains(&path) || state.dirs.contains(&path))
    }

    async fn create_dir_all(&self, path: &Path) -> Result<()> {
        let path = normalize_absolute(path)?;
        let mut state = self.state.write().await;
        if state.failing_dirs.iter().any(|failing| path.starts_with(failing)) {
            exn::bail!(ErrorKind::Io(IoError::other(format!("injected failure: {}", path.display()))));
        }
        if let Some(file) = path.ancestors().find(|a| state.files.contains(*a)) {
            exn::bail!(ErrorKind::AlreadyExists(file.to_path_buf()));
        }
        state.add_dirs(&path);
        Ok(())
    }

    async fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        let from = normalize_absolute(from)?;
        let to = normalize_absolute(to)?;
        let mut state = self.state.write().await;
        if state.failing_renames.contains(&from) || state.failing_renames.contains(&to) {
            exn::bail!(ErrorKind::Io(IoError::other(format!("injected failure: {}", from.display()))));
        }
        if !state.files.contains(&from) {
            exn::bail!(ErrorKind::NotFound(from));
        }
        if let Some(parent) = to.parent()
            && !state.dirs.contains(parent)
        {
            exn::bail!(ErrorKind::NotFound(parent.to_path_buf()));
        }
        state.files.remove(&from);
        state.files.insert(to);
        Ok(())
    }
}

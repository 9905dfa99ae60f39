//! Storage roots and owning-root resolution.

use crate::error::{ErrorKind, Result};
use crate::path::normalize_absolute;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// A directory under which library files are expected to live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageRoot {
    pub id: i64,
    pub name: String,
    pub path: PathBuf,
}
impl StorageRoot {
    pub fn new(id: i64, name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self { id, name: name.into(), path: path.into() }
    }

    /// `path` relative to this root, if the root contains it.
    pub fn relative<'a>(&self, path: &'a Path) -> Option<&'a Path> {
        path.strip_prefix(&self.path).ok()
    }
}

/// The set of known storage roots.
///
/// Roots may nest (`/music` and `/music/unsorted`); a file belongs to the
/// deepest root containing it. Two roots with the same path are rejected,
/// since resolution between them would be arbitrary.
#[derive(Debug, Clone, Default)]
pub struct StorageRoots {
    roots: Vec<StorageRoot>,
}
impl StorageRoots {
    /// Normalizes every root path and checks for duplicates.
    ///
    /// Returns [`InvalidPath`](ErrorKind::InvalidPath) for a relative root path
    /// and [`DuplicateRoot`](ErrorKind::DuplicateRoot) when two roots normalize
    /// to the same path.
    pub fn new(roots: impl IntoIterator<Item = StorageRoot>) -> Result<Self> {
        let mut normalized: Vec<StorageRoot> = Vec::new();
        for mut root in roots {
            root.path = normalize_absolute(&root.path)?;
            if normalized.iter().any(|r| r.path == root.path) {
                exn::bail!(ErrorKind::DuplicateRoot(root.path));
            }
            normalized.push(root);
        }
        Ok(Self { roots: normalized })
    }

    /// Returns the root whose path is the longest component-wise prefix of
    /// `path`, or `None` when no root contains it.
    ///
    /// ```
    /// use renamarr_storage::{StorageRoot, StorageRoots};
    /// use std::path::Path;
    ///
    /// let roots = StorageRoots::new([
    ///     StorageRoot::new(1, "music", "/music"),
    ///     StorageRoot::new(2, "unsorted", "/music/unsorted"),
    /// ]).unwrap();
    /// assert_eq!(roots.resolve(Path::new("/music/unsorted/a.mp3")).unwrap().id, 2);
    /// assert_eq!(roots.resolve(Path::new("/music/a.mp3")).unwrap().id, 1);
    /// assert!(roots.resolve(Path::new("/musicbox/a.mp3")).is_none());
    /// ```
    pub fn resolve(&self, path: &Path) -> Option<&StorageRoot> {
        self.roots
            .iter()
            .filter(|root| path.starts_with(&root.path))
            .max_by_key(|root| root.path.components().count())
    }

    /// Like [`resolve`](Self::resolve), but for a path that may be
    /// non-normalized. Fails for relative paths.
    pub fn resolve_normalized(&self, path: impl AsRef<Path>) -> Result<Option<&StorageRoot>> {
        let normalized = normalize_absolute(path)?;
        Ok(self.resolve(&normalized))
    }

    pub fn get(&self, id: i64) -> Option<&StorageRoot> {
        self.roots.iter().find(|r| r.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StorageRoot> {
        self.roots.iter()
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

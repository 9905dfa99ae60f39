//! Local filesystem access via `tokio::fs`.

use crate::error::{ErrorKind, Result};
use crate::fs::Filesystem;
use crate::path::normalize_absolute;
use async_trait::async_trait;
use std::path::Path;
use tokio::fs;
use tracing::trace;

/// The machine's own filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFilesystem;

#[async_trait]
impl Filesystem for LocalFilesystem {
    async fn exists(&self, path: &Path) -> Result<bool> {
        let path = normalize_absolute(path)?;
        Ok(fs::try_exists(&path).await.map_err(|e| ErrorKind::from_io(e, &path))?)
    }

    async fn create_dir_all(&self, path: &Path) -> Result<()> {
        let path = normalize_absolute(path)?;
        trace!(path = %path.display(), "creating directory");
        Ok(fs::create_dir_all(&path).await.map_err(|e| ErrorKind::from_io(e, &path))?)
    }

    async fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        let from = normalize_absolute(from)?;
        let to = normalize_absolute(to)?;
        trace!(from = %from.display(), to = %to.display(), "renaming");
        Ok(fs::rename(&from, &to).await.map_err(|e| ErrorKind::from_io(e, &from))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_exists() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file = temp_dir.path().join("exists.txt");
        assert!(!LocalFilesystem.exists(&file).await.unwrap());
        std::fs::write(&file, b"data").unwrap();
        assert!(LocalFilesystem.exists(&file).await.unwrap());
        assert!(LocalFilesystem.exists(temp_dir.path()).await.unwrap());
    }

    #[tokio::test]
    async fn test_relative_paths_rejected() {
        let err = LocalFilesystem.exists(Path::new("relative/file.txt")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidPath(_)));
    }

    #[tokio::test]
    async fn test_create_dir_all_is_idempotent() {
        let temp_dir = tempfile::tempdir().unwrap();
        let dir = temp_dir.path().join("a/b/c");
        LocalFilesystem.create_dir_all(&dir).await.unwrap();
        LocalFilesystem.create_dir_all(&dir).await.unwrap();
        assert!(dir.is_dir());
    }

    #[tokio::test]
    async fn test_rename() {
        let temp_dir = tempfile::tempdir().unwrap();
        let from = temp_dir.path().join("old.txt");
        let to = temp_dir.path().join("new.txt");
        std::fs::write(&from, b"data").unwrap();
        LocalFilesystem.rename(&from, &to).await.unwrap();
        assert!(!from.exists());
        assert_eq!(std::fs::read(&to).unwrap(), b"data");
    }

    #[tokio::test]
    async fn test_rename_missing_source() {
        let temp_dir = tempfile::tempdir().unwrap();
        let from = temp_dir.path().join("missing.txt");
        let err = LocalFilesystem.rename(&from, &temp_dir.path().join("new.txt")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(p) if *p == from));
    }

    #[tokio::test]
    async fn test_rename_does_not_create_parents() {
        let temp_dir = tempfile::tempdir().unwrap();
        let from = temp_dir.path().join("file.txt");
        std::fs::write(&from, b"data").unwrap();
        let result = LocalFilesystem.rename(&from, &temp_dir.path().join("a/b/file.txt")).await;
        assert!(result.is_err());
        assert!(from.exists());
    }
}

//! Path validation utilities.
//!
//! Media files and storage roots are addressed by absolute paths, while
//! rendered patterns produce paths relative to a root. Both go through the
//! same lexical resolution so a rendered path can never climb out of its root.

use crate::error::{ErrorKind, Result};
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

/// Lexically resolves `.` and `..`, returning the normal components.
///
/// Returns `None` when a `..` would climb above the start, when a component
/// contains a null byte, or on a Windows path prefix.
fn resolve(path: &Path) -> Option<Vec<&OsStr>> {
    let mut components = Vec::new();
    for component in path.components() {
        match component {
            // Null bytes pass through Path::components() on Unix but cause
            // truncation in C-based syscalls.
            Component::Normal(s) if s.as_encoded_bytes().contains(&0) => return None,
            Component::Normal(s) => components.push(s),
            Component::CurDir | Component::RootDir => {},
            Component::Prefix(_) => return None,
            Component::ParentDir => {
                components.pop()?;
            },
        }
    }
    Some(components)
}

/// Validates a path relative to a storage root.
///
/// Returns the resolved path, or [`InvalidPath`](ErrorKind::InvalidPath) if
/// the path is empty or escapes the root.
///
/// ```
/// use std::path::Path;
/// use renamarr_storage::validate_relative;
///
/// assert!(validate_relative("Artist/Album/01 - Title.flac").is_ok());
/// assert!(validate_relative("Artist/../../etc/passwd").is_err());
/// assert_eq!(
///     validate_relative("Artist//./Album/").unwrap(),
///     Path::new("Artist/Album")
/// );
/// ```
pub fn validate_relative(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    match resolve(path) {
        Some(components) if !components.is_empty() => Ok(components.into_iter().collect()),
        _ => exn::bail!(ErrorKind::InvalidPath(path.to_path_buf())),
    }
}

/// Normalizes an absolute path: `.` and `..` are resolved lexically,
/// duplicate and trailing separators dropped. `/` stays `/`.
///
/// ```
/// use std::path::Path;
/// use renamarr_storage::normalize_absolute;
///
/// assert_eq!(normalize_absolute("/music//rock/").unwrap(), Path::new("/music/rock"));
/// assert!(normalize_absolute("music").is_err());
/// ```
pub fn normalize_absolute(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    if !path.has_root() {
        exn::bail!(ErrorKind::InvalidPath(path.to_path_buf()));
    }
    match resolve(path) {
        Some(components) => Ok(std::iter::once(Component::RootDir.as_os_str()).chain(components).collect()),
        None => exn::bail!(ErrorKind::InvalidPath(path.to_path_buf())),
    }
}

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Where a companion file should go when its media file moves to
/// `destination`: same directory and base name as the destination, keeping
/// the sidecar's own extension (or `fallback_extension` when it has none).
///
/// ```
/// use renamarr_storage::sidecar_destination;
/// use std::path::Path;
///
/// let to = sidecar_destination(
///     Path::new("/music/A/B/01 - Title.flac"),
///     Path::new("/music/in/track.lrc"),
///     "txt",
/// );
/// assert_eq!(to, Path::new("/music/A/B/01 - Title.lrc"));
/// ```
pub fn sidecar_destination(destination: &Path, sidecar: &Path, fallback_extension: &str) -> PathBuf {
    let extension = sidecar
        .extension()
        .filter(|e| !e.is_empty())
        .map_or_else(|| OsString::from(fallback_extension.trim_matches('.')), |e| e.to_os_string());
    let mut name = destination.file_stem().map(|s| s.to_os_string()).unwrap_or_default();
    name.push(".");
    name.push(extension);
    destination.with_file_name(name)
}

use crate::decision::{join_root, resolve_root};
use renamarr_naming::models::TrackFile;
use renamarr_naming::{NamingDefaults, Pattern, render_path};
use renamarr_storage::StorageRoots;
use serde::Serialize;

/// What renaming a file would do, for display before committing a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenamePreview {
    pub id: i64,
    pub track_id: i64,
    pub current_name: Option<String>,
    /// Last segment of the rendered path.
    pub new_name: String,
    /// The rendered path under the file's storage root, or relative when no
    /// root contains the file.
    pub new_full_path: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub title: String,
    pub track_number: String,
    pub quality: Option<String>,
    pub format: Option<String>,
    #[serde(rename = "needRename")]
    pub need_rename: bool,
}

/// Previews `pattern` for every flagged file in `files`. Files whose flag is
/// cleared are left out.
pub fn preview(
    pattern: &Pattern,
    files: &[TrackFile],
    roots: &StorageRoots,
    defaults: &NamingDefaults,
) -> Vec<RenamePreview> {
    files
        .iter()
        .filter(|item| item.file.needs_rename)
        .map(|TrackFile { track, file }| {
            let rendered = render_path(track, pattern, Some(file), defaults);
            let new_name = rendered.rsplit('/').next().unwrap_or_default().to_string();
            let new_full_path = match resolve_root(file, roots) {
                Some(root) => join_root(&root.path, &rendered),
                None => rendered,
            };
            let album = track.album.as_ref();
            RenamePreview {
                id: file.id,
                track_id: track.id,
                current_name: file.path.clone(),
                new_name,
                new_full_path,
                artist: album.and_then(|a| a.artist.as_ref()).map(|a| a.name.clone()),
                album: album.map(|a| a.title.clone()),
                title: track.title.clone(),
                track_number: track.track_number.clone(),
                quality: file.quality.clone(),
                format: file.format.clone(),
                need_rename: file.needs_rename,
            }
        })
        .collect()
}

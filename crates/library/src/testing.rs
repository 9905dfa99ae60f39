use crate::Context;
use renamarr_naming::models::{Album, Artist, MediaFile, Medium, Track, TrackFile};
use renamarr_storage::fs::MockFilesystem;
use std::path::PathBuf;
use std::sync::Arc;

/// A file of track `Track {id}` (number `id`) on "Test Album" by "Test Artist".
pub(crate) fn track_file(id: i64, path: &str) -> TrackFile {
    let file = MediaFile {
        id,
        track_id: id,
        path: Some(path.to_string()),
        format: Some("MP3".to_string()),
        quality: Some("320 kbps".to_string()),
        size: 1_000,
        duration_secs: Some(180),
        sidecar_path: None,
        needs_rename: true,
    };
    let track = Track {
        id,
        title: format!("Track {id}"),
        track_number: id.to_string(),
        album: Some(Album {
            id: 1,
            title: "Test Album".to_string(),
            release_date: None,
            artist: Some(Artist { id: 1, name: "Test Artist".to_string(), folder: None }),
            mediums: vec![Medium { id: 1, title: None, format: Some("CD".to_string()), position: 1 }],
        }),
        medium: None,
        files: vec![file.clone()],
    };
    TrackFile { track, file }
}

pub(crate) fn context(files: impl IntoIterator<Item = impl Into<PathBuf>>) -> (Arc<MockFilesystem>, Context) {
    let fs = Arc::new(MockFilesystem::with_files(files));
    let ctx = Context::new(fs.clone());
    (fs, ctx)
}

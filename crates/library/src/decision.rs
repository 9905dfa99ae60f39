//! Rename decisions: which storage root owns a file, and whether the file
//! already sits at the path its pattern renders to.
//!
//! Comparison is exact string equality on purpose. Any metadata change that
//! alters the rendered path (a corrected artist name, a quality upgrade)
//! makes the file need a rename.

use derive_more::Display;
use renamarr_naming::models::{MediaFile, Track};
use renamarr_naming::{NamingDefaults, Pattern, render_path};
use renamarr_storage::{StorageRoot, StorageRoots};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, instrument};

/// Why a file does or does not need renaming.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RenameReason {
    #[display("no_file_path")]
    NoFilePath,
    #[display("library_not_found")]
    LibraryNotFound,
    #[display("file_is_correct")]
    FileIsCorrect,
    /// Right name under the root, but the full path differs.
    #[display("path_change_needed")]
    PathChangeNeeded,
    #[display("filename_change_needed")]
    FilenameChangeNeeded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameAnalysis {
    pub needs_rename: bool,
    pub reason: RenameReason,
    pub current_path: Option<String>,
    pub expected_path: Option<String>,
    pub filename_correct: bool,
    pub path_correct: bool,
}
impl RenameAnalysis {
    fn unresolved(reason: RenameReason, current_path: Option<&str>) -> Self {
        Self {
            needs_rename: true,
            reason,
            current_path: current_path.map(str::to_string),
            expected_path: None,
            filename_correct: false,
            path_correct: false,
        }
    }
}

/// The storage root owning `file`: the root whose path is the longest prefix
/// of the file's current path.
pub fn resolve_root<'a>(file: &MediaFile, roots: &'a StorageRoots) -> Option<&'a StorageRoot> {
    roots.resolve(Path::new(file.path.as_deref()?))
}

/// Joins a root and a rendered relative path the way stored file paths are
/// written: a single `/` between them.
pub fn join_root(root: &Path, rendered: &str) -> String {
    let root = root.to_string_lossy();
    format!("{}/{}", root.trim_end_matches('/'), rendered)
}

/// Classifies whether `file` needs renaming under `pattern`.
#[instrument(level = "debug", skip_all, fields(file_id = file.id))]
pub fn classify(
    track: &Track,
    pattern: &Pattern,
    file: &MediaFile,
    roots: &StorageRoots,
    defaults: &NamingDefaults,
) -> RenameAnalysis {
    let Some(current) = file.path.as_deref() else {
        return RenameAnalysis::unresolved(RenameReason::NoFilePath, None);
    };
    let Some(root) = resolve_root(file, roots) else {
        debug!(path = current, "no storage root contains file");
        return RenameAnalysis::unresolved(RenameReason::LibraryNotFound, Some(current));
    };

    let rendered = render_path(track, pattern, Some(file), defaults);
    let expected = join_root(&root.path, &rendered);
    let path_correct = current == expected;
    let filename_correct = relative_to(current, &root.path) == Some(rendered.as_str());
    debug!(root = %root.path.display(), expected = %expected, path_correct, filename_correct, "compared paths");

    let reason = match (filename_correct, path_correct) {
        (true, true) => RenameReason::FileIsCorrect,
        (true, false) => RenameReason::PathChangeNeeded,
        _ => RenameReason::FilenameChangeNeeded,
    };
    RenameAnalysis {
        needs_rename: reason != RenameReason::FileIsCorrect,
        reason,
        current_path: Some(current.to_string()),
        expected_path: Some(expected),
        filename_correct,
        path_correct,
    }
}

/// `path` with the root and the separator after it removed.
fn relative_to<'a>(path: &'a str, root: &Path) -> Option<&'a str> {
    let root = root.to_str()?.trim_end_matches('/');
    path.strip_prefix(root)?.strip_prefix('/')
}

#[cfg(test)]
mod tests {
    use super::*;
    use renamarr_naming::models::{Album, Artist, Medium};
    use rstest::rstest;

    fn track(artist: &str) -> Track {
        Track {
            id: 1,
            title: "Test Track".to_string(),
            track_number: "1".to_string(),
            album: Some(Album {
                id: 1,
                title: "Test Album".to_string(),
                release_date: None,
                artist: Some(Artist { id: 1, name: artist.to_string(), folder: None }),
                mediums: vec![Medium { id: 1, title: None, format: Some("CD".to_string()), position: 1 }],
            }),
            medium: None,
            files: vec![],
        }
    }

    fn file(path: Option<&str>) -> MediaFile {
        MediaFile {
            id: 7,
            track_id: 1,
            path: path.map(str::to_string),
            format: Some("MP3".to_string()),
            quality: Some("320 kbps".to_string()),
            size: 10,
            duration_secs: None,
            sidecar_path: None,
            needs_rename: true,
        }
    }

    fn roots() -> StorageRoots {
        StorageRoots::new([StorageRoot::new(1, "x", "/x"), StorageRoot::new(2, "unsorted", "/x/unsorted")]).unwrap()
    }

    fn flat() -> Pattern {
        Pattern::new("{{artist}} - {{album}} - {{title}}.{{extension}}")
    }

    #[test]
    fn test_correct_file() {
        let analysis = classify(
            &track("Test Artist"),
            &flat(),
            &file(Some("/x/Test Artist - Test Album - Test Track.mp3")),
            &roots(),
            &NamingDefaults::default(),
        );
        assert_eq!(analysis.reason, RenameReason::FileIsCorrect);
        assert!(!analysis.needs_rename);
        assert!(analysis.filename_correct && analysis.path_correct);
        assert_eq!(analysis.expected_path, analysis.current_path);
    }

    #[test]
    fn test_metadata_change_needs_rename() {
        let path = Some("/x/The Beatles - Test Album - Test Track.mp3");
        let before = classify(&track("The Beatles"), &flat(), &file(path), &roots(), &NamingDefaults::default());
        assert_eq!(before.reason, RenameReason::FileIsCorrect);

        let after = classify(&track("Beatles, The"), &flat(), &file(path), &roots(), &NamingDefaults::default());
        assert_eq!(after.reason, RenameReason::FilenameChangeNeeded);
        assert!(after.needs_rename);
        assert_eq!(after.expected_path.as_deref(), Some("/x/Beatles, The - Test Album - Test Track.mp3"));
    }

    #[test]
    fn test_no_file_path() {
        let analysis = classify(&track("A"), &flat(), &file(None), &roots(), &NamingDefaults::default());
        assert_eq!(analysis.reason, RenameReason::NoFilePath);
        assert!(analysis.needs_rename);
        assert_eq!(analysis.current_path, None);
    }

    #[test]
    fn test_library_not_found() {
        let analysis = classify(&track("A"), &flat(), &file(Some("/y/a.mp3")), &roots(), &NamingDefaults::default());
        assert_eq!(analysis.reason, RenameReason::LibraryNotFound);
        assert_eq!(analysis.current_path.as_deref(), Some("/y/a.mp3"));
        assert_eq!(analysis.expected_path, None);
    }

    #[test]
    fn test_exact_string_comparison() {
        let analysis = classify(
            &track("Test Artist"),
            &Pattern::new("{{artist}}/{{title}}.{{extension}}"),
            &file(Some("/x/unsorted/Test Artist/Test Track.mp3")),
            &roots(),
            &NamingDefaults::default(),
        );
        assert_eq!(analysis.reason, RenameReason::FileIsCorrect);

        let analysis = classify(
            &track("Test Artist"),
            &Pattern::new("{{artist}}/{{title}}.{{extension}}"),
            // Same file, but written with a doubled separator.
            &file(Some("/x//Test Artist/Test Track.mp3")),
            &roots(),
            &NamingDefaults::default(),
        );
        assert_eq!(analysis.reason, RenameReason::FilenameChangeNeeded);
        assert_eq!(analysis.expected_path.as_deref(), Some("/x/Test Artist/Test Track.mp3"));
    }

    #[test]
    fn test_dot_segment_metadata_stays_inside_root() {
        let mut track = track("Test Artist");
        if let Some(album) = track.album.as_mut() {
            album.title = "..".to_string();
        }
        let pattern = Pattern::new("{{artist}}/{{album}}/{{title}}.{{extension}}");
        let analysis = classify(
            &track,
            &pattern,
            &file(Some("/x/Test Artist/_/Test Track.mp3")),
            &roots(),
            &NamingDefaults::default(),
        );
        assert_eq!(analysis.reason, RenameReason::FileIsCorrect);
        assert!(!analysis.needs_rename);

        let analysis =
            classify(&track, &pattern, &file(Some("/x/Test Track.mp3")), &roots(), &NamingDefaults::default());
        assert_eq!(analysis.reason, RenameReason::FilenameChangeNeeded);
        assert_eq!(analysis.expected_path.as_deref(), Some("/x/Test Artist/_/Test Track.mp3"));
    }

    #[test]
    fn test_resolves_deepest_root() {
        let analysis = classify(
            &track("Test Artist"),
            &flat(),
            &file(Some("/x/unsorted/a.mp3")),
            &roots(),
            &NamingDefaults::default(),
        );
        assert_eq!(
            analysis.expected_path.as_deref(),
            Some("/x/unsorted/Test Artist - Test Album - Test Track.mp3")
        );
        assert_eq!(resolve_root(&file(Some("/x/unsorted/a.mp3")), &roots()).map(|r| r.id), Some(2));
        assert_eq!(resolve_root(&file(Some("/x/a.mp3")), &roots()).map(|r| r.id), Some(1));
        assert!(resolve_root(&file(None), &roots()).is_none());
    }

    #[rstest]
    #[case("/music/a/b.mp3", "/music", Some("a/b.mp3"))]
    #[case("/music/a/b.mp3", "/music/", Some("a/b.mp3"))]
    #[case("/a.mp3", "/", Some("a.mp3"))]
    #[case("/musicbox/a.mp3", "/music", None)]
    fn test_relative_to(#[case] path: &str, #[case] root: &str, #[case] expected: Option<&str>) {
        assert_eq!(relative_to(path, Path::new(root)), expected);
    }

    #[rstest]
    #[case("/music", "A/b.mp3", "/music/A/b.mp3")]
    #[case("/", "A/b.mp3", "/A/b.mp3")]
    fn test_join_root(#[case] root: &str, #[case] rendered: &str, #[case] expected: &str) {
        assert_eq!(join_root(Path::new(root), rendered), expected);
    }

    #[test]
    fn test_serialized_shape() {
        let analysis = RenameAnalysis::unresolved(RenameReason::LibraryNotFound, Some("/y/a.mp3"));
        let json = serde_json::to_value(&analysis).unwrap();
        assert_eq!(json["needsRename"], true);
        assert_eq!(json["reason"], "library_not_found");
        assert_eq!(json["currentPath"], "/y/a.mp3");
        assert!(json["expectedPath"].is_null());
    }
}

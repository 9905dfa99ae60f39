//! Turns library metadata into canonical relative file paths.
//!
//! The pipeline is always the same: derive [`Variables`] from a track and one
//! of its files, render a [`Pattern`] against them, then sanitize the result
//! (see [`sanitize`]). Nothing here touches the filesystem.

pub mod models;
pub mod sanitize;
mod template;
mod variables;

pub use crate::template::Pattern;
pub use crate::variables::{Variables, format_track_number};
use crate::models::{MediaFile, Track};

/// Placeholders used when metadata is missing.
///
/// The strings are caller-supplied so they can be localized; [`Default`]
/// provides English ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingDefaults {
    pub unknown_artist: String,
    pub unknown_album: String,
    pub unknown_title: String,
    /// Extension (without the dot) used when neither the file nor the
    /// rendered pattern provide one.
    pub fallback_extension: String,
}
impl Default for NamingDefaults {
    fn default() -> Self {
        Self {
            unknown_artist: "Unknown Artist".to_string(),
            unknown_album: "Unknown Album".to_string(),
            unknown_title: "Unknown Title".to_string(),
            fallback_extension: "mp3".to_string(),
        }
    }
}

/// Renders the canonical path of `file` (or of the track's first file),
/// relative to its storage root.
///
/// Pure: same inputs, same output.
pub fn render_path(track: &Track, pattern: &Pattern, file: Option<&MediaFile>, defaults: &NamingDefaults) -> String {
    let file = file.or_else(|| track.files.first());
    let vars = Variables::build(track, file, defaults);
    sanitize::finalize_path(&pattern.render(&vars), pattern.source(), &defaults.fallback_extension)
}

/// Like [`render_path`], but the result is a single file name: any separator
/// produced by the pattern is replaced.
pub fn render_file_name(
    track: &Track,
    pattern: &Pattern,
    file: Option<&MediaFile>,
    defaults: &NamingDefaults,
) -> String {
    let file = file.or_else(|| track.files.first());
    let vars = Variables::build(track, file, defaults);
    sanitize::finalize_file_name(&pattern.render(&vars), pattern.source(), &defaults.fallback_extension)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Album, Artist, Medium};
    use rstest::rstest;
    use time::macros::date;

    const STANDARD: &str = "{{artist_folder}}/{{album}}{% if quality %} [{{quality_full}}]{% endif %}/{% if mediums_count > 1 %}{{medium}}/{% endif %}{{trackNumber}} - {{title}}.{{extension}}";

    fn track() -> Track {
        Track {
            id: 1,
            title: "Test Track".to_string(),
            track_number: "1".to_string(),
            album: Some(Album {
                id: 1,
                title: "Test Album".to_string(),
                release_date: Some(date!(2023 - 06 - 30)),
                artist: Some(Artist { id: 1, name: "Test Artist".to_string(), folder: None }),
                mediums: vec![Medium { id: 1, title: None, format: Some("CD".to_string()), position: 1 }],
            }),
            medium: Some(Medium { id: 1, title: None, format: Some("CD".to_string()), position: 1 }),
            files: vec![MediaFile {
                id: 1,
                track_id: 1,
                path: Some("/music/incoming/track.flac".to_string()),
                format: Some("FLAC".to_string()),
                quality: Some("FLAC".to_string()),
                size: 1_000,
                duration_secs: Some(200),
                sidecar_path: None,
                needs_rename: true,
            }],
        }
    }

    #[test]
    fn test_render_path_uses_first_file() {
        let pattern = Pattern::new("{{artist}} - {{album}} - {{title}}.{{extension}}");
        assert_eq!(
            render_path(&track(), &pattern, None, &NamingDefaults::default()),
            "Test Artist - Test Album - Test Track.flac"
        );
    }

    #[test]
    fn test_render_path_complex() {
        let pattern = Pattern::new(
            "{{year}}/{{artist}}/{{album}}/{{trackNumber}} - {{title}} [{{quality_short}}] [{{format_short}}] [{{bitrate_short}}] [{{medium_short}}].{{extension}}",
        );
        assert_eq!(
            render_path(&track(), &pattern, None, &NamingDefaults::default()),
            "2023/Test Artist/Test Album/01 - Test Track [FLAC] [FLAC] [FLAC] [CD].flac"
        );
    }

    #[test]
    fn test_render_path_empty_metadata() {
        let track = Track {
            id: 1,
            title: String::new(),
            track_number: String::new(),
            album: None,
            medium: None,
            files: vec![],
        };
        let pattern = Pattern::new(
            "{{artist}} - {{album}} - {{title}} [{{quality}}] [{{format}}] [{{bitrate}}] [{{medium}}].{{extension}}",
        );
        assert_eq!(
            render_path(&track, &pattern, None, &NamingDefaults::default()),
            "Unknown Artist - Unknown Album - Unknown Title [] [] [] [].mp3"
        );
    }

    #[test]
    fn test_render_path_appends_fallback_extension() {
        let pattern = Pattern::new("{{artist}}/{{title}}");
        let defaults = NamingDefaults { fallback_extension: "ogg".to_string(), ..Default::default() };
        assert_eq!(render_path(&track(), &pattern, None, &defaults), "Test Artist/Test Track.ogg");
    }

    #[test]
    fn test_render_path_sanitizes() {
        let mut track = track();
        track.title = "What? Why: Now".to_string();
        let pattern = Pattern::new("{{artist}}//{{title}}.{{extension}}");
        assert_eq!(
            render_path(&track, &pattern, None, &NamingDefaults::default()),
            "Test Artist/What_ Why_ Now.flac"
        );
    }

    #[rstest]
    #[case(1, 1, "FLAC (24-bit)", "Test Artist/Test Album [FLAC _24-bit_]/01 - Test Track.flac")]
    #[case(1, 1, "FLAC", "Test Artist/Test Album [FLAC]/01 - Test Track.flac")]
    #[case(1, 1, "", "Test Artist/Test Album/01 - Test Track.flac")]
    #[case(2, 2, "Lossless", "Test Artist/Test Album [Lossless]/CD/01 - Test Track.flac")]
    fn test_render_path_standard_pattern(
        #[case] mediums: u32,
        #[case] position: u32,
        #[case] quality: &str,
        #[case] expected: &str,
    ) {
        let mut track = track();
        if let Some(album) = track.album.as_mut() {
            album.mediums = (1..=mediums)
                .map(|p| Medium { id: i64::from(p), title: None, format: Some("CD".to_string()), position: p })
                .collect();
        }
        if let Some(medium) = track.medium.as_mut() {
            medium.position = position;
        }
        track.files[0].quality = Some(quality.to_string());
        assert_eq!(render_path(&track, &Pattern::new(STANDARD), None, &NamingDefaults::default()), expected);
    }

    #[test]
    fn test_render_file_name() {
        let mut track = track();
        if let Some(artist) = track.album.as_mut().and_then(|a| a.artist.as_mut()) {
            artist.name = "AC/DC".to_string();
        }
        let pattern = Pattern::new("{{artist}} - {{title}}.{{extension}}");
        assert_eq!(
            render_file_name(&track, &pattern, None, &NamingDefaults::default()),
            "AC_DC - Test Track.flac"
        );
    }
}

//! Library entities consumed by the naming engine.
//!
//! The graph (track → album → artist, track → medium, track → files) is held
//! as plain owned values. Nothing here navigates lazily; whoever loads a
//! [`Track`] is expected to hand over the whole tree it needs for naming.

use time::Date;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artist {
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Pre-computed folder name, used instead of `name` for `artist_folder`.
    pub folder: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Medium {
    pub id: i64,
    /// Explicit title (e.g. "Bonus Disc"); wins over the format label.
    pub title: Option<String>,
    /// Physical medium type as tagged ("CD", "Vinyl", "Digital Media", ...).
    pub format: Option<String>,
    /// 1-based position among the album's mediums.
    pub position: u32,
}
impl Medium {
    /// Title if present, otherwise the format tag, otherwise empty.
    pub fn display_name(&self) -> &str {
        non_empty(self.title.as_deref()).or(non_empty(self.format.as_deref())).unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Album {
    pub id: i64,
    pub title: String,
    pub release_date: Option<Date>,
    pub artist: Option<Artist>,
    /// All mediums of the album, in position order. Only the count matters
    /// for naming.
    pub mediums: Vec<Medium>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub id: i64,
    pub title: String,
    /// Free-form ordinal: `"7"`, `"A1"`, `"3/12"`, or anything else.
    pub track_number: String,
    pub album: Option<Album>,
    pub medium: Option<Medium>,
    pub files: Vec<MediaFile>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    pub id: i64,
    pub track_id: i64,
    /// Absolute path on disk, if the file has ever been located.
    pub path: Option<String>,
    pub format: Option<String>,
    pub quality: Option<String>,
    pub size: u64,
    pub duration_secs: Option<u32>,
    /// Companion file (lyrics) sharing the media file's base name.
    pub sidecar_path: Option<String>,
    pub needs_rename: bool,
}

/// A media file together with the track it belongs to.
///
/// This is the unit every batch operation works on: the track provides the
/// metadata, the file provides the path and quality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackFile {
    pub track: Track,
    pub file: MediaFile,
}

/// A stored naming pattern. The engine only ever looks at `pattern`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingPattern {
    pub id: i64,
    pub name: String,
    pub pattern: String,
    pub is_active: bool,
    pub is_default: bool,
    pub description: Option<String>,
}

pub(crate) fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.is_empty())
}

//! Flat name → string mapping derived from a track and one of its files.
//!
//! | Variable         | Source                                                         |
//! |------------------|----------------------------------------------------------------|
//! | `artist`         | album artist name, else the unknown-artist placeholder         |
//! | `artist_folder`  | artist folder override, else `artist`                          |
//! | `album`          | album title, else the unknown-album placeholder                |
//! | `title`          | track title, else the unknown-title placeholder                |
//! | `trackNumber`    | normalized ordinal (`"07"`, `"A01"`)                           |
//! | `year`           | album release year, else empty                                 |
//! | `extension`      | file extension, else the fallback extension                    |
//! | `quality`        | quality with everything but ASCII letters, digits and spaces dropped |
//! | `quality_badge`  | raw quality with unsafe characters replaced by `_`             |
//! | `quality_full`   | same as `quality_badge`                                        |
//! | `quality_short`  | compact quality label (`FLAC`, `320`, `V0`, ...)               |
//! | `format`         | file format, uppercased                                        |
//! | `format_short`   | compact format label                                           |
//! | `bitrate`        | `"320kbps"`, `"Lossless"`, ...                                 |
//! | `bitrate_short`  | `"320"`, `"FLAC"`, ...                                         |
//! | `medium`         | medium title, else medium format, else empty                   |
//! | `medium_short`   | compact medium label (`"CD 2"`, `"Vinyl"`, `"Medium"`)          |
//! | `mediums_count`  | number of mediums on the album (`1` without an album)          |
//!
//! Every value is a string. Missing data yields an empty string rather than
//! an absent key, so templates can test any variable for truthiness.

use crate::models::{MediaFile, Track, non_empty};
use crate::NamingDefaults;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

static LETTERED_TRACK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^([A-Z])(\d+)$").expect("valid regex"));
static LOSSLESS_KBPS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*kbps").expect("valid regex"));
static LOSSY_KBPS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*kbps").expect("valid regex"));

/// Named values available to a naming pattern.
///
/// Built with [`Variables::build`]; also keeps a reference to the originating
/// track and file so the renderer can expose nested `track.*` fields.
#[derive(Debug, Clone, Default)]
pub struct Variables<'a> {
    values: BTreeMap<String, String>,
    track: Option<&'a Track>,
    file: Option<&'a MediaFile>,
}

impl<'a> Variables<'a> {
    /// Derives every variable from `track` and (optionally) one of its files.
    ///
    /// Never fails: missing relations fall back to the placeholders in
    /// `defaults` or to empty strings.
    pub fn build(track: &'a Track, file: Option<&'a MediaFile>, defaults: &NamingDefaults) -> Self {
        let album = track.album.as_ref();
        let artist = album.and_then(|a| a.artist.as_ref());

        let artist_name = artist
            .and_then(|a| non_empty(Some(a.name.as_str())))
            .unwrap_or(defaults.unknown_artist.as_str())
            .to_string();
        let artist_folder = artist
            .and_then(|a| non_empty(a.folder.as_deref()))
            .map(str::to_string)
            .unwrap_or_else(|| artist_name.clone());
        let album_title = album
            .and_then(|a| non_empty(Some(a.title.as_str())))
            .unwrap_or(defaults.unknown_album.as_str())
            .to_string();
        let title = non_empty(Some(track.title.as_str())).unwrap_or(defaults.unknown_title.as_str()).to_string();
        let year = album
            .and_then(|a| a.release_date)
            .map(|d| d.year().to_string())
            .unwrap_or_default();

        let extension = file
            .and_then(|f| f.path.as_deref())
            .and_then(|p| Path::new(p).extension())
            .and_then(|e| e.to_str())
            .filter(|e| !e.is_empty())
            .unwrap_or(defaults.fallback_extension.as_str())
            .to_string();

        let raw_quality = file.and_then(|f| f.quality.as_deref()).unwrap_or_default();
        let raw_format = file.and_then(|f| f.format.as_deref()).unwrap_or_default();
        let quality = clean_quality(raw_quality);
        let badge = quality_badge(raw_quality);
        let format = raw_format.to_uppercase();
        let (bitrate, bitrate_short) = bitrate(raw_quality, raw_format);

        let mediums_count = album.map_or(1, |a| a.mediums.len());
        let (medium, medium_short) = match track.medium.as_ref() {
            Some(m) => (m.display_name().to_string(), medium_short_name(m, mediums_count)),
            None => (String::new(), String::new()),
        };

        let values = [
            ("artist", artist_name),
            ("artist_folder", artist_folder),
            ("album", album_title),
            ("title", title),
            ("trackNumber", format_track_number(&track.track_number)),
            ("year", year),
            ("extension", extension),
            ("quality_badge", badge.clone()),
            ("quality_short", quality_short(&quality)),
            ("quality", quality),
            ("quality_full", badge),
            ("format_short", format_short(raw_format)),
            ("format", format),
            ("bitrate", bitrate),
            ("bitrate_short", bitrate_short),
            ("medium", medium),
            ("medium_short", medium_short),
            ("mediums_count", mediums_count.to_string()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        Self { values, track: Some(track), file }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn track(&self) -> Option<&'a Track> {
        self.track
    }

    pub fn file(&self) -> Option<&'a MediaFile> {
        self.file
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Variables<'_> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
            track: None,
            file: None,
        }
    }
}

/// `"7"` → `"07"`, `"A1"` → `"A01"`, `"3/12"` → `"03"`; anything else as-is.
pub fn format_track_number(raw: &str) -> String {
    if let Some(caps) = LETTERED_TRACK.captures(raw)
        && let Ok(n) = caps[2].parse::<u64>()
    {
        return format!("{}{n:02}", &caps[1]);
    }
    if let Ok(n) = raw.trim().parse::<u64>() {
        return format!("{n:02}");
    }
    if let Some((first, _)) = raw.split_once('/')
        && let Ok(n) = first.trim().parse::<u64>()
    {
        return format!("{n:02}");
    }
    raw.to_string()
}

/// Drops punctuation and collapses whitespace: `"V0 (VBR)"` → `"V0 VBR"`.
fn clean_quality(raw: &str) -> String {
    let stripped: String = raw.chars().filter(|c| c.is_ascii_alphanumeric() || c.is_ascii_whitespace()).collect();
    collapse_whitespace(&stripped)
}

/// Replaces anything outside `[A-Za-z0-9 .-]` with `_`: `"V0 (VBR)"` → `"V0 _VBR_"`.
/// Non-ASCII letters are replaced too.
fn quality_badge(quality: &str) -> String {
    let replaced: String = quality
        .chars()
        .map(|c| match c {
            c if c.is_ascii_alphanumeric() || c.is_ascii_whitespace() || c == '-' || c == '.' => c,
            _ => '_',
        })
        .collect();
    collapse_whitespace(&replaced)
}

fn quality_short(quality: &str) -> String {
    const LABELS: [(&str, &str); 8] = [
        ("flac", "FLAC"),
        ("lossless", "FLAC"),
        ("320", "320"),
        ("256", "256"),
        ("192", "192"),
        ("128", "128"),
        ("v0", "V0"),
        ("v2", "V2"),
    ];
    let lower = quality.to_lowercase();
    LABELS
        .iter()
        .find(|(needle, _)| lower.contains(needle))
        .map_or_else(|| quality.to_string(), |(_, label)| label.to_string())
}

fn format_short(format: &str) -> String {
    match format.to_lowercase().as_str() {
        "mp3" => "MP3".to_string(),
        "flac" => "FLAC".to_string(),
        "alac" => "ALAC".to_string(),
        "aac" => "AAC".to_string(),
        "ogg" => "OGG".to_string(),
        "wav" => "WAV".to_string(),
        _ => format.to_uppercase(),
    }
}

/// Returns `(bitrate, bitrate_short)`.
fn bitrate(quality: &str, format: &str) -> (String, String) {
    if quality.is_empty() {
        return (String::new(), String::new());
    }
    let quality_lower = quality.to_lowercase();
    let format_lower = format.to_lowercase();
    let lossless = matches!(format_lower.as_str(), "flac" | "alac")
        || quality_lower.contains("flac")
        || quality_lower.contains("lossless");

    if lossless {
        return match LOSSLESS_KBPS.captures(quality) {
            Some(caps) => {
                let rate = &caps[1];
                let whole = rate.split_once('.').map_or(rate, |(whole, _)| whole);
                (format!("{rate}kbps"), whole.to_string())
            },
            None => ("Lossless".to_string(), format.to_uppercase()),
        };
    }
    match LOSSY_KBPS.captures(quality) {
        Some(caps) => (format!("{}kbps", &caps[1]), caps[1].to_string()),
        None => (String::new(), String::new()),
    }
}

fn medium_short_name(medium: &crate::models::Medium, mediums_count: usize) -> String {
    if let Some(title) = non_empty(medium.title.as_deref()) {
        return title.to_string();
    }
    if let Some(format) = non_empty(medium.format.as_deref()) {
        let label = match format.to_lowercase().as_str() {
            "cd" => "CD".to_string(),
            "vinyl" => "Vinyl".to_string(),
            "digital media" | "digital" => "Digital".to_string(),
            "cassette" => "Cassette".to_string(),
            "sacd" => "SACD".to_string(),
            "dvd" => "DVD".to_string(),
            "blu-ray" => "Blu-ray".to_string(),
            _ => upper_first(format),
        };
        return match mediums_count > 1 {
            true => format!("{label} {}", medium.position),
            false => label,
        };
    }
    match medium.position > 1 {
        true => format!("Medium {}", medium.position),
        false => "Medium".to_string(),
    }
}

fn upper_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

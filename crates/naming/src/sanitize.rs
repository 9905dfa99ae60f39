//! Filesystem-safe normalization of rendered patterns.

use regex::Regex;
use std::sync::LazyLock;

/// Characters no supported filesystem accepts inside a path segment.
pub const UNSAFE_CHARS: [char; 7] = ['<', '>', ':', '"', '|', '?', '*'];

static EXTENSION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.[A-Za-z0-9]{1,5}$").expect("valid regex"));

/// Cleans a rendered relative path, keeping `/` as the directory separator.
///
/// Unsafe characters become `_`, whitespace runs become one space, separator
/// runs (`//`, `\\`) become one separator, and the result is trimmed. Leading
/// separators are dropped so the result stays relative, and `.`/`..` segments
/// become `_` so the path never leaves its root.
pub fn sanitize_path(rendered: &str) -> String {
    let replaced: String = rendered.chars().map(|c| if UNSAFE_CHARS.contains(&c) { '_' } else { c }).collect();
    let collapsed = collapse_runs(&collapse_whitespace(&replaced), &['/', '\\']);
    collapsed.trim().trim_start_matches('/').trim().split('/').map(dot_segment).collect::<Vec<_>>().join("/")
}

/// Like [`sanitize_path`], but for a bare file name: separators are unsafe too.
pub fn sanitize_file_name(rendered: &str) -> String {
    let replaced: String = rendered
        .chars()
        .map(|c| if UNSAFE_CHARS.contains(&c) || c == '/' || c == '\\' { '_' } else { c })
        .collect();
    dot_segment(collapse_whitespace(&replaced).trim()).to_string()
}

fn dot_segment(segment: &str) -> &str {
    match segment {
        "." | ".." => "_",
        other => other,
    }
}

/// Whether the last path segment ends in a short alphanumeric extension.
pub fn has_extension(path: &str) -> bool {
    let name = path.rsplit('/').next().unwrap_or(path);
    EXTENSION.is_match(name)
}

/// Applies the full post-render pipeline: sanitize, fall back to the raw
/// pattern text when nothing is left, and append `fallback_extension` when
/// the result has no extension.
pub fn finalize_path(rendered: &str, pattern: &str, fallback_extension: &str) -> String {
    finish(sanitize_path(rendered), pattern, fallback_extension)
}

/// [`finalize_path`] for bare file names.
pub fn finalize_file_name(rendered: &str, pattern: &str, fallback_extension: &str) -> String {
    finish(sanitize_file_name(rendered), pattern, fallback_extension)
}

fn finish(sanitized: String, pattern: &str, fallback_extension: &str) -> String {
    if sanitized.is_empty() {
        return pattern.to_string();
    }
    match has_extension(&sanitized) {
        true => sanitized,
        false => format!("{sanitized}.{}", fallback_extension.trim().trim_matches('.')),
    }
}

fn collapse_whitespace(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_space = false;
    for c in s.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

fn collapse_runs(s: &str, targets: &[char]) -> String {
    let mut out = String::with_capacity(s.len());
    let mut previous = None;
    for c in s.chars() {
        if targets.contains(&c) && previous == Some(c) {
            continue;
        }
        out.push(c);
        previous = Some(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Artist/Album/01 - Title.mp3", "Artist/Album/01 - Title.mp3")]
    #[case("AC/DC: Live?/01 <intro>.mp3", "AC/DC_ Live_/01 _intro_.mp3")]
    #[case("  A   B//C\\\\D  ", "A B/C\\D")]
    #[case("a\t\nb", "a b")]
    #[case("//abs/path", "abs/path")]
    #[case("\"quoted\" | star*", "_quoted_ _ star_")]
    #[case("Artist/../01.mp3", "Artist/_/01.mp3")]
    #[case("./a/.", "_/a/_")]
    #[case("../../etc", "_/_/etc")]
    #[case("a/.../b..c", "a/.../b..c")]
    fn test_sanitize_path(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(sanitize_path(input), expected);
    }

    #[rstest]
    #[case("AC/DC - Back in Black.flac", "AC_DC - Back in Black.flac")]
    #[case("a\\b:c", "a_b_c")]
    #[case("  spaced   out  ", "spaced out")]
    #[case(" .. ", "_")]
    fn test_sanitize_file_name(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(sanitize_file_name(input), expected);
    }

    #[test]
    fn test_sanitized_output_has_no_unsafe_characters() {
        let out = sanitize_path("<>:\"|?*/<>:\"|?*");
        assert!(!out.chars().any(|c| UNSAFE_CHARS.contains(&c)));
        assert!(out.contains('/'));
    }

    #[rstest]
    #[case("a/b.mp3", true)]
    #[case("a/b.flac", true)]
    #[case("a/b", false)]
    #[case("a.dir/b", false)]
    #[case("a/b.toolong", false)]
    #[case("a/b.", false)]
    fn test_has_extension(#[case] path: &str, #[case] expected: bool) {
        assert_eq!(has_extension(path), expected);
    }

    #[rstest]
    #[case("A/B - C", "{{p}}", "A/B - C.mp3")]
    #[case("A/B - C.flac", "{{p}}", "A/B - C.flac")]
    #[case("   ", "{{artist}}/{{title}}", "{{artist}}/{{title}}")]
    #[case("", "raw", "raw")]
    fn test_finalize_path(#[case] rendered: &str, #[case] pattern: &str, #[case] expected: &str) {
        assert_eq!(finalize_path(rendered, pattern, "mp3"), expected);
    }

    #[test]
    fn test_finalize_file_name() {
        assert_eq!(finalize_file_name("A/B", "p", ".ogg"), "A_B.ogg");
        assert_eq!(finalize_path("A/..", "p", "mp3"), "A/_.mp3");
    }
}

mod file;
mod pattern;
mod root;
mod track;

pub(crate) use self::file::FileRow;
pub(crate) use self::pattern::PatternRow;
pub(crate) use self::root::RootRow;
pub(crate) use self::track::{MediumRow, TrackRow, format_date};

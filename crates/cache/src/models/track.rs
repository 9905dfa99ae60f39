use crate::error::{Error, ErrorKind, Result};
use exn::ResultExt;
use renamarr_naming::models::{Album, Artist, MediaFile, Medium, Track};
use time::Date;
use time::macros::format_description;

fn parse_date(s: &str) -> Result<Date> {
    Date::parse(s, format_description!("[year]-[month]-[day]")).or_raise(|| ErrorKind::InvalidData("release date"))
}

pub(crate) fn format_date(date: Date) -> Result<String> {
    date.format(format_description!("[year]-[month]-[day]"))
        .or_raise(|| ErrorKind::InvalidData("release date"))
}

fn position(value: i64) -> Result<u32> {
    u32::try_from(value).or_raise(|| ErrorKind::InvalidData("medium position"))
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct MediumRow {
    id: i64,
    title: Option<String>,
    format: Option<String>,
    position: i64,
}
impl TryFrom<MediumRow> for Medium {
    type Error = Error;
    fn try_from(row: MediumRow) -> std::result::Result<Self, Self::Error> {
        Ok(Self { id: row.id, title: row.title, format: row.format, position: position(row.position)? })
    }
}

/// A track joined with its album, the album's artist and its medium.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct TrackRow {
    track_id: i64,
    track_title: String,
    track_number: String,
    pub(crate) album_id: Option<i64>,
    album_title: Option<String>,
    release_date: Option<String>,
    artist_id: Option<i64>,
    artist_name: Option<String>,
    artist_folder: Option<String>,
    medium_id: Option<i64>,
    medium_title: Option<String>,
    medium_format: Option<String>,
    medium_position: Option<i64>,
}
impl TrackRow {
    /// Assembles the track graph. `mediums` are all mediums of the track's
    /// album, `files` all files of the track.
    pub(crate) fn into_track(self, mediums: Vec<Medium>, files: Vec<MediaFile>) -> Result<Track> {
        let artist = match (self.artist_id, self.artist_name) {
            (Some(id), Some(name)) => Some(Artist { id, name, folder: self.artist_folder }),
            _ => None,
        };
        let album = match (self.album_id, self.album_title) {
            (Some(id), Some(title)) => Some(Album {
                id,
                title,
                release_date: self.release_date.as_deref().map(parse_date).transpose()?,
                artist,
                mediums,
            }),
            _ => None,
        };
        let medium = match (self.medium_id, self.medium_position) {
            (Some(id), Some(pos)) => Some(Medium {
                id,
                title: self.medium_title,
                format: self.medium_format,
                position: position(pos)?,
            }),
            _ => None,
        };
        Ok(Track {
            id: self.track_id,
            title: self.track_title,
            track_number: self.track_number,
            album,
            medium,
            files,
        })
    }
}

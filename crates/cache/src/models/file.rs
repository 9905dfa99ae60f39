use crate::error::{Error, ErrorKind};
use exn::ResultExt;
use renamarr_naming::models::MediaFile;

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct FileRow {
    pub(crate) id: i64,
    pub(crate) track_id: i64,
    path: Option<String>,
    format: Option<String>,
    quality: Option<String>,
    size: i64,
    duration: Option<i64>,
    sidecar_path: Option<String>,
    need_rename: bool,
}
impl TryFrom<FileRow> for MediaFile {
    type Error = Error;
    fn try_from(row: FileRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            track_id: row.track_id,
            path: row.path,
            format: row.format,
            quality: row.quality,
            size: u64::try_from(row.size).or_raise(|| ErrorKind::InvalidData("file size"))?,
            duration_secs: row
                .duration
                .map(u32::try_from)
                .transpose()
                .or_raise(|| ErrorKind::InvalidData("duration"))?,
            sidecar_path: row.sidecar_path,
            needs_rename: row.need_rename,
        })
    }
}

//! Repository over the library database.
//!
//! Files are always handed out together with their fully-loaded track (see
//! [`TrackFile`]), because every consumer ends up rendering a pattern for
//! them and needs the whole graph anyway.

use crate::Database;
use crate::error::{ErrorKind, Result};
use crate::models::{FileRow, MediumRow, PatternRow, RootRow, TrackRow, format_date};
use exn::{OptionExt, ResultExt};
use renamarr_naming::models::{MediaFile, Medium, NamingPattern, Track, TrackFile};
use renamarr_storage::{StorageRoot, normalize_absolute};
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::path::Path;
use time::Date;
use tracing::{debug, instrument};

/// Repository for library entities.
///
/// A `dry_run` repository still reads and inserts, but never updates
/// existing rows: [`update_file`](Self::update_file) and
/// [`set_need_rename`](Self::set_need_rename) report success without
/// touching the database.
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
    dry_run: bool,
}
impl From<&Database> for Repository {
    fn from(db: &Database) -> Self {
        Self { pool: db.pool().clone(), dry_run: false }
    }
}
impl Repository {
    pub fn new(pool: SqlitePool, dry_run: bool) -> Self {
        Self { pool, dry_run }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    fn sqlx_hates_paths(path: &Path) -> Result<String> {
        Ok(path.to_str().ok_or_raise(|| ErrorKind::InvalidData("path"))?.to_string())
    }

    fn count(value: i64) -> Result<u64> {
        u64::try_from(value).or_raise(|| ErrorKind::InvalidData("count"))
    }

    // =========================================================================
    // Storage roots
    // =========================================================================

    /// Stores a new storage root. The path is normalized first and must be
    /// absolute.
    pub async fn insert_storage_root(&self, name: impl AsRef<str>, path: impl AsRef<Path>) -> Result<StorageRoot> {
        let path = normalize_absolute(path.as_ref()).or_raise(|| ErrorKind::InvalidData("storage root path"))?;
        let id: i64 = sqlx::query_scalar(include_str!("../queries/insert_storage_root.sql"))
            .bind(name.as_ref())
            .bind(Self::sqlx_hates_paths(&path)?)
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(StorageRoot::new(id, name.as_ref(), path))
    }

    pub async fn list_storage_roots(&self) -> Result<Vec<StorageRoot>> {
        let rows: Vec<RootRow> = sqlx::query_as(include_str!("../queries/list_storage_roots.sql"))
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(rows.into_iter().map(StorageRoot::from).collect())
    }

    // =========================================================================
    // Naming patterns
    // =========================================================================

    pub async fn insert_pattern(
        &self,
        name: &str,
        pattern: &str,
        description: Option<&str>,
        is_active: bool,
    ) -> Result<i64> {
        sqlx::query_scalar(include_str!("../queries/insert_pattern.sql"))
            .bind(name)
            .bind(pattern)
            .bind(description)
            .bind(is_active)
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)
    }

    pub async fn get_pattern(&self, id: i64) -> Result<Option<NamingPattern>> {
        let row: Option<PatternRow> = sqlx::query_as(include_str!("../queries/get_pattern.sql"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(row.map(NamingPattern::from))
    }

    /// Active patterns, ordered by name.
    pub async fn list_active_patterns(&self) -> Result<Vec<NamingPattern>> {
        let rows: Vec<PatternRow> = sqlx::query_as(include_str!("../queries/list_active_patterns.sql"))
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(rows.into_iter().map(NamingPattern::from).collect())
    }

    /// The pattern used for rename-status checks: the first active one.
    pub async fn active_pattern(&self) -> Result<Option<NamingPattern>> {
        Ok(self.list_active_patterns().await?.into_iter().next())
    }

    // =========================================================================
    // Library graph
    // =========================================================================

    pub async fn insert_artist(&self, name: &str, folder: Option<&str>) -> Result<i64> {
        sqlx::query_scalar(include_str!("../queries/insert_artist.sql"))
            .bind(name)
            .bind(folder)
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)
    }

    pub async fn insert_album(&self, artist_id: Option<i64>, title: &str, release_date: Option<Date>) -> Result<i64> {
        let release_date = release_date.map(format_date).transpose()?;
        sqlx::query_scalar(include_str!("../queries/insert_album.sql"))
            .bind(artist_id)
            .bind(title)
            .bind(release_date)
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)
    }

    pub async fn insert_medium(
        &self,
        album_id: i64,
        title: Option<&str>,
        format: Option<&str>,
        position: u32,
    ) -> Result<i64> {
        sqlx::query_scalar(include_str!("../queries/insert_medium.sql"))
            .bind(album_id)
            .bind(title)
            .bind(format)
            .bind(i64::from(position))
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)
    }

    pub async fn insert_track(
        &self,
        album_id: Option<i64>,
        medium_id: Option<i64>,
        title: &str,
        track_number: &str,
    ) -> Result<i64> {
        sqlx::query_scalar(include_str!("../queries/insert_track.sql"))
            .bind(album_id)
            .bind(medium_id)
            .bind(title)
            .bind(track_number)
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)
    }

    /// Stores a media file for `file.track_id`; `file.id` is ignored.
    pub async fn insert_file(&self, file: &MediaFile) -> Result<i64> {
        sqlx::query_scalar(include_str!("../queries/insert_file.sql"))
            .bind(file.track_id)
            .bind(file.path.as_deref())
            .bind(file.format.as_deref())
            .bind(file.quality.as_deref())
            .bind(i64::try_from(file.size).or_raise(|| ErrorKind::InvalidData("file size"))?)
            .bind(file.duration_secs.map(i64::from))
            .bind(file.sidecar_path.as_deref())
            .bind(file.needs_rename)
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)
    }

    /// Loads a track with its album, artist, album mediums, medium and files.
    #[instrument(level = "debug", skip(self))]
    pub async fn load_track(&self, id: i64) -> Result<Option<Track>> {
        let row: Option<TrackRow> = sqlx::query_as(include_str!("../queries/get_track.sql"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let Some(row) = row else {
            return Ok(None);
        };
        let mediums = match row.album_id {
            Some(album_id) => self.mediums_for_album(album_id).await?,
            None => Vec::new(),
        };
        let files = self
            .file_rows_for_track(id)
            .await?
            .into_iter()
            .map(MediaFile::try_from)
            .collect::<Result<Vec<_>>>()?;
        Ok(Some(row.into_track(mediums, files)?))
    }

    async fn mediums_for_album(&self, album_id: i64) -> Result<Vec<Medium>> {
        let rows: Vec<MediumRow> = sqlx::query_as(include_str!("../queries/list_mediums_for_album.sql"))
            .bind(album_id)
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        rows.into_iter().map(Medium::try_from).collect()
    }

    async fn file_rows_for_track(&self, track_id: i64) -> Result<Vec<FileRow>> {
        sqlx::query_as(include_str!("../queries/list_files_for_track.sql"))
            .bind(track_id)
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)
    }

    /// Pairs every file row with its loaded track, loading each track once.
    async fn with_tracks(&self, rows: Vec<FileRow>) -> Result<Vec<TrackFile>> {
        let mut tracks: HashMap<i64, Track> = HashMap::new();
        let mut results = Vec::with_capacity(rows.len());
        for row in rows {
            let track_id = row.track_id;
            if !tracks.contains_key(&track_id) {
                let track = self
                    .load_track(track_id)
                    .await?
                    .ok_or_raise(|| ErrorKind::Missing("track", track_id))?;
                tracks.insert(track_id, track);
            }
            let file = MediaFile::try_from(row)?;
            let track = tracks.get(&track_id).cloned().ok_or_raise(|| ErrorKind::Missing("track", track_id))?;
            results.push(TrackFile { track, file });
        }
        Ok(results)
    }

    /// Files with the given ids, ordered by id. Unknown ids are skipped.
    pub async fn files_by_ids(&self, ids: &[i64]) -> Result<Vec<TrackFile>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids = serde_json::to_string(ids).or_raise(|| ErrorKind::InvalidData("file ids"))?;
        let rows: Vec<FileRow> = sqlx::query_as(include_str!("../queries/get_files_by_ids.sql"))
            .bind(ids)
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        self.with_tracks(rows).await
    }

    pub async fn files_for_track(&self, track_id: i64) -> Result<Vec<TrackFile>> {
        let rows = self.file_rows_for_track(track_id).await?;
        self.with_tracks(rows).await
    }

    /// One page of files ordered by id.
    pub async fn files_page(&self, limit: usize, offset: u64) -> Result<Vec<TrackFile>> {
        let limit = i64::try_from(limit).or_raise(|| ErrorKind::InvalidData("limit"))?;
        let offset = i64::try_from(offset).or_raise(|| ErrorKind::InvalidData("offset"))?;
        let rows: Vec<FileRow> = sqlx::query_as(include_str!("../queries/list_files_page.sql"))
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        self.with_tracks(rows).await
    }

    pub async fn count_files(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(include_str!("../queries/count_files.sql"))
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Self::count(count)
    }

    pub async fn count_need_rename(&self, need_rename: bool) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(include_str!("../queries/count_need_rename.sql"))
            .bind(need_rename)
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Self::count(count)
    }

    // =========================================================================
    // Update
    // =========================================================================

    /// Persists a file's path, sidecar path and rename flag.
    ///
    /// Returns `true` if a record was updated.
    #[instrument(level = "debug", skip_all, fields(file_id = file.id))]
    pub async fn update_file(&self, file: &MediaFile) -> Result<bool> {
        if self.dry_run {
            debug!("dry run, not updating file");
            return Ok(true);
        }
        let result = sqlx::query(include_str!("../queries/update_file.sql"))
            .bind(file.path.as_deref())
            .bind(file.sidecar_path.as_deref())
            .bind(file.needs_rename)
            .bind(file.id)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(result.rows_affected() > 0)
    }

    /// Returns `true` if a record was updated.
    pub async fn set_need_rename(&self, id: i64, need_rename: bool) -> Result<bool> {
        if self.dry_run {
            return Ok(true);
        }
        let result = sqlx::query(include_str!("../queries/set_need_rename.sql"))
            .bind(need_rename)
            .bind(id)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    struct Fixture {
        repo: Repository,
        track_id: i64,
        file_ids: Vec<i64>,
    }

    fn file(track_id: i64, path: &str) -> MediaFile {
        MediaFile {
            id: 0,
            track_id,
            path: Some(path.to_string()),
            format: Some("FLAC".to_string()),
            quality: Some("Lossless".to_string()),
            size: 4096,
            duration_secs: Some(240),
            sidecar_path: None,
            needs_rename: true,
        }
    }

    async fn fixture() -> Fixture {
        let db = Database::connect_in_memory().await.unwrap();
        let repo = Repository::from(&db);
        let artist = repo.insert_artist("Test Artist", Some("Artist, Test")).await.unwrap();
        let album = repo.insert_album(Some(artist), "Test Album", Some(date!(2023 - 02 - 01))).await.unwrap();
        let cd1 = repo.insert_medium(album, None, Some("CD"), 1).await.unwrap();
        let _cd2 = repo.insert_medium(album, Some("Bonus"), Some("CD"), 2).await.unwrap();
        let track_id = repo.insert_track(Some(album), Some(cd1), "Test Track", "3").await.unwrap();
        let other = repo.insert_track(Some(album), Some(cd1), "Other Track", "4").await.unwrap();
        let file_ids = vec![
            repo.insert_file(&file(track_id, "/music/in/a.flac")).await.unwrap(),
            repo.insert_file(&file(track_id, "/music/in/a-copy.flac")).await.unwrap(),
            repo.insert_file(&file(other, "/music/in/b.flac")).await.unwrap(),
        ];
        Fixture { repo, track_id, file_ids }
    }

    #[tokio::test]
    async fn test_load_track_graph() {
        let f = fixture().await;
        let track = f.repo.load_track(f.track_id).await.unwrap().unwrap();
        assert_eq!(track.title, "Test Track");
        assert_eq!(track.track_number, "3");
        assert_eq!(track.files.len(), 2);
        let album = track.album.unwrap();
        assert_eq!(album.release_date, Some(date!(2023 - 02 - 01)));
        assert_eq!(album.mediums.len(), 2);
        assert_eq!(album.mediums[1].title.as_deref(), Some("Bonus"));
        assert_eq!(album.artist.unwrap().folder.as_deref(), Some("Artist, Test"));
        assert_eq!(track.medium.unwrap().position, 1);
        assert!(f.repo.load_track(9999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_files_by_ids() {
        let f = fixture().await;
        let files = f.repo.files_by_ids(&[f.file_ids[2], f.file_ids[0], 9999]).await.unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].file.id, f.file_ids[0]);
        assert_eq!(files[0].track.title, "Test Track");
        assert_eq!(files[1].track.title, "Other Track");
        assert!(f.repo.files_by_ids(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_paging() {
        let f = fixture().await;
        assert_eq!(f.repo.count_files().await.unwrap(), 3);
        let first = f.repo.files_page(2, 0).await.unwrap();
        let second = f.repo.files_page(2, 2).await.unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].file.id, f.file_ids[2]);
        assert!(f.repo.files_page(2, 4).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_files_for_track() {
        let f = fixture().await;
        let files = f.repo.files_for_track(f.track_id).await.unwrap();
        assert_eq!(files.iter().map(|tf| tf.file.id).collect::<Vec<_>>(), f.file_ids[..2].to_vec());
    }

    #[tokio::test]
    async fn test_update_file() {
        let f = fixture().await;
        let mut file = f.repo.files_by_ids(&[f.file_ids[0]]).await.unwrap().remove(0).file;
        file.path = Some("/music/Test Artist/a.flac".to_string());
        file.sidecar_path = Some("/music/Test Artist/a.lrc".to_string());
        file.needs_rename = false;
        assert!(f.repo.update_file(&file).await.unwrap());

        let stored = f.repo.files_by_ids(&[f.file_ids[0]]).await.unwrap().remove(0).file;
        assert_eq!(stored, file);
        assert_eq!(f.repo.count_need_rename(false).await.unwrap(), 1);
        assert_eq!(f.repo.count_need_rename(true).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_dry_run_does_not_update() {
        let f = fixture().await;
        let repo = f.repo.clone().dry_run(true);
        assert!(repo.set_need_rename(f.file_ids[0], false).await.unwrap());
        assert_eq!(f.repo.count_need_rename(true).await.unwrap(), 3);
        assert!(f.repo.set_need_rename(f.file_ids[0], false).await.unwrap());
        assert_eq!(f.repo.count_need_rename(true).await.unwrap(), 2);
        assert!(!f.repo.set_need_rename(9999, false).await.unwrap());
    }

    #[tokio::test]
    async fn test_patterns() {
        let f = fixture().await;
        let default = f.repo.active_pattern().await.unwrap().unwrap();
        assert!(default.is_default);
        let id = f.repo.insert_pattern("Flat", "{{artist}} - {{title}}", None, true).await.unwrap();
        f.repo.insert_pattern("Zzz inactive", "{{title}}", None, false).await.unwrap();

        let active = f.repo.list_active_patterns().await.unwrap();
        assert_eq!(active.iter().map(|p| p.name.as_str()).collect::<Vec<_>>(), ["Flat", "Standard"]);
        assert_eq!(f.repo.active_pattern().await.unwrap().unwrap().id, id);
        assert_eq!(f.repo.get_pattern(id).await.unwrap().unwrap().pattern, "{{artist}} - {{title}}");
        assert!(f.repo.get_pattern(9999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_storage_roots() {
        let f = fixture().await;
        let root = f.repo.insert_storage_root("music", "/music/").await.unwrap();
        assert_eq!(root.path, Path::new("/music"));
        f.repo.insert_storage_root("unsorted", "/music/unsorted").await.unwrap();
        let roots = f.repo.list_storage_roots().await.unwrap();
        assert_eq!(roots.len(), 2);
        assert_eq!(roots[0], root);

        let err = f.repo.insert_storage_root("dup", "/music").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Database));
        let err = f.repo.insert_storage_root("relative", "music").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidData(_)));
    }
}

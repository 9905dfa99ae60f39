//! Keeping persisted rename flags in line with the active pattern.
//!
//! A file's flag must equal "current path differs from canonical path", where
//! the canonical path is rendered with the first active pattern under the
//! file's storage root. Flags go stale whenever metadata, patterns or roots
//! change, so they are recomputed on demand: per file, per track, or for the
//! whole library in pages.

use crate::Context;
use crate::decision::classify;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use renamarr_cache::Repository;
use renamarr_naming::Pattern;
use renamarr_naming::models::TrackFile;
use renamarr_storage::StorageRoots;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RenameCounts {
    pub total: u64,
    pub needs_rename: u64,
    pub correct: u64,
}

/// Recomputes and persists rename flags.
pub struct RenameStatus<'a> {
    cache: &'a Repository,
    ctx: &'a Context,
}

/// The pattern and roots every flag in one refresh is computed against.
struct Rules {
    pattern: Pattern,
    roots: StorageRoots,
}

impl<'a> RenameStatus<'a> {
    pub fn new(cache: &'a Repository, ctx: &'a Context) -> Self {
        Self { cache, ctx }
    }

    /// `None` when there is no active pattern, in which case nothing can be
    /// refreshed.
    async fn rules(&self) -> Result<Option<Rules>> {
        let Some(pattern) = self.cache.active_pattern().await.or_raise(|| ErrorKind::Cache)? else {
            warn!("no active naming pattern, rename status not updated");
            return Ok(None);
        };
        let roots = self.cache.list_storage_roots().await.or_raise(|| ErrorKind::Cache)?;
        let roots = StorageRoots::new(roots).or_raise(|| ErrorKind::Storage)?;
        Ok(Some(Rules { pattern: Pattern::new(pattern.pattern), roots }))
    }

    async fn apply(&self, rules: &Rules, item: &TrackFile) -> Result<bool> {
        let analysis = classify(&item.track, &rules.pattern, &item.file, &rules.roots, &self.ctx.defaults);
        if analysis.needs_rename != item.file.needs_rename {
            debug!(file_id = item.file.id, reason = %analysis.reason, needs_rename = analysis.needs_rename, "rename flag changed");
        }
        self.cache.set_need_rename(item.file.id, analysis.needs_rename).await.or_raise(|| ErrorKind::Cache)
    }

    async fn apply_all(&self, rules: &Rules, items: &[TrackFile]) -> Result<u64> {
        let mut updated = 0;
        for item in items {
            if self.apply(rules, item).await? {
                updated += 1;
            }
        }
        Ok(updated)
    }

    /// Recomputes one file's flag. Returns `false` when the file does not
    /// exist or there is no active pattern.
    #[instrument(skip(self))]
    pub async fn refresh_file(&self, file_id: i64) -> Result<bool> {
        let Some(rules) = self.rules().await? else {
            return Ok(false);
        };
        let files = self.cache.files_by_ids(&[file_id]).await.or_raise(|| ErrorKind::Cache)?;
        match files.first() {
            Some(item) => self.apply(&rules, item).await,
            None => Ok(false),
        }
    }

    /// Recomputes the flags of every file of a track, returning how many
    /// were written.
    #[instrument(skip(self))]
    pub async fn refresh_track(&self, track_id: i64) -> Result<u64> {
        let Some(rules) = self.rules().await? else {
            return Ok(0);
        };
        let files = self.cache.files_for_track(track_id).await.or_raise(|| ErrorKind::Cache)?;
        let updated = self.apply_all(&rules, &files).await?;
        info!(total = files.len(), updated, "updated rename status for track files");
        Ok(updated)
    }

    /// Recomputes every flag in the library, `page_size` files at a time.
    /// Each page is dropped before the next one is loaded.
    #[instrument(skip(self))]
    pub async fn refresh_all(&self) -> Result<u64> {
        let Some(rules) = self.rules().await? else {
            return Ok(0);
        };
        let total = self.cache.count_files().await.or_raise(|| ErrorKind::Cache)?;
        info!(total, "starting bulk update of rename statuses");
        let mut updated = 0;
        let mut offset = 0;
        while offset < total {
            let page = self.cache.files_page(self.ctx.page_size, offset).await.or_raise(|| ErrorKind::Cache)?;
            if page.is_empty() {
                break;
            }
            updated += self.apply_all(&rules, &page).await?;
            offset += u64::try_from(page.len()).unwrap_or(u64::MAX);
            info!(processed = offset, total, updated, "processed page of files");
        }
        info!(total, updated, "completed bulk update of rename statuses");
        Ok(updated)
    }

    pub async fn counts(&self) -> Result<RenameCounts> {
        let needs_rename = self.cache.count_need_rename(true).await.or_raise(|| ErrorKind::Cache)?;
        let correct = self.cache.count_need_rename(false).await.or_raise(|| ErrorKind::Cache)?;
        Ok(RenameCounts { total: needs_rename + correct, needs_rename, correct })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::context;
    use renamarr_cache::Database;
    use renamarr_naming::models::MediaFile;

    const CORRECT: &str = "/music/Test Artist/01 - Track 1.mp3";

    async fn library(paths: &[&str]) -> (Repository, Vec<i64>, i64) {
        let db = Database::connect_in_memory().await.unwrap();
        let repo = Repository::from(&db);
        repo.insert_storage_root("music", "/music").await.unwrap();
        // Sorts before the seeded "Standard" pattern, so it is the one used.
        repo.insert_pattern("Flat", "{{artist}}/{{trackNumber}} - {{title}}.{{extension}}", None, true)
            .await
            .unwrap();
        let artist = repo.insert_artist("Test Artist", None).await.unwrap();
        let album = repo.insert_album(Some(artist), "Test Album", None).await.unwrap();
        let track = repo.insert_track(Some(album), None, "Track 1", "1").await.unwrap();
        let mut ids = Vec::new();
        for path in paths {
            let file = MediaFile {
                id: 0,
                track_id: track,
                path: Some(path.to_string()),
                format: Some("MP3".to_string()),
                quality: None,
                size: 1,
                duration_secs: None,
                sidecar_path: None,
                // Inverted, so every refresh has something to fix.
                needs_rename: *path == CORRECT,
            };
            ids.push(repo.insert_file(&file).await.unwrap());
        }
        (repo, ids, track)
    }

    #[tokio::test]
    async fn test_refresh_file() {
        let (repo, ids, _) = library(&[CORRECT, "/music/in/a.mp3", "/elsewhere/a.mp3"]).await;
        let (_fs, ctx) = context(Vec::<&str>::new());
        let status = RenameStatus::new(&repo, &ctx);

        for id in &ids {
            assert!(status.refresh_file(*id).await.unwrap());
        }
        assert!(!status.refresh_file(9999).await.unwrap());
        let flags: Vec<bool> =
            repo.files_by_ids(&ids).await.unwrap().into_iter().map(|tf| tf.file.needs_rename).collect();
        assert_eq!(flags, vec![false, true, true]);
        assert_eq!(status.counts().await.unwrap(), RenameCounts { total: 3, needs_rename: 2, correct: 1 });
    }

    #[tokio::test]
    async fn test_refresh_track() {
        let (repo, _, track) = library(&[CORRECT, "/music/in/a.mp3"]).await;
        let (_fs, ctx) = context(Vec::<&str>::new());
        let status = RenameStatus::new(&repo, &ctx);
        assert_eq!(status.refresh_track(track).await.unwrap(), 2);
        assert_eq!(status.refresh_track(9999).await.unwrap(), 0);
        assert_eq!(repo.count_need_rename(false).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_refresh_all_in_pages() {
        let paths = [CORRECT, "/music/in/1.mp3", "/music/in/2.mp3", "/music/in/3.mp3", "/music/in/4.mp3"];
        let (repo, _, _) = library(&paths).await;
        let (_fs, ctx) = context(Vec::<&str>::new());
        let ctx = ctx.with_page_size(2);
        let status = RenameStatus::new(&repo, &ctx);

        assert_eq!(status.refresh_all().await.unwrap(), 5);
        assert_eq!(status.counts().await.unwrap(), RenameCounts { total: 5, needs_rename: 4, correct: 1 });
    }

    #[tokio::test]
    async fn test_dry_run_repository() {
        let (repo, ids, _) = library(&[CORRECT]).await;
        let repo = repo.dry_run(true);
        let (_fs, ctx) = context(Vec::<&str>::new());
        let status = RenameStatus::new(&repo, &ctx);
        assert!(status.refresh_file(ids[0]).await.unwrap());
        assert_eq!(repo.count_need_rename(true).await.unwrap(), 1);
    }
}

use crate::Context;
use crate::rename::error::{ErrorKind, Result};
use crate::rename::{Action, BatchReport, RenameEvent};
use async_stream::stream;
use exn::{OptionExt, ResultExt};
use futures::{Stream, StreamExt};
use renamarr_naming::models::{MediaFile, TrackFile};
use renamarr_naming::{Pattern, render_path};
use renamarr_storage::{StorageRoots, normalize_absolute, sidecar_destination, validate_relative};
use std::path::{Path, PathBuf};
use std::pin::pin;
use tracing::{debug, info, instrument, warn};

/// Where rendered paths are placed.
#[derive(Debug, Clone)]
pub enum Base {
    /// Under the storage root currently owning each file.
    Roots(StorageRoots),
    /// Under one fixed directory, e.g. an artist folder when renaming the
    /// files of a single track.
    Directory(PathBuf),
}

/// Renames batches of files to the paths their pattern renders to.
pub struct RenameExecutor<'a> {
    ctx: &'a Context,
    base: Base,
}

impl<'a> RenameExecutor<'a> {
    pub fn new(ctx: &'a Context, base: Base) -> Self {
        Self { ctx, base }
    }

    /// The canonical absolute path of `item`.
    pub fn destination(&self, pattern: &Pattern, item: &TrackFile) -> Result<PathBuf> {
        let rendered = render_path(&item.track, pattern, Some(&item.file), &self.ctx.defaults);
        let relative = validate_relative(&rendered).or_raise(|| ErrorKind::InvalidDestination(rendered.clone()))?;
        let base = match &self.base {
            Base::Directory(dir) => dir.as_path(),
            Base::Roots(roots) => {
                let current = item.file.path.as_deref().ok_or_raise(|| ErrorKind::NoFilePath(item.file.id))?;
                let root = roots
                    .resolve(Path::new(current))
                    .ok_or_raise(|| ErrorKind::RootNotFound(PathBuf::from(current)))?;
                root.path.as_path()
            },
        };
        Ok(base.join(relative))
    }

    /// Moves a single file (and its sidecar) to its canonical path.
    ///
    /// The sidecar is moved first: if the primary move then fails, the
    /// sidecar is moved back and the file is left untouched. The returned
    /// [`Action`] carries the file as it must be persisted; nothing is
    /// written to the cache here.
    #[instrument(level = "debug", skip_all, fields(file_id = item.file.id))]
    pub async fn rename_file(&self, pattern: &Pattern, item: &TrackFile) -> Result<Action> {
        let file = &item.file;
        if !file.needs_rename {
            return Ok(Action::Skipped(file.id));
        }
        let current = file.path.as_deref().ok_or_raise(|| ErrorKind::NoFilePath(file.id))?;
        let source = Path::new(current);
        let destination = self.destination(pattern, item)?;
        let to = destination.to_string_lossy().into_owned();
        if to == current {
            debug!("already at canonical path, clearing flag");
            return Ok(Action::AlreadyCorrect(MediaFile { needs_rename: false, ..file.clone() }));
        }

        let fs = &self.ctx.fs;
        if !fs.exists(source).await.or_raise(|| ErrorKind::Storage)? {
            exn::bail!(ErrorKind::SourceFileMissing(source.to_path_buf()));
        }
        let mut updated = MediaFile { path: Some(to), needs_rename: false, ..file.clone() };
        if normalize_absolute(source).is_ok_and(|normalized| normalized == destination) {
            // Same file, only the stored spelling of its path changes.
            return Ok(Action::Renamed { from: current.to_string(), file: updated });
        }
        if fs.exists(&destination).await.or_raise(|| ErrorKind::Storage)? {
            exn::bail!(ErrorKind::DestinationOccupied(destination));
        }
        if let Some(parent) = destination.parent() {
            fs.create_dir_all(parent).await.or_raise(|| ErrorKind::DirectoryCreateFailed(parent.to_path_buf()))?;
        }

        let sidecar = self.move_sidecar(file, &destination).await?;
        if let Err(err) = fs.rename(source, &destination).await {
            if let Some((original, moved)) = &sidecar
                && let Err(undo) = fs.rename(moved, original).await
            {
                warn!(sidecar = %moved.display(), error = %undo, "could not move sidecar back");
            }
            return Err(err).or_raise(|| ErrorKind::RenameFailed(source.to_path_buf()));
        }
        if let Some((_, moved)) = sidecar {
            updated.sidecar_path = Some(moved.to_string_lossy().into_owned());
        }
        info!(from = current, to = %destination.display(), "renamed file");
        Ok(Action::Renamed { from: current.to_string(), file: updated })
    }

    /// Moves the sidecar next to `destination`, returning where it was and
    /// where it went. A recorded sidecar missing on disk is left alone.
    async fn move_sidecar(&self, file: &MediaFile, destination: &Path) -> Result<Option<(PathBuf, PathBuf)>> {
        let Some(sidecar) = file.sidecar_path.as_deref().map(Path::new) else {
            return Ok(None);
        };
        let fs = &self.ctx.fs;
        if !fs.exists(sidecar).await.or_raise(|| ErrorKind::Storage)? {
            debug!(sidecar = %sidecar.display(), "sidecar missing on disk, not moving it");
            return Ok(None);
        }
        let target = sidecar_destination(destination, sidecar, &self.ctx.sidecar_extension);
        if target == sidecar {
            return Ok(None);
        }
        if fs.exists(&target).await.or_raise(|| ErrorKind::Storage)? {
            exn::bail!(ErrorKind::SidecarMoveFailed(sidecar.to_path_buf()));
        }
        fs.rename(sidecar, &target).await.or_raise(|| ErrorKind::SidecarMoveFailed(sidecar.to_path_buf()))?;
        debug!(from = %sidecar.display(), to = %target.display(), "moved sidecar");
        Ok(Some((sidecar.to_path_buf(), target)))
    }

    /// Streams a [`RenameEvent`] per file while renaming `files` one after
    /// another. Failures are yielded, never returned.
    pub fn rename_stream<'s>(
        &'s self,
        pattern: &'s Pattern,
        files: &'s [TrackFile],
    ) -> impl Stream<Item = RenameEvent> + 's {
        // `rustfmt` does not format macros that use braces. Wrap in parentheses!
        stream!({
            // Infallible: a usize (either 32- or 64-bit) will always fit in a u64.
            yield RenameEvent::Started(u64::try_from(files.len()).unwrap_or(u64::MAX));
            for item in files {
                let result = self.rename_file(pattern, item).await;
                if let Err(err) = &result {
                    warn!(file_id = item.file.id, error = ?err, "rename failed");
                }
                yield RenameEvent::Processed { file_id: item.file.id, result };
            }
            yield RenameEvent::Complete;
        })
    }

    /// Renames `files` and summarizes the outcome. Nothing is persisted; see
    /// [`RenameFilesTask`](crate::RenameFilesTask) for that.
    #[instrument(skip_all, fields(pattern = %pattern.source(), files = files.len()))]
    pub async fn rename_batch(&self, pattern: &Pattern, files: &[TrackFile]) -> BatchReport {
        let mut report = BatchReport::default();
        let mut events = pin!(self.rename_stream(pattern, files));
        while let Some(event) = events.next().await {
            report.record(event);
        }
        info!(succeeded = report.succeeded, failed = report.failed, skipped = report.skipped, "{report}");
        report
    }
}

use crate::Context;
use crate::rename::error::{ErrorKind, Result};
use crate::rename::{Base, BatchReport, RenameEvent, RenameExecutor};
use exn::{OptionExt, ResultExt};
use futures::StreamExt;
use renamarr_cache::Repository;
use renamarr_naming::Pattern;
use renamarr_storage::{StorageRoots, normalize_absolute};
use std::path::PathBuf;
use std::pin::pin;
use tracing::{info, instrument, warn};

/// A deferred request to rename files with a stored naming pattern.
///
/// Only a missing pattern, an empty selection and cache failures while
/// loading the batch are returned as errors. Once the batch starts, every
/// file is attempted and failures end up in the [`BatchReport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameFilesTask {
    pub pattern_id: i64,
    pub file_ids: Vec<i64>,
    /// Place files under this directory instead of their storage roots.
    pub directory: Option<PathBuf>,
}

impl RenameFilesTask {
    pub fn new(pattern_id: i64, file_ids: impl IntoIterator<Item = i64>) -> Self {
        Self { pattern_id, file_ids: file_ids.into_iter().collect(), directory: None }
    }

    pub fn into_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = Some(directory.into());
        self
    }

    #[instrument(skip_all, fields(pattern_id = self.pattern_id, files = self.file_ids.len()))]
    pub async fn run(&self, cache: &Repository, ctx: &Context) -> Result<BatchReport> {
        if self.file_ids.is_empty() {
            exn::bail!(ErrorKind::NoFilesSelected);
        }
        let pattern = cache
            .get_pattern(self.pattern_id)
            .await
            .or_raise(|| ErrorKind::Cache)?
            .ok_or_raise(|| ErrorKind::PatternNotFound(self.pattern_id))?;
        let files = cache.files_by_ids(&self.file_ids).await.or_raise(|| ErrorKind::Cache)?;
        if files.is_empty() {
            exn::bail!(ErrorKind::NoFilesSelected);
        }
        let base = match &self.directory {
            Some(directory) => Base::Directory(normalize_absolute(directory).or_raise(|| ErrorKind::Storage)?),
            None => {
                let roots = cache.list_storage_roots().await.or_raise(|| ErrorKind::Cache)?;
                Base::Roots(StorageRoots::new(roots).or_raise(|| ErrorKind::Storage)?)
            },
        };
        info!(pattern = %pattern.name, files = files.len(), "processing rename files task");

        let pattern = Pattern::new(pattern.pattern);
        let executor = RenameExecutor::new(ctx, base);
        let mut report = BatchReport::default();
        let mut events = pin!(executor.rename_stream(&pattern, &files));
        while let Some(event) = events.next().await {
            if let RenameEvent::Processed { file_id, result: Ok(action) } = &event
                && let Some(file) = action.updated_file()
            {
                // The file is already moved. Leave a failed commit to the
                // next status refresh rather than failing the item.
                if let Err(err) = cache.update_file(file).await {
                    warn!(file_id, error = ?err, "could not persist renamed file");
                }
            }
            report.record(event);
        }
        info!(
            succeeded = report.succeeded,
            failed = report.failed,
            skipped = report.skipped,
            renamed = report.renamed.len(),
            "rename files task completed"
        );
        Ok(report)
    }
}

//! Library operations built on naming, storage and the cache: deciding
//! whether files sit at their canonical paths, moving them there, and
//! keeping the persisted rename flags current.

pub mod decision;
pub mod error;
mod preview;
pub mod rename;
mod status;
#[cfg(test)]
mod testing;

pub use crate::decision::{RenameAnalysis, RenameReason, classify, resolve_root};
pub use crate::preview::{RenamePreview, preview};
pub use crate::rename::{Action, Base, BatchReport, RenameEvent, RenameExecutor, RenameFilesTask};
pub use crate::status::{RenameCounts, RenameStatus};
use renamarr_naming::NamingDefaults;
use renamarr_storage::FilesystemHandle;

/// Default number of files loaded per page when refreshing rename flags.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Settings and handles shared by library operations.
#[derive(Clone)]
pub struct Context {
    pub fs: FilesystemHandle,
    pub defaults: NamingDefaults,
    /// Extension given to a moved sidecar that has none.
    pub sidecar_extension: String,
    pub page_size: usize,
}
impl Context {
    pub fn new(fs: FilesystemHandle) -> Self {
        Self {
            fs,
            defaults: NamingDefaults::default(),
            sidecar_extension: "txt".to_string(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_defaults(mut self, defaults: NamingDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_sidecar_extension(mut self, extension: impl Into<String>) -> Self {
        self.sidecar_extension = extension.into();
        self
    }

    /// Clamped to at least one.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }
}

pub mod error;
pub mod fs;
mod path;
mod roots;
mod sidecar;

pub use crate::fs::Filesystem;
pub use crate::path::{normalize_absolute, validate_relative};
pub use crate::roots::{StorageRoot, StorageRoots};
pub use crate::sidecar::sidecar_destination;
use std::sync::Arc;

pub type FilesystemHandle = Arc<dyn Filesystem + Send + Sync>;

use renamarr_storage::StorageRoot;
use std::path::PathBuf;

#[derive(sqlx::FromRow)]
pub(crate) struct RootRow {
    id: i64,
    name: String,
    path: String,
}
impl From<RootRow> for StorageRoot {
    fn from(row: RootRow) -> Self {
        StorageRoot::new(row.id, row.name, PathBuf::from(row.path))
    }
}

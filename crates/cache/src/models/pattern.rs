use renamarr_naming::models::NamingPattern;

#[derive(sqlx::FromRow)]
pub(crate) struct PatternRow {
    id: i64,
    name: String,
    pattern: String,
    description: Option<String>,
    is_active: bool,
    is_default: bool,
}
impl From<PatternRow> for NamingPattern {
    fn from(row: PatternRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            pattern: row.pattern,
            is_active: row.is_active,
            is_default: row.is_default,
            description: row.description,
        }
    }
}

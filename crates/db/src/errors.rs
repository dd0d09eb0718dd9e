#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("query error: {0}")]
    Query(#[source] sqlx::Error),
    #[error("not found")]
    NotFound,
    /// A unique constraint rejected the write; carries the constraint name.
    #[error("conflict on {0}")]
    Conflict(String),
    #[error("migration error: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("configuration error: {0}")]
    Config(#[source] anyhow::Error),
}

impl DbError {
    pub(crate) fn from_sqlx(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error() {
            if db_err.is_unique_violation() {
                return Self::Conflict(db_err.constraint().unwrap_or_default().to_string());
            }
        }
        Self::Query(err)
    }

    pub fn is_conflict_on(&self, constraint: &str) -> bool {
        matches!(self, DbError::Conflict(name) if name == constraint)
    }
}

pub type Result<T> = std::result::Result<T, DbError>;

pub type Result<T, E = AppError> = std::result::Result<T, E>;

/// Startup failures: anything that stops the service before it can serve.
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("failed to load configuration: {0}")]
    Config(#[from] config::ConfigError),
    #[error("invalid setting `{key}`: {reason}")]
    InvalidSetting { key: &'static str, reason: String },
    #[error("database unavailable: {0}")]
    Database(#[source] anyhow::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AppError {
    pub fn invalid(key: &'static str, reason: impl ToString) -> Self {
        Self::InvalidSetting {
            key,
            reason: reason.to_string(),
        }
    }

    pub fn database(err: impl Into<anyhow::Error>) -> Self {
        Self::Database(err.into())
    }
}

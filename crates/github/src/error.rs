use thiserror::Error;

#[derive(Debug, Error)]
pub enum GithubError {
    #[error("github api error: {status} for {endpoint}")]
    Status { status: u16, endpoint: String },
    #[error("github transport error: {0}")]
    Transport(#[source] anyhow::Error),
    #[error("github response decode error for {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("github graphql errors: {}", .0.join("; "))]
    Graphql(Vec<String>),
}

impl GithubError {
    pub fn status(status: u16, endpoint: impl Into<String>) -> Self {
        Self::Status {
            status,
            endpoint: endpoint.into(),
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            GithubError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(404)
    }
}

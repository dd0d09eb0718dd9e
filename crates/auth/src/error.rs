use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid address")]
    InvalidAddress,
    #[error("invalid signature")]
    InvalidSignature,
    #[error("invalid message: {0}")]
    InvalidMessage(String),
    #[error(transparent)]
    Token(#[from] jsonwebtoken::errors::Error),
}

pub type Result<T, E = AuthError> = std::result::Result<T, E>;

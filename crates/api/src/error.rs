use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub field: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest { code: &'static str, message: String },
    Validation(Vec<ValidationIssue>),
    Unauthorized { code: &'static str, message: String },
    NotFound { code: &'static str, message: String },
    Internal(String),
}

impl ApiError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code,
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            code: "unauthorized",
            message: message.into(),
        }
    }

    pub fn unauthorized_with(code: &'static str, message: impl Into<String>) -> Self {
        Self::Unauthorized {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(code: &'static str, message: impl Into<String>) -> Self {
        Self::NotFound {
            code,
            message: message.into(),
        }
    }

    pub fn route_not_found() -> Self {
        Self::not_found("not_found", "Not found")
    }

    pub fn invalid_message() -> Self {
        Self::bad_request("invalid_message", "Invalid message")
    }

    pub fn internal(err: impl std::fmt::Display) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<db::DbError> for ApiError {
    fn from(err: db::DbError) -> Self {
        Self::internal(err)
    }
}

impl From<github::RepositoryError> for ApiError {
    fn from(err: github::RepositoryError) -> Self {
        Self::internal(err)
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    success: bool,
    error: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    issues: Option<&'a [ValidationIssue]>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, issues) = match &self {
            ApiError::BadRequest { code, message } => {
                (StatusCode::BAD_REQUEST, *code, message.as_str(), None)
            }
            ApiError::Validation(issues) => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                issues
                    .first()
                    .map(|issue| issue.message.as_str())
                    .unwrap_or("Bad request"),
                Some(issues.as_slice()),
            ),
            ApiError::Unauthorized { code, message } => {
                (StatusCode::UNAUTHORIZED, *code, message.as_str(), None)
            }
            ApiError::NotFound { code, message } => {
                (StatusCode::NOT_FOUND, *code, message.as_str(), None)
            }
            ApiError::Internal(detail) => {
                error!(error = %detail, "unexpected error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "unexpected_error",
                    "Unexpected error",
                    None,
                )
            }
        };
        let body = Json(ErrorBody {
            success: false,
            error: code,
            message,
            issues,
        });
        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

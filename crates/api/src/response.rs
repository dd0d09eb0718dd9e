use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Success envelope: `{"success":true,"data":...}`. `data` is omitted when
/// there is nothing to return.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
}

pub struct Reply<T> {
    status: StatusCode,
    envelope: Envelope<T>,
}

pub fn ok<T: Serialize>(data: T) -> Reply<T> {
    Reply {
        status: StatusCode::OK,
        envelope: Envelope {
            success: true,
            data: Some(data),
        },
    }
}

pub fn created<T: Serialize>(data: T) -> Reply<T> {
    Reply {
        status: StatusCode::CREATED,
        envelope: Envelope {
            success: true,
            data: Some(data),
        },
    }
}

pub fn ok_empty() -> Reply<()> {
    Reply {
        status: StatusCode::OK,
        envelope: Envelope {
            success: true,
            data: None,
        },
    }
}

impl<T: Serialize> IntoResponse for Reply<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self.envelope)).into_response()
    }
}

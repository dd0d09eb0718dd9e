use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::response::IntoResponse;
use db::{
    ConnectionType, NewConnection, CONNECTIONS_UNIQUE_TYPE_EXTERNAL_USER,
    CONNECTIONS_UNIQUE_USER_TYPE,
};
use github::CreateAccessTokenRequest;
use secrecy::ExposeSecret;
use tracing::{info, instrument, warn};

use crate::error::{ApiError, ApiResult};
use crate::extract::CurrentUser;
use crate::response::ok_empty;
use crate::routes::ApiState;
use crate::validation::{JsonObject, Validator};

fn already_connected() -> ApiError {
    ApiError::bad_request("github_already_connected", "GitHub is already connected")
}

#[instrument(skip_all, fields(user = %user.sub))]
pub async fn connect_github(
    State(state): State<Arc<ApiState>>,
    CurrentUser(user): CurrentUser,
    body: Bytes,
) -> ApiResult<impl IntoResponse> {
    let object = JsonObject::parse(&body)?;
    let mut v = Validator::new();
    let code = object.required_string(&mut v, "code", "Code");
    let oauth_state = object.optional_string(&mut v, "state", "State");
    v.finish(())?;
    let code = code.unwrap_or_default();

    let existing = state
        .repositories
        .connections()
        .find(user.sub, ConnectionType::Github)
        .await?;
    if existing.is_some() {
        return Err(already_connected());
    }

    let access_token = state
        .connections
        .create_access_token(CreateAccessTokenRequest {
            code,
            state: oauth_state,
        })
        .await
        .map_err(|_| ApiError::bad_request("invalid_github_code", "Invalid GitHub code"))?;

    let github_user = state
        .connections
        .get_current_user(access_token.clone())
        .await
        .map_err(|_| ApiError::bad_request("invalid_github_user", "Invalid GitHub user"))?;

    let created = state
        .repositories
        .connections()
        .create(NewConnection {
            connection_type: ConnectionType::Github,
            external_user_id: github_user.id,
            external_username: github_user.username,
            token: access_token.expose_secret().to_string(),
            user_id: user.sub,
        })
        .await;

    match created {
        Ok(connection) => {
            info!(username = %connection.external_username, "github account linked");
            Ok(ok_empty())
        }
        Err(err) if err.is_conflict_on(CONNECTIONS_UNIQUE_USER_TYPE) => Err(already_connected()),
        Err(err) if err.is_conflict_on(CONNECTIONS_UNIQUE_TYPE_EXTERNAL_USER) => {
            warn!("github account already linked to another user");
            Err(ApiError::bad_request(
                "github_account_in_use",
                "GitHub account is already connected to another user",
            ))
        }
        Err(err) => Err(err.into()),
    }
}

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use serde::Serialize;
use tracing::instrument;

use crate::error::ApiResult;
use crate::extract::CurrentUser;
use crate::response::ok;
use crate::routes::ApiState;

#[derive(Debug, Serialize)]
struct ConnectionsResponse {
    /// Connection type to the linked account's username.
    connected: BTreeMap<String, String>,
}

#[instrument(skip_all, fields(user = %user.sub))]
pub async fn list_connections(
    State(state): State<Arc<ApiState>>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<impl IntoResponse> {
    let connections = state
        .repositories
        .connections()
        .list_for_user(user.sub)
        .await?;
    let connected = connections
        .into_iter()
        .map(|connection| (connection.connection_type, connection.external_username))
        .collect();
    Ok(ok(ConnectionsResponse { connected }))
}

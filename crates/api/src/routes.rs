use std::sync::Arc;
use std::time::Duration;

use auth::TokenIssuer;
use axum::http::HeaderValue;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use db::{KeyValueStore, Repositories};
use github::{ConnectionAdapter, RepositoryAdapterFactory};
use secrecy::SecretString;
use serde_json::json;
use tower::{Layer, ServiceBuilder};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{instrument, warn};

use crate::error::{ApiError, ApiResult};
use crate::handlers::{auth as auth_handlers, connect, discover, repos, settings};

pub struct ApiState {
    pub repositories: Arc<dyn Repositories>,
    pub kv: Arc<dyn KeyValueStore>,
    pub github: Arc<dyn RepositoryAdapterFactory>,
    pub connections: Arc<dyn ConnectionAdapter>,
    pub tokens: TokenIssuer,
    /// Used when the caller has no linked GitHub account.
    pub default_github_token: SecretString,
    pub nonce_ttl: Duration,
    pub cors_origins: Vec<String>,
    pub metrics_path: &'static str,
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        return base.allow_origin(Any);
    }
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    base.allow_origin(AllowOrigin::list(origins))
}

pub fn build_router(state: Arc<ApiState>) -> Router {
    let metrics_path: &'static str = state.metrics_path;

    let v1 = Router::new()
        .route(
            "/auth/siwe/:address/nonce",
            get(auth_handlers::create_nonce),
        )
        .route("/auth/siwe", post(auth_handlers::verify_siwe))
        .route("/connect/github", post(connect::connect_github))
        .route("/discover", get(discover::discover_repositories))
        .route("/repos", get(repos::list_funded_repos))
        .route("/repos/github/:owner/:name", get(repos::get_repo))
        .route("/repos/github/:owner/:name/issues", get(repos::list_issues))
        .route(
            "/repos/github/:owner/:name/issues/:number",
            get(repos::get_issue),
        )
        .route("/settings/connections", get(settings::list_connections));

    let middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(cors_layer(&state.cors_origins));

    Router::new()
        .route("/healthz", get(healthz))
        .route(metrics_path, get(metrics))
        .nest("/v1", v1)
        .fallback(not_found)
        .layer(middleware)
        .with_state(state)
}

/// The router with trailing slashes trimmed before routing.
pub fn build_service(state: Arc<ApiState>) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(build_router(state))
}

async fn healthz() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

#[instrument]
async fn metrics() -> ApiResult<impl IntoResponse> {
    crate::metrics::render()
}

async fn not_found() -> ApiError {
    ApiError::route_not_found()
}

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use api::{build_service, ApiState};
use auth::TokenIssuer;
use axum::extract::Request;
use axum::ServiceExt;
use common::config::{AppConfig, KvBackend};
use common::{logging, AppError};
use db::pg::PgDatabase;
use db::{KeyValueStore, MemoryKeyValueStore, Repositories};
use github::{GithubAdapterFactory, GithubConnectionAdapter, ReqwestExecutor};
use tracing::info;
use url::Url;

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_tracing("api", "info");
    let config = AppConfig::load()?;

    let database = Arc::new(
        PgDatabase::connect_with(&config.database.url, config.database.max_connections)
            .await
            .map_err(AppError::database)?,
    );
    let repositories: Arc<dyn Repositories> = database.clone();
    let kv: Arc<dyn KeyValueStore> = match config.kv.backend {
        KvBackend::Postgres => Arc::new(database.key_value_store()),
        KvBackend::Memory => Arc::new(MemoryKeyValueStore::new(config.kv.memory_capacity)),
    };

    let exec = Arc::new(ReqwestExecutor::new(&config.github.user_agent)?);
    let api_base = Url::parse(&config.github.api_base).context("github.api_base")?;
    let oauth_base = Url::parse(&config.github.oauth_base).context("github.oauth_base")?;
    let github = Arc::new(GithubAdapterFactory::new(
        exec.clone(),
        api_base.clone(),
        config.github.user_agent.clone(),
    ));
    let connections = Arc::new(GithubConnectionAdapter::new(
        exec,
        api_base,
        oauth_base,
        config.github.user_agent.clone(),
        config.github.client_id.clone(),
        config.github.client_secret.clone(),
    ));

    let metrics_path: &'static str =
        Box::leak(config.observability.metrics_path.clone().into_boxed_str());
    let state = Arc::new(ApiState {
        repositories,
        kv,
        github,
        connections,
        tokens: TokenIssuer::new(&config.auth.jwt_secret, config.auth.token_ttl_secs),
        default_github_token: config.github.default_access_token.clone(),
        nonce_ttl: Duration::from_secs(config.auth.nonce_ttl_secs),
        cors_origins: config.api.cors_origins.clone(),
        metrics_path,
    });
    let app = build_service(state);

    let addr = config.api.socket_addr()?;
    info!("api listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    logging::shutdown_tracer_provider();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

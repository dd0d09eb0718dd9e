pub mod auth;
pub mod connect;
pub mod discover;
pub mod repos;
pub mod settings;

use std::sync::Arc;

use catalog::language::find_language;
use catalog::license::find_license;
use catalog::{Platform, Repository};
use db::{ConnectionType, RepositoryRow, RepositoryUpsert};
use github::{ExternalRepository, RepositoryAdapter, RepositoryError};
use secrecy::SecretString;
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::metrics::REPOSITORY_CACHE;
use crate::routes::ApiState;

/// Adapter acting as the caller's linked GitHub account, or as the service
/// account for anonymous and unlinked callers.
pub(crate) async fn github_adapter(
    state: &ApiState,
    user: Option<&::auth::AuthUser>,
) -> ApiResult<Arc<dyn RepositoryAdapter>> {
    let linked = match user {
        Some(user) => state
            .repositories
            .connections()
            .find(user.sub, ConnectionType::Github)
            .await?
            .map(|connection| SecretString::from(connection.token)),
        None => None,
    };
    let token = linked.unwrap_or_else(|| state.default_github_token.clone());
    Ok(state.github.for_token(token))
}

pub(crate) fn repository_from_row(row: RepositoryRow) -> Repository {
    Repository {
        owner: row.owner,
        name: row.name,
        description: row.description,
        stars: row.stars,
        forks: row.forks,
        url: row.url,
        license: row
            .license
            .as_deref()
            .and_then(find_license)
            .cloned(),
        language: row
            .language
            .as_deref()
            .and_then(find_language)
            .cloned(),
        total_bounty_usd: row.total_bounty_usd,
    }
}

fn upsert_from_external(repo: ExternalRepository) -> RepositoryUpsert {
    RepositoryUpsert {
        platform: Platform::Github,
        owner: repo.owner,
        name: repo.name,
        description: repo.description,
        url: repo.url,
        stars: repo.stars,
        forks: repo.forks,
        license: repo.license.map(|license| license.key.into_owned()),
        language: repo.language.map(|language| language.name.into_owned()),
    }
}

/// GitHub owner and repository names: ASCII letters, digits, `-`, `_` and
/// `.`, but never `.` or `..` alone.
pub(crate) fn is_repository_name(segment: &str) -> bool {
    !matches!(segment, "" | "." | "..")
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

fn repo_not_found(owner: &str, name: &str) -> ApiError {
    ApiError::not_found(
        "repo_not_found",
        format!("Repository {owner}/{name} not found"),
    )
}

/// Stored repository, or fetched from GitHub and stored on first sight.
pub(crate) async fn resolve_repository(
    state: &ApiState,
    adapter: &dyn RepositoryAdapter,
    owner: &str,
    name: &str,
) -> ApiResult<Repository> {
    if !is_repository_name(owner) || !is_repository_name(name) {
        return Err(repo_not_found(owner, name));
    }
    if let Some(row) = state
        .repositories
        .repos()
        .get(Platform::Github, owner, name)
        .await?
    {
        REPOSITORY_CACHE.with_label_values(&["hit"]).inc();
        return Ok(repository_from_row(row));
    }

    REPOSITORY_CACHE.with_label_values(&["miss"]).inc();
    let external = match adapter.get_repository(owner, name).await {
        Ok(repo) => repo,
        Err(RepositoryError::RepoNotFound) => return Err(repo_not_found(owner, name)),
        Err(err) => return Err(err.into()),
    };
    debug!(owner = %external.owner, name = %external.name, "caching repository");
    let row = state
        .repositories
        .repos()
        .upsert(upsert_from_external(external))
        .await?;
    Ok(repository_from_row(row))
}

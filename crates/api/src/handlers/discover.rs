use std::sync::Arc;

use axum::extract::{RawQuery, State};
use axum::response::IntoResponse;
use github::SearchRepositoriesOptions;
use tracing::instrument;

use crate::error::ApiResult;
use crate::extract::MaybeUser;
use crate::handlers::github_adapter;
use crate::response::ok;
use crate::routes::ApiState;
use crate::validation::{QueryParams, Validator};

/// Live GitHub search. Results are not stored, so every item reports a zero
/// bounty total.
#[instrument(skip_all, fields(query = ?query))]
pub async fn discover_repositories(
    State(state): State<Arc<ApiState>>,
    MaybeUser(user): MaybeUser,
    RawQuery(query): RawQuery,
) -> ApiResult<impl IntoResponse> {
    let params = QueryParams::parse(query.as_deref());
    let mut v = Validator::new();
    let _platform = params.platform(&mut v);
    let options = SearchRepositoriesOptions {
        query: params.string("q"),
        languages: params.languages(&mut v),
        licenses: params.licenses(&mut v),
        limit: params.limit(&mut v),
        offset: params.offset(&mut v),
    };
    let options = v.finish(options)?;

    let adapter = github_adapter(&state, user.as_ref()).await?;
    let page = adapter.search_repositories(options).await?;
    Ok(ok(page.map(|repo| repo.into_repository(0))))
}

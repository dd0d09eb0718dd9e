use std::sync::Arc;

use axum::extract::{Path, RawQuery, State};
use axum::response::IntoResponse;
use catalog::Pagination;
use db::FundedRepoQuery;
use github::{RepositoryError, SearchIssuesOptions};
use tracing::instrument;

use crate::error::{ApiError, ApiResult};
use crate::extract::MaybeUser;
use crate::handlers::{
    github_adapter, is_repository_name, repository_from_row, resolve_repository,
};
use crate::response::ok;
use crate::routes::ApiState;
use crate::validation::{QueryParams, Validator};

/// Stored repositories that carry a bounty.
#[instrument(skip_all, fields(query = ?query))]
pub async fn list_funded_repos(
    State(state): State<Arc<ApiState>>,
    RawQuery(query): RawQuery,
) -> ApiResult<impl IntoResponse> {
    let params = QueryParams::parse(query.as_deref());
    let mut v = Validator::new();
    let filter = FundedRepoQuery {
        platform: params.platform(&mut v),
        languages: params.languages(&mut v).unwrap_or_default(),
        licenses: params.licenses(&mut v).unwrap_or_default(),
        sort: params.sort(&mut v),
        limit: i64::from(params.limit(&mut v)),
        offset: i64::from(params.offset(&mut v)),
    };
    let filter = v.finish(filter)?;

    let (rows, total) = state.repositories.repos().list_funded(filter).await?;
    let items = rows.into_iter().map(repository_from_row).collect();
    Ok(ok(Pagination::new(items, total)))
}

#[instrument(skip(state, user))]
pub async fn get_repo(
    State(state): State<Arc<ApiState>>,
    MaybeUser(user): MaybeUser,
    Path((owner, name)): Path<(String, String)>,
) -> ApiResult<impl IntoResponse> {
    let adapter = github_adapter(&state, user.as_ref()).await?;
    let repo = resolve_repository(&state, adapter.as_ref(), &owner, &name).await?;
    Ok(ok(repo))
}

#[instrument(skip(state, user))]
pub async fn list_issues(
    State(state): State<Arc<ApiState>>,
    MaybeUser(user): MaybeUser,
    Path((owner, name)): Path<(String, String)>,
    RawQuery(query): RawQuery,
) -> ApiResult<impl IntoResponse> {
    let params = QueryParams::parse(query.as_deref());
    let mut v = Validator::new();
    let q = params.string("q");
    let limit = params.limit(&mut v);
    let offset = params.offset(&mut v);
    v.finish(())?;

    let adapter = github_adapter(&state, user.as_ref()).await?;
    let repo = resolve_repository(&state, adapter.as_ref(), &owner, &name).await?;
    let page = adapter
        .search_issues(SearchIssuesOptions {
            owner: repo.owner,
            repo: repo.name,
            query: q,
            limit,
            offset,
        })
        .await?;
    Ok(ok(page.map(|issue| issue.into_issue())))
}

fn parse_issue_number(raw: &str) -> ApiResult<i64> {
    let mut v = Validator::new();
    let number = raw.parse::<i64>().ok().filter(|number| *number > 0);
    if number.is_none() {
        v.push("number", "Issue number must be a positive integer");
    }
    v.finish(number.unwrap_or_default())
}

#[instrument(skip(state, user))]
pub async fn get_issue(
    State(state): State<Arc<ApiState>>,
    MaybeUser(user): MaybeUser,
    Path((owner, name, number)): Path<(String, String, String)>,
) -> ApiResult<impl IntoResponse> {
    let number = parse_issue_number(&number)?;
    let not_found = || {
        ApiError::not_found(
            "issue_not_found",
            format!("Issue {owner}/{name}#{number} not found"),
        )
    };
    if !is_repository_name(&owner) || !is_repository_name(&name) {
        return Err(not_found());
    }
    let adapter = github_adapter(&state, user.as_ref()).await?;
    match adapter.get_issue(&owner, &name, number).await {
        Ok(detail) => Ok(ok(detail.into_detail())),
        Err(RepositoryError::IssueNotFound | RepositoryError::RepoNotFound) => Err(not_found()),
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_names_are_single_plain_segments() {
        for good in ["octo", "hello-world", "my_repo", "site.github.io", ".github"] {
            assert!(is_repository_name(good), "{good}");
        }
        for bad in ["", ".", "..", "a/b", "a/../../user", "x?y", "x#y", "x y", "x%2Fy"] {
            assert!(!is_repository_name(bad), "{bad}");
        }
    }

    #[test]
    fn issue_numbers_must_be_positive_integers() {
        assert_eq!(parse_issue_number("42").ok(), Some(42));
        for bad in ["0", "-3", "1.5", "abc", ""] {
            assert!(parse_issue_number(bad).is_err(), "{bad}");
        }
    }
}

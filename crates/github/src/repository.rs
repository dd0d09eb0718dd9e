use std::sync::Arc;

use async_trait::async_trait;
use catalog::issue::DEFAULT_ISSUE_LABEL_COLOR;
use catalog::language::{find_language, DEFAULT_LANGUAGE_COLOR};
use catalog::license::find_license;
use catalog::{
    Issue, IssueAuthor, IssueDetail, IssueLabel, IssueState, Language, License, Pagination,
    Repository,
};
use secrecy::SecretString;
use serde_json::json;
use thiserror::Error;
use tracing::instrument;
use url::Url;

use crate::client::GithubClient;
use crate::error::GithubError;
use crate::exec::HttpExec;
use crate::payloads::{
    IssueNode, RepositoryNode, RestIssue, RestLabel, RestRepository, SearchData,
};
use crate::query::{
    build_issue_search_query, build_repository_search_query, cursor_for_offset, SEARCH_ISSUES,
    SEARCH_REPOSITORIES,
};

pub const DEFAULT_SEARCH_LIMIT: u32 = 10;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("repository not found")]
    RepoNotFound,
    #[error("issue not found")]
    IssueNotFound,
    #[error(transparent)]
    Unexpected(#[from] GithubError),
}

/// Repository metadata as the platform reports it, before the store adds
/// its bounty total.
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalRepository {
    pub owner: String,
    pub name: String,
    pub description: String,
    pub stars: i64,
    pub forks: i64,
    pub url: String,
    pub license: Option<License>,
    pub language: Option<Language>,
}

impl ExternalRepository {
    pub fn into_repository(self, total_bounty_usd: i64) -> Repository {
        Repository {
            owner: self.owner,
            name: self.name,
            description: self.description,
            stars: self.stars,
            forks: self.forks,
            url: self.url,
            license: self.license,
            language: self.language,
            total_bounty_usd,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalIssue {
    pub number: i64,
    pub title: String,
    pub state: IssueState,
    pub labels: Vec<IssueLabel>,
    pub created_at: i64,
}

impl ExternalIssue {
    pub fn into_issue(self) -> Issue {
        Issue {
            number: self.number,
            title: self.title,
            state: self.state,
            labels: self.labels,
            created_at: self.created_at,
            bounty: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalIssueDetail {
    pub issue: ExternalIssue,
    pub body: String,
    pub author: Option<IssueAuthor>,
}

impl ExternalIssueDetail {
    pub fn into_detail(self) -> IssueDetail {
        IssueDetail {
            issue: self.issue.into_issue(),
            body: self.body,
            author: self.author,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRepositoriesOptions {
    pub query: String,
    pub languages: Option<Vec<String>>,
    pub licenses: Option<Vec<String>>,
    pub limit: u32,
    pub offset: u32,
}

impl Default for SearchRepositoriesOptions {
    fn default() -> Self {
        Self {
            query: String::new(),
            languages: None,
            licenses: None,
            limit: DEFAULT_SEARCH_LIMIT,
            offset: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchIssuesOptions {
    pub owner: String,
    pub repo: String,
    pub query: String,
    pub limit: u32,
    pub offset: u32,
}

#[async_trait]
pub trait RepositoryAdapter: Send + Sync {
    async fn get_repository(
        &self,
        owner: &str,
        name: &str,
    ) -> Result<ExternalRepository, RepositoryError>;

    async fn get_issue(
        &self,
        owner: &str,
        name: &str,
        number: i64,
    ) -> Result<ExternalIssueDetail, RepositoryError>;

    async fn search_repositories(
        &self,
        options: SearchRepositoriesOptions,
    ) -> Result<Pagination<ExternalRepository>, RepositoryError>;

    async fn search_issues(
        &self,
        options: SearchIssuesOptions,
    ) -> Result<Pagination<ExternalIssue>, RepositoryError>;
}

/// Builds a [`RepositoryAdapter`] bound to one access token.
pub trait RepositoryAdapterFactory: Send + Sync {
    fn for_token(&self, access_token: SecretString) -> Arc<dyn RepositoryAdapter>;
}

#[derive(Clone)]
pub struct GithubAdapterFactory {
    exec: Arc<dyn HttpExec>,
    api_base: Url,
    user_agent: String,
}

impl GithubAdapterFactory {
    pub fn new(exec: Arc<dyn HttpExec>, api_base: Url, user_agent: impl Into<String>) -> Self {
        Self {
            exec,
            api_base,
            user_agent: user_agent.into(),
        }
    }
}

impl RepositoryAdapterFactory for GithubAdapterFactory {
    fn for_token(&self, access_token: SecretString) -> Arc<dyn RepositoryAdapter> {
        Arc::new(GithubRepositoryAdapter::new(GithubClient::new(
            self.exec.clone(),
            self.api_base.clone(),
            self.user_agent.clone(),
            access_token,
        )))
    }
}

pub struct GithubRepositoryAdapter {
    client: GithubClient,
}

impl GithubRepositoryAdapter {
    pub fn new(client: GithubClient) -> Self {
        Self { client }
    }
}

fn prefixed_color(color: &str) -> String {
    if color.starts_with('#') {
        color.to_string()
    } else {
        format!("#{color}")
    }
}

fn map_rest_repository(repo: RestRepository) -> ExternalRepository {
    ExternalRepository {
        owner: repo.owner.login,
        name: repo.name,
        description: repo.description.unwrap_or_default(),
        stars: repo.stargazers_count,
        forks: repo.forks_count,
        url: repo.html_url,
        license: repo
            .license
            .and_then(|license| find_license(&license.key).cloned()),
        language: repo
            .language
            .and_then(|language| find_language(&language).cloned()),
    }
}

fn map_rest_label(label: RestLabel) -> IssueLabel {
    match label {
        RestLabel::Name(name) => IssueLabel {
            name,
            color: DEFAULT_ISSUE_LABEL_COLOR.to_string(),
        },
        RestLabel::Object { name, color } => IssueLabel {
            name: name.unwrap_or_else(|| "Unknown".to_string()),
            color: color
                .filter(|c| !c.is_empty())
                .map(|c| prefixed_color(&c))
                .unwrap_or_else(|| DEFAULT_ISSUE_LABEL_COLOR.to_string()),
        },
    }
}

fn map_rest_issue(issue: RestIssue) -> ExternalIssueDetail {
    let state = if issue.state.eq_ignore_ascii_case("open") {
        IssueState::Open
    } else {
        IssueState::Closed
    };
    ExternalIssueDetail {
        issue: ExternalIssue {
            number: issue.number,
            title: issue.title,
            state,
            labels: issue.labels.into_iter().map(map_rest_label).collect(),
            created_at: issue.created_at.timestamp_millis(),
        },
        body: issue.body.unwrap_or_default(),
        author: issue.user.map(|user| IssueAuthor {
            username: user.login,
            avatar_url: user.avatar_url,
            url: user.html_url,
        }),
    }
}

fn map_repository_node(node: RepositoryNode) -> ExternalRepository {
    ExternalRepository {
        owner: node.owner.login,
        name: node.name,
        description: node.description.unwrap_or_default(),
        stars: node.stargazer_count,
        forks: node.fork_count,
        url: node.url,
        license: node
            .license_info
            .map(|license| License::new(license.key, license.name)),
        language: node.primary_language.map(|language| {
            Language::new(
                language.name,
                language
                    .color
                    .unwrap_or_else(|| DEFAULT_LANGUAGE_COLOR.to_string()),
            )
        }),
    }
}

fn map_issue_node(node: IssueNode) -> ExternalIssue {
    let labels = node
        .labels
        .map(|labels| {
            labels
                .nodes
                .into_iter()
                .flatten()
                .map(|label| IssueLabel {
                    name: label.name,
                    color: prefixed_color(&label.color),
                })
                .collect()
        })
        .unwrap_or_default();
    ExternalIssue {
        number: node.number,
        title: node.title,
        state: IssueState::Open,
        labels,
        created_at: node.created_at.timestamp_millis(),
    }
}

/// Owner and repository names are single path segments. Empty, `.` and `..`
/// never name a repository and would be dropped or resolved by URL handling.
fn is_name_segment(segment: &str) -> bool {
    !matches!(segment, "" | "." | "..")
}

#[async_trait]
impl RepositoryAdapter for GithubRepositoryAdapter {
    #[instrument(skip(self))]
    async fn get_repository(
        &self,
        owner: &str,
        name: &str,
    ) -> Result<ExternalRepository, RepositoryError> {
        if !is_name_segment(owner) || !is_name_segment(name) {
            return Err(RepositoryError::RepoNotFound);
        }
        match self
            .client
            .get_json::<RestRepository>(&["repos", owner, name], "repos.get")
            .await
        {
            Ok(repo) => Ok(map_rest_repository(repo)),
            Err(err) if err.is_not_found() => Err(RepositoryError::RepoNotFound),
            Err(err) => Err(err.into()),
        }
    }

    #[instrument(skip(self))]
    async fn get_issue(
        &self,
        owner: &str,
        name: &str,
        number: i64,
    ) -> Result<ExternalIssueDetail, RepositoryError> {
        if !is_name_segment(owner) || !is_name_segment(name) {
            return Err(RepositoryError::IssueNotFound);
        }
        let number = number.to_string();
        let issue = match self
            .client
            .get_json::<RestIssue>(&["repos", owner, name, "issues", &number], "issues.get")
            .await
        {
            Ok(issue) => issue,
            Err(err) if err.is_not_found() => return Err(RepositoryError::IssueNotFound),
            Err(err) => return Err(err.into()),
        };
        if issue.pull_request.is_some() {
            return Err(RepositoryError::IssueNotFound);
        }
        Ok(map_rest_issue(issue))
    }

    #[instrument(skip(self))]
    async fn search_repositories(
        &self,
        options: SearchRepositoriesOptions,
    ) -> Result<Pagination<ExternalRepository>, RepositoryError> {
        let query = build_repository_search_query(
            &options.query,
            options.languages.as_deref(),
            options.licenses.as_deref(),
        );
        let variables = json!({
            "query": query,
            "first": options.limit,
            "after": cursor_for_offset(options.offset),
        });
        let data: SearchData<RepositoryNode> = self
            .client
            .graphql(SEARCH_REPOSITORIES, variables, "search.repositories")
            .await?;
        let total = data.search.repository_count.unwrap_or_default();
        let items = data
            .search
            .nodes
            .into_iter()
            .flatten()
            .map(map_repository_node)
            .collect();
        Ok(Pagination::new(items, total))
    }

    #[instrument(skip(self))]
    async fn search_issues(
        &self,
        options: SearchIssuesOptions,
    ) -> Result<Pagination<ExternalIssue>, RepositoryError> {
        let query = build_issue_search_query(&options.owner, &options.repo, &options.query);
        let variables = json!({
            "query": query,
            "first": options.limit,
            "after": cursor_for_offset(options.offset),
        });
        let data: SearchData<IssueNode> = self
            .client
            .graphql(SEARCH_ISSUES, variables, "search.issues")
            .await?;
        let total = data.search.issue_count.unwrap_or_default();
        let items = data
            .search
            .nodes
            .into_iter()
            .flatten()
            .map(map_issue_node)
            .collect();
        Ok(Pagination::new(items, total))
    }
}

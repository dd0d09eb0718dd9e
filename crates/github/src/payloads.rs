//! Wire shapes of the GitHub responses the adapters read. Only the fields
//! we map are declared.

use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct RestOwner {
    pub login: String,
}

#[derive(Debug, Deserialize)]
pub struct RestLicense {
    pub key: String,
}

#[derive(Debug, Deserialize)]
pub struct RestRepository {
    pub name: String,
    pub owner: RestOwner,
    pub description: Option<String>,
    pub html_url: String,
    #[serde(default)]
    pub stargazers_count: i64,
    #[serde(default)]
    pub forks_count: i64,
    pub license: Option<RestLicense>,
    pub language: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RestLabel {
    Name(String),
    Object {
        name: Option<String>,
        color: Option<String>,
    },
}

#[derive(Debug, Deserialize)]
pub struct RestUser {
    pub login: String,
    pub avatar_url: String,
    pub html_url: String,
}

#[derive(Debug, Deserialize)]
pub struct RestIssue {
    pub number: i64,
    pub title: String,
    pub state: String,
    #[serde(default)]
    pub labels: Vec<RestLabel>,
    pub created_at: DateTime<Utc>,
    pub body: Option<String>,
    pub user: Option<RestUser>,
    /// Present only when the "issue" is a pull request.
    pub pull_request: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct AuthenticatedUser {
    pub id: i64,
    pub login: String,
}

#[derive(Debug, Deserialize)]
pub struct AccessTokenResponse {
    pub access_token: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchData<N> {
    pub search: SearchConnection<N>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchConnection<N> {
    pub repository_count: Option<i64>,
    pub issue_count: Option<i64>,
    #[serde(default = "Vec::new")]
    pub nodes: Vec<Option<N>>,
}

#[derive(Debug, Deserialize)]
pub struct GraphqlLanguage {
    pub name: String,
    pub color: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GraphqlLicense {
    pub key: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryNode {
    pub name: String,
    pub owner: RestOwner,
    pub description: Option<String>,
    pub url: String,
    pub stargazer_count: i64,
    pub fork_count: i64,
    pub primary_language: Option<GraphqlLanguage>,
    pub license_info: Option<GraphqlLicense>,
}

#[derive(Debug, Deserialize)]
pub struct GraphqlLabel {
    pub name: String,
    pub color: String,
}

#[derive(Debug, Deserialize)]
pub struct LabelConnection {
    #[serde(default = "Vec::new")]
    pub nodes: Vec<Option<GraphqlLabel>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueNode {
    pub number: i64,
    pub title: String,
    pub labels: Option<LabelConnection>,
    pub created_at: DateTime<Utc>,
}

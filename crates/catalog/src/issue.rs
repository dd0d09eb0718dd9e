use serde::Serialize;

use crate::bounty::Bounty;

pub const DEFAULT_ISSUE_LABEL_COLOR: &str = "#ededed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    Open,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssueLabel {
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueAuthor {
    pub username: String,
    pub avatar_url: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub number: i64,
    pub title: String,
    pub state: IssueState,
    pub labels: Vec<IssueLabel>,
    /// Milliseconds since the Unix epoch.
    pub created_at: i64,
    pub bounty: Option<Bounty>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssueDetail {
    #[serde(flatten)]
    pub issue: Issue,
    pub body: String,
    pub author: Option<IssueAuthor>,
}

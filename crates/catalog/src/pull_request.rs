use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PullRequestState {
    Open,
    Closed,
    Merged,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequest {
    pub id: String,
    pub owner: String,
    pub repo: String,
    pub number: i64,
    pub title: String,
    pub state: PullRequestState,
    pub author: String,
    pub solved_issue_numbers: Vec<i64>,
}

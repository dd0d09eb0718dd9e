use serde::Serialize;

use crate::language::Language;
use crate::license::License;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Repository {
    pub owner: String,
    pub name: String,
    pub description: String,
    pub stars: i64,
    pub forks: i64,
    pub url: String,
    pub license: Option<License>,
    pub language: Option<Language>,
    pub total_bounty_usd: i64,
}

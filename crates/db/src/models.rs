use catalog::Platform;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub address: String,
    pub formatted_address: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// External platforms a user can link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionType {
    Github,
}

impl ConnectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionType::Github => "github",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ConnectionRow {
    pub id: Uuid,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub connection_type: String,
    pub external_user_id: String,
    pub external_username: String,
    pub token: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewConnection {
    pub connection_type: ConnectionType,
    pub external_user_id: String,
    pub external_username: String,
    pub token: String,
    pub user_id: Uuid,
}

pub const CONNECTIONS_UNIQUE_USER_TYPE: &str = "connections_unique_user_id_type";
pub const CONNECTIONS_UNIQUE_TYPE_EXTERNAL_USER: &str = "connections_unique_type_external_user_id";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RepositoryRow {
    pub id: Uuid,
    pub platform: String,
    pub owner: String,
    pub name: String,
    pub description: String,
    pub url: String,
    pub stars: i64,
    pub forks: i64,
    pub license: Option<String>,
    pub language: Option<String>,
    pub total_bounty_usd: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Metadata refreshed from the platform. The bounty total is owned by the
/// store and never overwritten by an upsert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryUpsert {
    pub platform: Platform,
    pub owner: String,
    pub name: String,
    pub description: String,
    pub url: String,
    pub stars: i64,
    pub forks: i64,
    pub license: Option<String>,
    pub language: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RepoSort {
    #[default]
    HighestBounty,
    LowestBounty,
    Stars,
    Forks,
}

impl RepoSort {
    pub const ALL: [RepoSort; 4] = [
        RepoSort::HighestBounty,
        RepoSort::LowestBounty,
        RepoSort::Stars,
        RepoSort::Forks,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RepoSort::HighestBounty => "highest_bounty",
            RepoSort::LowestBounty => "lowest_bounty",
            RepoSort::Stars => "stars",
            RepoSort::Forks => "forks",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|sort| sort.as_str() == value)
    }

    pub fn order_by(&self) -> &'static str {
        match self {
            RepoSort::HighestBounty => "total_bounty_usd DESC, stars DESC",
            RepoSort::LowestBounty => "total_bounty_usd ASC, stars DESC",
            RepoSort::Stars => "stars DESC, owner ASC, name ASC",
            RepoSort::Forks => "forks DESC, owner ASC, name ASC",
        }
    }
}

#[derive(Debug, Clone)]
pub struct FundedRepoQuery {
    pub platform: Platform,
    pub languages: Vec<String>,
    pub licenses: Vec<String>,
    pub sort: RepoSort,
    pub limit: i64,
    pub offset: i64,
}

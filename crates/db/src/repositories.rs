use async_trait::async_trait;
use catalog::Platform;
use uuid::Uuid;

use crate::errors::Result;
use crate::models::{
    ConnectionRow, ConnectionType, FundedRepoQuery, NewConnection, RepositoryRow,
    RepositoryUpsert, UserRow,
};

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Returns the user owning `address` (compared lower-cased), creating it
    /// on first sight.
    async fn find_or_create(&self, address: &str) -> Result<UserRow>;
    async fn get_by_id(&self, id: Uuid) -> Result<Option<UserRow>>;
}

#[async_trait]
pub trait ConnectionRepository: Send + Sync {
    async fn find(
        &self,
        user_id: Uuid,
        connection_type: ConnectionType,
    ) -> Result<Option<ConnectionRow>>;
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<ConnectionRow>>;
    async fn create(&self, connection: NewConnection) -> Result<ConnectionRow>;
}

#[async_trait]
pub trait RepoRepository: Send + Sync {
    async fn get(&self, platform: Platform, owner: &str, name: &str)
        -> Result<Option<RepositoryRow>>;
    async fn upsert(&self, repo: RepositoryUpsert) -> Result<RepositoryRow>;
    /// Rows with a positive bounty total plus the unpaginated match count.
    async fn list_funded(&self, query: FundedRepoQuery) -> Result<(Vec<RepositoryRow>, i64)>;
}

pub trait Repositories: Send + Sync {
    fn users(&self) -> &dyn UserRepository;
    fn connections(&self) -> &dyn ConnectionRepository;
    fn repos(&self) -> &dyn RepoRepository;
}

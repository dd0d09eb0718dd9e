use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use catalog::Platform;
use chrono::{Duration, Utc};
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, QueryBuilder};
use tokio::time::sleep;
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::errors::{DbError, Result};
use crate::kv::KeyValueStore;
use crate::models::{
    ConnectionRow, ConnectionType, FundedRepoQuery, NewConnection, RepositoryRow,
    RepositoryUpsert, UserRow,
};
use crate::repositories::{ConnectionRepository, RepoRepository, Repositories, UserRepository};

pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("../../migrations")
        .run(pool)
        .await
        .map_err(DbError::Migration)
}

#[derive(Clone)]
pub struct PgDatabase {
    pool: PgPool,
    user_repo: Arc<PgUserRepository>,
    connection_repo: Arc<PgConnectionRepository>,
    repo_repo: Arc<PgRepoRepository>,
}

impl PgDatabase {
    pub async fn connect(database_url: &str) -> Result<Self> {
        Self::connect_with(database_url, 10).await
    }

    pub async fn connect_with(database_url: &str, max_connections: u32) -> Result<Self> {
        const MAX_ATTEMPTS: u32 = 5;
        const BASE_DELAY_MS: u64 = 500;

        let mut attempts = 0;
        loop {
            match PgPoolOptions::new()
                .max_connections(max_connections)
                .connect(database_url)
                .await
            {
                Ok(pool) => {
                    run_migrations(&pool).await?;
                    return Ok(Self::from_pool(pool));
                }
                Err(err) => {
                    attempts += 1;
                    if attempts >= MAX_ATTEMPTS {
                        return Err(DbError::Query(err));
                    }

                    let exp = (attempts - 1).min(5);
                    let backoff = StdDuration::from_millis(BASE_DELAY_MS * (1u64 << exp));
                    warn!(
                        attempts,
                        error = %err,
                        wait_ms = backoff.as_millis(),
                        "database connection failed; retrying"
                    );
                    sleep(backoff).await;
                }
            }
        }
    }

    pub fn from_pool(pool: PgPool) -> Self {
        let user_repo = Arc::new(PgUserRepository { pool: pool.clone() });
        let connection_repo = Arc::new(PgConnectionRepository { pool: pool.clone() });
        let repo_repo = Arc::new(PgRepoRepository { pool: pool.clone() });

        Self {
            pool,
            user_repo,
            connection_repo,
            repo_repo,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn key_value_store(&self) -> PgKeyValueStore {
        PgKeyValueStore {
            pool: self.pool.clone(),
        }
    }
}

impl Repositories for PgDatabase {
    fn users(&self) -> &dyn UserRepository {
        &*self.user_repo
    }

    fn connections(&self) -> &dyn ConnectionRepository {
        &*self.connection_repo
    }

    fn repos(&self) -> &dyn RepoRepository {
        &*self.repo_repo
    }
}

#[derive(Clone)]
struct PgUserRepository {
    pool: PgPool,
}

#[async_trait]
impl UserRepository for PgUserRepository {
    #[instrument(skip(self))]
    async fn find_or_create(&self, address: &str) -> Result<UserRow> {
        sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (id, address, formatted_address)
            VALUES ($1, $2, $3)
            ON CONFLICT (formatted_address) DO UPDATE
                SET updated_at = now()
            RETURNING id, address, formatted_address, created_at, updated_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(address)
        .bind(address.to_lowercase())
        .fetch_one(&self.pool)
        .await
        .map_err(DbError::from_sqlx)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<UserRow>> {
        sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, address, formatted_address, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::Query)
    }
}

#[derive(Clone)]
struct PgConnectionRepository {
    pool: PgPool,
}

#[async_trait]
impl ConnectionRepository for PgConnectionRepository {
    async fn find(
        &self,
        user_id: Uuid,
        connection_type: ConnectionType,
    ) -> Result<Option<ConnectionRow>> {
        sqlx::query_as::<_, ConnectionRow>(
            r#"
            SELECT id, type, external_user_id, external_username, token, user_id, created_at, updated_at
            FROM connections
            WHERE user_id = $1 AND type = $2
            "#,
        )
        .bind(user_id)
        .bind(connection_type.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::Query)
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<ConnectionRow>> {
        sqlx::query_as::<_, ConnectionRow>(
            r#"
            SELECT id, type, external_user_id, external_username, token, user_id, created_at, updated_at
            FROM connections
            WHERE user_id = $1
            ORDER BY type
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::Query)
    }

    #[instrument(skip(self, connection), fields(user_id = %connection.user_id, kind = connection.connection_type.as_str()))]
    async fn create(&self, connection: NewConnection) -> Result<ConnectionRow> {
        sqlx::query_as::<_, ConnectionRow>(
            r#"
            INSERT INTO connections (id, type, external_user_id, external_username, token, user_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, type, external_user_id, external_username, token, user_id, created_at, updated_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(connection.connection_type.as_str())
        .bind(connection.external_user_id)
        .bind(connection.external_username)
        .bind(connection.token)
        .bind(connection.user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(DbError::from_sqlx)
    }
}

#[derive(Clone)]
struct PgRepoRepository {
    pool: PgPool,
}

const REPOSITORY_COLUMNS: &str = "id, platform, owner, name, description, url, stars, forks, \
     license, language, total_bounty_usd, created_at, updated_at";

fn push_funded_filter(builder: &mut QueryBuilder<'_, Postgres>, query: &FundedRepoQuery) {
    builder
        .push(" WHERE platform = ")
        .push_bind(query.platform.as_str())
        .push(" AND total_bounty_usd > 0");
    if !query.languages.is_empty() {
        builder
            .push(" AND language = ANY(")
            .push_bind(query.languages.clone())
            .push(")");
    }
    if !query.licenses.is_empty() {
        builder
            .push(" AND license = ANY(")
            .push_bind(query.licenses.clone())
            .push(")");
    }
}

#[async_trait]
impl RepoRepository for PgRepoRepository {
    async fn get(
        &self,
        platform: Platform,
        owner: &str,
        name: &str,
    ) -> Result<Option<RepositoryRow>> {
        sqlx::query_as::<_, RepositoryRow>(&format!(
            r#"
            SELECT {REPOSITORY_COLUMNS}
            FROM repositories
            WHERE platform = $1 AND lower(owner) = lower($2) AND lower(name) = lower($3)
            "#
        ))
        .bind(platform.as_str())
        .bind(owner)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::Query)
    }

    #[instrument(skip(self, repo), fields(owner = %repo.owner, name = %repo.name))]
    async fn upsert(&self, repo: RepositoryUpsert) -> Result<RepositoryRow> {
        sqlx::query_as::<_, RepositoryRow>(&format!(
            r#"
            INSERT INTO repositories (id, platform, owner, name, description, url, stars, forks, license, language)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (platform, owner, name) DO UPDATE
                SET description = EXCLUDED.description,
                    url = EXCLUDED.url,
                    stars = EXCLUDED.stars,
                    forks = EXCLUDED.forks,
                    license = EXCLUDED.license,
                    language = EXCLUDED.language,
                    updated_at = now()
            RETURNING {REPOSITORY_COLUMNS}
            "#
        ))
        .bind(Uuid::now_v7())
        .bind(repo.platform.as_str())
        .bind(repo.owner)
        .bind(repo.name)
        .bind(repo.description)
        .bind(repo.url)
        .bind(repo.stars)
        .bind(repo.forks)
        .bind(repo.license)
        .bind(repo.language)
        .fetch_one(&self.pool)
        .await
        .map_err(DbError::from_sqlx)
    }

    #[instrument(skip(self))]
    async fn list_funded(&self, query: FundedRepoQuery) -> Result<(Vec<RepositoryRow>, i64)> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM repositories");
        push_funded_filter(&mut count, &query);
        let total: i64 = count
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(DbError::Query)?;

        let mut select =
            QueryBuilder::<Postgres>::new(format!("SELECT {REPOSITORY_COLUMNS} FROM repositories"));
        push_funded_filter(&mut select, &query);
        select
            .push(" ORDER BY ")
            .push(query.sort.order_by())
            .push(" LIMIT ")
            .push_bind(query.limit)
            .push(" OFFSET ")
            .push_bind(query.offset);
        let rows = select
            .build_query_as::<RepositoryRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(DbError::Query)?;

        Ok((rows, total))
    }
}

/// Key-value entries kept in the `kv_entries` table. Expired rows are swept
/// on write.
#[derive(Clone)]
pub struct PgKeyValueStore {
    pool: PgPool,
}

impl PgKeyValueStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn purge_expired(&self) -> Result<u64> {
        sqlx::query("DELETE FROM kv_entries WHERE expires_at <= now()")
            .execute(&self.pool)
            .await
            .map(|done| done.rows_affected())
            .map_err(DbError::Query)
    }
}

#[async_trait]
impl KeyValueStore for PgKeyValueStore {
    #[instrument(skip(self, value))]
    async fn put(&self, key: &str, value: &str, ttl: StdDuration) -> Result<()> {
        let ttl = Duration::from_std(ttl).map_err(|err| DbError::Config(err.into()))?;
        self.purge_expired().await?;
        sqlx::query(
            r#"
            INSERT INTO kv_entries (key, value, expires_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (key) DO UPDATE
                SET value = EXCLUDED.value,
                    expires_at = EXCLUDED.expires_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now() + ttl)
        .execute(&self.pool)
        .await
        .map(|_| ())
        .map_err(DbError::Query)
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT value FROM kv_entries
            WHERE key = $1 AND (expires_at IS NULL OR expires_at > now())
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::Query)
    }

    async fn take(&self, key: &str) -> Result<Option<String>> {
        let removed: Option<(String, bool)> = sqlx::query_as(
            r#"
            DELETE FROM kv_entries
            WHERE key = $1
            RETURNING value, (expires_at IS NULL OR expires_at > now()) AS live
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::Query)?;

        Ok(removed.and_then(|(value, live)| live.then_some(value)))
    }

    async fn consume(&self, key: &str, expected: &str) -> Result<bool> {
        sqlx::query(
            r#"
            DELETE FROM kv_entries
            WHERE key = $1
              AND value = $2
              AND (expires_at IS NULL OR expires_at > now())
            "#,
        )
        .bind(key)
        .bind(expected)
        .execute(&self.pool)
        .await
        .map(|done| done.rows_affected() == 1)
        .map_err(DbError::Query)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM kv_entries WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(DbError::Query)
    }
}

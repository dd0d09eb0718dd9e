//! Throwaway Postgres databases for integration tests.
//!
//! Each test gets its own database named `<prefix>_<uuid>` on the server
//! given by `TEST_ADMIN_URL` (falling back to `DATABASE_URL`), so tests can
//! run in parallel without sharing rows.

use std::env;

use anyhow::{Context, Result};
use db::pg::{run_migrations, PgDatabase};
use sqlx::{Executor, PgPool};
use uuid::Uuid;

pub struct DbFixture {
    server_url: String,
}

impl DbFixture {
    /// Fails when neither variable is set; callers treat that as "skip".
    pub fn from_env() -> Result<Self> {
        let url = env::var("TEST_ADMIN_URL")
            .or_else(|_| env::var("DATABASE_URL"))
            .context("set TEST_ADMIN_URL or DATABASE_URL to run database tests")?;
        Ok(Self::new(url))
    }

    pub fn new(server_url: impl Into<String>) -> Self {
        let server_url = server_url.into();
        Self {
            server_url: server_url.trim_end_matches('/').to_string(),
        }
    }

    /// A fresh database with the schema applied.
    pub async fn create(&self, prefix: &str) -> Result<DatabaseHandle> {
        let handle = self.create_unmigrated(prefix).await?;
        run_migrations(&handle.pool)
            .await
            .with_context(|| format!("migrating {}", handle.name))?;
        Ok(handle)
    }

    /// A fresh, empty database. Useful for exercising startup migrations.
    pub async fn create_unmigrated(&self, prefix: &str) -> Result<DatabaseHandle> {
        let name = database_name(prefix);
        admin_execute(&self.server_url, &format!("CREATE DATABASE \"{name}\"")).await?;

        let url = format!("{}/{}", self.server_url, name);
        let pool = PgPool::connect(&url)
            .await
            .with_context(|| format!("connecting to {name}"))?;
        Ok(DatabaseHandle {
            pool,
            name,
            url,
            server_url: self.server_url.clone(),
        })
    }
}

fn database_name(prefix: &str) -> String {
    let prefix: String = prefix
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    format!("{prefix}_{}", Uuid::new_v4().simple())
}

async fn admin_execute(server_url: &str, sql: &str) -> Result<()> {
    let admin = PgPool::connect(server_url)
        .await
        .context("connecting to the admin database")?;
    admin.execute(sql).await.with_context(|| sql.to_string())?;
    admin.close().await;
    Ok(())
}

pub struct DatabaseHandle {
    pool: PgPool,
    name: String,
    url: String,
    server_url: String,
}

impl DatabaseHandle {
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn database_url(&self) -> &str {
        &self.url
    }

    /// Repositories and key-value store over this database's pool.
    pub fn database(&self) -> PgDatabase {
        PgDatabase::from_pool(self.pool.clone())
    }

    /// Closes the pool, kicks any lingering sessions and drops the database.
    pub async fn cleanup(self) -> Result<()> {
        self.pool.close().await;
        admin_execute(
            &self.server_url,
            &format!(
                "SELECT pg_terminate_backend(pid) FROM pg_stat_activity WHERE datname = '{}'",
                self.name
            ),
        )
        .await?;
        admin_execute(
            &self.server_url,
            &format!("DROP DATABASE IF EXISTS \"{}\"", self.name),
        )
        .await
    }
}

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use api::{build_service, ApiState};
use async_trait::async_trait;
use auth::signature::{address_from_key, personal_message_hash};
use auth::{AuthUser, TokenIssuer};
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use catalog::{IssueState, Pagination, Platform};
use chrono::Utc;
use db::{
    ConnectionRepository, ConnectionRow, ConnectionType, DbError, FundedRepoQuery,
    MemoryKeyValueStore, NewConnection, RepoRepository, Repositories, RepositoryRow,
    RepositoryUpsert, UserRepository, UserRow, CONNECTIONS_UNIQUE_TYPE_EXTERNAL_USER,
    CONNECTIONS_UNIQUE_USER_TYPE,
};
use github::{
    ConnectionAdapter, ConnectionError, ConnectionUser, CreateAccessTokenRequest,
    ExternalIssue, ExternalIssueDetail, ExternalRepository, RepositoryAdapter,
    RepositoryAdapterFactory, RepositoryError, SearchIssuesOptions, SearchRepositoriesOptions,
};
use k256::ecdsa::SigningKey;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tower::util::ServiceExt;
use tower_http::normalize_path::NormalizePath;
use uuid::Uuid;

pub const JWT_SECRET: &str = "test-secret";
pub const DEFAULT_TOKEN: &str = "ghp_default";

// --- Store doubles ---

#[derive(Default)]
pub struct MemoryRepos {
    pub users: Mutex<Vec<UserRow>>,
    pub connections: Mutex<Vec<ConnectionRow>>,
    pub repos: Mutex<Vec<RepositoryRow>>,
}

impl MemoryRepos {
    pub fn seed_repo(&self, owner: &str, name: &str, stars: i64, total_bounty_usd: i64) {
        let now = Utc::now();
        self.repos.lock().unwrap().push(RepositoryRow {
            id: Uuid::now_v7(),
            platform: "github".into(),
            owner: owner.into(),
            name: name.into(),
            description: format!("{name} description"),
            url: format!("https://github.com/{owner}/{name}"),
            stars,
            forks: 0,
            license: Some("mit".into()),
            language: Some("Rust".into()),
            total_bounty_usd,
            created_at: now,
            updated_at: now,
        });
    }
}

#[async_trait]
impl UserRepository for MemoryRepos {
    async fn find_or_create(&self, address: &str) -> db::errors::Result<UserRow> {
        let formatted = address.to_ascii_lowercase();
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.iter().find(|u| u.formatted_address == formatted) {
            return Ok(user.clone());
        }
        let now = Utc::now();
        let user = UserRow {
            id: Uuid::now_v7(),
            address: address.into(),
            formatted_address: formatted,
            created_at: now,
            updated_at: now,
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn get_by_id(&self, id: Uuid) -> db::errors::Result<Option<UserRow>> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.id == id).cloned())
    }
}

#[async_trait]
impl ConnectionRepository for MemoryRepos {
    async fn find(
        &self,
        user_id: Uuid,
        connection_type: ConnectionType,
    ) -> db::errors::Result<Option<ConnectionRow>> {
        Ok(self
            .connections
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.user_id == user_id && c.connection_type == connection_type.as_str())
            .cloned())
    }

    async fn list_for_user(&self, user_id: Uuid) -> db::errors::Result<Vec<ConnectionRow>> {
        Ok(self
            .connections
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn create(&self, connection: NewConnection) -> db::errors::Result<ConnectionRow> {
        let kind = connection.connection_type.as_str();
        let mut connections = self.connections.lock().unwrap();
        if connections
            .iter()
            .any(|c| c.user_id == connection.user_id && c.connection_type == kind)
        {
            return Err(DbError::Conflict(CONNECTIONS_UNIQUE_USER_TYPE.into()));
        }
        if connections
            .iter()
            .any(|c| c.external_user_id == connection.external_user_id && c.connection_type == kind)
        {
            return Err(DbError::Conflict(CONNECTIONS_UNIQUE_TYPE_EXTERNAL_USER.into()));
        }
        let now = Utc::now();
        let row = ConnectionRow {
            id: Uuid::now_v7(),
            connection_type: kind.into(),
            external_user_id: connection.external_user_id,
            external_username: connection.external_username,
            token: connection.token,
            user_id: connection.user_id,
            created_at: now,
            updated_at: now,
        };
        connections.push(row.clone());
        Ok(row)
    }
}

#[async_trait]
impl RepoRepository for MemoryRepos {
    async fn get(
        &self,
        platform: Platform,
        owner: &str,
        name: &str,
    ) -> db::errors::Result<Option<RepositoryRow>> {
        Ok(self
            .repos
            .lock()
            .unwrap()
            .iter()
            .find(|r| {
                r.platform == platform.as_str()
                    && r.owner.eq_ignore_ascii_case(owner)
                    && r.name.eq_ignore_ascii_case(name)
            })
            .cloned())
    }

    async fn upsert(&self, repo: RepositoryUpsert) -> db::errors::Result<RepositoryRow> {
        let mut repos = self.repos.lock().unwrap();
        let now = Utc::now();
        if let Some(row) = repos
            .iter_mut()
            .find(|r| r.owner == repo.owner && r.name == repo.name)
        {
            row.description = repo.description;
            row.stars = repo.stars;
            row.forks = repo.forks;
            row.updated_at = now;
            return Ok(row.clone());
        }
        let row = RepositoryRow {
            id: Uuid::now_v7(),
            platform: repo.platform.as_str().into(),
            owner: repo.owner,
            name: repo.name,
            description: repo.description,
            url: repo.url,
            stars: repo.stars,
            forks: repo.forks,
            license: repo.license,
            language: repo.language,
            total_bounty_usd: 0,
            created_at: now,
            updated_at: now,
        };
        repos.push(row.clone());
        Ok(row)
    }

    async fn list_funded(
        &self,
        query: FundedRepoQuery,
    ) -> db::errors::Result<(Vec<RepositoryRow>, i64)> {
        let mut rows: Vec<_> = self
            .repos
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.total_bounty_usd > 0)
            .filter(|r| {
                query.languages.is_empty()
                    || r.language.as_ref().is_some_and(|l| query.languages.contains(l))
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.total_bounty_usd.cmp(&a.total_bounty_usd));
        let total = rows.len() as i64;
        let page = rows
            .into_iter()
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .collect();
        Ok((page, total))
    }
}

pub struct MemoryRepositories(pub Arc<MemoryRepos>);

impl Repositories for MemoryRepositories {
    fn users(&self) -> &dyn UserRepository {
        self.0.as_ref()
    }
    fn connections(&self) -> &dyn ConnectionRepository {
        self.0.as_ref()
    }
    fn repos(&self) -> &dyn RepoRepository {
        self.0.as_ref()
    }
}

// --- GitHub doubles ---

#[derive(Default)]
pub struct StubGithub {
    pub repos: Mutex<HashMap<String, ExternalRepository>>,
    pub issues: Mutex<HashMap<i64, ExternalIssueDetail>>,
    pub tokens_used: Mutex<Vec<String>>,
    pub repository_fetches: AtomicUsize,
    pub searches: Mutex<Vec<SearchRepositoriesOptions>>,
}

impl StubGithub {
    pub fn add_repo(&self, owner: &str, name: &str, stars: i64) {
        self.repos.lock().unwrap().insert(
            format!("{}/{}", owner.to_ascii_lowercase(), name.to_ascii_lowercase()),
            ExternalRepository {
                owner: owner.into(),
                name: name.into(),
                description: "from github".into(),
                stars,
                forks: 2,
                url: format!("https://github.com/{owner}/{name}"),
                license: None,
                language: None,
            },
        );
    }

    pub fn add_issue(&self, number: i64, title: &str) {
        self.issues.lock().unwrap().insert(
            number,
            ExternalIssueDetail {
                issue: ExternalIssue {
                    number,
                    title: title.into(),
                    state: IssueState::Open,
                    labels: Vec::new(),
                    created_at: 1_700_000_000_000,
                },
                body: "details".into(),
                author: None,
            },
        );
    }

    pub fn fetches(&self) -> usize {
        self.repository_fetches.load(Ordering::SeqCst)
    }
}

pub struct StubFactory(pub Arc<StubGithub>);

impl RepositoryAdapterFactory for StubFactory {
    fn for_token(&self, access_token: SecretString) -> Arc<dyn RepositoryAdapter> {
        self.0
            .tokens_used
            .lock()
            .unwrap()
            .push(access_token.expose_secret().to_string());
        Arc::new(StubAdapter(self.0.clone()))
    }
}

pub struct StubAdapter(Arc<StubGithub>);

#[async_trait]
impl RepositoryAdapter for StubAdapter {
    async fn get_repository(
        &self,
        owner: &str,
        name: &str,
    ) -> Result<ExternalRepository, RepositoryError> {
        self.0.repository_fetches.fetch_add(1, Ordering::SeqCst);
        let key = format!("{}/{}", owner.to_ascii_lowercase(), name.to_ascii_lowercase());
        self.0
            .repos
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .ok_or(RepositoryError::RepoNotFound)
    }

    async fn get_issue(
        &self,
        _owner: &str,
        _name: &str,
        number: i64,
    ) -> Result<ExternalIssueDetail, RepositoryError> {
        self.0
            .issues
            .lock()
            .unwrap()
            .get(&number)
            .cloned()
            .ok_or(RepositoryError::IssueNotFound)
    }

    async fn search_repositories(
        &self,
        options: SearchRepositoriesOptions,
    ) -> Result<Pagination<ExternalRepository>, RepositoryError> {
        self.0.searches.lock().unwrap().push(options);
        let items: Vec<_> = self.0.repos.lock().unwrap().values().cloned().collect();
        let total = items.len() as i64;
        Ok(Pagination::new(items, total))
    }

    async fn search_issues(
        &self,
        _options: SearchIssuesOptions,
    ) -> Result<Pagination<ExternalIssue>, RepositoryError> {
        let items: Vec<_> = self
            .0
            .issues
            .lock()
            .unwrap()
            .values()
            .map(|detail| detail.issue.clone())
            .collect();
        let total = items.len() as i64;
        Ok(Pagination::new(items, total))
    }
}

/// OAuth double: code `good-<id>` yields token `gho_<id>` for GitHub user
/// `<id>`; anything else is rejected.
pub struct StubConnections;

#[async_trait]
impl ConnectionAdapter for StubConnections {
    async fn create_access_token(
        &self,
        request: CreateAccessTokenRequest,
    ) -> Result<SecretString, ConnectionError> {
        request
            .code
            .strip_prefix("good-")
            .map(|id| SecretString::from(format!("gho_{id}")))
            .ok_or(ConnectionError::InvalidCode)
    }

    async fn get_current_user(
        &self,
        access_token: SecretString,
    ) -> Result<ConnectionUser, ConnectionError> {
        let id = access_token
            .expose_secret()
            .strip_prefix("gho_")
            .ok_or(ConnectionError::InvalidToken)?
            .to_string();
        Ok(ConnectionUser {
            username: format!("octo-{id}"),
            id,
        })
    }
}

// --- App harness ---

pub struct TestApp {
    pub app: NormalizePath<Router>,
    pub store: Arc<MemoryRepos>,
    pub github: Arc<StubGithub>,
    pub kv: MemoryKeyValueStore,
    pub tokens: TokenIssuer,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_nonce_ttl(Duration::from_secs(600))
    }

    pub fn with_nonce_ttl(nonce_ttl: Duration) -> Self {
        let store = Arc::new(MemoryRepos::default());
        let github = Arc::new(StubGithub::default());
        let kv = MemoryKeyValueStore::new(128);
        let tokens = TokenIssuer::new(&SecretString::from(JWT_SECRET), 3600);
        let state = Arc::new(ApiState {
            repositories: Arc::new(MemoryRepositories(store.clone())),
            kv: Arc::new(kv.clone()),
            github: Arc::new(StubFactory(github.clone())),
            connections: Arc::new(StubConnections),
            tokens: tokens.clone(),
            default_github_token: SecretString::from(DEFAULT_TOKEN),
            nonce_ttl,
            cors_origins: Vec::new(),
            metrics_path: "/metrics",
        });
        Self {
            app: build_service(state),
            store,
            github,
            kv,
            tokens,
        }
    }

    /// Signs a session token for a user that already exists in the store.
    pub async fn login(&self, address: &str) -> String {
        let user = self.store.find_or_create(address).await.unwrap();
        self.tokens
            .sign(&AuthUser {
                sub: user.id,
                address: address.into(),
            })
            .unwrap()
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let res = self.app.clone().oneshot(request).await.unwrap();
        let status = res.status();
        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let value = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap_or(Value::Null)
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::get(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post_json(
        &self,
        uri: &str,
        token: Option<&str>,
        body: Value,
    ) -> (StatusCode, Value) {
        let mut builder = Request::post(uri).header("content-type", "application/json");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }
}

// --- Wallet helpers ---

pub struct Wallet {
    key: SigningKey,
    pub address: String,
}

impl Wallet {
    pub fn new(seed: u8) -> Self {
        let key = SigningKey::from_slice(&[seed; 32]).unwrap();
        let address = address_from_key(key.verifying_key());
        Self { key, address }
    }

    pub fn sign(&self, message: &str) -> String {
        let digest = personal_message_hash(message);
        let (sig, recid) = self.key.sign_prehash_recoverable(&digest).unwrap();
        let mut bytes = sig.to_bytes().to_vec();
        bytes.push(recid.to_byte() + 27);
        format!("0x{}", hex::encode(bytes))
    }

    pub fn siwe_message(&self, nonce: &str, expiration: Option<&str>) -> String {
        let mut message = format!(
            "app.fanumtax.test wants you to sign in with your Ethereum account:\n{}\n\nSign in to fanumtax.\n\nURI: https://app.fanumtax.test\nVersion: 1\nChain ID: 42161\nNonce: {nonce}\nIssued At: 2024-01-01T00:00:00Z",
            self.address
        );
        if let Some(expiration) = expiration {
            message.push_str(&format!("\nExpiration Time: {expiration}"));
        }
        message
    }
}

//! GitHub access for the marketplace: repository and issue lookups over
//! REST and GraphQL, and the OAuth flow used to link accounts.

pub mod client;
pub mod connection;
pub mod error;
pub mod exec;
pub mod metrics;
pub mod payloads;
pub mod query;
pub mod repository;

pub use client::GithubClient;
pub use connection::{
    ConnectionAdapter, ConnectionError, ConnectionUser, CreateAccessTokenRequest,
    GithubConnectionAdapter,
};
pub use error::GithubError;
pub use exec::{HttpExec, ReqwestExecutor};
pub use repository::{
    ExternalIssue, ExternalIssueDetail, ExternalRepository, GithubAdapterFactory,
    GithubRepositoryAdapter, RepositoryAdapter, RepositoryAdapterFactory, RepositoryError,
    SearchIssuesOptions, SearchRepositoriesOptions,
};

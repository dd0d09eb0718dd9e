use std::sync::Arc;

use async_trait::async_trait;
use http::header::{ACCEPT, CONTENT_TYPE, USER_AGENT};
use http::{Method, Request};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use thiserror::Error;
use tracing::{instrument, warn};
use url::Url;

use crate::client::{decode, send, GithubClient};
use crate::error::GithubError;
use crate::exec::HttpExec;
use crate::payloads::{AccessTokenResponse, AuthenticatedUser};

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("invalid authorization code")]
    InvalidCode,
    #[error("invalid access token")]
    InvalidToken,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateAccessTokenRequest {
    pub code: String,
    pub state: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionUser {
    /// Numeric platform id rendered as a string.
    pub id: String,
    pub username: String,
}

#[async_trait]
pub trait ConnectionAdapter: Send + Sync {
    async fn create_access_token(
        &self,
        request: CreateAccessTokenRequest,
    ) -> Result<SecretString, ConnectionError>;

    async fn get_current_user(
        &self,
        access_token: SecretString,
    ) -> Result<ConnectionUser, ConnectionError>;
}

#[derive(Serialize)]
struct AccessTokenBody<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    code: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    state: Option<&'a str>,
}

/// OAuth app flow against github.com plus the `/user` lookup.
pub struct GithubConnectionAdapter {
    exec: Arc<dyn HttpExec>,
    api_base: Url,
    oauth_base: Url,
    user_agent: String,
    client_id: String,
    client_secret: SecretString,
}

impl GithubConnectionAdapter {
    pub fn new(
        exec: Arc<dyn HttpExec>,
        api_base: Url,
        oauth_base: Url,
        user_agent: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: SecretString,
    ) -> Self {
        Self {
            exec,
            api_base,
            oauth_base,
            user_agent: user_agent.into(),
            client_id: client_id.into(),
            client_secret,
        }
    }

    async fn exchange_code(
        &self,
        request: &CreateAccessTokenRequest,
    ) -> Result<AccessTokenResponse, GithubError> {
        let url = self
            .oauth_base
            .join("login/oauth/access_token")
            .map_err(|err| GithubError::Transport(err.into()))?;
        let body = AccessTokenBody {
            client_id: &self.client_id,
            client_secret: self.client_secret.expose_secret(),
            code: &request.code,
            state: request.state.as_deref(),
        };
        let body = serde_json::to_vec(&body).map_err(|source| GithubError::Decode {
            endpoint: "oauth.access_token".to_string(),
            source,
        })?;
        let req = Request::builder()
            .method(Method::POST)
            .uri(url.as_str())
            .header(USER_AGENT, self.user_agent.as_str())
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .map_err(|err| GithubError::Transport(err.into()))?;
        let resp = send(self.exec.as_ref(), req, "oauth.access_token").await?;
        decode(&resp, "oauth.access_token")
    }
}

#[async_trait]
impl ConnectionAdapter for GithubConnectionAdapter {
    #[instrument(skip_all)]
    async fn create_access_token(
        &self,
        request: CreateAccessTokenRequest,
    ) -> Result<SecretString, ConnectionError> {
        let payload = match self.exchange_code(&request).await {
            Ok(payload) => payload,
            Err(err) => {
                warn!(error = %err, "github code exchange failed");
                return Err(ConnectionError::InvalidCode);
            }
        };
        if let Some(error) = payload.error {
            warn!(
                %error,
                description = payload.error_description.as_deref().unwrap_or_default(),
                "github rejected authorization code"
            );
            return Err(ConnectionError::InvalidCode);
        }
        payload
            .access_token
            .filter(|token| !token.is_empty())
            .map(SecretString::from)
            .ok_or(ConnectionError::InvalidCode)
    }

    #[instrument(skip_all)]
    async fn get_current_user(
        &self,
        access_token: SecretString,
    ) -> Result<ConnectionUser, ConnectionError> {
        let client = GithubClient::new(
            self.exec.clone(),
            self.api_base.clone(),
            self.user_agent.clone(),
            access_token,
        );
        match client.get_json::<AuthenticatedUser>(&["user"], "users.current").await {
            Ok(user) => Ok(ConnectionUser {
                id: user.id.to_string(),
                username: user.login,
            }),
            Err(err) => {
                warn!(error = %err, "github user lookup failed");
                Err(ConnectionError::InvalidToken)
            }
        }
    }
}

use std::sync::Arc;
use std::time::Instant;

use http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use http::{Method, Request, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

use crate::error::GithubError;
use crate::exec::HttpExec;
use crate::metrics::{LATENCY, REQUESTS_TOTAL};

const GITHUB_JSON: &str = "application/vnd.github+json";
const API_VERSION_HEADER: &str = "x-github-api-version";
const API_VERSION: &str = "2022-11-28";

/// Authenticated REST/GraphQL client for one access token.
#[derive(Clone)]
pub struct GithubClient {
    exec: Arc<dyn HttpExec>,
    api_base: Url,
    user_agent: String,
    token: SecretString,
}

#[derive(Serialize)]
struct GraphqlRequest<'a, V> {
    query: &'a str,
    variables: V,
}

#[derive(Deserialize)]
struct GraphqlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphqlErrorPayload>,
}

#[derive(Deserialize)]
struct GraphqlErrorPayload {
    message: String,
}

impl GithubClient {
    pub fn new(
        exec: Arc<dyn HttpExec>,
        api_base: Url,
        user_agent: impl Into<String>,
        token: SecretString,
    ) -> Self {
        Self {
            exec,
            api_base,
            user_agent: user_agent.into(),
            token,
        }
    }

    pub fn api_base(&self) -> &Url {
        &self.api_base
    }

    /// `{api_base}` followed by `segments`, each percent-encoded as a single
    /// path segment so caller-supplied names cannot add or climb segments.
    fn endpoint_url(&self, segments: &[&str]) -> Result<Url, GithubError> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|()| {
                GithubError::Transport(anyhow::anyhow!(
                    "api base {} cannot take a path",
                    self.api_base
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: &Url, body: Vec<u8>) -> Result<Request<Vec<u8>>, GithubError> {
        let mut builder = Request::builder()
            .method(method)
            .uri(url.as_str())
            .header(USER_AGENT, self.user_agent.as_str())
            .header(ACCEPT, GITHUB_JSON)
            .header(API_VERSION_HEADER, API_VERSION);
        let token = self.token.expose_secret();
        if !token.is_empty() {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        if !body.is_empty() {
            builder = builder.header(CONTENT_TYPE, "application/json");
        }
        builder
            .body(body)
            .map_err(|err| GithubError::Transport(err.into()))
    }

    /// `GET {api_base}{segments joined by /}` decoded as JSON. Non-2xx
    /// responses become [`GithubError::Status`].
    #[instrument(skip(self))]
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        endpoint: &'static str,
    ) -> Result<T, GithubError> {
        let url = self.endpoint_url(segments)?;
        let req = self.request(Method::GET, &url, Vec::new())?;
        let resp = send(self.exec.as_ref(), req, endpoint).await?;
        decode(&resp, endpoint)
    }

    /// Runs a GraphQL document against `{api_base}graphql`.
    #[instrument(skip(self, query, variables))]
    pub async fn graphql<V: Serialize, T: DeserializeOwned>(
        &self,
        query: &str,
        variables: V,
        endpoint: &'static str,
    ) -> Result<T, GithubError> {
        let url = self.endpoint_url(&["graphql"])?;
        let body = serde_json::to_vec(&GraphqlRequest { query, variables }).map_err(|source| {
            GithubError::Decode {
                endpoint: endpoint.to_string(),
                source,
            }
        })?;
        let req = self.request(Method::POST, &url, body)?;
        let resp = send(self.exec.as_ref(), req, endpoint).await?;
        let payload: GraphqlResponse<T> = decode(&resp, endpoint)?;
        if !payload.errors.is_empty() {
            return Err(GithubError::Graphql(
                payload.errors.into_iter().map(|e| e.message).collect(),
            ));
        }
        payload
            .data
            .ok_or_else(|| GithubError::Graphql(vec!["response carried no data".to_string()]))
    }
}

/// Executes `req`, records metrics under `endpoint`, and turns non-2xx
/// statuses into errors.
pub(crate) async fn send(
    exec: &dyn HttpExec,
    req: Request<Vec<u8>>,
    endpoint: &'static str,
) -> Result<Response<Vec<u8>>, GithubError> {
    let started = Instant::now();
    let result = exec.execute(req).await;
    LATENCY
        .with_label_values(&[endpoint])
        .observe(started.elapsed().as_secs_f64());

    let resp = match result {
        Ok(resp) => resp,
        Err(err) => {
            REQUESTS_TOTAL.with_label_values(&[endpoint, "error"]).inc();
            return Err(GithubError::Transport(err));
        }
    };

    let status = resp.status();
    REQUESTS_TOTAL
        .with_label_values(&[endpoint, status.as_str()])
        .inc();
    debug!(%status, "github response");

    if !status.is_success() {
        return Err(GithubError::status(status.as_u16(), endpoint));
    }
    Ok(resp)
}

pub(crate) fn decode<T: DeserializeOwned>(
    resp: &Response<Vec<u8>>,
    endpoint: &'static str,
) -> Result<T, GithubError> {
    serde_json::from_slice(resp.body()).map_err(|source| GithubError::Decode {
        endpoint: endpoint.to_string(),
        source,
    })
}

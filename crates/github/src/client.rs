//! REST client for the two endpoints the checker uses.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::Url;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument};
use tracker::{
    ApiError, CancelToken, ChannelName, CommitSha, CompareResult, GitHubApi, PrNumber,
    PullRequest, REPO_NAME, REPO_OWNER,
};

use crate::classify::classify_failure;
use crate::wire::PullRequestPayload;

/// Public GitHub REST API.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Per-request transport timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const API_VERSION: &str = "2022-11-28";
const USER_AGENT: &str = concat!("nprt/", env!("CARGO_PKG_VERSION"));

/// Errors raised while constructing a [`RestClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    /// The base URL does not parse or cannot carry a path.
    #[error("invalid GitHub API URL '{url}': {reason}")]
    InvalidBaseUrl {
        /// The rejected URL.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The token contains bytes that are not valid in an HTTP header.
    #[error("GitHub token contains characters not allowed in an HTTP header")]
    InvalidToken,

    /// The underlying HTTP client could not be built (e.g. TLS backend failure).
    #[error("failed to build HTTP client: {0}")]
    Build(#[from] reqwest::Error),
}

/// GitHub REST API client scoped to `NixOS/nixpkgs`.
///
/// Authenticates with `Authorization: token <token>` when a token is given and
/// falls back to anonymous access otherwise. Performs no retries.
#[derive(Debug, Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: Url,
    authenticated: bool,
}

impl RestClient {
    /// Creates a client for [`DEFAULT_API_URL`].
    ///
    /// A `None` or blank `token` means anonymous access.
    pub fn new(token: Option<&str>) -> Result<Self, ClientError> {
        Self::with_options(DEFAULT_API_URL, token, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Creates a client for an arbitrary API root, e.g. a local test server or
    /// a GitHub Enterprise `https://host/api/v3`.
    pub fn with_options(
        base_url: &str,
        token: Option<&str>,
        request_timeout: Duration,
    ) -> Result<Self, ClientError> {
        let base_url = parse_base_url(base_url)?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert("x-github-api-version", HeaderValue::from_static(API_VERSION));

        let token = token.map(str::trim).filter(|t| !t.is_empty());
        if let Some(token) = token {
            let mut value = HeaderValue::from_str(&format!("token {token}"))
                .map_err(|_| ClientError::InvalidToken)?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(request_timeout)
            .build()?;

        Ok(Self {
            http,
            base_url,
            authenticated: token.is_some(),
        })
    }

    /// Returns `true` if requests carry a token.
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// The API root requests are sent to.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Builds `{base}/repos/NixOS/nixpkgs/{tail...}`, percent-encoding each
    /// tail element as a single path segment.
    fn repo_endpoint(&self, tail: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|()| {
                ApiError::transport(format!("base URL {} cannot carry a path", self.base_url))
            })?;
            path.pop_if_empty()
                .extend(["repos", REPO_OWNER, REPO_NAME])
                .extend(tail);
        }
        Ok(url)
    }

    /// Issues a GET and decodes a 2xx body as `T`; classifies anything else.
    async fn get_json<T: DeserializeOwned>(&self, url: Url, subject: &str) -> Result<T, ApiError> {
        debug!(%url, "GET");
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(ApiError::transport)?;

        let status = response.status();
        debug!(status = status.as_u16(), "response received");

        if status.is_success() {
            return response.json::<T>().await.map_err(ApiError::transport);
        }

        let headers = response.headers().clone();
        // A body that fails to arrive still leaves the status to classify on.
        let body = response.text().await.unwrap_or_default();
        Err(classify_failure(status, &headers, &body, subject))
    }
}

fn parse_base_url(raw: &str) -> Result<Url, ClientError> {
    let invalid = |reason: String| ClientError::InvalidBaseUrl {
        url: raw.to_string(),
        reason,
    };

    let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(invalid("URL cannot carry a path".to_string()));
    }
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    Ok(url)
}

#[async_trait]
impl GitHubApi for RestClient {
    #[instrument(skip_all, fields(pr = %number))]
    async fn get_pull_request(
        &self,
        cancel: &CancelToken,
        number: PrNumber,
    ) -> Result<PullRequest, ApiError> {
        let url = self.repo_endpoint(&["pulls", &number.to_string()])?;
        let subject = format!("pull request #{number}");

        let payload: PullRequestPayload = cancel.guard(self.get_json(url, &subject)).await?;
        payload.into_domain()
    }

    #[instrument(skip_all, fields(commit = %commit, branch = %branch))]
    async fn compare_commit_with_branch(
        &self,
        cancel: &CancelToken,
        commit: &CommitSha,
        branch: &ChannelName,
    ) -> Result<CompareResult, ApiError> {
        // Base is the commit and head is the branch, so `behind_by` counts
        // commits the branch is missing; zero means the commit is an ancestor.
        let basehead = format!("{commit}...{branch}");
        let url = self.repo_endpoint(&["compare", &basehead])?;
        let subject = format!("comparison of {commit} with branch {branch}");

        cancel.guard(self.get_json(url, &subject)).await
    }
}

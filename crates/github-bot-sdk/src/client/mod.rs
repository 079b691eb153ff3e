//! GitHub API client for authenticated operations.
//!
//! [`GitHubClient`] talks to one or more GitHub API hosts (github.com or a
//! GitHub Enterprise server). Every call receives the API base URL explicitly
//! so that a single client can serve projects hosted on different servers.
//!
//! App-level calls are authenticated with a [`JsonWebToken`]. Installation
//! scoped calls go through an [`InstallationClient`].

mod installation;
mod pull_request;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::auth::{GitHubApiClient, InstallationId, InstallationToken, JsonWebToken};
use crate::error::ApiError;

pub use installation::InstallationClient;
pub use pull_request::{PullRequest, PullRequestBranch, PullRequestRepo, PullRequestUser};

/// Default public GitHub API endpoint.
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

const GITHUB_ACCEPT: &str = "application/vnd.github+json";
const GITHUB_API_VERSION: &str = "2022-11-28";

/// Configuration for the GitHub API client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Sent as the `User-Agent` header; GitHub rejects requests without one.
    pub user_agent: String,
    /// Upper bound for each request, connection set-up included.
    pub timeout: Duration,
    /// API base used when a caller has no project specific override.
    pub github_api_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("trigger-gateway/{}", env!("CARGO_PKG_VERSION")),
            timeout: Duration::from_secs(10),
            github_api_url: DEFAULT_GITHUB_API_URL.to_string(),
        }
    }
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
        }
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn github_api_url(mut self, url: impl Into<String>) -> Self {
        self.config.github_api_url = url.into();
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}

impl Default for ClientConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Response body of `POST /app/installations/{id}/access_tokens`.
#[derive(Debug, Deserialize)]
struct AccessTokenResponse {
    token: String,
    expires_at: DateTime<Utc>,
}

/// GitHub REST client.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http_client: reqwest::Client,
    config: ClientConfig,
}

impl GitHubClient {
    /// Build a client whose requests are bounded by `config.timeout`.
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let http_client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            http_client,
            config,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub(crate) fn http_client(&self) -> &reqwest::Client {
        &self.http_client
    }

    /// Create an installation-scoped client for `token`.
    pub fn installation(&self, api_url: &str, token: InstallationToken) -> InstallationClient {
        InstallationClient::new(self.clone(), api_url, token)
    }

    /// Resolve the API base, falling back to the configured default.
    pub(crate) fn base_url<'a>(&'a self, api_url: &'a str) -> &'a str {
        let url = if api_url.trim().is_empty() {
            self.config.github_api_url.as_str()
        } else {
            api_url
        };
        url.trim_end_matches('/')
    }
}

/// Turn a non-success response into an [`ApiError`], otherwise decode it.
pub(crate) async fn decode_response<T>(response: reqwest::Response) -> Result<T, ApiError>
where
    T: serde::de::DeserializeOwned,
{
    let status = response.status();
    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read error body".to_string());
        return Err(ApiError::from_status(status.as_u16(), error_text));
    }

    let bytes = response.bytes().await.map_err(ApiError::from_transport)?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[async_trait]
impl GitHubApiClient for GitHubClient {
    #[instrument(skip(self, jwt), fields(installation_id = %installation_id))]
    async fn create_installation_access_token(
        &self,
        api_url: &str,
        installation_id: InstallationId,
        jwt: &JsonWebToken,
    ) -> Result<InstallationToken, ApiError> {
        let url = format!(
            "{}/app/installations/{}/access_tokens",
            self.base_url(api_url),
            installation_id.as_u64()
        );

        let response = self
            .http_client
            .post(&url)
            .header("Authorization", format!("Bearer {}", jwt.token()))
            .header("Accept", GITHUB_ACCEPT)
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
            .send()
            .await
            .map_err(ApiError::from_transport)?;

        let body: AccessTokenResponse = decode_response(response).await?;
        debug!(expires_at = %body.expires_at, "Installation access token created");

        Ok(InstallationToken::new(
            body.token,
            installation_id,
            body.expires_at,
        ))
    }

    async fn get_pull_request(
        &self,
        api_url: &str,
        token: &InstallationToken,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<PullRequest, ApiError> {
        self.installation(api_url, token.clone())
            .get_pull_request(owner, repo, number)
            .await
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;

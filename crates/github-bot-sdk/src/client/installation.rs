//! Installation-scoped access to GitHub API operations.
//!
//! An `InstallationClient` is bound to one installation token and sends it
//! with the `token` authorization scheme.

use crate::auth::{InstallationId, InstallationToken};
use crate::client::{GitHubClient, GITHUB_ACCEPT, GITHUB_API_VERSION};
use crate::error::ApiError;

#[cfg(test)]
#[path = "installation_tests.rs"]
mod tests;

/// Installation-scoped GitHub API client.
#[derive(Debug, Clone)]
pub struct InstallationClient {
    client: GitHubClient,
    api_url: String,
    token: InstallationToken,
}

impl InstallationClient {
    pub fn new(client: GitHubClient, api_url: &str, token: InstallationToken) -> Self {
        let api_url = client.base_url(api_url).to_string();
        Self {
            client,
            api_url,
            token,
        }
    }

    pub fn installation_id(&self) -> InstallationId {
        self.token.installation_id()
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Issue an authenticated GET for `path` (relative to the API base).
    pub async fn get(&self, path: &str) -> Result<reqwest::Response, ApiError> {
        let url = format!("{}/{}", self.api_url, path.trim_start_matches('/'));

        self.client
            .http_client()
            .get(&url)
            .header("Authorization", format!("token {}", self.token.token()))
            .header("Accept", GITHUB_ACCEPT)
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
            .send()
            .await
            .map_err(ApiError::from_transport)
    }
}

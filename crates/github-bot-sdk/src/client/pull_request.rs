//! Pull request lookup for GitHub API.
//!
//! Only the fields needed to pin a build to a pull request head are required;
//! everything else is optional so that payloads from older GitHub Enterprise
//! servers still deserialize.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::client::{decode_response, InstallationClient};
use crate::error::ApiError;

/// A pull request as returned by `GET /repos/{owner}/{repo}/pulls/{number}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequest {
    #[serde(default)]
    pub id: u64,

    pub number: u64,

    #[serde(default)]
    pub title: String,

    /// "open" or "closed"
    #[serde(default)]
    pub state: String,

    /// API URL of the pull request.
    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub html_url: String,

    #[serde(default)]
    pub user: Option<PullRequestUser>,

    pub head: PullRequestBranch,

    #[serde(default)]
    pub base: Option<PullRequestBranch>,
}

impl PullRequest {
    /// Git ref under which GitHub publishes the head of this pull request.
    pub fn head_ref_path(&self) -> String {
        format!("refs/pull/{}/head", self.number)
    }
}

/// One side (head or base) of a pull request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequestBranch {
    /// Branch name
    #[serde(rename = "ref")]
    pub branch_ref: String,

    /// Commit SHA at the tip of the branch
    pub sha: String,

    /// The repository may be null when a fork was deleted.
    #[serde(default)]
    pub repo: Option<PullRequestRepo>,
}

/// Repository referenced by a pull request branch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequestRepo {
    pub id: u64,
    pub name: String,
    pub full_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequestUser {
    pub login: String,
    pub id: u64,
}

impl InstallationClient {
    /// Fetch a single pull request.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` when the pull request does not exist or
    /// is not visible to the installation.
    #[instrument(skip(self), fields(installation_id = %self.installation_id()))]
    pub async fn get_pull_request(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<PullRequest, ApiError> {
        let path = format!("repos/{}/{}/pulls/{}", owner, repo, number);
        let response = self.get(&path).await?;
        decode_response(response).await
    }
}

#[cfg(test)]
#[path = "pull_request_tests.rs"]
mod tests;

//! Pull request enrichment for comment events.
//!
//! An installation token is minted for the delivery's installation and used
//! once, to fetch the pull request the comment belongs to. The resulting
//! revision pins the build to the pull request head.

use chrono::{DateTime, Utc};
use github_bot_sdk::{AuthenticationProvider, GitHubApiClient, InstallationId};
use std::time::Duration;
use tracing::{debug, instrument};

use crate::build::{BuildPayload, Revision};
use crate::remote;
use crate::webhook::events::IssueCommentEvent;
use crate::GatewayError;

/// Context added to a comment event from its pull request.
#[derive(Clone)]
pub(crate) struct PullRequestContext {
    pub revision: Revision,
    pub token: String,
    pub token_expires: DateTime<Utc>,
    pub owner: String,
    pub repo: String,
    pub pull: u64,
    pub pull_url: String,
}

impl PullRequestContext {
    pub fn apply(&self, payload: &mut BuildPayload) {
        payload.token = Some(self.token.clone());
        payload.token_expires = Some(self.token_expires);
        payload.commit = self.revision.commit.clone();
        payload.branch = self.revision.git_ref.clone();
        payload.owner = Some(self.owner.clone());
        payload.repo = Some(self.repo.clone());
        payload.pull = Some(self.pull.to_string());
        payload.pull_url = Some(self.pull_url.clone());
    }
}

/// Look up the pull request behind `event`.
///
/// # Errors
///
/// - `GatewayError::TokenExchange` when the App or installation id is
///   missing or the exchange fails
/// - `GatewayError::NotFound` when the pull request does not exist
/// - `GatewayError::RemoteApi` for any other GitHub failure
#[instrument(skip(auth, github, event), fields(repository = %event.repository.full_name, pull = event.issue.number))]
pub(crate) async fn pull_request_context(
    auth: &dyn AuthenticationProvider,
    github: &dyn GitHubApiClient,
    api_url: &str,
    installation_id: Option<InstallationId>,
    event: &IssueCommentEvent,
    budget: Duration,
) -> Result<PullRequestContext, GatewayError> {
    let (owner, repo) = event.repository.owner_and_name()?;
    let number = event.issue.number;

    let token = remote::installation_token(auth, api_url, installation_id, budget).await?;
    let pull_request =
        remote::pull_request(github, api_url, &token, owner, repo, number, budget).await?;

    debug!(head_sha = %pull_request.head.sha, "Resolved pull request head");

    let pull_url = if pull_request.url.is_empty() {
        format!(
            "{}/repos/{}/{}/pulls/{}",
            api_url.trim_end_matches('/'),
            owner,
            repo,
            number
        )
    } else {
        pull_request.url.clone()
    };

    Ok(PullRequestContext {
        revision: Revision {
            commit: Some(pull_request.head.sha.clone()),
            git_ref: Some(pull_request.head_ref_path()),
        },
        token: token.token().to_string(),
        token_expires: token.expires_at(),
        owner: owner.to_string(),
        repo: repo.to_string(),
        pull: pull_request.number,
        pull_url,
    })
}

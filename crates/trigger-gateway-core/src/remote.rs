//! Time-bounded calls to GitHub.
//!
//! Each call gets its own budget and is never retried; failures are mapped
//! onto [`GatewayError`] and returned to the caller.

use std::time::Duration;

use github_bot_sdk::client::PullRequest;
use github_bot_sdk::{
    ApiError, AuthError, AuthenticationProvider, GitHubApiClient, InstallationId,
    InstallationToken,
};
use tokio::time::timeout;

use crate::GatewayError;

/// Obtain a fresh installation token within `budget`.
///
/// Every failure, the timeout included, is reported as a token exchange
/// failure.
pub(crate) async fn installation_token(
    auth: &dyn AuthenticationProvider,
    api_url: &str,
    installation_id: Option<InstallationId>,
    budget: Duration,
) -> Result<InstallationToken, GatewayError> {
    match timeout(budget, auth.installation_token(api_url, installation_id)).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(GatewayError::TokenExchange(
            AuthError::TokenExchangeFailed(ApiError::Timeout),
        )),
    }
}

/// Fetch a pull request within `budget`.
pub(crate) async fn pull_request(
    github: &dyn GitHubApiClient,
    api_url: &str,
    token: &InstallationToken,
    owner: &str,
    repo: &str,
    number: u64,
    budget: Duration,
) -> Result<PullRequest, GatewayError> {
    let fetch = github.get_pull_request(api_url, token, owner, repo, number);
    match timeout(budget, fetch).await {
        Ok(Ok(pull_request)) => Ok(pull_request),
        Ok(Err(ApiError::NotFound)) => Err(GatewayError::NotFound {
            what: format!("pull request {}/{}#{}", owner, repo, number),
        }),
        Ok(Err(e)) => Err(GatewayError::remote("fetching pull request", e)),
        Err(_) => Err(GatewayError::remote(
            "fetching pull request",
            ApiError::Timeout,
        )),
    }
}

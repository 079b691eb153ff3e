//! Fakes shared by the unit tests.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use github_bot_sdk::client::PullRequest;
use github_bot_sdk::{
    ApiError, AuthError, AuthenticationProvider, GitHubApiClient, InstallationId,
    InstallationToken, JsonWebToken,
};
use serde_json::json;
use std::sync::Mutex;

pub const HEAD_SHA: &str = "6dcb09b5b57875f334f61aebed695e2e4193db5e";

/// Hands out tokens and records every request.
#[derive(Default)]
pub struct FakeAuth {
    pub requests: Mutex<Vec<(String, Option<InstallationId>)>>,
    pub fail: bool,
}

impl FakeAuth {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl AuthenticationProvider for FakeAuth {
    async fn installation_token(
        &self,
        api_url: &str,
        installation_id: Option<InstallationId>,
    ) -> Result<InstallationToken, AuthError> {
        self.requests
            .lock()
            .unwrap()
            .push((api_url.to_string(), installation_id));

        let installation_id = installation_id.ok_or(AuthError::MissingInstallationId)?;
        if self.fail {
            return Err(AuthError::TokenExchangeFailed(ApiError::HttpError {
                status: 502,
                message: "bad gateway".to_string(),
            }));
        }

        Ok(InstallationToken::new(
            format!("ghs_{}", installation_id),
            installation_id,
            Utc::now() + Duration::hours(1),
        ))
    }
}

/// Serves one canned pull request lookup result and records requests.
pub struct FakeGitHub {
    pub lookups: Mutex<Vec<(String, String, u64)>>,
    pub status: Option<u16>,
}

impl FakeGitHub {
    pub fn new() -> Self {
        Self {
            lookups: Mutex::new(Vec::new()),
            status: None,
        }
    }

    pub fn failing(status: u16) -> Self {
        Self {
            lookups: Mutex::new(Vec::new()),
            status: Some(status),
        }
    }

    pub fn lookup_count(&self) -> usize {
        self.lookups.lock().unwrap().len()
    }
}

#[async_trait]
impl GitHubApiClient for FakeGitHub {
    async fn create_installation_access_token(
        &self,
        _api_url: &str,
        _installation_id: InstallationId,
        _jwt: &JsonWebToken,
    ) -> Result<InstallationToken, ApiError> {
        Err(ApiError::AuthorizationFailed)
    }

    async fn get_pull_request(
        &self,
        api_url: &str,
        _token: &InstallationToken,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<PullRequest, ApiError> {
        self.lookups
            .lock()
            .unwrap()
            .push((api_url.to_string(), format!("{}/{}", owner, repo), number));

        if let Some(status) = self.status {
            return Err(ApiError::from_status(status, "canned failure".to_string()));
        }

        Ok(serde_json::from_value(json!({
            "id": 1,
            "number": number,
            "url": format!("{}/repos/{}/{}/pulls/{}", api_url, owner, repo, number),
            "html_url": format!("https://github.com/{}/{}/pull/{}", owner, repo, number),
            "state": "open",
            "head": { "ref": "feature", "sha": HEAD_SHA }
        }))?)
    }
}

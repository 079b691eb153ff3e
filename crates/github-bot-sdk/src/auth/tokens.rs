//! Installation token exchange for the gateway's GitHub App.
//!
//! [`AppAuthenticator`] mints a fresh App assertion for every request and
//! trades it for an installation token. Nothing is cached: one enrichment,
//! one assertion, one exchange.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use super::jwt::{JwtGenerator, RS256JwtGenerator};
use super::{
    AppCredential, AuthenticationProvider, GitHubApiClient, GitHubAppId, InstallationId,
    InstallationToken, JsonWebToken,
};
use crate::error::{ApiError, AuthError};

/// GitHub App authenticator.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use github_bot_sdk::auth::{AppAuthenticator, AppCredential, AuthenticationProvider, InstallationId};
/// use github_bot_sdk::client::{ClientConfig, GitHubClient};
///
/// # async fn example(credential: AppCredential) -> Result<(), Box<dyn std::error::Error>> {
/// let client = Arc::new(GitHubClient::new(ClientConfig::default())?);
/// let auth = AppAuthenticator::new(Some(&credential), client)?;
/// let token = auth
///     .installation_token("https://api.github.com", Some(InstallationId::new(42)))
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct AppAuthenticator<A>
where
    A: GitHubApiClient,
{
    signer: Option<(GitHubAppId, RS256JwtGenerator)>,
    api_client: Arc<A>,
}

impl<A> AppAuthenticator<A>
where
    A: GitHubApiClient,
{
    /// Create an authenticator.
    ///
    /// Passing no credential is allowed; every token request then fails with
    /// [`AuthError::MissingAppId`].
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidPrivateKey` if the credential's key cannot
    /// sign RS256 assertions.
    pub fn new(credential: Option<&AppCredential>, api_client: Arc<A>) -> Result<Self, AuthError> {
        let signer = match credential {
            Some(credential) => Some((
                credential.app_id,
                RS256JwtGenerator::new(&credential.private_key)?,
            )),
            None => None,
        };

        Ok(Self { signer, api_client })
    }

    /// The configured App id, if any.
    pub fn app_id(&self) -> Option<GitHubAppId> {
        self.signer.as_ref().map(|(app_id, _)| *app_id)
    }

    /// Mint a short-lived App assertion.
    pub fn mint_assertion(&self) -> Result<JsonWebToken, AuthError> {
        let (app_id, generator) = self.signer.as_ref().ok_or(AuthError::MissingAppId)?;
        if app_id.as_u64() == 0 {
            return Err(AuthError::MissingAppId);
        }
        generator.generate_jwt(*app_id)
    }

    /// Exchange an assertion for a token scoped to `installation_id`.
    pub async fn exchange_installation_token(
        &self,
        api_url: &str,
        assertion: &JsonWebToken,
        installation_id: InstallationId,
    ) -> Result<InstallationToken, AuthError> {
        if installation_id.as_u64() == 0 {
            return Err(AuthError::MissingInstallationId);
        }

        self.api_client
            .create_installation_access_token(api_url, installation_id, assertion)
            .await
            .map_err(|e| match e {
                ApiError::NotFound => AuthError::InstallationNotFound { installation_id },
                other => AuthError::TokenExchangeFailed(other),
            })
    }
}

#[async_trait]
impl<A> AuthenticationProvider for AppAuthenticator<A>
where
    A: GitHubApiClient,
{
    #[instrument(skip(self), fields(app_id = ?self.app_id()))]
    async fn installation_token(
        &self,
        api_url: &str,
        installation_id: Option<InstallationId>,
    ) -> Result<InstallationToken, AuthError> {
        // Both ids must be present before anything is signed.
        if self.app_id().map_or(true, |id| id.as_u64() == 0) {
            return Err(AuthError::MissingAppId);
        }
        let installation_id = installation_id
            .filter(|id| id.as_u64() != 0)
            .ok_or(AuthError::MissingInstallationId)?;

        let assertion = self.mint_assertion()?;
        let result = self
            .exchange_installation_token(api_url, &assertion, installation_id)
            .await;

        match &result {
            Ok(token) => debug!(
                installation_id = %installation_id,
                expires_at = %token.expires_at(),
                "Obtained installation token"
            ),
            Err(e) => warn!(
                installation_id = %installation_id,
                error = %e,
                "Installation token exchange failed"
            ),
        }

        result
    }
}

impl<A> std::fmt::Debug for AppAuthenticator<A>
where
    A: GitHubApiClient,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppAuthenticator")
            .field("app_id", &self.app_id())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "tokens_tests.rs"]
mod tests;

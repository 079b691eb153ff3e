//! GitHub App authentication types and interfaces.
//!
//! This module provides core authentication types for GitHub Apps including:
//! - ID types (GitHubAppId, InstallationId)
//! - Token types (JsonWebToken, InstallationToken)
//! - Key material (PrivateKey, AppCredential)
//! - Authentication trait interfaces
//!
//! Installation tokens are minted on demand and never cached. Every caller
//! that needs one gets a fresh exchange.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use zeroize::Zeroizing;

use crate::client::PullRequest;
use crate::error::{ApiError, AuthError, ValidationError};

pub mod jwt;
pub mod tokens;

pub use jwt::{JwtGenerator, RS256JwtGenerator};
pub use tokens::AppAuthenticator;

// ============================================================================
// Core ID Types
// ============================================================================

/// GitHub App identifier assigned during app registration.
///
/// A value of zero is never a valid App id; use [`GitHubAppId::non_zero`] when
/// reading ids from configuration where zero means "not configured".
///
/// # Examples
///
/// ```
/// use github_bot_sdk::auth::GitHubAppId;
///
/// let app_id = GitHubAppId::new(123456);
/// assert_eq!(app_id.as_u64(), 123456);
/// assert_eq!(app_id.to_string(), "123456");
/// assert!(GitHubAppId::non_zero(0).is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GitHubAppId(u64);

impl GitHubAppId {
    /// Create a new GitHub App ID.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Create an App ID, treating zero as absent.
    pub fn non_zero(id: u64) -> Option<Self> {
        (id != 0).then_some(Self(id))
    }

    /// Get the raw u64 value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for GitHubAppId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for GitHubAppId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = s
            .trim()
            .parse::<u64>()
            .map_err(|_| ValidationError::InvalidFormat {
                field: "github_app_id".to_string(),
                message: "must be a positive integer".to_string(),
            })?;
        Ok(Self::new(id))
    }
}

/// GitHub App installation identifier for specific accounts.
///
/// When a GitHub App is installed on an organization or user account, GitHub
/// assigns an installation ID. Webhook deliveries and annotated resources carry
/// it so that an installation-scoped token can be requested.
///
/// # Examples
///
/// ```
/// use github_bot_sdk::auth::InstallationId;
///
/// let installation = InstallationId::new(98765);
/// assert_eq!(installation.as_u64(), 98765);
/// assert_eq!("98765".parse::<InstallationId>().unwrap(), installation);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstallationId(u64);

impl InstallationId {
    /// Create a new installation ID.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Create an installation ID, treating zero as absent.
    pub fn non_zero(id: u64) -> Option<Self> {
        (id != 0).then_some(Self(id))
    }

    /// Get the raw u64 value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for InstallationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for InstallationId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = s
            .trim()
            .parse::<u64>()
            .map_err(|_| ValidationError::InvalidFormat {
                field: "installation_id".to_string(),
                message: "must be a positive integer".to_string(),
            })?;
        Ok(Self::new(id))
    }
}

// ============================================================================
// Token Types
// ============================================================================

/// Signed App assertion (a JWT) used to authenticate as the GitHub App.
///
/// Assertions have a maximum lifetime of 10 minutes and are only ever sent to
/// the installation token exchange endpoint.
///
/// The token string is never exposed in Debug output.
#[derive(Clone)]
pub struct JsonWebToken {
    token: String,
    app_id: GitHubAppId,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl JsonWebToken {
    /// Create a new JWT token.
    ///
    /// # Arguments
    ///
    /// * `token` - The encoded JWT string
    /// * `app_id` - The GitHub App ID this token represents
    /// * `issued_at` - The `iat` claim of the token
    /// * `expires_at` - The `exp` claim of the token
    pub fn new(
        token: String,
        app_id: GitHubAppId,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            token,
            app_id,
            issued_at,
            expires_at,
        }
    }

    /// Get the token string for use as `Authorization: Bearer <token>`.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Get the GitHub App ID this token represents.
    pub fn app_id(&self) -> GitHubAppId {
        self.app_id
    }

    /// Get when this token was issued.
    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    /// Get when this token expires.
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Check if the token is currently expired.
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

impl std::fmt::Debug for JsonWebToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonWebToken")
            .field("app_id", &self.app_id)
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .field("token", &"<REDACTED>")
            .finish()
    }
}

/// Installation-scoped access token for GitHub API operations.
///
/// Installation tokens give access to one installation's repositories and
/// expire after roughly an hour. A token belongs to the single operation that
/// requested it and is never reused.
///
/// The token string is never exposed in Debug output.
///
/// # Examples
///
/// ```
/// use github_bot_sdk::auth::{InstallationToken, InstallationId};
/// use chrono::{Utc, Duration};
///
/// let token = InstallationToken::new(
///     "ghs_token".to_string(),
///     InstallationId::new(456),
///     Utc::now() + Duration::hours(1),
/// );
///
/// assert_eq!(token.installation_id(), InstallationId::new(456));
/// assert!(!token.is_expired());
/// ```
#[derive(Clone)]
pub struct InstallationToken {
    token: String,
    installation_id: InstallationId,
    expires_at: DateTime<Utc>,
}

impl InstallationToken {
    /// Create a new installation token.
    pub fn new(token: String, installation_id: InstallationId, expires_at: DateTime<Utc>) -> Self {
        Self {
            token,
            installation_id,
            expires_at,
        }
    }

    /// Get the token string.
    ///
    /// Installation tokens are sent as `Authorization: token <token>`.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Get the installation this token is scoped to.
    pub fn installation_id(&self) -> InstallationId {
        self.installation_id
    }

    /// Get when this token expires.
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Check if the token is currently expired.
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// Check if the token will expire within the given margin.
    pub fn expires_soon(&self, margin: Duration) -> bool {
        Utc::now() + margin >= self.expires_at
    }
}

impl std::fmt::Debug for InstallationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstallationToken")
            .field("installation_id", &self.installation_id)
            .field("expires_at", &self.expires_at)
            .field("token", &"<REDACTED>")
            .finish()
    }
}

// ============================================================================
// Key Material
// ============================================================================

/// Private key for JWT signing.
///
/// Holds PEM encoded RSA key material. The bytes are wiped on drop and never
/// exposed in Debug output.
#[derive(Clone)]
pub struct PrivateKey {
    key_data: Zeroizing<Vec<u8>>,
}

impl PrivateKey {
    /// Get the PEM bytes.
    pub fn key_data(&self) -> &[u8] {
        &self.key_data
    }
}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivateKey")
            .field("key_data", &"<REDACTED>")
            .finish()
    }
}

/// The gateway's App identity: its id plus the key used to sign assertions.
///
/// Loaded once at start-up and shared read-only.
#[derive(Debug, Clone)]
pub struct AppCredential {
    pub app_id: GitHubAppId,
    pub private_key: PrivateKey,
}

impl AppCredential {
    pub fn new(app_id: GitHubAppId, private_key: PrivateKey) -> Self {
        Self {
            app_id,
            private_key,
        }
    }
}

/// JWT claims structure for GitHub App authentication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Issuer (GitHub App ID)
    pub iss: GitHubAppId,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp, max 10 minutes from iat)
    pub exp: i64,
}

// ============================================================================
// Trait Definitions
// ============================================================================

/// Obtains installation-scoped tokens for the gateway's App.
#[async_trait::async_trait]
pub trait AuthenticationProvider: Send + Sync {
    /// Mint a fresh assertion and exchange it for an installation token.
    ///
    /// # Arguments
    ///
    /// * `api_url` - Base URL of the GitHub API serving the installation
    /// * `installation_id` - The installation to scope the token to
    ///
    /// # Errors
    ///
    /// Fails when the App id or the installation id is absent, or when the
    /// exchange itself fails.
    async fn installation_token(
        &self,
        api_url: &str,
        installation_id: Option<InstallationId>,
    ) -> Result<InstallationToken, AuthError>;
}

/// Interface for the GitHub REST operations the gateway depends on.
#[async_trait::async_trait]
pub trait GitHubApiClient: Send + Sync {
    /// Create installation access token via GitHub API.
    async fn create_installation_access_token(
        &self,
        api_url: &str,
        installation_id: InstallationId,
        jwt: &JsonWebToken,
    ) -> Result<InstallationToken, ApiError>;

    /// Fetch one pull request using an installation token.
    async fn get_pull_request(
        &self,
        api_url: &str,
        token: &InstallationToken,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<PullRequest, ApiError>;
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;

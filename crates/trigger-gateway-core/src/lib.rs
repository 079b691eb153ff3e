//! # Trigger Gateway Core
//!
//! Event authentication and translation logic for the trigger gateway.
//!
//! Two independent change streams are turned into normalized [`BuildTrigger`]
//! records for a downstream build store:
//! - GitHub webhook deliveries, handled by [`WebhookEventClassifier`]
//! - Reconciled custom resources, handled by [`ResourceStateTranslator`]
//!
//! ## Architecture
//!
//! - Business logic depends only on trait abstractions ([`ProjectStore`],
//!   [`BuildRecorder`], and the GitHub traits from `github-bot-sdk`)
//! - One immutable [`GatewayConfig`] is built at start-up and shared by `Arc`
//! - Every delivery and reconciliation is an independent unit of work; there
//!   is no shared mutable state and no token cache
//!
//! ## Usage
//!
//! ```rust
//! use trigger_gateway_core::{BuildId, EmissionFilter, ProjectId};
//!
//! let build_id = BuildId::new();
//! let project_id = ProjectId::from_name("octo/repo");
//! assert!(project_id.as_str().starts_with("brigade-"));
//!
//! let filter = EmissionFilter::new(["issue_comment"]);
//! assert!(filter.should_emit("issue_comment:created"));
//! ```

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

use github_bot_sdk::{ApiError, AuthError};

pub use ulid::Ulid;

/// Standard result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

// ============================================================================
// Domain Identifier Types
// ============================================================================

/// Unique identifier for a build trigger
///
/// Uses ULID so that stored builds sort by creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BuildId(Ulid);

impl BuildId {
    /// Generate a new unique build ID
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    /// Get string representation of build ID
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for BuildId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BuildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BuildId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ulid = s.parse::<Ulid>().map_err(|_| ParseError::InvalidFormat {
            expected: "ULID format".to_string(),
            actual: s.to_string(),
        })?;
        Ok(Self(ulid))
    }
}

/// Identifier the build store files builds under.
///
/// Derived deterministically from the project name: `brigade-` followed by the
/// first 54 hex characters of the SHA-256 of the name. Names that already
/// carry the prefix are taken as ids verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectId(String);

impl ProjectId {
    const PREFIX: &'static str = "brigade-";
    const HASH_LEN: usize = 54;

    /// Derive the project id for a project name.
    pub fn from_name(name: &str) -> Self {
        if name.starts_with(Self::PREFIX) {
            return Self(name.to_string());
        }

        let digest = hex::encode(Sha256::digest(name.as_bytes()));
        Self(format!("{}{}", Self::PREFIX, &digest[..Self::HASH_LEN]))
    }

    /// Get string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Error categories for monitoring and status mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Temporary failures that may succeed on retry
    Transient,
    /// Permanent failures caused by the input
    Permanent,
    /// Forged or unauthenticated requests
    Security,
    /// Deployment misconfiguration
    Configuration,
}

/// Parsing errors for deliveries, annotations and identifiers
#[derive(Debug, Clone, thiserror::Error)]
pub enum ParseError {
    #[error("Invalid format: expected {expected}, got '{actual}'")]
    InvalidFormat { expected: String, actual: String },

    #[error("Malformed body: {message}")]
    MalformedBody { message: String },

    #[error("Field '{field}' is required")]
    MissingField { field: String },

    #[error("Resource kind '{actual}' does not match mapping kind '{expected}'")]
    UnexpectedKind { expected: String, actual: String },
}

impl From<serde_json::Error> for ParseError {
    fn from(e: serde_json::Error) -> Self {
        Self::MalformedBody {
            message: e.to_string(),
        }
    }
}

/// Top-level gateway error
///
/// Transports map each variant to a response: see `error_category` for the
/// classification they build on.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Deployment misconfiguration, for example no resolvable webhook secret.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The request could not be authenticated (bad or missing signature).
    #[error("Authentication failed: {message}")]
    Auth { message: String },

    /// Minting or exchanging an installation token failed.
    #[error("Installation authentication failed: {0}")]
    TokenExchange(#[from] AuthError),

    /// A referenced project or pull request does not exist.
    #[error("{what} not found")]
    NotFound { what: String },

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// GitHub API failure other than authentication, with context.
    #[error("Remote API error while {context}: {source}")]
    RemoteApi {
        context: String,
        #[source]
        source: ApiError,
    },

    /// The build store failed.
    #[error("Build store error: {0}")]
    Store(#[from] StoreError),
}

impl GatewayError {
    /// Check if error is transient and should be retried
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Config { .. } => false,
            Self::Auth { .. } => false,
            Self::TokenExchange(e) => e.is_transient(),
            Self::NotFound { .. } => false,
            Self::Parse(_) => false,
            Self::RemoteApi { source, .. } => source.is_transient(),
            Self::Store(e) => e.is_transient(),
        }
    }

    /// Get error category for monitoring and alerting
    pub fn error_category(&self) -> ErrorCategory {
        match self {
            Self::Config { .. } => ErrorCategory::Configuration,
            Self::Auth { .. } => ErrorCategory::Security,
            Self::TokenExchange(_) => ErrorCategory::Security,
            Self::NotFound { .. } => ErrorCategory::Permanent,
            Self::Parse(_) => ErrorCategory::Permanent,
            Self::RemoteApi { .. } => ErrorCategory::Transient,
            Self::Store(_) => ErrorCategory::Transient,
        }
    }

    pub(crate) fn remote(context: impl Into<String>, source: ApiError) -> Self {
        Self::RemoteApi {
            context: context.into(),
            source,
        }
    }
}

// ============================================================================
// Module declarations
// ============================================================================

/// Static gateway configuration and resource mappings
pub mod config;

/// Project records and webhook secrets
pub mod project;

/// Build trigger, revision and payload types
pub mod build;

/// Contracts for the external project and build stores
pub mod store;

/// Webhook signature verification against project or default secrets
pub mod signature;

/// Which trigger names are forwarded
pub mod emission;

mod remote;

/// Webhook classification and enrichment
pub mod webhook;

/// Custom resource state translation
pub mod resource;

/// Store implementations
pub mod adapters;

pub use build::{BuildPayload, BuildTrigger, Revision, GITHUB_PROVIDER, RESOURCE_PROVIDER};
pub use config::{ConfigError, GatewayConfig, ProjectConfig, ResourceMapping};
pub use emission::EmissionFilter;
pub use project::{GitHubEndpoint, Project, SharedSecret};
pub use resource::{
    Reconciled, ResourceAction, ResourceSnapshot, ResourceState, ResourceStateTranslator,
};
pub use store::{BuildRecorder, ProjectStore, StoreError};
pub use webhook::{EventKind, WebhookDelivery, WebhookEventClassifier, WebhookOutcome};

#[cfg(test)]
mod test_support;

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

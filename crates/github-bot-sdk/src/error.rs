//! Error types for GitHub Bot SDK operations.
//!
//! Each error carries a transience classification so callers can decide how to
//! surface the failure. The SDK itself never retries.

use thiserror::Error;

use crate::auth::InstallationId;

/// Authentication-related errors.
///
/// Covers missing identifiers, unusable keys, assertion signing and the
/// installation token exchange.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No GitHub App id is configured, or it is zero.
    #[error("GitHub App id is not configured")]
    MissingAppId,

    /// No installation id was supplied, or it is zero.
    #[error("Installation id is missing or zero")]
    MissingInstallationId,

    /// Invalid private key format or data.
    #[error("Invalid private key: {message}")]
    InvalidPrivateKey { message: String },

    /// JWT generation failed.
    #[error("JWT generation failed: {message}")]
    JwtGenerationFailed { message: String },

    /// Installation not found or access denied.
    #[error("Installation {installation_id} not found or access denied")]
    InstallationNotFound { installation_id: InstallationId },

    /// The token exchange endpoint rejected the request or could not be reached.
    #[error("Installation token exchange failed: {0}")]
    TokenExchangeFailed(#[from] ApiError),
}

impl AuthError {
    /// Check if this error represents a transient condition that may succeed if retried.
    ///
    /// Only exchange failures caused by server errors, rate limiting or
    /// transport problems are transient. Configuration problems never are.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::MissingAppId => false,
            Self::MissingInstallationId => false,
            Self::InvalidPrivateKey { .. } => false,
            Self::JwtGenerationFailed { .. } => false,
            Self::InstallationNotFound { .. } => false,
            Self::TokenExchangeFailed(e) => e.is_transient(),
        }
    }
}

/// Errors during GitHub API operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP error response from GitHub API.
    #[error("HTTP error: {status} - {message}")]
    HttpError { status: u16, message: String },

    /// Request to GitHub API timed out.
    #[error("Request timeout")]
    Timeout,

    /// Authentication to GitHub API failed.
    #[error("Authentication failed")]
    AuthenticationFailed,

    /// Authorization check failed (insufficient permissions).
    #[error("Authorization failed")]
    AuthorizationFailed,

    /// The requested resource was not found.
    #[error("Resource not found")]
    NotFound,

    /// Failed to parse JSON response from GitHub API.
    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// HTTP client error (network, TLS, etc.).
    #[error("HTTP client error: {0}")]
    HttpClientError(#[from] reqwest::Error),
}

impl ApiError {
    /// Map a non-success status and its body text to an error.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 => Self::AuthenticationFailed,
            403 => Self::AuthorizationFailed,
            404 => Self::NotFound,
            _ => Self::HttpError { status, message },
        }
    }

    /// Map a transport failure, keeping timeouts distinct.
    pub fn from_transport(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else {
            Self::HttpClientError(error)
        }
    }

    /// Check if this error represents a transient condition that may succeed if retried.
    ///
    /// Transient conditions include:
    /// - Server errors (5xx)
    /// - Rate limiting (429)
    /// - Request timeouts
    /// - Network/transport errors
    pub fn is_transient(&self) -> bool {
        match self {
            Self::HttpError { status, .. } => *status >= 500 || *status == 429,
            Self::Timeout => true,
            Self::AuthenticationFailed => false,
            Self::AuthorizationFailed => false,
            Self::NotFound => false,
            Self::JsonError(_) => false,
            Self::HttpClientError(_) => true,
        }
    }
}

/// Input validation errors.
///
/// These errors occur when validating identifiers, keys and signature headers.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A field has an invalid format.
    #[error("Invalid format for {field}: {message}")]
    InvalidFormat { field: String, message: String },

    /// A webhook signature header could not be parsed.
    #[error("Invalid signature format: {message}")]
    InvalidSignatureFormat { message: String },

    /// The HMAC could not be initialised.
    #[error("HMAC error: {message}")]
    HmacError { message: String },
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;

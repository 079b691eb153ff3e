//! # GitHub Bot SDK
//!
//! GitHub App primitives used by the trigger gateway:
//! - App assertion (JWT) minting and installation token exchange
//! - An installation-scoped REST client for pull request lookups
//! - Webhook signature validation
//!
//! # Examples
//!
//! ## Identifiers
//!
//! ```rust
//! use github_bot_sdk::auth::{GitHubAppId, InstallationId};
//!
//! let app_id = GitHubAppId::new(123456);
//! let installation_id = InstallationId::new(789012);
//! assert!(GitHubAppId::non_zero(0).is_none());
//! ```
//!
//! ## Validating a delivery
//!
//! ```rust
//! use github_bot_sdk::webhook::{sign_payload, SignatureAlgorithm, SignatureValidator};
//!
//! let body = br#"{"zen":"Keep it logically awesome."}"#;
//! let header = sign_payload(SignatureAlgorithm::Sha1, b"s3cret", body).unwrap();
//!
//! let validator = SignatureValidator::new();
//! assert!(validator.validate(body, &header, b"s3cret").unwrap());
//! assert!(!validator.validate(body, &header, b"other").unwrap());
//! ```

pub mod auth;
pub mod client;
pub mod error;
pub mod webhook;

pub use error::{ApiError, AuthError, ValidationError};

pub use auth::{
    AppAuthenticator, AppCredential, AuthenticationProvider, GitHubApiClient, GitHubAppId,
    InstallationId, InstallationToken, JsonWebToken, JwtClaims, PrivateKey,
};
pub use client::{ClientConfig, GitHubClient, InstallationClient, PullRequest};

//! Webhook signature verification.
//!
//! The secret is the project's own, else the configured default. Having
//! neither is a deployment problem and is reported as a configuration error,
//! distinct from a forged request.

use github_bot_sdk::webhook::SignatureValidator;
use tracing::warn;

use crate::project::{Project, SharedSecret};
use crate::GatewayError;

/// Pick the secret that signs deliveries for `project`.
pub fn resolve_secret<'a>(
    project: &'a Project,
    default_secret: Option<&'a SharedSecret>,
) -> Result<&'a SharedSecret, GatewayError> {
    project
        .shared_secret
        .as_ref()
        .or(default_secret)
        .ok_or_else(|| GatewayError::Config {
            message: format!("No secret is configured for {}", project.name),
        })
}

/// Verify `signature` over `body` with `secret`.
///
/// A missing, malformed or mismatched signature is an authentication failure.
pub fn verify_signature(
    body: &[u8],
    signature: Option<&str>,
    secret: &SharedSecret,
) -> Result<(), GatewayError> {
    let signature = signature
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| GatewayError::Auth {
            message: "missing signature".to_string(),
        })?;

    match SignatureValidator::new().validate(body, signature, secret.expose()) {
        Ok(true) => Ok(()),
        Ok(false) => Err(GatewayError::Auth {
            message: "signature mismatch".to_string(),
        }),
        Err(e) => {
            warn!(error = %e, "Rejected malformed webhook signature");
            Err(GatewayError::Auth {
                message: "malformed signature".to_string(),
            })
        }
    }
}

#[cfg(test)]
#[path = "signature_tests.rs"]
mod tests;

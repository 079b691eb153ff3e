//! Webhook signature validation implementation.
//!
//! GitHub signs each delivery with an HMAC of the raw body, keyed by the
//! webhook secret, and sends it as `algorithm=hexdigest`. `X-Hub-Signature`
//! carries an HMAC-SHA1 digest and `X-Hub-Signature-256` an HMAC-SHA256 one.
//! Comparison is constant-time.

use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::ValidationError;

/// Keyed-hash scheme named by the signature prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    Sha1,
    Sha256,
}

impl SignatureAlgorithm {
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
        }
    }
}

/// A parsed `algorithm=hexdigest` signature header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookSignature {
    pub algorithm: SignatureAlgorithm,
    pub digest: Vec<u8>,
}

impl WebhookSignature {
    /// Parse a signature header value.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidSignatureFormat` for an unknown
    /// algorithm prefix, a missing `=` or a digest that is not hex.
    pub fn parse(signature: &str) -> Result<Self, ValidationError> {
        let (prefix, hex_digest) = signature.trim().split_once('=').ok_or_else(|| {
            ValidationError::InvalidSignatureFormat {
                message: "Signature must have the form 'algorithm=hexdigest'".to_string(),
            }
        })?;

        let algorithm = match prefix.to_ascii_lowercase().as_str() {
            "sha1" => SignatureAlgorithm::Sha1,
            "sha256" => SignatureAlgorithm::Sha256,
            other => {
                return Err(ValidationError::InvalidSignatureFormat {
                    message: format!(
                        "Unsupported signature algorithm '{}'",
                        other.chars().take(10).collect::<String>()
                    ),
                })
            }
        };

        let digest = hex::decode(hex_digest).map_err(|e| ValidationError::InvalidSignatureFormat {
            message: format!("Invalid hex encoding in signature: {}", e),
        })?;

        Ok(Self { algorithm, digest })
    }
}

/// Compute the raw HMAC digest of `payload` with `secret`.
pub fn compute_hmac(
    algorithm: SignatureAlgorithm,
    secret: &[u8],
    payload: &[u8],
) -> Result<Vec<u8>, ValidationError> {
    let hmac_error = |e: hmac::digest::InvalidLength| ValidationError::HmacError {
        message: format!("Failed to create HMAC instance: {}", e),
    };

    let digest = match algorithm {
        SignatureAlgorithm::Sha1 => {
            let mut mac = Hmac::<Sha1>::new_from_slice(secret).map_err(hmac_error)?;
            mac.update(payload);
            mac.finalize().into_bytes().to_vec()
        }
        SignatureAlgorithm::Sha256 => {
            let mut mac = Hmac::<Sha256>::new_from_slice(secret).map_err(hmac_error)?;
            mac.update(payload);
            mac.finalize().into_bytes().to_vec()
        }
    };

    Ok(digest)
}

/// Produce the header value a sender would attach to `payload`.
///
/// # Examples
///
/// ```
/// use github_bot_sdk::webhook::{sign_payload, SignatureAlgorithm, SignatureValidator};
///
/// let header = sign_payload(SignatureAlgorithm::Sha256, b"secret", b"{}").unwrap();
/// assert!(header.starts_with("sha256="));
/// assert!(SignatureValidator::new().validate(b"{}", &header, b"secret").unwrap());
/// ```
pub fn sign_payload(
    algorithm: SignatureAlgorithm,
    secret: &[u8],
    payload: &[u8],
) -> Result<String, ValidationError> {
    let digest = compute_hmac(algorithm, secret, payload)?;
    Ok(format!("{}={}", algorithm.prefix(), hex::encode(digest)))
}

/// Stateless webhook signature validator.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignatureValidator;

impl SignatureValidator {
    pub fn new() -> Self {
        Self
    }

    /// Check `signature` against the HMAC of `payload` keyed by `secret`.
    ///
    /// Returns `Ok(false)` on a mismatch and `Err` when the header cannot be
    /// parsed at all.
    pub fn validate(
        &self,
        payload: &[u8],
        signature: &str,
        secret: &[u8],
    ) -> Result<bool, ValidationError> {
        let parsed = WebhookSignature::parse(signature)?;
        let expected = compute_hmac(parsed.algorithm, secret, payload)?;
        Ok(constant_time_compare(&parsed.digest, &expected))
    }
}

fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    // Digest lengths are public.
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

#[cfg(test)]
#[path = "validation_tests.rs"]
mod tests;

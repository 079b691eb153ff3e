//! App assertion (JWT) minting for GitHub App authentication.
//!
//! # GitHub Requirements
//!
//! - JWTs must use RS256 algorithm (RSA Signature with SHA-256)
//! - Expiration may be at most 10 minutes in the future
//! - Claims must include `iss` (app ID), `iat` (issued at), and `exp` (expiration)
//!
//! The issued-at claim is backdated by a minute so that small clock drift
//! between this host and GitHub does not produce "issued in the future" errors.

use crate::auth::{GitHubAppId, JsonWebToken, JwtClaims, PrivateKey};
use crate::error::{AuthError, ValidationError};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::RsaPrivateKey;
use zeroize::Zeroizing;

/// Longest assertion lifetime GitHub accepts.
pub fn max_expiration() -> Duration {
    Duration::minutes(10)
}

/// Interface for minting App assertions.
pub trait JwtGenerator: Send + Sync {
    /// Mint a signed assertion for the given App.
    fn generate_jwt(&self, app_id: GitHubAppId) -> Result<JsonWebToken, AuthError>;

    /// How long minted assertions stay valid after issuance.
    fn expiration_duration(&self) -> Duration;
}

/// RS256 assertion generator.
///
/// The encoding key is parsed once when the generator is built, so a broken
/// key surfaces at start-up instead of on the first enrichment.
///
/// # Examples
///
/// ```no_run
/// use github_bot_sdk::auth::{GitHubAppId, JwtGenerator, PrivateKey, RS256JwtGenerator};
///
/// # fn example(pem: &str) -> Result<(), Box<dyn std::error::Error>> {
/// let key = PrivateKey::from_pem(pem)?;
/// let generator = RS256JwtGenerator::new(&key)?;
/// let jwt = generator.generate_jwt(GitHubAppId::new(123456))?;
/// assert!(!jwt.is_expired());
/// # Ok(())
/// # }
/// ```
pub struct RS256JwtGenerator {
    encoding_key: EncodingKey,
    expiration_duration: Duration,
    clock_skew: Duration,
}

impl RS256JwtGenerator {
    /// Create a generator that issues assertions valid for nine minutes.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidPrivateKey` if the key cannot be used for RS256.
    pub fn new(private_key: &PrivateKey) -> Result<Self, AuthError> {
        let encoding_key = EncodingKey::from_rsa_pem(private_key.key_data()).map_err(|e| {
            AuthError::InvalidPrivateKey {
                message: format!("Failed to create encoding key: {}", e),
            }
        })?;

        Ok(Self {
            encoding_key,
            expiration_duration: Duration::minutes(9),
            clock_skew: Duration::seconds(60),
        })
    }

    /// Override the assertion lifetime.
    ///
    /// Values are clamped to between one second and GitHub's ten minute maximum.
    pub fn with_expiration(mut self, expiration_duration: Duration) -> Self {
        self.expiration_duration = expiration_duration.clamp(Duration::seconds(1), max_expiration());
        self
    }

    fn build_claims(&self, app_id: GitHubAppId, now: DateTime<Utc>) -> JwtClaims {
        JwtClaims {
            iss: app_id,
            iat: (now - self.clock_skew).timestamp(),
            exp: (now + self.expiration_duration).timestamp(),
        }
    }
}

impl JwtGenerator for RS256JwtGenerator {
    fn generate_jwt(&self, app_id: GitHubAppId) -> Result<JsonWebToken, AuthError> {
        let now = Utc::now();
        let claims = self.build_claims(app_id, now);

        let token = encode(&Header::new(Algorithm::RS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::JwtGenerationFailed {
                message: format!("Failed to encode JWT: {}", e),
            })?;

        Ok(JsonWebToken::new(
            token,
            app_id,
            now - self.clock_skew,
            now + self.expiration_duration,
        ))
    }

    fn expiration_duration(&self) -> Duration {
        self.expiration_duration
    }
}

impl std::fmt::Debug for RS256JwtGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RS256JwtGenerator")
            .field("expiration_duration", &self.expiration_duration)
            .field("clock_skew", &self.clock_skew)
            .field("encoding_key", &"<REDACTED>")
            .finish()
    }
}

impl PrivateKey {
    /// Parse and validate a PEM encoded RSA private key.
    ///
    /// Both PKCS#1 (`BEGIN RSA PRIVATE KEY`, the format GitHub hands out) and
    /// PKCS#8 (`BEGIN PRIVATE KEY`) encodings are accepted.
    pub fn from_pem(pem: &str) -> Result<Self, ValidationError> {
        let pem = pem.trim();

        if pem.is_empty() {
            return Err(ValidationError::InvalidFormat {
                field: "private_key".to_string(),
                message: "PEM string cannot be empty".to_string(),
            });
        }

        if !pem.contains("-----BEGIN") || !pem.contains("-----END") {
            return Err(ValidationError::InvalidFormat {
                field: "private_key".to_string(),
                message: "Invalid PEM format: missing BEGIN/END markers".to_string(),
            });
        }

        let parsed = if pem.contains("BEGIN RSA PRIVATE KEY") {
            RsaPrivateKey::from_pkcs1_pem(pem).map_err(|e| e.to_string())
        } else {
            RsaPrivateKey::from_pkcs8_pem(pem).map_err(|e| e.to_string())
        };
        parsed.map_err(|message| ValidationError::InvalidFormat {
            field: "private_key".to_string(),
            message: format!("Failed to parse RSA private key: {}", message),
        })?;

        Ok(Self {
            key_data: Zeroizing::new(pem.as_bytes().to_vec()),
        })
    }
}

#[cfg(test)]
#[path = "jwt_tests.rs"]
mod tests;

//! GitHub webhook signature handling.
//!
//! GitHub signs every delivery with the webhook secret. The header names
//! below are the ones GitHub sends; `X-Hub-Signature-256` should be preferred
//! when present, with `X-Hub-Signature` (SHA-1) as the legacy fallback.
//!
//! # Security
//!
//! Digests are compared in constant time. Secrets are passed in per call and
//! never retained.

mod validation;

pub use validation::{
    compute_hmac, sign_payload, SignatureAlgorithm, SignatureValidator, WebhookSignature,
};

/// Event kind header.
pub const EVENT_HEADER: &str = "x-github-event";
/// Unique id of one delivery.
pub const DELIVERY_HEADER: &str = "x-github-delivery";
/// HMAC-SHA256 signature header.
pub const SIGNATURE_256_HEADER: &str = "x-hub-signature-256";
/// Legacy HMAC-SHA1 signature header.
pub const SIGNATURE_HEADER: &str = "x-hub-signature";

//! Error types for the HTTP service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use trigger_gateway_core::GatewayError;
use tracing::{error, warn};

/// Webhook handler errors with HTTP status code mapping
///
/// - `400 Bad Request`: unreadable body, unknown project or pull request
/// - `403 Forbidden`: signature or installation authentication failure
/// - `500 Internal Server Error`: missing secret, GitHub or store failure
///
/// Bodies take the form `{"status": "<message>"}`, the same shape as the
/// success response, so senders can log them uniformly.
#[derive(Debug, thiserror::Error)]
pub enum WebhookHandlerError {
    #[error(transparent)]
    Processing(#[from] GatewayError),
}

impl WebhookHandlerError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Processing(e) => match e {
                GatewayError::Parse(_) | GatewayError::NotFound { .. } => StatusCode::BAD_REQUEST,
                GatewayError::Auth { .. } | GatewayError::TokenExchange(_) => {
                    StatusCode::FORBIDDEN
                }
                GatewayError::Config { .. }
                | GatewayError::RemoteApi { .. }
                | GatewayError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Client-facing message; details stay in the server log.
    fn public_message(&self) -> String {
        match self {
            Self::Processing(e) => match e {
                GatewayError::Parse(_) => "Malformed body".to_string(),
                GatewayError::NotFound { .. } => e.to_string(),
                GatewayError::Auth { message } => message.clone(),
                GatewayError::TokenExchange(_) => "Auth Failed".to_string(),
                GatewayError::Config { .. } => {
                    "No secret is configured for this repo.".to_string()
                }
                GatewayError::RemoteApi { .. } => {
                    "failed to fetch pull request for corresponding issue comment".to_string()
                }
                GatewayError::Store(_) => "failed to record build".to_string(),
            },
        }
    }
}

impl IntoResponse for WebhookHandlerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "Webhook processing failed");
        } else {
            warn!(error = %self, "Webhook rejected");
        }

        let body = serde_json::json!({ "status": self.public_message() });
        (status, Json(body)).into_response()
    }
}

/// Reconciliation endpoint errors
///
/// The reconciliation runtime owns retries, so transient failures map to
/// gateway-class statuses it can back off on.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileHandlerError {
    #[error("No resource mapping for kind '{kind}'")]
    UnknownMapping { kind: String },

    #[error(transparent)]
    Processing(#[from] GatewayError),
}

impl ReconcileHandlerError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::UnknownMapping { .. } => StatusCode::NOT_FOUND,
            Self::Processing(e) => match e {
                GatewayError::Parse(_) => StatusCode::BAD_REQUEST,
                GatewayError::NotFound { .. } => StatusCode::NOT_FOUND,
                GatewayError::Auth { .. } | GatewayError::TokenExchange(_) => {
                    StatusCode::FORBIDDEN
                }
                GatewayError::RemoteApi { .. } => StatusCode::BAD_GATEWAY,
                GatewayError::Store(e) if e.is_transient() => StatusCode::SERVICE_UNAVAILABLE,
                GatewayError::Config { .. } | GatewayError::Store(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }
}

impl IntoResponse for ReconcileHandlerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "Reconciliation failed");
        } else {
            warn!(error = %self, "Reconciliation rejected");
        }

        let body = serde_json::json!({ "status": self.to_string() });
        (status, Json(body)).into_response()
    }
}

/// Service-level errors
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Failed to bind to address {address}: {message}")]
    BindFailed { address: String, message: String },

    #[error("Server failed: {message}")]
    ServerFailed { message: String },

    #[error("Failed to initialize metrics: {0}")]
    Metrics(#[from] prometheus::Error),
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

//! # Trigger Gateway HTTP Service
//!
//! HTTP transport for the trigger gateway.
//!
//! This service provides:
//! - GitHub webhook endpoints (`/events/github`, `/events/github/{app}/{inst}`)
//! - A reconciliation endpoint for custom resource snapshots
//! - Health and Prometheus metrics endpoints

pub mod errors;
pub mod metrics;

use axum::{
    extract::{DefaultBodyLimit, Path, State},
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::{get, post},
    Router,
};
use bytes::Bytes;
use github_bot_sdk::webhook::{
    DELIVERY_HEADER, EVENT_HEADER, SIGNATURE_256_HEADER, SIGNATURE_HEADER,
};
use github_bot_sdk::InstallationId;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, net::SocketAddr, sync::Arc, time::Instant};
use tower::ServiceBuilder;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::{debug, error, info, instrument};
use trigger_gateway_core::{
    EventKind, GatewayError, ParseError, ResourceState, ResourceStateTranslator, WebhookDelivery,
    WebhookEventClassifier, WebhookOutcome, GITHUB_PROVIDER, RESOURCE_PROVIDER,
};

pub use errors::{ReconcileHandlerError, ServiceError, WebhookHandlerError};
pub use metrics::ServiceMetrics;

/// GitHub caps webhook payloads at 25 MiB.
pub const MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

// ============================================================================
// Application State
// ============================================================================

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub classifier: Arc<WebhookEventClassifier>,

    /// Translators keyed by lower-cased resource kind
    pub translators: Arc<HashMap<String, Arc<ResourceStateTranslator>>>,

    pub metrics: Arc<ServiceMetrics>,
}

impl AppState {
    pub fn new(
        classifier: Arc<WebhookEventClassifier>,
        translators: Vec<ResourceStateTranslator>,
        metrics: Arc<ServiceMetrics>,
    ) -> Self {
        // The first mapping for a kind wins, matching config lookup order.
        let mut by_kind = HashMap::new();
        for translator in translators {
            by_kind
                .entry(translator.mapping().event_prefix())
                .or_insert_with(|| Arc::new(translator));
        }

        Self {
            classifier,
            translators: Arc::new(by_kind),
            metrics,
        }
    }

    pub fn translator_for(&self, kind: &str) -> Option<&Arc<ResourceStateTranslator>> {
        self.translators.get(&kind.to_lowercase())
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 7746,
        }
    }
}

// ============================================================================
// Router
// ============================================================================

/// Create the HTTP router
pub fn create_router(state: AppState) -> Router {
    let event_routes = Router::new()
        .route("/events/github", post(handle_github_webhook))
        .route(
            "/events/github/{app}/{inst}",
            post(handle_github_installation_webhook),
        );

    let reconcile_routes = Router::new().route("/reconcile/{kind}", post(handle_reconcile));

    let observability_routes = Router::new()
        .route("/healthz", get(handle_healthz))
        .route("/metrics", get(metrics_endpoint));

    Router::new()
        .merge(event_routes)
        .merge(reconcile_routes)
        .merge(observability_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CatchPanicLayer::custom(panic_response))
                .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
                .into_inner(),
        )
        .with_state(state)
}

/// Start HTTP server and serve until a shutdown signal arrives
pub async fn start_server(config: ServerConfig, state: AppState) -> Result<(), ServiceError> {
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e: std::net::AddrParseError| ServiceError::BindFailed {
            address: format!("{}:{}", config.host, config.port),
            message: e.to_string(),
        })?;
    let listener =
        tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServiceError::BindFailed {
                address: addr.to_string(),
                message: e.to_string(),
            })?;

    info!("Starting HTTP server on {}", addr);

    // In-flight requests complete; new connections are refused.
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ServiceError::ServerFailed {
            message: e.to_string(),
        })?;

    info!("HTTP server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT (Ctrl+C), initiating graceful shutdown"),
        _ = terminate => info!("Received SIGTERM, initiating graceful shutdown"),
    }
}

fn panic_response(
    _payload: Box<dyn std::any::Any + Send + 'static>,
) -> axum::response::Response {
    use axum::response::IntoResponse;

    error!("Request handler panicked");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "status": "Internal server error" })),
    )
        .into_response()
}

// ============================================================================
// Webhook Handlers
// ============================================================================

/// Handle GitHub webhook deliveries
#[instrument(skip(state, headers, body))]
pub async fn handle_github_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>, WebhookHandlerError> {
    process_delivery(&state, delivery_from_headers(&headers, body)).await
}

/// Legacy per-installation URL
///
/// `{inst}` stands in for the installation id when the body names none.
#[instrument(skip(state, headers, body))]
pub async fn handle_github_installation_webhook(
    State(state): State<AppState>,
    route: Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>, WebhookHandlerError> {
    let Path((app, inst)) = route;
    let installation = inst
        .trim()
        .parse::<u64>()
        .ok()
        .and_then(InstallationId::non_zero);
    debug!(app = %app, installation = ?installation, "Delivery on installation route");

    let delivery = delivery_from_headers(&headers, body).with_route_installation(installation);
    process_delivery(&state, delivery).await
}

async fn process_delivery(
    state: &AppState,
    delivery: WebhookDelivery,
) -> Result<Json<WebhookResponse>, WebhookHandlerError> {
    let started = Instant::now();
    let result = state.classifier.handle(&delivery).await;
    state
        .metrics
        .record_webhook_request(kind_label(&delivery.kind), started.elapsed());

    match result {
        Ok(WebhookOutcome::Acknowledged) => Ok(Json(WebhookResponse::message("OK"))),
        Ok(WebhookOutcome::Ignored { .. }) => Ok(Json(WebhookResponse::message("Ignored"))),
        Ok(WebhookOutcome::Completed { emitted, .. }) => {
            state
                .metrics
                .record_build_triggers(GITHUB_PROVIDER, emitted.len());
            Ok(Json(WebhookResponse::status("Complete")))
        }
        Err(e) => {
            state.metrics.record_webhook_failure(&e);
            Err(e.into())
        }
    }
}

/// Metric label for a delivery kind.
///
/// The event header is unauthenticated, so unsupported kinds share one label.
fn kind_label(kind: &EventKind) -> &str {
    match kind {
        EventKind::Unrecognized(_) => "unrecognized",
        other => other.as_str(),
    }
}

/// Build a delivery from request headers.
///
/// The SHA-256 signature header is preferred over the legacy SHA-1 one.
fn delivery_from_headers(headers: &HeaderMap, body: Bytes) -> WebhookDelivery {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    let kind = EventKind::from_header(header(EVENT_HEADER).unwrap_or(""));
    let mut delivery = WebhookDelivery::new(kind, body);

    if let Some(signature) = header(SIGNATURE_256_HEADER).or_else(|| header(SIGNATURE_HEADER)) {
        delivery = delivery.with_signature(signature);
    }
    if let Some(delivery_id) = header(DELIVERY_HEADER) {
        delivery = delivery.with_delivery_id(delivery_id);
    }

    delivery
}

// ============================================================================
// Reconciliation Handler
// ============================================================================

/// Translate one resource snapshot into a build trigger
#[instrument(skip(state, body))]
pub async fn handle_reconcile(
    State(state): State<AppState>,
    route: Path<String>,
    body: Bytes,
) -> Result<Json<ResourceState>, ReconcileHandlerError> {
    let Path(kind) = route;
    let Some(translator) = state.translator_for(&kind) else {
        state.metrics.record_reconciliation(None);
        return Err(ReconcileHandlerError::UnknownMapping { kind });
    };

    let request: ResourceState = serde_json::from_slice(&body)
        .map_err(|e| GatewayError::Parse(ParseError::from(e)))
        .inspect_err(|_| state.metrics.record_reconciliation(None))?;

    match translator.handle_state(request.object).await {
        Ok(reconciled) => {
            state
                .metrics
                .record_reconciliation(Some(reconciled.action.as_str()));
            state.metrics.record_build_triggers(RESOURCE_PROVIDER, 1);
            Ok(Json(ResourceState {
                object: reconciled.snapshot,
            }))
        }
        Err(e) => {
            state.metrics.record_reconciliation(None);
            Err(e.into())
        }
    }
}

// ============================================================================
// Observability Handlers
// ============================================================================

async fn handle_healthz() -> &'static str {
    "OK"
}

/// Prometheus metrics endpoint
#[instrument(skip_all)]
async fn metrics_endpoint(State(state): State<AppState>) -> Result<String, StatusCode> {
    state.metrics.render().map_err(|e| {
        error!(error = %e, "Failed to encode metrics");
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

// ============================================================================
// Response Types
// ============================================================================

/// Webhook response body: `{"message": ...}` for acknowledgements,
/// `{"status": ...}` once a delivery has been processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl WebhookResponse {
    fn message(message: &str) -> Self {
        Self {
            message: Some(message.to_string()),
            status: None,
        }
    }

    fn status(status: &str) -> Self {
        Self {
            message: None,
            status: Some(status.to_string()),
        }
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

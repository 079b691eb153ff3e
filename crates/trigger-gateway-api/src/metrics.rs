//! Metrics collection for the gateway service.

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;
use std::time::Duration;
use trigger_gateway_core::{ErrorCategory, GatewayError};

/// Service metrics for observability
///
/// Metrics live in a registry owned by the instance rather than the process
/// global one, so several routers can coexist in one process.
#[derive(Debug)]
pub struct ServiceMetrics {
    registry: Registry,

    pub webhook_requests_total: IntCounterVec,
    pub webhook_failures_total: IntCounterVec,
    pub webhook_duration_seconds: Histogram,
    pub build_triggers_total: IntCounterVec,
    pub reconciliations_total: IntCounterVec,
}

impl ServiceMetrics {
    pub fn new() -> Result<Arc<Self>, prometheus::Error> {
        let registry = Registry::new();

        let webhook_requests_total = IntCounterVec::new(
            Opts::new("webhook_requests_total", "Webhook deliveries received"),
            &["kind"],
        )?;
        let webhook_failures_total = IntCounterVec::new(
            Opts::new("webhook_failures_total", "Failed webhook deliveries"),
            &["category"],
        )?;
        let webhook_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "webhook_duration_seconds",
                "Webhook processing time distribution",
            )
            .buckets(vec![0.001, 0.01, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0]),
        )?;
        let build_triggers_total = IntCounterVec::new(
            Opts::new("build_triggers_total", "Build triggers recorded"),
            &["provider"],
        )?;
        let reconciliations_total = IntCounterVec::new(
            Opts::new("reconciliations_total", "Resource reconciliations handled"),
            &["action"],
        )?;

        registry.register(Box::new(webhook_requests_total.clone()))?;
        registry.register(Box::new(webhook_failures_total.clone()))?;
        registry.register(Box::new(webhook_duration_seconds.clone()))?;
        registry.register(Box::new(build_triggers_total.clone()))?;
        registry.register(Box::new(reconciliations_total.clone()))?;

        Ok(Arc::new(Self {
            registry,
            webhook_requests_total,
            webhook_failures_total,
            webhook_duration_seconds,
            build_triggers_total,
            reconciliations_total,
        }))
    }

    pub fn record_webhook_request(&self, kind: &str, duration: Duration) {
        self.webhook_requests_total.with_label_values(&[kind]).inc();
        self.webhook_duration_seconds
            .observe(duration.as_secs_f64());
    }

    pub fn record_webhook_failure(&self, error: &GatewayError) {
        self.webhook_failures_total
            .with_label_values(&[category_label(error.error_category())])
            .inc();
    }

    pub fn record_build_triggers(&self, provider: &str, count: usize) {
        if count > 0 {
            self.build_triggers_total
                .with_label_values(&[provider])
                .inc_by(count as u64);
        }
    }

    /// Count a reconciliation; failures are counted under `failed`.
    pub fn record_reconciliation(&self, action: Option<&str>) {
        self.reconciliations_total
            .with_label_values(&[action.unwrap_or("failed")])
            .inc();
    }

    /// Prometheus text exposition of every metric.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

fn category_label(category: ErrorCategory) -> &'static str {
    match category {
        ErrorCategory::Transient => "transient",
        ErrorCategory::Permanent => "permanent",
        ErrorCategory::Security => "security",
        ErrorCategory::Configuration => "configuration",
    }
}

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod tests;

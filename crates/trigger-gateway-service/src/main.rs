//! # Trigger Gateway Service
//!
//! Binary entry point for the trigger gateway.
//!
//! This executable:
//! - Loads configuration from files, environment and command-line flags
//! - Initializes logging
//! - Loads the GitHub App credential and builds the store adapters
//! - Starts the HTTP server from trigger-gateway-api

mod settings;

use anyhow::Context;
use clap::Parser;
use settings::{Args, LoggingConfig, ServiceConfig};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use github_bot_sdk::{AppAuthenticator, ClientConfig, GitHubClient};
use trigger_gateway_api::{start_server, AppState, ServiceMetrics};
use trigger_gateway_core::adapters::{FilesystemBuildRecorder, StaticProjectStore};
use trigger_gateway_core::{
    BuildRecorder, ProjectStore, ResourceStateTranslator, WebhookEventClassifier,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // -------------------------------------------------------------------------
    // Load configuration
    //
    // Sources (later sources override earlier ones):
    //  1. /etc/trigger-gateway/service.yaml
    //  2. ./config/service.yaml
    //  3. --config / TG_CONFIG_FILE
    //  4. Environment variables prefixed TG__ (e.g. TG__SERVER__PORT=9090)
    //  5. Command-line flags
    // -------------------------------------------------------------------------
    let service_config = ServiceConfig::load(args.config.as_deref())
        .context("failed to load configuration")?
        .apply_args(&args);

    init_logging(&service_config.logging);
    info!("Starting trigger gateway");

    service_config
        .validate()
        .context("service configuration is invalid")?;

    let gateway = Arc::new(service_config.gateway.clone());

    let github = Arc::new(
        GitHubClient::new(
            ClientConfig::builder()
                .github_api_url(gateway.github_api_url.clone())
                .timeout(gateway.remote_timeout())
                .build(),
        )
        .context("failed to build GitHub client")?,
    );

    let credential = service_config.app_credential().await?;
    if credential.is_none() {
        warn!("No GitHub App configured; pull request enrichment is disabled");
    }
    let auth = Arc::new(
        AppAuthenticator::new(credential.as_ref(), github.clone())
            .context("failed to initialize GitHub App authentication")?,
    );

    if service_config.projects.is_empty() {
        warn!("No projects configured; every delivery will be rejected");
    }
    let projects: Arc<dyn ProjectStore> =
        Arc::new(StaticProjectStore::new(service_config.projects.clone()));

    let builds_dir = service_config
        .builds_dir
        .clone()
        .context("builds_dir must be configured")?;
    info!(path = %builds_dir.display(), "Recording builds to the filesystem");
    let recorder: Arc<dyn BuildRecorder> = Arc::new(
        FilesystemBuildRecorder::new(builds_dir)
            .await
            .context("failed to open build directory")?,
    );

    let classifier = Arc::new(WebhookEventClassifier::new(
        gateway.clone(),
        projects.clone(),
        recorder.clone(),
        auth.clone(),
        github.clone(),
    ));

    let translators = gateway
        .mappings
        .iter()
        .cloned()
        .map(|mapping| {
            info!(kind = %mapping.kind, project = %mapping.project, "Registered resource mapping");
            ResourceStateTranslator::new(
                mapping,
                gateway.clone(),
                projects.clone(),
                recorder.clone(),
                auth.clone(),
            )
        })
        .collect();

    let metrics = ServiceMetrics::new().context("failed to register metrics")?;
    let state = AppState::new(classifier, translators, metrics);

    info!(
        host = %service_config.server.host,
        port = service_config.server.port,
        "Starting HTTP server"
    );
    start_server(service_config.server, state).await?;

    Ok(())
}

fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("{},tower_http=debug", config.level).into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    if config.json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

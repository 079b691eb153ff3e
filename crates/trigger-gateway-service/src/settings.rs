//! Service settings: layered configuration files, environment and
//! command-line overrides.

use clap::Parser;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

use github_bot_sdk::{AppCredential, PrivateKey};
use trigger_gateway_api::ServerConfig;
use trigger_gateway_core::config::parse_list;
use trigger_gateway_core::{GatewayConfig, ProjectConfig, ResourceMapping, SharedSecret};

const SYSTEM_CONFIG: &str = "/etc/trigger-gateway/service";
const LOCAL_CONFIG: &str = "config/service";
const ENV_PREFIX: &str = "TG";

/// Errors raised while assembling the service settings
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error(transparent)]
    Invalid(#[from] trigger_gateway_core::ConfigError),

    #[error("Failed to read private key from {path}: {message}")]
    PrivateKey { path: PathBuf, message: String },
}

/// Command-line arguments; each one overrides the matching setting.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "trigger-gateway", version, about = "GitHub and custom resource build trigger gateway")]
pub struct Args {
    /// Explicit YAML configuration file
    #[arg(long, env = "TG_CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Port to listen on
    #[arg(long, env = "TG_PORT")]
    pub port: Option<u16>,

    /// PEM file holding the GitHub App private key
    #[arg(long, env = "TG_KEY_FILE")]
    pub key_file: Option<PathBuf>,

    /// GitHub App id
    #[arg(long, env = "TG_APP_ID")]
    pub app_id: Option<u64>,

    /// Comma separated author associations allowed to trigger enrichment
    #[arg(long, env = "TG_AUTHORS")]
    pub authors: Option<String>,

    /// Comma separated event patterns to emit
    #[arg(long, env = "TG_EVENTS")]
    pub events: Option<String>,

    /// Resource mapping, `group=..,version=..,kind=..,project=..`; repeatable
    #[arg(long = "mapping")]
    pub mappings: Vec<ResourceMapping>,

    /// Secret for projects without one of their own
    #[arg(long, env = "TG_DEFAULT_SHARED_SECRET", hide_env_values = true)]
    pub default_shared_secret: Option<String>,

    /// Directory builds are written to
    #[arg(long, env = "TG_BUILDS_DIR")]
    pub builds_dir: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long)]
    pub json_logs: bool,
}

/// `TG__`-prefixed environment source.
///
/// List settings take comma separated values, e.g.
/// `TG__GATEWAY__ALLOWED_AUTHORS=owner,member`.
fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("gateway.allowed_authors")
        .with_list_parse_key("gateway.emitted_events")
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub json: bool,

    /// Filter used when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            json: false,
            level: "info".to_string(),
        }
    }
}

/// Complete service configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub server: ServerConfig,
    pub gateway: GatewayConfig,
    pub projects: Vec<ProjectConfig>,
    pub logging: LoggingConfig,

    /// Directory builds are written to; required.
    pub builds_dir: Option<PathBuf>,

    pub private_key_file: Option<PathBuf>,
}

impl ServiceConfig {
    /// Load settings from, in increasing precedence: the system file, the
    /// local file, `explicit` and `TG__`-prefixed environment variables.
    ///
    /// Absent system and local files are skipped; a missing explicit file is
    /// an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self, SettingsError> {
        let mut builder = config::Config::builder()
            .add_source(
                config::File::with_name(SYSTEM_CONFIG)
                    .required(false)
                    .format(config::FileFormat::Yaml),
            )
            .add_source(
                config::File::with_name(LOCAL_CONFIG)
                    .required(false)
                    .format(config::FileFormat::Yaml),
            );

        if let Some(path) = explicit {
            info!(path = %path.display(), "Loading configuration from explicit path");
            builder = builder.add_source(
                config::File::from(path)
                    .required(true)
                    .format(config::FileFormat::Yaml),
            );
        }

        let settings = builder
            .add_source(environment())
            .build()?
            .try_deserialize()?;

        Ok(settings)
    }

    /// Apply command-line overrides and normalize the gateway settings.
    pub fn apply_args(mut self, args: &Args) -> Self {
        if let Some(port) = args.port {
            self.server.port = port;
        }
        if let Some(path) = &args.key_file {
            self.private_key_file = Some(path.clone());
        }
        if let Some(app_id) = args.app_id {
            self.gateway.app_id = Some(app_id);
        }
        if let Some(authors) = &args.authors {
            self.gateway.allowed_authors = parse_list(authors);
        }
        if let Some(events) = &args.events {
            self.gateway.emitted_events = parse_list(events);
        }
        if !args.mappings.is_empty() {
            self.gateway.mappings = args.mappings.clone();
        }
        if let Some(secret) = args.default_shared_secret.as_deref().and_then(SharedSecret::new) {
            self.gateway.default_shared_secret = Some(secret);
        }
        if let Some(dir) = &args.builds_dir {
            self.builds_dir = Some(dir.clone());
        }
        if args.json_logs {
            self.logging.json = true;
        }

        self.gateway = self.gateway.normalized();
        self
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.server.port == 0 {
            return Err(trigger_gateway_core::ConfigError::Invalid {
                key: "server.port".to_string(),
                message: "must be greater than zero".to_string(),
            }
            .into());
        }

        if self.builds_dir.is_none() {
            return Err(trigger_gateway_core::ConfigError::Missing {
                key: "builds_dir".to_string(),
            }
            .into());
        }

        if self.gateway.app_id().is_some() && self.private_key_file.is_none() {
            return Err(trigger_gateway_core::ConfigError::Missing {
                key: "private_key_file".to_string(),
            }
            .into());
        }

        for project in &self.projects {
            if project.name.trim().is_empty() {
                return Err(trigger_gateway_core::ConfigError::Missing {
                    key: "projects.name".to_string(),
                }
                .into());
            }
        }

        self.gateway.validate()?;
        Ok(())
    }

    /// Read the App credential when an App id is configured.
    pub async fn app_credential(&self) -> Result<Option<AppCredential>, SettingsError> {
        let (Some(app_id), Some(path)) = (self.gateway.app_id(), &self.private_key_file) else {
            return Ok(None);
        };

        let pem = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| SettingsError::PrivateKey {
                path: path.clone(),
                message: e.to_string(),
            })?;
        let private_key = PrivateKey::from_pem(&pem).map_err(|e| SettingsError::PrivateKey {
            path: path.clone(),
            message: e.to_string(),
        })?;

        Ok(Some(AppCredential::new(app_id, private_key)))
    }
}

#[cfg(test)]
#[path = "settings_tests.rs"]
mod tests;

//! # Gateway Configuration
//!
//! One immutable [`GatewayConfig`] value is built at start-up, validated, and
//! then shared read-only with every component.

use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;

use github_bot_sdk::client::DEFAULT_GITHUB_API_URL;
use github_bot_sdk::GitHubAppId;

use crate::emission::EmissionFilter;
use crate::project::{GitHubEndpoint, Project, SharedSecret};

/// Configuration validation errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing configuration value: {key}")]
    Missing { key: String },

    #[error("Invalid configuration value for {key}: {message}")]
    Invalid { key: String, message: String },
}

/// Maps a custom resource kind to the project its builds are filed under.
///
/// The lower-cased kind becomes the event type prefix, so a `Terraform`
/// resource produces `terraform:apply`, `terraform:plan` or
/// `terraform:destroy`.
///
/// # Examples
///
/// ```
/// use trigger_gateway_core::ResourceMapping;
///
/// let mapping: ResourceMapping = "g=cd.example.com,v=v1,k=Terraform,p=octo/infra".parse().unwrap();
/// assert_eq!(mapping.event_prefix(), "terraform");
/// assert_eq!(mapping.project, "octo/infra");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResourceMapping {
    pub group: String,
    pub version: String,
    pub kind: String,
    pub project: String,
}

impl ResourceMapping {
    pub fn event_prefix(&self) -> String {
        self.kind.to_lowercase()
    }

    /// Whether `kind` names this mapping's resource kind.
    pub fn matches_kind(&self, kind: &str) -> bool {
        self.kind.eq_ignore_ascii_case(kind)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("group", &self.group),
            ("version", &self.version),
            ("kind", &self.kind),
            ("project", &self.project),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Missing {
                    key: format!("mapping.{}", key),
                });
            }
        }
        Ok(())
    }
}

impl FromStr for ResourceMapping {
    type Err = ConfigError;

    /// Parse `group=..,version=..,kind=..,project=..` (short keys `g`, `v`,
    /// `k`, `p` are accepted).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut mapping = ResourceMapping {
            group: String::new(),
            version: String::new(),
            kind: String::new(),
            project: String::new(),
        };

        for pair in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').ok_or_else(|| ConfigError::Invalid {
                key: "mapping".to_string(),
                message: format!("expected key=value, got '{}'", pair),
            })?;

            let slot = match key.trim() {
                "g" | "group" => &mut mapping.group,
                "v" | "version" => &mut mapping.version,
                "k" | "kind" => &mut mapping.kind,
                "p" | "project" => &mut mapping.project,
                other => {
                    return Err(ConfigError::Invalid {
                        key: "mapping".to_string(),
                        message: format!("unknown key '{}'", other),
                    })
                }
            };
            *slot = value.trim().to_string();
        }

        mapping.validate()?;
        Ok(mapping)
    }
}

/// A project declared in configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectConfig {
    /// Repository full name, `owner/repo`.
    pub name: String,
    #[serde(default)]
    pub shared_secret: Option<SharedSecret>,
    #[serde(default)]
    pub github_api_url: Option<String>,
    #[serde(default)]
    pub github_upload_url: Option<String>,
}

impl From<ProjectConfig> for Project {
    fn from(config: ProjectConfig) -> Self {
        Project::new(config.name)
            .with_shared_secret(config.shared_secret)
            .with_github(GitHubEndpoint {
                base_url: config.github_api_url,
                upload_url: config.github_upload_url,
            })
    }
}

/// Static gateway configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Branch used when an event carries no ref of its own.
    pub default_branch: String,
    /// Author associations allowed to trigger pull request enrichment.
    pub allowed_authors: Vec<String>,
    /// Event name patterns that are forwarded to the build store.
    pub emitted_events: Vec<String>,
    /// Secret used for projects without one of their own.
    pub default_shared_secret: Option<SharedSecret>,
    /// GitHub App id; zero means no App is configured.
    pub app_id: Option<u64>,
    /// API base for projects that do not override it.
    pub github_api_url: String,
    /// Budget for each remote call.
    pub remote_timeout_seconds: u64,
    pub mappings: Vec<ResourceMapping>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            default_branch: "master".to_string(),
            allowed_authors: vec![
                "COLLABORATOR".to_string(),
                "OWNER".to_string(),
                "MEMBER".to_string(),
            ],
            emitted_events: vec![crate::emission::WILDCARD.to_string()],
            default_shared_secret: None,
            app_id: None,
            github_api_url: DEFAULT_GITHUB_API_URL.to_string(),
            remote_timeout_seconds: 10,
            mappings: Vec::new(),
        }
    }
}

impl GatewayConfig {
    /// Apply the case conventions: author associations upper-case, event
    /// patterns lower-case, blanks dropped.
    pub fn normalized(mut self) -> Self {
        self.allowed_authors = normalize_list(&self.allowed_authors, str::to_uppercase);
        self.emitted_events = normalize_list(&self.emitted_events, str::to_lowercase);
        self.default_branch = self.default_branch.trim().to_string();
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_branch.trim().is_empty() {
            return Err(ConfigError::Missing {
                key: "default_branch".to_string(),
            });
        }

        if self.emitted_events.iter().all(|e| e.trim().is_empty()) {
            return Err(ConfigError::Invalid {
                key: "emitted_events".to_string(),
                message: "at least one event pattern is required".to_string(),
            });
        }

        if self.remote_timeout_seconds == 0 {
            return Err(ConfigError::Invalid {
                key: "remote_timeout_seconds".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }

        if !self.github_api_url.starts_with("http://") && !self.github_api_url.starts_with("https://")
        {
            return Err(ConfigError::Invalid {
                key: "github_api_url".to_string(),
                message: format!("'{}' is not an http(s) URL", self.github_api_url),
            });
        }

        for mapping in &self.mappings {
            mapping.validate()?;
        }

        Ok(())
    }

    /// Ref used when an event leaves its revision ref unset.
    pub fn default_ref(&self) -> String {
        format!("refs/heads/{}", self.default_branch)
    }

    pub fn app_id(&self) -> Option<GitHubAppId> {
        self.app_id.and_then(GitHubAppId::non_zero)
    }

    pub fn remote_timeout(&self) -> Duration {
        Duration::from_secs(self.remote_timeout_seconds)
    }

    pub fn is_author_allowed(&self, association: &str) -> bool {
        let association = association.trim().to_uppercase();
        !association.is_empty() && self.allowed_authors.iter().any(|a| *a == association)
    }

    pub fn emission_filter(&self) -> EmissionFilter {
        EmissionFilter::new(&self.emitted_events)
    }
}

/// Split a comma separated list, trimming entries and dropping blanks.
pub fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

fn normalize_list(values: &[String], case: fn(&str) -> String) -> Vec<String> {
    values
        .iter()
        .map(|v| case(v.trim()))
        .filter(|v| !v.is_empty())
        .collect()
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

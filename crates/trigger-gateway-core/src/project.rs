//! Project records.
//!
//! A project is a configured target repository in the build store. It carries
//! the webhook secret for that repository and, for GitHub Enterprise, the API
//! endpoints of the server hosting it.

use serde::{Deserialize, Deserializer};
use std::fmt;
use zeroize::Zeroizing;

use crate::ProjectId;

/// Webhook shared secret.
///
/// Wiped on drop and never printed.
#[derive(Clone)]
pub struct SharedSecret(Zeroizing<String>);

impl SharedSecret {
    /// Wrap a secret value; blank values are treated as no secret at all.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            None
        } else {
            Some(Self(Zeroizing::new(value)))
        }
    }

    pub fn expose(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedSecret(<REDACTED>)")
    }
}

impl<'de> Deserialize<'de> for SharedSecret {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        SharedSecret::new(value)
            .ok_or_else(|| serde::de::Error::custom("shared secret must not be blank"))
    }
}

/// GitHub API endpoints serving a project.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitHubEndpoint {
    /// REST API base, for example `https://ghe.example.com/api/v3`.
    pub base_url: Option<String>,
    /// Upload API base, kept for clients that publish artifacts.
    pub upload_url: Option<String>,
}

/// A configured build target.
#[derive(Debug, Clone)]
pub struct Project {
    pub id: ProjectId,
    /// Repository full name, `owner/repo`.
    pub name: String,
    pub shared_secret: Option<SharedSecret>,
    pub github: GitHubEndpoint,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: ProjectId::from_name(&name),
            name,
            shared_secret: None,
            github: GitHubEndpoint::default(),
        }
    }

    pub fn with_shared_secret(mut self, secret: Option<SharedSecret>) -> Self {
        self.shared_secret = secret;
        self
    }

    pub fn with_github(mut self, github: GitHubEndpoint) -> Self {
        self.github = github;
        self
    }

    /// API base for this project, or `default` when none is configured.
    pub fn api_url<'a>(&'a self, default: &'a str) -> &'a str {
        self.github
            .base_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or(default)
    }
}

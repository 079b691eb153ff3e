//! # Build Triggers
//!
//! The normalized record handed to the build store, plus the revision it
//! points at and the JSON payload the execution system receives.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::project::Project;
use crate::{BuildId, GatewayError, ParseError, ProjectId};

/// Provider tag for triggers created from webhook deliveries.
pub const GITHUB_PROVIDER: &str = "github";

/// Provider tag for triggers created from reconciled resources.
pub const RESOURCE_PROVIDER: &str = "brigade-cd";

/// A code-state pointer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub git_ref: Option<String>,
}

impl Revision {
    /// Fill an unset or blank ref with `default_ref`.
    pub fn with_default_ref(mut self, default_ref: &str) -> Self {
        if self.git_ref.as_deref().map_or(true, |r| r.trim().is_empty()) {
            self.git_ref = Some(default_ref.to_string());
        }
        self
    }
}

/// The body handed to the execution system.
///
/// Field names follow the JSON contract consumed downstream.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildPayload {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_expires: Option<DateTime<Utc>>,
    pub body: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull: Option<String>,
    #[serde(rename = "pullURL", default, skip_serializing_if = "Option::is_none")]
    pub pull_url: Option<String>,
}

impl BuildPayload {
    pub fn new(event_type: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            event_type: event_type.into(),
            body,
            ..Self::default()
        }
    }
}

impl fmt::Debug for BuildPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildPayload")
            .field("event_type", &self.event_type)
            .field("token", &self.token.as_ref().map(|_| "<REDACTED>"))
            .field("token_expires", &self.token_expires)
            .field("commit", &self.commit)
            .field("branch", &self.branch)
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("pull", &self.pull)
            .field("pull_url", &self.pull_url)
            .finish_non_exhaustive()
    }
}

/// The normalized record sent to the build store.
///
/// Created exactly once per emitted trigger name; the store treats it as
/// append-only.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildTrigger {
    pub build_id: BuildId,
    pub project_id: ProjectId,
    pub project_name: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub provider: String,
    pub revision: Revision,
    /// JSON encoded [`BuildPayload`].
    #[serde(with = "json_text")]
    pub payload: Vec<u8>,
    pub created_at: DateTime<Utc>,
}

impl BuildTrigger {
    /// Assemble a trigger for `project`.
    ///
    /// # Errors
    ///
    /// Fails if the event type is blank or the payload cannot be encoded.
    pub fn new(
        project: &Project,
        event_type: &str,
        provider: &str,
        revision: Revision,
        payload: &BuildPayload,
    ) -> Result<Self, GatewayError> {
        if event_type.trim().is_empty() {
            return Err(ParseError::MissingField {
                field: "event_type".to_string(),
            }
            .into());
        }

        let payload = serde_json::to_vec(payload).map_err(ParseError::from)?;

        Ok(Self {
            build_id: BuildId::new(),
            project_id: project.id.clone(),
            project_name: project.name.clone(),
            event_type: event_type.to_string(),
            provider: provider.to_string(),
            revision,
            payload,
            created_at: Utc::now(),
        })
    }

    /// Decode the payload back into its structured form.
    pub fn payload(&self) -> Result<BuildPayload, ParseError> {
        Ok(serde_json::from_slice(&self.payload)?)
    }
}

impl fmt::Debug for BuildTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The payload may hold an installation token.
        f.debug_struct("BuildTrigger")
            .field("build_id", &self.build_id)
            .field("project_id", &self.project_id)
            .field("event_type", &self.event_type)
            .field("provider", &self.provider)
            .field("revision", &self.revision)
            .field("payload_len", &self.payload.len())
            .finish()
    }
}

/// Stores JSON payload bytes as a string so stored builds stay readable.
mod json_text {
    use serde::ser::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        let text = std::str::from_utf8(bytes).map_err(S::Error::custom)?;
        serializer.serialize_str(text)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        Ok(String::deserialize(deserializer)?.into_bytes())
    }
}

#[cfg(test)]
#[path = "build_tests.rs"]
mod tests;

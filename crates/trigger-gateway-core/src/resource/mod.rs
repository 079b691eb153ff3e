//! # Custom Resource Translation
//!
//! Reconciled custom resources become build triggers. Each snapshot yields
//! exactly one trigger, `{kind}:apply`, `{kind}:plan` or `{kind}:destroy`,
//! and the snapshot is handed back with its status phase set to `completed`.
//!
//! The reconciliation runtime invoking the translator serializes calls per
//! resource and drops redundant invocations; the translator keeps no
//! bookkeeping of its own.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

mod translator;

pub use translator::{Reconciled, ResourceStateTranslator};

/// Annotation keys read from resource metadata.
pub mod annotations {
    pub const PREFIX: &str = "cd.brigade.sh/";
    pub const INSTALLATION_ID: &str = "cd.brigade.sh/github-app-inst-id";
    pub const APPROVED: &str = "cd.brigade.sh/approved";
    pub const DRY_RUN: &str = "cd.brigade.sh/dry-run";
    pub const GIT_REPO: &str = "cd.brigade.sh/git-repo";
    pub const GIT_COMMIT: &str = "cd.brigade.sh/git-commit";
    pub const GIT_BRANCH: &str = "cd.brigade.sh/git-branch";
    pub const PULL_ID: &str = "cd.brigade.sh/github-pull-id";
}

/// Phase written to a snapshot once its trigger is recorded.
pub const COMPLETED_PHASE: &str = "completed";

/// A custom resource as observed by the reconciliation runtime.
///
/// Fields the gateway does not interpret are preserved verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSnapshot {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: Value,
    #[serde(default)]
    pub status: ResourceStatus,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ResourceSnapshot {
    /// Annotation value, or `None` when absent or blank.
    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.metadata
            .annotations
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn is_deleted(&self) -> bool {
        self.metadata.deletion_timestamp.is_some()
    }

    /// Mark the snapshot completed; a no-op when it already is.
    pub fn mark_completed(&mut self) {
        if self.status.phase.as_deref() != Some(COMPLETED_PHASE) {
            self.status.phase = Some(COMPLETED_PHASE.to_string());
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
    /// Set by the cluster once deletion of the resource has been requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deletion_timestamp: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Wire envelope used by the reconciliation runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceState {
    pub object: ResourceSnapshot,
}

/// What a reconciled resource asks the build system to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceAction {
    Apply,
    Plan,
    Destroy,
}

impl ResourceAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Apply => "apply",
            Self::Plan => "plan",
            Self::Destroy => "destroy",
        }
    }
}

impl fmt::Display for ResourceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decide the action for `snapshot`.
///
/// Deletion wins. Otherwise the resource is applied when it is approved and
/// not a dry run, and planned in every other case. Approval defaults to
/// true and dry-run to false when their annotations are absent.
pub fn decide_action(snapshot: &ResourceSnapshot) -> ResourceAction {
    if snapshot.is_deleted() {
        return ResourceAction::Destroy;
    }

    let approved = snapshot
        .annotation(annotations::APPROVED)
        .map_or(true, |v| is_one_of(v, &["true", "yes"]));
    let dry_run = snapshot
        .annotation(annotations::DRY_RUN)
        .map_or(false, |v| !is_one_of(v, &["no", "false"]));

    if approved && !dry_run {
        ResourceAction::Apply
    } else {
        ResourceAction::Plan
    }
}

fn is_one_of(value: &str, accepted: &[&str]) -> bool {
    accepted.iter().any(|a| value.eq_ignore_ascii_case(a))
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;

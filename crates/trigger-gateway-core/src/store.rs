//! # Store Contracts
//!
//! The gateway reads projects from, and appends builds to, an external
//! store. Recording is at-least-once; callers must not assume the sink
//! deduplicates.

use async_trait::async_trait;

use crate::build::BuildTrigger;
use crate::project::Project;

/// Errors reported by store implementations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Project not found: {name}")]
    ProjectNotFound { name: String },

    #[error("Failed to write build: {message}")]
    WriteFailed { message: String },

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store unavailable: {message}")]
    Unavailable { message: String },
}

impl StoreError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::WriteFailed { .. } | Self::Unavailable { .. })
    }
}

/// Looks up configured projects by repository full name.
#[async_trait]
pub trait ProjectStore: Send + Sync {
    async fn get_project(&self, name: &str) -> Result<Project, StoreError>;
}

/// Append-only sink for build triggers.
#[async_trait]
pub trait BuildRecorder: Send + Sync {
    async fn create_build(&self, trigger: &BuildTrigger) -> Result<(), StoreError>;
}

//! # Filesystem Build Recorder
//!
//! Local filesystem implementation of [`BuildRecorder`] for development and
//! single-node deployments.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::build::BuildTrigger;
use crate::store::{BuildRecorder, StoreError};

/// Writes every trigger as a pretty-printed JSON file.
///
/// Layout: `{root}/{project_id}/{build_id}.json`. Build ids are ULIDs, so a
/// directory listing is in creation order.
///
/// # Examples
///
/// ```no_run
/// use trigger_gateway_core::adapters::FilesystemBuildRecorder;
/// use std::path::PathBuf;
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let recorder = FilesystemBuildRecorder::new(PathBuf::from("./data/builds")).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct FilesystemBuildRecorder {
    root: PathBuf,
}

impl FilesystemBuildRecorder {
    /// Create the recorder, creating `root` if needed.
    ///
    /// # Errors
    ///
    /// Returns error if the root directory cannot be created.
    pub async fn new(root: PathBuf) -> Result<Self, StoreError> {
        fs::create_dir_all(&root)
            .await
            .map_err(|e| StoreError::Unavailable {
                message: format!("Failed to create build directory: {}", e),
            })?;

        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Final location of `trigger`.
    pub fn build_path(&self, trigger: &BuildTrigger) -> PathBuf {
        self.root
            .join(trigger.project_id.as_str())
            .join(format!("{}.json", trigger.build_id))
    }
}

#[async_trait]
impl BuildRecorder for FilesystemBuildRecorder {
    async fn create_build(&self, trigger: &BuildTrigger) -> Result<(), StoreError> {
        let path = self.build_path(trigger);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::WriteFailed {
                    message: format!("Failed to create project directory: {}", e),
                })?;
        }

        let json = serde_json::to_string_pretty(trigger)?;

        // Write to a temporary file first so readers never see partial builds
        let temp_path = path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path)
            .await
            .map_err(|e| StoreError::WriteFailed {
                message: format!("Failed to create temp file: {}", e),
            })?;

        file.write_all(json.as_bytes())
            .await
            .map_err(|e| StoreError::WriteFailed {
                message: format!("Failed to write build: {}", e),
            })?;

        file.flush().await.map_err(|e| StoreError::WriteFailed {
            message: format!("Failed to flush file: {}", e),
        })?;

        fs::rename(&temp_path, &path)
            .await
            .map_err(|e| StoreError::WriteFailed {
                message: format!("Failed to finalize build file: {}", e),
            })?;

        debug!(path = %path.display(), "Build written");
        Ok(())
    }
}

#[cfg(test)]
#[path = "filesystem_recorder_tests.rs"]
mod tests;

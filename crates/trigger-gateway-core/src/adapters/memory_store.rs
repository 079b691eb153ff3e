//! # In-Memory Store
//!
//! Thread-safe store holding projects and recorded builds in memory.
//! Suitable for development and tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::build::BuildTrigger;
use crate::project::Project;
use crate::store::{BuildRecorder, ProjectStore, StoreError};

/// Project and build store kept in memory.
///
/// Clones share the same underlying data.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    projects: Arc<RwLock<HashMap<String, Project>>>,
    builds: Arc<RwLock<Vec<BuildTrigger>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `project`.
    pub fn with_project(self, project: Project) -> Self {
        self.insert_project(project);
        self
    }

    /// Add or replace a project, keyed by name.
    pub fn insert_project(&self, project: Project) {
        // Inserts are single operations; a poisoned map is still consistent.
        let mut projects = match self.projects.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        projects.insert(project.name.clone(), project);
    }

    /// Snapshot of every build recorded so far, in recording order.
    pub fn builds(&self) -> Vec<BuildTrigger> {
        match self.builds.read() {
            Ok(builds) => builds.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn build_count(&self) -> usize {
        self.builds().len()
    }
}

#[async_trait]
impl ProjectStore for InMemoryStore {
    async fn get_project(&self, name: &str) -> Result<Project, StoreError> {
        let projects = self.projects.read().map_err(|e| StoreError::Unavailable {
            message: format!("project lock poisoned: {}", e),
        })?;

        projects
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::ProjectNotFound {
                name: name.to_string(),
            })
    }
}

#[async_trait]
impl BuildRecorder for InMemoryStore {
    async fn create_build(&self, trigger: &BuildTrigger) -> Result<(), StoreError> {
        let mut builds = self.builds.write().map_err(|e| StoreError::WriteFailed {
            message: format!("build lock poisoned: {}", e),
        })?;
        builds.push(trigger.clone());
        Ok(())
    }
}

#[cfg(test)]
#[path = "memory_store_tests.rs"]
mod tests;

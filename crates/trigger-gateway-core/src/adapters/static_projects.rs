//! Projects declared in configuration.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::config::ProjectConfig;
use crate::project::Project;
use crate::store::{ProjectStore, StoreError};

/// Read-only [`ProjectStore`] built once from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticProjectStore {
    projects: HashMap<String, Project>,
}

impl StaticProjectStore {
    /// Build the store; a later entry with the same name replaces an earlier one.
    pub fn new(projects: impl IntoIterator<Item = ProjectConfig>) -> Self {
        let projects = projects
            .into_iter()
            .map(Project::from)
            .map(|p| (p.name.clone(), p))
            .collect();
        Self { projects }
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }
}

#[async_trait]
impl ProjectStore for StaticProjectStore {
    async fn get_project(&self, name: &str) -> Result<Project, StoreError> {
        self.projects
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::ProjectNotFound {
                name: name.to_string(),
            })
    }
}

#[cfg(test)]
#[path = "static_projects_tests.rs"]
mod tests;

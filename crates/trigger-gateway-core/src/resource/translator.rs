//! Snapshot to build trigger translation.

use std::sync::Arc;

use github_bot_sdk::{AuthenticationProvider, InstallationId};
use tracing::{debug, info, instrument};

use super::{annotations, decide_action, ResourceAction, ResourceSnapshot};
use crate::build::{BuildPayload, BuildTrigger, Revision, RESOURCE_PROVIDER};
use crate::config::{GatewayConfig, ResourceMapping};
use crate::store::{BuildRecorder, ProjectStore, StoreError};
use crate::webhook::split_full_name;
use crate::{BuildId, GatewayError, ParseError};

/// Result of one successful reconciliation.
#[derive(Debug, Clone)]
pub struct Reconciled {
    /// The snapshot with its phase set to `completed`.
    pub snapshot: ResourceSnapshot,
    pub action: ResourceAction,
    /// Qualified event type of the recorded trigger.
    pub event_type: String,
    pub build_id: BuildId,
}

/// Translates snapshots of one mapped resource kind into build triggers.
pub struct ResourceStateTranslator {
    mapping: ResourceMapping,
    config: Arc<GatewayConfig>,
    projects: Arc<dyn ProjectStore>,
    recorder: Arc<dyn BuildRecorder>,
    auth: Arc<dyn AuthenticationProvider>,
}

impl ResourceStateTranslator {
    pub fn new(
        mapping: ResourceMapping,
        config: Arc<GatewayConfig>,
        projects: Arc<dyn ProjectStore>,
        recorder: Arc<dyn BuildRecorder>,
        auth: Arc<dyn AuthenticationProvider>,
    ) -> Self {
        Self {
            mapping,
            config,
            projects,
            recorder,
            auth,
        }
    }

    pub fn mapping(&self) -> &ResourceMapping {
        &self.mapping
    }

    /// Record the trigger for `snapshot` and return the updated snapshot.
    ///
    /// Exactly one trigger is recorded on success and none on failure.
    ///
    /// # Errors
    ///
    /// - `GatewayError::Parse` for a snapshot of another kind, a non-numeric
    ///   installation id or a repository annotation without an owner
    /// - `GatewayError::NotFound` when the mapped project does not exist
    /// - `GatewayError::TokenExchange` when a token cannot be obtained
    /// - `GatewayError::Store` when the trigger cannot be recorded
    #[instrument(skip(self, snapshot), fields(
        kind = %self.mapping.kind,
        project = %self.mapping.project,
        resource = %snapshot.metadata.name,
    ))]
    pub async fn handle_state(
        &self,
        mut snapshot: ResourceSnapshot,
    ) -> Result<Reconciled, GatewayError> {
        if !snapshot.kind.is_empty() && !self.mapping.matches_kind(&snapshot.kind) {
            return Err(ParseError::UnexpectedKind {
                expected: self.mapping.kind.clone(),
                actual: snapshot.kind.clone(),
            }
            .into());
        }

        let prefix = self.mapping.event_prefix();
        let action = decide_action(&snapshot);
        let event_type = format!("{}:{}", prefix, action);

        // Annotations are validated before anything remote is touched
        let installation_id = parse_installation_id(&snapshot)?;
        let repository = snapshot
            .annotation(annotations::GIT_REPO)
            .map(split_full_name)
            .transpose()?
            .map(|(owner, repo)| (owner.to_string(), repo.to_string()));
        let pull = snapshot.annotation(annotations::PULL_ID).map(str::to_string);
        let commit = snapshot
            .annotation(annotations::GIT_COMMIT)
            .map(str::to_string);
        let branch = snapshot
            .annotation(annotations::GIT_BRANCH)
            .map(str::to_string)
            .or_else(|| {
                commit
                    .is_none()
                    .then(|| self.config.default_branch.clone())
            });

        let project = self
            .projects
            .get_project(&self.mapping.project)
            .await
            .map_err(|e| match e {
                StoreError::ProjectNotFound { name } => GatewayError::NotFound {
                    what: format!("Project '{}'", name),
                },
                other => GatewayError::Store(other),
            })?;
        let api_url = project.api_url(&self.config.github_api_url);

        let body = serde_json::to_value(&snapshot).map_err(ParseError::from)?;
        let mut payload = BuildPayload::new(prefix, body);

        if let (Some(_), Some(installation_id)) = (self.config.app_id(), installation_id) {
            let token = crate::remote::installation_token(
                self.auth.as_ref(),
                api_url,
                Some(installation_id),
                self.config.remote_timeout(),
            )
            .await?;
            payload.token = Some(token.token().to_string());
            payload.token_expires = Some(token.expires_at());
        } else {
            debug!("No App credential or installation; payload carries no token");
        }

        if let (Some((owner, repo)), Some(pull)) = (&repository, &pull) {
            payload.pull_url = Some(format!(
                "{}/repos/{}/{}/pulls/{}",
                api_url.trim_end_matches('/'),
                owner,
                repo,
                pull
            ));
        }
        if let Some((owner, repo)) = repository {
            payload.owner = Some(owner);
            payload.repo = Some(repo);
        }
        payload.pull = pull;
        payload.commit = commit.clone();
        payload.branch = branch.clone();

        let revision = Revision {
            commit,
            git_ref: branch.map(|b| format!("refs/heads/{}", b)),
        }
        .with_default_ref(&self.config.default_ref());

        let trigger =
            BuildTrigger::new(&project, &event_type, RESOURCE_PROVIDER, revision, &payload)?;
        self.recorder.create_build(&trigger).await?;

        info!(
            build_id = %trigger.build_id,
            project_id = %trigger.project_id,
            event = %event_type,
            "Build trigger recorded"
        );

        snapshot.mark_completed();

        Ok(Reconciled {
            snapshot,
            action,
            event_type,
            build_id: trigger.build_id,
        })
    }
}

/// Installation id annotation; absent and zero both mean none.
fn parse_installation_id(
    snapshot: &ResourceSnapshot,
) -> Result<Option<InstallationId>, ParseError> {
    let Some(raw) = snapshot.annotation(annotations::INSTALLATION_ID) else {
        return Ok(None);
    };

    let id = raw.parse::<u64>().map_err(|_| ParseError::InvalidFormat {
        expected: format!("numeric {}", annotations::INSTALLATION_ID),
        actual: raw.to_string(),
    })?;

    Ok(InstallationId::non_zero(id))
}

#[cfg(test)]
#[path = "translator_tests.rs"]
mod tests;

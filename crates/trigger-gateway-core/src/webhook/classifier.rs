//! Webhook classification.

use std::sync::Arc;

use github_bot_sdk::{AuthenticationProvider, GitHubApiClient, InstallationId};
use tracing::{debug, info, instrument, warn};

use super::enrichment;
use super::events::IssueCommentEvent;
use super::{EventKind, WebhookDelivery, WebhookOutcome};
use crate::build::{BuildPayload, BuildTrigger, Revision, GITHUB_PROVIDER};
use crate::config::GatewayConfig;
use crate::emission::EmissionFilter;
use crate::signature::{resolve_secret, verify_signature};
use crate::store::{BuildRecorder, ProjectStore, StoreError};
use crate::{GatewayError, ParseError};

/// Turns webhook deliveries into build triggers.
///
/// Holds no per-delivery state; one instance is shared by every request.
pub struct WebhookEventClassifier {
    config: Arc<GatewayConfig>,
    filter: EmissionFilter,
    projects: Arc<dyn ProjectStore>,
    recorder: Arc<dyn BuildRecorder>,
    auth: Arc<dyn AuthenticationProvider>,
    github: Arc<dyn GitHubApiClient>,
}

impl WebhookEventClassifier {
    pub fn new(
        config: Arc<GatewayConfig>,
        projects: Arc<dyn ProjectStore>,
        recorder: Arc<dyn BuildRecorder>,
        auth: Arc<dyn AuthenticationProvider>,
        github: Arc<dyn GitHubApiClient>,
    ) -> Self {
        let filter = config.emission_filter();
        Self {
            config,
            filter,
            projects,
            recorder,
            auth,
            github,
        }
    }

    /// Handle one delivery.
    ///
    /// # Errors
    ///
    /// - `GatewayError::Parse` for an unreadable body
    /// - `GatewayError::NotFound` for an unknown project or pull request
    /// - `GatewayError::Config` when no secret applies to the project
    /// - `GatewayError::Auth` for a missing or wrong signature
    /// - `GatewayError::TokenExchange` when enrichment cannot authenticate
    /// - `GatewayError::RemoteApi` or `GatewayError::Store` for downstream failures
    #[instrument(skip(self, delivery), fields(
        kind = %delivery.kind,
        delivery_id = delivery.delivery_id.as_deref().unwrap_or("-"),
    ))]
    pub async fn handle(&self, delivery: &WebhookDelivery) -> Result<WebhookOutcome, GatewayError> {
        match &delivery.kind {
            EventKind::Ping => {
                info!("Ping acknowledged");
                Ok(WebhookOutcome::Acknowledged)
            }
            EventKind::IssueComment => self.handle_issue_comment(delivery).await,
            EventKind::Unrecognized(kind) => {
                debug!(kind = %kind, "Ignoring unsupported event kind");
                Ok(WebhookOutcome::Ignored { kind: kind.clone() })
            }
        }
    }

    async fn handle_issue_comment(
        &self,
        delivery: &WebhookDelivery,
    ) -> Result<WebhookOutcome, GatewayError> {
        // 1. Parse; the raw value is forwarded untouched.
        let body: serde_json::Value =
            serde_json::from_slice(&delivery.body).map_err(ParseError::from)?;
        let event: IssueCommentEvent =
            serde_json::from_value(body.clone()).map_err(ParseError::from)?;

        // 2. Resolve the project and authenticate the delivery against it
        let project = self
            .projects
            .get_project(&event.repository.full_name)
            .await
            .map_err(|e| match e {
                StoreError::ProjectNotFound { name } => GatewayError::NotFound {
                    what: format!("Project '{}'", name),
                },
                other => GatewayError::Store(other),
            })?;

        let secret = resolve_secret(&project, self.config.default_shared_secret.as_ref())?;
        verify_signature(&delivery.body, delivery.signature.as_deref(), secret)?;

        // 3. Enrich pull request comments from allowed authors
        let kind = EventKind::IssueComment;
        let mut payload = BuildPayload::new(kind.as_str(), body);
        let mut revision = Revision::default();

        if self.should_enrich(&event) {
            let installation_id = event
                .installation
                .and_then(|i| InstallationId::non_zero(i.id))
                .or(delivery.route_installation);

            let context = enrichment::pull_request_context(
                self.auth.as_ref(),
                self.github.as_ref(),
                project.api_url(&self.config.github_api_url),
                installation_id,
                &event,
                self.config.remote_timeout(),
            )
            .await
            .inspect_err(|e| warn!(error = %e, "Pull request enrichment failed"))?;

            context.apply(&mut payload);
            revision = context.revision;
        }

        let revision = revision.with_default_ref(&self.config.default_ref());

        // 4. Emit the bare kind, then the kind qualified by action
        let mut names = vec![kind.as_str().to_string()];
        if let Some(action) = event.action() {
            names.push(format!("{}:{}", kind, action));
        }

        let mut emitted = Vec::new();
        let mut filtered = Vec::new();
        for name in names {
            if !self.filter.should_emit(&name) {
                debug!(event = %name, "Event filtered out");
                filtered.push(name);
                continue;
            }

            let trigger =
                BuildTrigger::new(&project, &name, GITHUB_PROVIDER, revision.clone(), &payload)?;
            self.recorder.create_build(&trigger).await?;

            info!(
                build_id = %trigger.build_id,
                project_id = %trigger.project_id,
                event = %name,
                "Build trigger recorded"
            );
            emitted.push(name);
        }

        Ok(WebhookOutcome::Completed { emitted, filtered })
    }

    fn should_enrich(&self, event: &IssueCommentEvent) -> bool {
        if !event.is_created_or_edited() || !event.issue.is_pull_request() {
            return false;
        }

        let association = event.comment.author_association.as_deref().unwrap_or("");
        if !self.config.is_author_allowed(association) {
            debug!(
                author_association = %association,
                "Author not allowed to trigger pull request builds"
            );
            return false;
        }

        true
    }
}

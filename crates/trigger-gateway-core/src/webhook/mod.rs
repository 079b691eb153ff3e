//! # Webhook Processing
//!
//! Classifies GitHub webhook deliveries into build triggers.
//!
//! Deliveries are dispatched on their declared kind:
//! - `ping` is acknowledged without creating anything
//! - `issue_comment` is verified, optionally enriched from its pull request,
//!   and emitted as `issue_comment` and `issue_comment:{action}`
//! - every other kind is acknowledged as ignored, so new upstream event kinds
//!   never fail a delivery

use bytes::Bytes;
use github_bot_sdk::InstallationId;
use std::fmt;

mod classifier;
mod enrichment;
mod events;

pub use classifier::WebhookEventClassifier;
pub(crate) use events::split_full_name;
pub use events::{
    CommentPayload, InstallationRef, IssueCommentEvent, IssuePayload, IssuePullRequestLinks,
    RepositoryPayload,
};

/// Delivery kinds the gateway distinguishes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Liveness check sent when a hook is created.
    Ping,
    /// Comment created, edited or deleted on an issue or pull request.
    IssueComment,
    /// Any other kind; acknowledged and otherwise dropped.
    Unrecognized(String),
}

impl EventKind {
    /// Classify the value of the event kind header.
    pub fn from_header(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "ping" => Self::Ping,
            "issue_comment" => Self::IssueComment,
            other => Self::Unrecognized(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Ping => "ping",
            Self::IssueComment => "issue_comment",
            Self::Unrecognized(kind) => kind,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One inbound webhook request.
#[derive(Debug, Clone)]
pub struct WebhookDelivery {
    pub kind: EventKind,
    /// Raw body exactly as received; signatures are computed over these bytes.
    pub body: Bytes,
    /// `algorithm=hexdigest` signature header value.
    pub signature: Option<String>,
    pub delivery_id: Option<String>,
    /// Installation named by the delivery URL, used when the body has none.
    pub route_installation: Option<InstallationId>,
}

impl WebhookDelivery {
    pub fn new(kind: EventKind, body: impl Into<Bytes>) -> Self {
        Self {
            kind,
            body: body.into(),
            signature: None,
            delivery_id: None,
            route_installation: None,
        }
    }

    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    pub fn with_delivery_id(mut self, delivery_id: impl Into<String>) -> Self {
        self.delivery_id = Some(delivery_id.into());
        self
    }

    pub fn with_route_installation(mut self, installation: Option<InstallationId>) -> Self {
        self.route_installation = installation;
        self
    }
}

/// Result of handling a delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// Liveness check answered.
    Acknowledged,
    /// Unsupported kind, nothing done.
    Ignored { kind: String },
    /// Delivery processed; lists trigger names recorded and filtered out.
    Completed {
        emitted: Vec<String>,
        filtered: Vec<String>,
    },
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;

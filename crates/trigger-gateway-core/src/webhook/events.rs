//! Typed views of the webhook bodies the gateway reads.
//!
//! Only the fields used for classification are modelled. The untouched body
//! travels on to the build payload as raw JSON.

use serde::Deserialize;

use crate::ParseError;

/// `issue_comment` webhook body.
#[derive(Debug, Clone, Deserialize)]
pub struct IssueCommentEvent {
    #[serde(default)]
    pub action: Option<String>,
    pub issue: IssuePayload,
    pub comment: CommentPayload,
    pub repository: RepositoryPayload,
    #[serde(default)]
    pub installation: Option<InstallationRef>,
}

impl IssueCommentEvent {
    pub fn action(&self) -> Option<&str> {
        self.action.as_deref().map(str::trim).filter(|a| !a.is_empty())
    }

    /// Whether the comment was created or edited; deletions never enrich.
    pub fn is_created_or_edited(&self) -> bool {
        matches!(self.action(), Some("created") | Some("edited"))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct IssuePayload {
    pub number: u64,
    /// Present only when the issue is a pull request.
    #[serde(default)]
    pub pull_request: Option<IssuePullRequestLinks>,
}

impl IssuePayload {
    pub fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IssuePullRequestLinks {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentPayload {
    #[serde(default)]
    pub author_association: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryPayload {
    pub full_name: String,
}

impl RepositoryPayload {
    /// Split `owner/repo`.
    pub fn owner_and_name(&self) -> Result<(&str, &str), ParseError> {
        split_full_name(&self.full_name)
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct InstallationRef {
    pub id: u64,
}

/// Split an `owner/repo` name; both halves must be non-empty.
pub(crate) fn split_full_name(full_name: &str) -> Result<(&str, &str), ParseError> {
    match full_name.trim().split_once('/') {
        Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
            Ok((owner, repo))
        }
        _ => Err(ParseError::InvalidFormat {
            expected: "owner/repo".to_string(),
            actual: full_name.to_string(),
        }),
    }
}

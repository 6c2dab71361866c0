//! Collaborator boundary and the end-to-end reconciliation run.
//!
//! The core never talks to a chat platform directly. It is handed a
//! [`RosterSource`] for the duration of one run; implementations own the
//! transport and credentials.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    fetch_all, normalize, reconcile, DesiredRoster, Page, PagerPolicy, RawDirectoryUser,
    ReconcileResult, ReportWarning,
};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors a [`RosterSource`] may return. Any of them aborts the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// Network or transport failure (including timeouts).
    Transport(String),
    /// The platform answered with an application-level error.
    Api { code: Option<u16>, message: String },
    /// A response payload could not be decoded.
    Decode(String),
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::Transport(msg) => write!(f, "transport error: {msg}"),
            SourceError::Api {
                code: Some(c),
                message,
            } => write!(f, "platform api error code={c}: {message}"),
            SourceError::Api {
                code: None,
                message,
            } => write!(f, "platform api error: {message}"),
            SourceError::Decode(msg) => write!(f, "decode error: {msg}"),
        }
    }
}

impl std::error::Error for SourceError {}

// ---------------------------------------------------------------------------
// Collaborator trait
// ---------------------------------------------------------------------------

/// Paginated read access to one workspace.
///
/// Object-safe so callers can hold `&dyn RosterSource`.
#[async_trait::async_trait]
pub trait RosterSource: Send + Sync {
    /// Human-readable name for logs (e.g. `"slack"`).
    fn name(&self) -> &'static str;

    /// One page of member ids of `channel_id`.
    async fn channel_members_page(
        &self,
        channel_id: &str,
        cursor: Option<String>,
    ) -> Result<Page<String>, SourceError>;

    /// One page of the workspace user directory.
    async fn directory_page(
        &self,
        cursor: Option<String>,
    ) -> Result<Page<RawDirectoryUser>, SourceError>;
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileRun {
    pub run_id: Uuid,
    pub channel_id: String,
    pub result: ReconcileResult,
    pub member_pages: u32,
    pub directory_pages: u32,
    pub members_truncated: bool,
    pub directory_truncated: bool,
}

impl ReconcileRun {
    /// Warnings that belong in the report for this run.
    pub fn warnings(&self) -> Vec<ReportWarning> {
        let mut out = Vec::new();
        if self.members_truncated {
            out.push(ReportWarning::MembersTruncated {
                pages: self.member_pages,
            });
        }
        if self.directory_truncated {
            out.push(ReportWarning::DirectoryTruncated {
                pages: self.directory_pages,
            });
        }
        if !self.result.unresolved_member_ids.is_empty() {
            out.push(ReportWarning::UnresolvedMembers {
                count: self.result.unresolved_member_ids.len(),
            });
        }
        out
    }
}

/// Fetch channel members, then the directory, and reconcile against `desired`.
///
/// The two fetches run one after the other, so membership may change in
/// between; members missing from the directory end up in
/// `unresolved_member_ids`.
pub async fn run_reconciliation(
    source: &dyn RosterSource,
    channel_id: &str,
    desired: &DesiredRoster,
    policy: &PagerPolicy,
) -> Result<ReconcileRun, SourceError> {
    let run_id = Uuid::new_v4();
    info!(%run_id, source = source.name(), channel_id, desired = desired.len(), "reconcile start");

    let members = fetch_all(policy, None, |cursor| {
        source.channel_members_page(channel_id, cursor)
    })
    .await?;
    info!(%run_id, count = members.items.len(), pages = members.pages, "channel members fetched");
    debug!(%run_id, ids = %members.items.join(","), "channel member ids");

    let raw = fetch_all(policy, None, |cursor| source.directory_page(cursor)).await?;
    let directory = normalize(&raw.items);
    info!(
        %run_id,
        raw = raw.items.len(),
        kept = directory.len(),
        pages = raw.pages,
        "directory fetched"
    );

    let result = reconcile(&desired.emails, &members.items, &directory);
    info!(
        %run_id,
        in_channel = result.desired_emails_in_channel.len(),
        invite = result.users_to_invite.len(),
        unknown = result.emails_to_invite_unknown.len(),
        remove = result.users_to_remove.len(),
        bots = result.channel_bot_ids.len(),
        unresolved = result.unresolved_member_ids.len(),
        "reconcile done"
    );

    Ok(ReconcileRun {
        run_id,
        channel_id: channel_id.to_string(),
        result,
        member_pages: members.pages,
        directory_pages: raw.pages,
        members_truncated: members.truncated,
        directory_truncated: raw.truncated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_error_display_api_with_code() {
        let err = SourceError::Api {
            code: Some(429),
            message: "ratelimited".to_string(),
        };
        assert_eq!(err.to_string(), "platform api error code=429: ratelimited");
    }

    #[test]
    fn source_error_display_api_no_code() {
        let err = SourceError::Api {
            code: None,
            message: "channel_not_found".to_string(),
        };
        assert_eq!(err.to_string(), "platform api error: channel_not_found");
    }

    #[test]
    fn warnings_reflect_truncation_and_unresolved() {
        let mut run = ReconcileRun {
            run_id: Uuid::nil(),
            channel_id: "C1".to_string(),
            result: ReconcileResult::default(),
            member_pages: 15,
            directory_pages: 2,
            members_truncated: true,
            directory_truncated: false,
        };
        assert_eq!(
            run.warnings(),
            vec![ReportWarning::MembersTruncated { pages: 15 }]
        );

        run.result.unresolved_member_ids.push("U9".to_string());
        assert_eq!(run.warnings().len(), 2);
    }
}

//! Report sections for a reconciliation result.
//!
//! Section order is fixed: summary, invite, unknown invite, remove, then any
//! warnings. Markup is not decided here; `Display` gives a plain-text
//! rendering and chat adapters render sections in their own format.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ReconcileResult;

/// Where the report is delivered: the channel it concerns and the requester.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportContext {
    pub channel_id: String,
    pub requester_id: String,
}

/// Conditions that make a report less trustworthy than it looks.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportWarning {
    /// Channel member fetch stopped at the page cap.
    MembersTruncated { pages: u32 },
    /// Directory fetch stopped at the page cap.
    DirectoryTruncated { pages: u32 },
    /// Channel members that were not found in the directory snapshot.
    UnresolvedMembers { count: usize },
}

impl fmt::Display for ReportWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportWarning::MembersTruncated { pages } => write!(
                f,
                "channel member list truncated after {pages} pages; results may be incomplete"
            ),
            ReportWarning::DirectoryTruncated { pages } => write!(
                f,
                "workspace directory truncated after {pages} pages; results may be incomplete"
            ),
            ReportWarning::UnresolvedMembers { count } => write!(
                f,
                "{count} channel member(s) not found in the workspace directory"
            ),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "section", rename_all = "snake_case")]
pub enum ReportSection {
    Summary {
        desired: usize,
        current_humans: usize,
        in_channel: usize,
    },
    /// Known users to invite, by email.
    Invite { emails: Vec<String> },
    /// Desired emails with no directory account.
    UnknownInvite { emails: Vec<String> },
    /// Human members to remove, by user id.
    Remove { user_ids: Vec<String> },
    Warning { warning: ReportWarning },
}

impl fmt::Display for ReportSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportSection::Summary {
                desired,
                current_humans,
                in_channel,
            } => write!(
                f,
                "roster: {desired}, channel members: {current_humans}, roster members in channel: {in_channel}"
            ),
            ReportSection::Invite { emails } => {
                write!(f, "to invite ({}): {}", emails.len(), emails.join(","))
            }
            ReportSection::UnknownInvite { emails } => write!(
                f,
                "to invite, not in workspace ({}): {}",
                emails.len(),
                emails.join(",")
            ),
            ReportSection::Remove { user_ids } => {
                write!(f, "to remove ({}): {}", user_ids.len(), user_ids.join(","))
            }
            ReportSection::Warning { warning } => write!(f, "warning: {warning}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub channel_id: String,
    pub requester_id: String,
    pub sections: Vec<ReportSection>,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, s) in self.sections.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{s}")?;
        }
        Ok(())
    }
}

/// Build the report for `result`.
///
/// Bots in `users_to_remove` are never listed.
pub fn format(result: &ReconcileResult, ctx: &ReportContext, warnings: &[ReportWarning]) -> Report {
    let mut sections = vec![
        ReportSection::Summary {
            desired: result.desired_emails.len(),
            current_humans: result.current_human_emails.len(),
            in_channel: result.desired_emails_in_channel.len(),
        },
        ReportSection::Invite {
            emails: result
                .users_to_invite
                .iter()
                .filter_map(|u| u.email.clone())
                .collect(),
        },
        ReportSection::UnknownInvite {
            emails: result.emails_to_invite_unknown.clone(),
        },
        ReportSection::Remove {
            user_ids: result.humans_to_remove().map(|u| u.id.clone()).collect(),
        },
    ];
    sections.extend(
        warnings
            .iter()
            .cloned()
            .map(|warning| ReportSection::Warning { warning }),
    );

    Report {
        channel_id: ctx.channel_id.clone(),
        requester_id: ctx.requester_id.clone(),
        sections,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CanonicalUser;

    fn ctx() -> ReportContext {
        ReportContext {
            channel_id: "C1".to_string(),
            requester_id: "U0".to_string(),
        }
    }

    fn sample() -> ReconcileResult {
        let mut bot = CanonicalUser::bot("B1", "BB1");
        bot.email = Some("bot@x.com".to_string());
        ReconcileResult {
            desired_emails: vec!["a@x.com".into(), "b@x.com".into(), "n@x.com".into()],
            desired_emails_in_channel: vec!["a@x.com".into()],
            users_to_invite: vec![CanonicalUser::human("U2", "b@x.com")],
            emails_to_invite_unknown: vec!["n@x.com".into()],
            users_to_remove: vec![CanonicalUser::human("U3", "c@x.com"), bot],
            current_human_emails: vec!["a@x.com".into(), "c@x.com".into()],
            channel_bot_ids: vec![],
            unresolved_member_ids: vec![],
        }
    }

    #[test]
    fn sections_come_in_fixed_order() {
        let r = format(&sample(), &ctx(), &[]);
        assert_eq!(r.sections.len(), 4);
        assert!(matches!(r.sections[0], ReportSection::Summary { .. }));
        assert!(matches!(r.sections[1], ReportSection::Invite { .. }));
        assert!(matches!(r.sections[2], ReportSection::UnknownInvite { .. }));
        assert!(matches!(r.sections[3], ReportSection::Remove { .. }));
    }

    #[test]
    fn summary_counts() {
        let r = format(&sample(), &ctx(), &[]);
        assert_eq!(
            r.sections[0],
            ReportSection::Summary {
                desired: 3,
                current_humans: 2,
                in_channel: 1
            }
        );
    }

    #[test]
    fn bots_are_not_rendered_in_remove() {
        let r = format(&sample(), &ctx(), &[]);
        assert_eq!(
            r.sections[3],
            ReportSection::Remove {
                user_ids: vec!["U3".to_string()]
            }
        );
    }

    #[test]
    fn warnings_follow_fixed_sections() {
        let w = [ReportWarning::DirectoryTruncated { pages: 15 }];
        let r = format(&sample(), &ctx(), &w);
        assert_eq!(r.sections.len(), 5);
        assert_eq!(
            r.sections[4],
            ReportSection::Warning {
                warning: ReportWarning::DirectoryTruncated { pages: 15 }
            }
        );
    }

    #[test]
    fn plain_text_rendering() {
        let text = format(&sample(), &ctx(), &[]).to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "roster: 3, channel members: 2, roster members in channel: 1"
        );
        assert_eq!(lines[1], "to invite (1): b@x.com");
        assert_eq!(lines[2], "to invite, not in workspace (1): n@x.com");
        assert_eq!(lines[3], "to remove (1): U3");
    }
}

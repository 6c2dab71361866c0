use serde::{Deserialize, Serialize};

/// Directory entry as handed over by a roster source, before normalization.
///
/// Every field is optional: an entry with missing or mistyped fields
/// degrades to `None`/`false` instead of failing the whole batch.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDirectoryUser {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub bot_id: Option<String>,
    #[serde(default)]
    pub deleted: Option<bool>,
    #[serde(default)]
    pub is_admin: Option<bool>,
    #[serde(default)]
    pub is_bot: Option<bool>,
    #[serde(default)]
    pub is_owner: Option<bool>,
}

/// Normalized directory record keyed by platform user id.
///
/// Bot accounts usually carry no email.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalUser {
    pub id: String,
    pub email: Option<String>,
    pub is_deleted: bool,
    pub bot_id: Option<String>,
    pub is_bot: bool,
    pub is_admin: bool,
    pub is_owner: bool,
}

impl CanonicalUser {
    /// Human (non-bot) account with an email. Test and fixture helper.
    pub fn human(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: Some(email.into()),
            is_deleted: false,
            bot_id: None,
            is_bot: false,
            is_admin: false,
            is_owner: false,
        }
    }

    /// Bot account without an email.
    pub fn bot(id: impl Into<String>, bot_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: None,
            is_deleted: false,
            bot_id: Some(bot_id.into()),
            is_bot: true,
            is_admin: false,
            is_owner: false,
        }
    }

    pub fn email_str(&self) -> Option<&str> {
        self.email.as_deref()
    }
}

/// Desired channel roster, expressed as emails.
///
/// Order and duplicates are preserved exactly as entered.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredRoster {
    pub emails: Vec<String>,
}

impl DesiredRoster {
    /// Parse a comma-separated free-text field.
    ///
    /// Tokens are trimmed and empty tokens dropped. An empty or all-whitespace
    /// input yields an empty roster, which is valid (everyone gets removed).
    pub fn parse(raw: &str) -> Self {
        let emails = raw
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
        Self { emails }
    }

    pub fn len(&self) -> usize {
        self.emails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }
}

/// Output of [`crate::reconcile`]. Read-only aggregate.
///
/// `users_to_remove` keeps every resolved record, bots included; display
/// filtering is left to the report.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileResult {
    pub desired_emails: Vec<String>,
    pub desired_emails_in_channel: Vec<String>,
    pub users_to_invite: Vec<CanonicalUser>,
    pub emails_to_invite_unknown: Vec<String>,
    pub users_to_remove: Vec<CanonicalUser>,
    pub current_human_emails: Vec<String>,
    /// Channel members that resolved to bot directory entries.
    pub channel_bot_ids: Vec<String>,
    /// Channel members missing from the directory snapshot.
    pub unresolved_member_ids: Vec<String>,
}

impl ReconcileResult {
    /// Members to remove that are not bots.
    pub fn humans_to_remove(&self) -> impl Iterator<Item = &CanonicalUser> {
        self.users_to_remove.iter().filter(|u| !u.is_bot)
    }

    /// True when nobody needs to be invited or removed.
    pub fn is_in_sync(&self) -> bool {
        self.users_to_invite.is_empty()
            && self.emails_to_invite_unknown.is_empty()
            && self.users_to_remove.is_empty()
    }
}

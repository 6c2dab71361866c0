//! Slack Web API wire shapes.
//!
//! Only the fields this service reads are declared; unknown fields are
//! ignored so API additions never break decoding.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use scm_roster::RawDirectoryUser;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseMetadata {
    #[serde(default)]
    pub next_cursor: Option<String>,
}

/// `conversations.members`
#[derive(Debug, Clone, Deserialize)]
pub struct ConversationsMembersResponse {
    #[serde(default)]
    pub members: Vec<String>,
    #[serde(default)]
    pub response_metadata: Option<ResponseMetadata>,
}

/// `users.list`. Members stay untyped here and are decoded one by one.
#[derive(Debug, Clone, Deserialize)]
pub struct UsersListResponse {
    #[serde(default)]
    pub members: Vec<Value>,
    #[serde(default)]
    pub response_metadata: Option<ResponseMetadata>,
}

fn str_field(v: &Value, key: &str) -> Option<String> {
    v.get(key).and_then(Value::as_str).map(str::to_string)
}

fn bool_field(v: &Value, key: &str) -> Option<bool> {
    v.get(key).and_then(Value::as_bool)
}

/// Decode one `users.list` member field by field.
///
/// A field with the wrong type decodes as absent and leaves its siblings
/// alone, so a bad `profile` never costs the member its `id`.
pub fn decode_member(v: Value) -> RawDirectoryUser {
    let profile = v.get("profile").filter(|p| p.is_object());
    if v.get("profile").is_some_and(|p| !p.is_null() && !p.is_object()) {
        debug!(id = ?str_field(&v, "id"), "users.list member with non-object profile");
    }
    RawDirectoryUser {
        id: str_field(&v, "id"),
        email: profile.and_then(|p| str_field(p, "email")),
        bot_id: profile.and_then(|p| str_field(p, "bot_id")),
        deleted: bool_field(&v, "deleted"),
        is_admin: bool_field(&v, "is_admin"),
        is_bot: bool_field(&v, "is_bot"),
        is_owner: bool_field(&v, "is_owner"),
    }
}

/// `oauth.v2.access` success body (fields this service stores).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct OAuthAccess {
    pub access_token: String,
    #[serde(default)]
    pub app_id: Option<String>,
    #[serde(default)]
    pub scope: String,
    #[serde(default)]
    pub bot_user_id: Option<String>,
    pub team: OAuthTeam,
    #[serde(default)]
    pub authed_user: Option<OAuthAuthedUser>,
    #[serde(default)]
    pub enterprise_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct OAuthTeam {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct OAuthAuthedUser {
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn member_profile_fields_are_lifted() {
        let raw = decode_member(json!({
            "id": "U1",
            "deleted": false,
            "is_bot": false,
            "profile": {"email": "a@x.com", "real_name": "A"}
        }));
        assert_eq!(raw.id.as_deref(), Some("U1"));
        assert_eq!(raw.email.as_deref(), Some("a@x.com"));
        assert_eq!(raw.bot_id, None);
    }

    #[test]
    fn mistyped_fields_decode_as_absent() {
        let raw = decode_member(json!({"id": 42, "deleted": "yes"}));
        assert_eq!(raw, RawDirectoryUser::default());
    }

    #[test]
    fn garbage_profile_keeps_id_and_flags() {
        let raw = decode_member(json!({
            "id": "U7",
            "deleted": false,
            "is_bot": "nope",
            "profile": "garbage"
        }));
        assert_eq!(raw.id.as_deref(), Some("U7"));
        assert_eq!(raw.deleted, Some(false));
        assert_eq!(raw.is_bot, None);
        assert_eq!(raw.email, None);
    }

    #[test]
    fn missing_profile_is_tolerated() {
        let raw = decode_member(json!({"id": "B1", "is_bot": true}));
        assert_eq!(raw.is_bot, Some(true));
        assert_eq!(raw.email, None);
    }
}

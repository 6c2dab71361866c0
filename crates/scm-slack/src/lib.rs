//! scm-slack
//!
//! Slack Web API adapter.
//!
//! [`SlackClient`] is scoped to one workspace token and implements
//! [`scm_roster::RosterSource`], plus report delivery and modal opening.
//! Clients are cheap to build; callers create one per request from that
//! workspace's credential instead of sharing a process-wide client.
//!
//! Every Slack response is checked twice: HTTP status, then the `ok` flag of
//! the JSON envelope. Both failure kinds surface as [`SourceError::Api`].

pub mod blocks;
pub mod wire;

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::debug;

use scm_roster::{Page, RawDirectoryUser, Report, RosterSource, SourceError};

use crate::wire::{ConversationsMembersResponse, OAuthAccess, UsersListResponse};

pub const DEFAULT_API_BASE_URL: &str = "https://slack.com/api";
pub const DEFAULT_MEMBERS_PAGE_LIMIT: u32 = 1000;

/// Shared HTTP client with a per-request timeout. Timeouts surface as
/// [`SourceError::Transport`].
pub fn http_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder().timeout(timeout).build()
}

fn method_url(base_url: &str, method: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), method)
}

fn transport(method: &str, err: reqwest::Error) -> SourceError {
    SourceError::Transport(format!("{method}: {err}"))
}

/// Check HTTP status and the Slack `ok` envelope, then decode `T`.
async fn decode_response<T: DeserializeOwned>(
    method: &str,
    resp: reqwest::Response,
) -> Result<T, SourceError> {
    let status = resp.status();
    let body: Value = match resp.json().await {
        Ok(v) => v,
        Err(err) if status.is_success() => {
            return Err(SourceError::Decode(format!("{method}: {err}")));
        }
        Err(_) => {
            return Err(SourceError::Api {
                code: Some(status.as_u16()),
                message: format!("{method}: http {status}"),
            });
        }
    };

    let slack_error = body
        .get("error")
        .and_then(Value::as_str)
        .map(str::to_string);

    if !status.is_success() {
        return Err(SourceError::Api {
            code: Some(status.as_u16()),
            message: slack_error.unwrap_or_else(|| format!("{method}: http {status}")),
        });
    }

    if body.get("ok").and_then(Value::as_bool) != Some(true) {
        return Err(SourceError::Api {
            code: None,
            message: slack_error.unwrap_or_else(|| "unknown_error".to_string()),
        });
    }

    serde_json::from_value(body).map_err(|err| SourceError::Decode(format!("{method}: {err}")))
}

fn next_cursor(meta: Option<wire::ResponseMetadata>) -> Option<String> {
    meta.and_then(|m| m.next_cursor).filter(|c| !c.is_empty())
}

/// Workspace-scoped Slack Web API client.
#[derive(Clone)]
pub struct SlackClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    members_page_limit: u32,
}

impl std::fmt::Debug for SlackClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackClient")
            .field("base_url", &self.base_url)
            .field("token", &"<REDACTED>")
            .field("members_page_limit", &self.members_page_limit)
            .finish()
    }
}

impl SlackClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            token: token.into(),
            members_page_limit: DEFAULT_MEMBERS_PAGE_LIMIT,
        }
    }

    pub fn with_members_page_limit(mut self, limit: u32) -> Self {
        self.members_page_limit = limit;
        self
    }

    async fn get<T: DeserializeOwned>(
        &self,
        method: &str,
        query: &[(&str, String)],
    ) -> Result<T, SourceError> {
        debug!(method, "slack GET");
        let resp = self
            .http
            .get(method_url(&self.base_url, method))
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .await
            .map_err(|e| transport(method, e))?;
        decode_response(method, resp).await
    }

    async fn post_json<T: DeserializeOwned>(&self, method: &str, body: &Value) -> Result<T, SourceError> {
        debug!(method, "slack POST");
        let resp = self
            .http
            .post(method_url(&self.base_url, method))
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await
            .map_err(|e| transport(method, e))?;
        decode_response(method, resp).await
    }

    /// Deliver `report` as an ephemeral message visible only to the requester.
    pub async fn post_ephemeral(&self, report: &Report) -> Result<(), SourceError> {
        let body = json!({
            "channel": report.channel_id,
            "user": report.requester_id,
            "text": report.to_string(),
            "blocks": blocks::report_blocks(report),
        });
        let _: Value = self.post_json("chat.postEphemeral", &body).await?;
        Ok(())
    }

    /// Open a modal `view` in response to an interaction `trigger_id`.
    pub async fn open_view(&self, trigger_id: &str, view: Value) -> Result<(), SourceError> {
        let body = json!({ "trigger_id": trigger_id, "view": view });
        let _: Value = self.post_json("views.open", &body).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl RosterSource for SlackClient {
    fn name(&self) -> &'static str {
        "slack"
    }

    async fn channel_members_page(
        &self,
        channel_id: &str,
        cursor: Option<String>,
    ) -> Result<Page<String>, SourceError> {
        let mut query = vec![
            ("channel", channel_id.to_string()),
            ("limit", self.members_page_limit.to_string()),
        ];
        if let Some(c) = cursor {
            query.push(("cursor", c));
        }
        let resp: ConversationsMembersResponse = self.get("conversations.members", &query).await?;
        Ok(Page {
            items: resp.members,
            next_cursor: next_cursor(resp.response_metadata),
        })
    }

    async fn directory_page(
        &self,
        cursor: Option<String>,
    ) -> Result<Page<RawDirectoryUser>, SourceError> {
        let mut query = Vec::new();
        if let Some(c) = cursor {
            query.push(("cursor", c));
        }
        let resp: UsersListResponse = self.get("users.list", &query).await?;
        Ok(Page {
            items: resp.members.into_iter().map(wire::decode_member).collect(),
            next_cursor: next_cursor(resp.response_metadata),
        })
    }
}

/// Exchange an OAuth `code` for a workspace bot token (`oauth.v2.access`).
///
/// Authenticates with the app's client credentials, not a bearer token.
pub async fn oauth_v2_access(
    http: &reqwest::Client,
    base_url: &str,
    client_id: &str,
    client_secret: &str,
    code: &str,
) -> Result<OAuthAccess, SourceError> {
    let method = "oauth.v2.access";
    let resp = http
        .post(method_url(base_url, method))
        .form(&[
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("code", code),
        ])
        .send()
        .await
        .map_err(|e| transport(method, e))?;
    decode_response(method, resp).await
}

//! Request and response types for all scm-daemon HTTP endpoints.
//!
//! These types are `Serialize + Deserialize` so they can be JSON-encoded
//! by Axum and decoded by tests.  No business logic lives here.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// /v1/health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: String,
    pub version: String,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Body of every non-2xx response. Never carries internal error detail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// POST /slack/commands
// ---------------------------------------------------------------------------

/// Slash-command form fields this service reads. Slack sends many more.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlashCommandForm {
    pub team_id: String,
    pub channel_id: String,
    pub user_id: String,
    pub trigger_id: String,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

// ---------------------------------------------------------------------------
// POST /slack/actions
// ---------------------------------------------------------------------------

/// Interaction callbacks arrive as a form with one JSON-encoded `payload` field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionForm {
    pub payload: String,
}

// ---------------------------------------------------------------------------
// GET /slack/oauth
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OAuthRedirectQuery {
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallResponse {
    pub ok: bool,
    pub team_id: String,
}

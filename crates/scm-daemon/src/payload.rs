//! Boundary decoding of Slack interaction payloads.
//!
//! The raw `payload` JSON is decoded into [`InteractionPayload`] and then
//! narrowed to a [`RosterSubmission`]. Anything that is not a roster modal
//! submission is rejected here, before any handler logic runs.

use std::collections::HashMap;
use std::fmt;

use serde::Deserialize;

use scm_roster::DesiredRoster;
use scm_slack::blocks::{ModalMetadata, MODAL_CALLBACK_ID, ROSTER_ACTION_ID, ROSTER_BLOCK_ID};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadError {
    /// Not JSON, or JSON of the wrong shape.
    Malformed(String),
    /// A recognised interaction type this service does not handle.
    Unsupported,
    /// A view submission from some other modal.
    WrongCallback(String),
    /// `private_metadata` does not carry a channel id.
    MissingChannel,
}

impl fmt::Display for PayloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadError::Malformed(msg) => write!(f, "malformed payload: {msg}"),
            PayloadError::Unsupported => write!(f, "unsupported interaction type"),
            PayloadError::WrongCallback(id) => write!(f, "unexpected callback_id '{id}'"),
            PayloadError::MissingChannel => write!(f, "private_metadata has no channel id"),
        }
    }
}

impl std::error::Error for PayloadError {}

#[derive(Debug, Clone, Deserialize)]
pub struct IdRef {
    pub id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InputValue {
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ViewState {
    #[serde(default)]
    pub values: HashMap<String, HashMap<String, InputValue>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmittedView {
    pub callback_id: String,
    #[serde(default)]
    pub private_metadata: String,
    #[serde(default)]
    pub state: ViewState,
}

/// Interaction callbacks, tagged on Slack's `type` field.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InteractionPayload {
    ViewSubmission {
        team: IdRef,
        user: IdRef,
        view: SubmittedView,
    },
    #[serde(other)]
    Other,
}

/// A decoded roster modal submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterSubmission {
    pub team_id: String,
    pub user_id: String,
    pub channel_id: String,
    pub roster: DesiredRoster,
}

/// Decode the `payload` form field of `/slack/actions`.
pub fn decode_roster_submission(raw: &str) -> Result<RosterSubmission, PayloadError> {
    let payload: InteractionPayload =
        serde_json::from_str(raw).map_err(|e| PayloadError::Malformed(e.to_string()))?;

    let (team, user, view) = match payload {
        InteractionPayload::ViewSubmission { team, user, view } => (team, user, view),
        InteractionPayload::Other => return Err(PayloadError::Unsupported),
    };

    if view.callback_id != MODAL_CALLBACK_ID {
        return Err(PayloadError::WrongCallback(view.callback_id));
    }

    let metadata: ModalMetadata =
        serde_json::from_str(&view.private_metadata).map_err(|_| PayloadError::MissingChannel)?;
    if metadata.channel_id.trim().is_empty() {
        return Err(PayloadError::MissingChannel);
    }

    // An absent or empty input is a valid, empty roster.
    let text = view
        .state
        .values
        .get(ROSTER_BLOCK_ID)
        .and_then(|block| block.get(ROSTER_ACTION_ID))
        .and_then(|input| input.value.as_deref())
        .unwrap_or("");

    Ok(RosterSubmission {
        team_id: team.id,
        user_id: user.id,
        channel_id: metadata.channel_id,
        roster: DesiredRoster::parse(text),
    })
}

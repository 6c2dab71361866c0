//! Block Kit rendering: the roster modal and the reconciliation report.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use scm_roster::{Report, ReportSection};

/// `callback_id` of the roster modal. View submissions with any other id are rejected.
pub const MODAL_CALLBACK_ID: &str = "MODAL_MAIN";
/// `block_id` of the roster input block.
pub const ROSTER_BLOCK_ID: &str = "COMMA_SEPARATED_EMAILS";
/// `action_id` of the roster text input.
pub const ROSTER_ACTION_ID: &str = "emails";

/// State carried through the modal's `private_metadata`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModalMetadata {
    #[serde(rename = "channelId")]
    pub channel_id: String,
}

fn plain_text(text: &str) -> Value {
    json!({ "type": "plain_text", "text": text, "emoji": true })
}

/// Modal view asking for the desired roster of `channel_id`.
pub fn roster_modal(channel_id: &str) -> Value {
    let metadata = ModalMetadata {
        channel_id: channel_id.to_string(),
    };
    // A two-field struct of Strings always serializes.
    let private_metadata = serde_json::to_string(&metadata).unwrap_or_default();

    json!({
        "type": "modal",
        "callback_id": MODAL_CALLBACK_ID,
        "private_metadata": private_metadata,
        "title": plain_text("Channel members"),
        "submit": plain_text("Check"),
        "close": plain_text("Cancel"),
        "blocks": [
            {
                "type": "input",
                "block_id": ROSTER_BLOCK_ID,
                "element": {
                    "type": "plain_text_input",
                    "action_id": ROSTER_ACTION_ID,
                    "multiline": true,
                    "placeholder": { "type": "plain_text", "text": "a@example.com, b@example.com" }
                },
                "label": { "type": "plain_text", "text": "Member emails" },
                "hint": { "type": "plain_text", "text": "Separate multiple emails with commas (,)." }
            }
        ]
    })
}

pub fn section_mrkdwn(text: &str) -> Value {
    json!({
        "type": "section",
        "text": { "type": "mrkdwn", "text": text },
    })
}

/// mrkdwn text of one report section.
pub fn section_text(section: &ReportSection) -> String {
    match section {
        ReportSection::Summary {
            desired,
            current_humans,
            in_channel,
        } => format!(
            ":credit_card: roster: *{desired}*, channel members: *{current_humans}*, roster members in channel: *{in_channel}*"
        ),
        ReportSection::Invite { emails } => format!(
            "*:handshake: to invite ({})*: {}",
            emails.len(),
            emails.join(",")
        ),
        ReportSection::UnknownInvite { emails } => format!(
            "*:interrobang: to invite, not in workspace ({})*: {}",
            emails.len(),
            emails.join(",")
        ),
        ReportSection::Remove { user_ids } => {
            let mentions: Vec<String> = user_ids.iter().map(|id| format!("<@{id}>")).collect();
            format!(
                "*:no_entry_sign: to remove ({})*: {}",
                user_ids.len(),
                mentions.join(",")
            )
        }
        ReportSection::Warning { warning } => format!(":warning: {warning}"),
    }
}

pub fn report_blocks(report: &Report) -> Vec<Value> {
    report
        .sections
        .iter()
        .map(|s| section_mrkdwn(&section_text(s)))
        .collect()
}

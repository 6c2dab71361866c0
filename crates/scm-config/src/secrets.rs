//! Runtime secret resolution.
//!
//! # Contract
//! - Config YAML stores only **env var NAMES** under `slack.keys_env`.
//! - Binaries call [`resolve_secrets_for_surface`] once at startup and pass the
//!   result into constructors; no other code reads these env vars.
//! - `Debug` on [`ResolvedSecrets`] redacts every value.
//! - Error messages name the env var, never its value.
//!
//! # Enforcement
//! | Surface | Required                              |
//! |---------|---------------------------------------|
//! | DAEMON  | slack client_id, slack client_secret  |
//! | CLI     | slack bot_token                       |
//!
//! The daemon gets per-workspace bot tokens from the OAuth install flow, so a
//! static bot token is optional there.

use anyhow::{bail, Result};
use serde_json::Value;

pub const DEFAULT_CLIENT_ID_VAR: &str = "SCM_SLACK_CLIENT_ID";
pub const DEFAULT_CLIENT_SECRET_VAR: &str = "SCM_SLACK_CLIENT_SECRET";
pub const DEFAULT_BOT_TOKEN_VAR: &str = "SCM_SLACK_BOT_TOKEN";

/// Which binary is asking. Decides which secrets are mandatory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    Daemon,
    Cli,
}

impl Surface {
    pub fn as_str(&self) -> &'static str {
        match self {
            Surface::Daemon => "DAEMON",
            Surface::Cli => "CLI",
        }
    }
}

/// Secrets resolved from the environment. **Values are redacted in `Debug`.**
#[derive(Clone)]
pub struct ResolvedSecrets {
    pub slack_client_id: Option<String>,
    pub slack_client_secret: Option<String>,
    pub slack_bot_token: Option<String>,
}

impl std::fmt::Debug for ResolvedSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedSecrets")
            .field(
                "slack_client_id",
                &self.slack_client_id.as_ref().map(|_| "<REDACTED>"),
            )
            .field(
                "slack_client_secret",
                &self.slack_client_secret.as_ref().map(|_| "<REDACTED>"),
            )
            .field(
                "slack_bot_token",
                &self.slack_bot_token.as_ref().map(|_| "<REDACTED>"),
            )
            .finish()
    }
}

struct SecretEnvNames {
    client_id_var: String,
    client_secret_var: String,
    bot_token_var: String,
}

/// Non-empty trimmed string at `pointer`, if any.
fn read_str_at(config: &Value, pointer: &str) -> Option<String> {
    let s = config.pointer(pointer)?.as_str()?;
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Unset and blank variables both resolve to `None`.
fn resolve_env(var_name: &str) -> Option<String> {
    match std::env::var(var_name) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}

fn parse_env_names(config_json: &Value) -> SecretEnvNames {
    SecretEnvNames {
        client_id_var: read_str_at(config_json, "/slack/keys_env/client_id")
            .unwrap_or_else(|| DEFAULT_CLIENT_ID_VAR.to_string()),
        client_secret_var: read_str_at(config_json, "/slack/keys_env/client_secret")
            .unwrap_or_else(|| DEFAULT_CLIENT_SECRET_VAR.to_string()),
        bot_token_var: read_str_at(config_json, "/slack/keys_env/bot_token")
            .unwrap_or_else(|| DEFAULT_BOT_TOKEN_VAR.to_string()),
    }
}

fn require(value: &Option<String>, surface: Surface, var: &str, what: &str) -> Result<()> {
    if value.is_none() {
        bail!(
            "SECRETS_MISSING surface={}: required env var '{}' ({}) is not set or empty",
            surface.as_str(),
            var,
            what,
        );
    }
    Ok(())
}

/// Resolve Slack secrets for `surface`, failing on the first missing required one.
pub fn resolve_secrets_for_surface(config_json: &Value, surface: Surface) -> Result<ResolvedSecrets> {
    let names = parse_env_names(config_json);

    let slack_client_id = resolve_env(&names.client_id_var);
    let slack_client_secret = resolve_env(&names.client_secret_var);
    let slack_bot_token = resolve_env(&names.bot_token_var);

    match surface {
        Surface::Daemon => {
            require(&slack_client_id, surface, &names.client_id_var, "slack client_id")?;
            require(
                &slack_client_secret,
                surface,
                &names.client_secret_var,
                "slack client_secret",
            )?;
        }
        Surface::Cli => {
            require(&slack_bot_token, surface, &names.bot_token_var, "slack bot_token")?;
        }
    }

    Ok(ResolvedSecrets {
        slack_client_id,
        slack_client_secret,
        slack_bot_token,
    })
}

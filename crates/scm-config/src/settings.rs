//! Typed view of the merged configuration.
//!
//! Every key has a default so an empty config is valid. Unknown keys are
//! ignored here; secrets live under `slack.keys_env` and are handled by
//! [`crate::secrets`].

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlackSettings {
    /// Web API root, e.g. `https://slack.com/api`. Tests point this at a mock.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// `limit` sent with every channel member page request.
    #[serde(default = "default_members_page_limit")]
    pub members_page_limit: u32,
    /// Page cap for every paginated fetch.
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
    /// Per-request HTTP timeout.
    #[serde(default = "default_http_timeout_ms")]
    pub http_timeout_ms: u64,
}

fn default_api_base_url() -> String {
    "https://slack.com/api".to_string()
}

fn default_members_page_limit() -> u32 {
    1000
}

fn default_max_pages() -> u32 {
    15
}

fn default_http_timeout_ms() -> u64 {
    10_000
}

impl Default for SlackSettings {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            members_page_limit: default_members_page_limit(),
            max_pages: default_max_pages(),
            http_timeout_ms: default_http_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaemonSettings {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

fn default_bind_addr() -> String {
    "127.0.0.1:8899".to_string()
}

impl Default for DaemonSettings {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub slack: SlackSettings,
    #[serde(default)]
    pub daemon: DaemonSettings,
}

impl Settings {
    pub fn from_config_json(config_json: &Value) -> Result<Self> {
        serde_json::from_value(config_json.clone()).context("CONFIG_INVALID: settings decode failed")
    }
}

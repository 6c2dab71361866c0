//! Shared runtime state for scm-daemon.
//!
//! Handlers receive `State<Arc<AppState>>` from Axum. The only mutable
//! shared state is the credential store; everything else is fixed at boot.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use scm_config::Settings;
use scm_roster::PagerPolicy;
use scm_slack::SlackClient;

use crate::store::{CredentialStore, MemoryCredentialStore};

// ---------------------------------------------------------------------------
// BuildInfo
// ---------------------------------------------------------------------------

/// Static build metadata included in health responses.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BuildInfo {
    pub service: &'static str,
    pub version: &'static str,
}

// ---------------------------------------------------------------------------
// OAuthApp
// ---------------------------------------------------------------------------

/// Slack app client credentials for the install flow. Redacted in `Debug`.
#[derive(Clone)]
pub struct OAuthApp {
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for OAuthApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthApp")
            .field("client_id", &"<REDACTED>")
            .field("client_secret", &"<REDACTED>")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct AppState {
    pub build: BuildInfo,
    pub settings: Settings,
    pub oauth: OAuthApp,
    /// Connection pool shared by every per-request [`SlackClient`].
    pub http: reqwest::Client,
    pub credentials: Arc<dyn CredentialStore>,
}

impl AppState {
    pub fn new(
        settings: Settings,
        oauth: OAuthApp,
        credentials: Arc<dyn CredentialStore>,
    ) -> Result<Self> {
        let http = scm_slack::http_client(Duration::from_millis(settings.slack.http_timeout_ms))
            .context("http client build failed")?;
        Ok(Self {
            build: BuildInfo {
                service: "scm-daemon",
                version: env!("CARGO_PKG_VERSION"),
            },
            settings,
            oauth,
            http,
            credentials,
        })
    }

    /// State backed by a fresh in-memory credential store.
    pub fn in_memory(settings: Settings, oauth: OAuthApp) -> Result<Self> {
        Self::new(settings, oauth, Arc::new(MemoryCredentialStore::new()))
    }

    /// Client scoped to one workspace's bot token.
    pub fn slack_client(&self, token: &str) -> SlackClient {
        SlackClient::new(
            self.http.clone(),
            self.settings.slack.api_base_url.clone(),
            token,
        )
        .with_members_page_limit(self.settings.slack.members_page_limit)
    }

    pub fn pager_policy(&self) -> PagerPolicy {
        PagerPolicy::with_max_pages(self.settings.slack.max_pages)
    }
}

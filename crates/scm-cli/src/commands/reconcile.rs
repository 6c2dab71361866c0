//! `scm reconcile`: one reconciliation with a static bot token.

use std::time::Duration;

use anyhow::{Context, Result};
use scm_config::{resolve_secrets_for_surface, Surface};
use scm_roster::{format, run_reconciliation, DesiredRoster, PagerPolicy, ReportContext};
use scm_slack::SlackClient;
use tracing::info;

pub struct ReconcileArgs {
    pub channel: String,
    pub roster: DesiredRoster,
    pub config_paths: Vec<String>,
    pub notify_user: Option<String>,
    pub json: bool,
}

pub async fn run(args: ReconcileArgs) -> Result<()> {
    let path_refs: Vec<&str> = args.config_paths.iter().map(|s| s.as_str()).collect();
    let loaded = scm_config::load_layered_yaml(&path_refs)?;
    let settings = loaded.settings()?;
    info!(config_hash = %loaded.config_hash, "config loaded");

    let secrets = resolve_secrets_for_surface(&loaded.config_json, Surface::Cli)?;
    let token = secrets
        .slack_bot_token
        .context("SECRETS_MISSING surface=CLI: slack bot_token")?;

    let http = scm_slack::http_client(Duration::from_millis(settings.slack.http_timeout_ms))
        .context("http client build failed")?;
    let client = SlackClient::new(http, settings.slack.api_base_url.clone(), token)
        .with_members_page_limit(settings.slack.members_page_limit);

    let policy = PagerPolicy::with_max_pages(settings.slack.max_pages);
    let run = run_reconciliation(&client, &args.channel, &args.roster, &policy)
        .await
        .with_context(|| format!("reconcile failed for channel {}", args.channel))?;

    let ctx = ReportContext {
        channel_id: args.channel.clone(),
        requester_id: args.notify_user.clone().unwrap_or_default(),
    };
    let report = format(&run.result, &ctx, &run.warnings());

    if args.notify_user.is_some() {
        client
            .post_ephemeral(&report)
            .await
            .context("report delivery failed")?;
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&run)?);
    } else {
        println!("run_id={}", run.run_id);
        println!("{report}");
    }

    Ok(())
}

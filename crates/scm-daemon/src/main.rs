//! scm-daemon entry point.
//!
//! Loads config and secrets, builds the shared state, wires middleware, and
//! starts the HTTP server. Route handlers live in `routes.rs`.

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use scm_config::{load_layered_yaml, resolve_secrets_for_surface, Surface};
use scm_daemon::{routes, state};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{info, Level};

const DEFAULT_CONFIG_PATH: &str = "config/defaults/base.yaml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env.local if present (dev convenience).
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let paths = config_paths_from_env();
    let path_refs: Vec<&str> = paths.iter().map(String::as_str).collect();
    let loaded = load_layered_yaml(&path_refs).context("config load failed")?;
    let settings = loaded.settings()?;
    info!(config_hash = %loaded.config_hash, "config loaded");

    let secrets = resolve_secrets_for_surface(&loaded.config_json, Surface::Daemon)?;
    let oauth = state::OAuthApp {
        client_id: secrets.slack_client_id.unwrap_or_default(),
        client_secret: secrets.slack_client_secret.unwrap_or_default(),
    };

    let addr: SocketAddr = match bind_addr_override(std::env::var("SCM_DAEMON_ADDR").ok())? {
        Some(a) => a,
        None => settings
            .daemon
            .bind_addr
            .parse()
            .with_context(|| format!("invalid daemon.bind_addr '{}'", settings.daemon.bind_addr))?,
    };

    let shared = Arc::new(state::AppState::in_memory(settings, oauth)?);

    let app = routes::build_router(Arc::clone(&shared)).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    info!("scm-daemon listening on http://{}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server crashed")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

/// `SCM_DAEMON_ADDR` overrides `daemon.bind_addr`. A value that does not
/// parse stops startup rather than falling back.
fn bind_addr_override(raw: Option<String>) -> anyhow::Result<Option<SocketAddr>> {
    match raw {
        Some(v) if !v.trim().is_empty() => v
            .trim()
            .parse::<SocketAddr>()
            .map(Some)
            .with_context(|| format!("invalid SCM_DAEMON_ADDR '{v}'")),
        _ => Ok(None),
    }
}

/// `SCM_CONFIG_PATHS`: comma-separated YAML layers, later layers win.
fn config_paths_from_env() -> Vec<String> {
    match std::env::var("SCM_CONFIG_PATHS") {
        Ok(v) if !v.trim().is_empty() => v
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect(),
        _ => vec![DEFAULT_CONFIG_PATH.to_string()],
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown requested");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_override_parses_or_fails_startup() {
        assert_eq!(bind_addr_override(None).unwrap(), None);
        assert_eq!(bind_addr_override(Some("  ".to_string())).unwrap(), None);
        assert_eq!(
            bind_addr_override(Some("127.0.0.1:9090".to_string())).unwrap(),
            Some("127.0.0.1:9090".parse().unwrap())
        );

        let err = bind_addr_override(Some("localhost:nope".to_string())).unwrap_err();
        assert!(err.to_string().contains("SCM_DAEMON_ADDR"), "got {err}");
    }
}

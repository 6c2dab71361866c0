//! Axum router and all HTTP handlers for scm-daemon.
//!
//! `build_router` is the single entry point; `main.rs` calls it and attaches
//! middleware layers.  Each Slack handler builds its own [`SlackClient`]
//! from the calling workspace's stored credential.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{FormRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use tracing::{error, info, warn};

use scm_roster::{format, run_reconciliation, ReportContext};
use scm_slack::{blocks, oauth_v2_access, SlackClient};

use crate::{
    api_types::{
        ActionForm, ErrorResponse, HealthResponse, InstallResponse, OAuthRedirectQuery,
        SlashCommandForm,
    },
    payload::decode_roster_submission,
    state::AppState,
    store::WorkspaceCredential,
};

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the complete application router wired to the given shared state.
///
/// Middleware layers (tracing) are **not** applied here; `main.rs`
/// attaches them after this call so tests can use the bare router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/health", get(health))
        .route("/slack/commands", post(slash_command))
        .route("/slack/actions", post(interaction))
        .route("/slack/oauth", get(oauth_redirect))
        .with_state(state)
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    (status, Json(ErrorResponse::new(msg))).into_response()
}

/// Client for `team_id`, or the response to send when the workspace is not
/// installed or the store is unavailable.
async fn client_for_team(st: &AppState, team_id: &str) -> Result<SlackClient, Response> {
    match st.credentials.get(team_id).await {
        Ok(Some(cred)) => Ok(st.slack_client(&cred.access_token)),
        Ok(None) => {
            warn!(team_id, "request from workspace without credential");
            Err(error_response(StatusCode::UNAUTHORIZED, "workspace not installed"))
        }
        Err(err) => {
            error!(team_id, error = %err, "credential lookup failed");
            Err(error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal error"))
        }
    }
}

// ---------------------------------------------------------------------------
// GET /v1/health
// ---------------------------------------------------------------------------

pub(crate) async fn health(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            ok: true,
            service: st.build.service.to_string(),
            version: st.build.version.to_string(),
        }),
    )
}

// ---------------------------------------------------------------------------
// POST /slack/commands
// ---------------------------------------------------------------------------

/// Slash command: open the roster modal for the invoking channel.
pub(crate) async fn slash_command(
    State(st): State<Arc<AppState>>,
    form: Result<Form<SlashCommandForm>, FormRejection>,
) -> Response {
    let Form(cmd) = match form {
        Ok(f) => f,
        Err(rej) => {
            warn!(error = %rej, "slash command rejected");
            return error_response(StatusCode::BAD_REQUEST, "wrong payload");
        }
    };

    let client = match client_for_team(&st, &cmd.team_id).await {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    info!(team_id = %cmd.team_id, channel_id = %cmd.channel_id, user_id = %cmd.user_id, "slash command");

    match client
        .open_view(&cmd.trigger_id, blocks::roster_modal(&cmd.channel_id))
        .await
    {
        Ok(()) => StatusCode::OK.into_response(),
        Err(err) => {
            error!(team_id = %cmd.team_id, error = %err, "views.open failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
        }
    }
}

// ---------------------------------------------------------------------------
// POST /slack/actions
// ---------------------------------------------------------------------------

/// Roster modal submission: reconcile and post the report to the submitter.
///
/// Only `view_submission` of the roster modal is accepted; every other
/// interaction is refused with 400. The result reaches the requester only
/// through the ephemeral report; the HTTP response body stays empty.
pub(crate) async fn interaction(
    State(st): State<Arc<AppState>>,
    form: Result<Form<ActionForm>, FormRejection>,
) -> Response {
    let submission = match form
        .map_err(|rej| rej.to_string())
        .and_then(|Form(f)| decode_roster_submission(&f.payload).map_err(|e| e.to_string()))
    {
        Ok(s) => s,
        Err(reason) => {
            warn!(%reason, "interaction rejected");
            return error_response(StatusCode::BAD_REQUEST, "wrong payload");
        }
    };

    let client = match client_for_team(&st, &submission.team_id).await {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    let run = match run_reconciliation(
        &client,
        &submission.channel_id,
        &submission.roster,
        &st.pager_policy(),
    )
    .await
    {
        Ok(run) => run,
        Err(err) => {
            error!(team_id = %submission.team_id, channel_id = %submission.channel_id, error = %err, "reconciliation failed");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal error");
        }
    };

    let warnings = run.warnings();
    let ctx = ReportContext {
        channel_id: submission.channel_id.clone(),
        requester_id: submission.user_id.clone(),
    };
    let report = format(&run.result, &ctx, &warnings);

    if let Err(err) = client.post_ephemeral(&report).await {
        error!(run_id = %run.run_id, error = %err, "report delivery failed");
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal error");
    }

    info!(
        run_id = %run.run_id,
        channel_id = %run.channel_id,
        in_sync = run.result.is_in_sync(),
        invite = run.result.users_to_invite.len(),
        unknown = run.result.emails_to_invite_unknown.len(),
        remove = run.result.users_to_remove.len(),
        warnings = warnings.len(),
        "report delivered"
    );

    StatusCode::OK.into_response()
}

// ---------------------------------------------------------------------------
// GET /slack/oauth
// ---------------------------------------------------------------------------

/// OAuth install redirect: exchange the code and store the workspace token.
pub(crate) async fn oauth_redirect(
    State(st): State<Arc<AppState>>,
    query: Result<Query<OAuthRedirectQuery>, QueryRejection>,
) -> Response {
    let Query(q) = match query {
        Ok(q) => q,
        Err(_) => return error_response(StatusCode::BAD_REQUEST, "bad request"),
    };

    if let Some(e) = q.error.as_deref() {
        warn!(error = e, "oauth install not completed");
        return if e == "access_denied" {
            error_response(StatusCode::FORBIDDEN, "access denied")
        } else {
            error_response(StatusCode::BAD_REQUEST, "install failed")
        };
    }

    let Some(code) = q.code.as_deref().filter(|c| !c.is_empty()) else {
        return error_response(StatusCode::BAD_REQUEST, "missing code");
    };

    let access = match oauth_v2_access(
        &st.http,
        &st.settings.slack.api_base_url,
        &st.oauth.client_id,
        &st.oauth.client_secret,
        code,
    )
    .await
    {
        Ok(a) => a,
        Err(err) => {
            error!(error = %err, "oauth.v2.access failed");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal error");
        }
    };

    let credential = WorkspaceCredential::from(access);
    let team_id = credential.team_id.clone();

    if let Err(err) = st.credentials.put(credential).await {
        error!(team_id = %team_id, error = %err, "credential store failed");
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal error");
    }

    info!(team_id = %team_id, "workspace installed");
    (
        StatusCode::OK,
        Json(InstallResponse { ok: true, team_id }),
    )
        .into_response()
}

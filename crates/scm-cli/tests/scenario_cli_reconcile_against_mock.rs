//! `scm reconcile` end to end against a mock Slack Web API.

use assert_cmd::prelude::*;
use httpmock::prelude::*;
use predicates::prelude::*;
use serde_json::json;
use std::process::Command;

const TOKEN_VAR: &str = "SCM_TEST_CLI_RECONCILE_TOKEN";

fn base_yaml() -> String {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../config/defaults/base.yaml")
        .to_string_lossy()
        .to_string()
}

fn mock_workspace(server: &MockServer) {
    server.mock(|when, then| {
        when.method(GET)
            .path("/conversations.members")
            .query_param("channel", "C1")
            .header("authorization", "Bearer test-bot-token");
        then.status(200).json_body(json!({
            "ok": true,
            "members": ["U1", "U2", "B1"],
            "response_metadata": {"next_cursor": ""}
        }));
    });
    server.mock(|when, then| {
        when.method(GET).path("/users.list");
        then.status(200).json_body(json!({
            "ok": true,
            "members": [
                {"id": "U1", "profile": {"email": "a@x.com"}},
                {"id": "U2", "profile": {"email": "c@x.com"}},
                {"id": "U3", "profile": {"email": "d@x.com"}},
                {"id": "B1", "is_bot": true, "profile": {"bot_id": "BB1"}}
            ],
            "response_metadata": {"next_cursor": ""}
        }));
    });
}

fn overlay(dir: &tempfile::TempDir, server: &MockServer) -> anyhow::Result<String> {
    let path = dir.path().join("overlay.yaml");
    std::fs::write(
        &path,
        format!(
            "slack:\n  api_base_url: \"{}\"\n  keys_env:\n    bot_token: \"{}\"\n",
            server.base_url(),
            TOKEN_VAR
        ),
    )?;
    Ok(path.to_string_lossy().to_string())
}

#[test]
fn reconcile_prints_text_report() -> anyhow::Result<()> {
    let server = MockServer::start();
    mock_workspace(&server);
    let dir = tempfile::tempdir()?;
    let overlay = overlay(&dir, &server)?;

    Command::cargo_bin("scm")?
        .env(TOKEN_VAR, "test-bot-token")
        .args([
            "reconcile",
            "--channel",
            "C1",
            "--emails",
            "a@x.com, d@x.com, n@x.com",
            "--config",
            &base_yaml(),
            "--config",
            &overlay,
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("run_id="))
        .stdout(predicate::str::contains(
            "roster: 3, channel members: 2, roster members in channel: 1",
        ))
        .stdout(predicate::str::contains("to invite (1): d@x.com"))
        .stdout(predicate::str::contains("to invite, not in workspace (1): n@x.com"))
        .stdout(predicate::str::contains("to remove (1): U2"));
    Ok(())
}

#[test]
fn reconcile_json_reads_roster_file() -> anyhow::Result<()> {
    let server = MockServer::start();
    mock_workspace(&server);
    let dir = tempfile::tempdir()?;
    let overlay = overlay(&dir, &server)?;
    let roster = dir.path().join("roster.txt");
    std::fs::write(&roster, "a@x.com\nc@x.com,\n")?;

    let out = Command::cargo_bin("scm")?
        .env(TOKEN_VAR, "test-bot-token")
        .args([
            "reconcile",
            "--channel",
            "C1",
            "--emails-file",
            &roster.to_string_lossy(),
            "--config",
            &base_yaml(),
            "--config",
            &overlay,
            "--json",
        ])
        .output()?;

    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    let run: serde_json::Value = serde_json::from_slice(&out.stdout)?;
    assert_eq!(run["channel_id"], "C1");
    assert_eq!(run["members_truncated"], false);
    assert_eq!(
        run["result"]["desired_emails_in_channel"],
        json!(["a@x.com", "c@x.com"])
    );
    assert_eq!(run["result"]["users_to_remove"], json!([]));
    assert_eq!(run["result"]["channel_bot_ids"], json!(["B1"]));
    Ok(())
}

#[test]
fn reconcile_surfaces_platform_error() -> anyhow::Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/conversations.members");
        then.status(200)
            .json_body(json!({"ok": false, "error": "channel_not_found"}));
    });
    let dir = tempfile::tempdir()?;
    let overlay = overlay(&dir, &server)?;

    Command::cargo_bin("scm")?
        .env(TOKEN_VAR, "test-bot-token")
        .args([
            "reconcile",
            "--channel",
            "CX",
            "--emails",
            "a@x.com",
            "--config",
            &base_yaml(),
            "--config",
            &overlay,
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("channel_not_found"))
        .stderr(predicate::str::contains("test-bot-token").not());
    Ok(())
}

//! Command handler modules for scm-cli.
//!
//! Shared utilities used by multiple command paths live here.

pub mod reconcile;

use anyhow::{Context, Result};
use scm_roster::DesiredRoster;
use std::fs;

/// Desired roster from either an inline `--emails` value or `--emails-file`.
pub fn load_roster(emails: Option<String>, emails_file: Option<String>) -> Result<DesiredRoster> {
    if let Some(p) = emails_file {
        let bytes = fs::read(&p).with_context(|| format!("read emails-file failed: {}", p))?;
        let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(&bytes);
        let raw = String::from_utf8(bytes.to_vec()).context("emails-file must be UTF-8 text")?;
        // Line breaks separate entries as well as commas.
        return Ok(DesiredRoster::parse(&raw.replace(['\r', '\n'], ",")));
    }

    let raw = emails.context("must provide --emails or --emails-file")?;
    Ok(DesiredRoster::parse(&raw))
}

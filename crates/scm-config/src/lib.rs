//! scm-config
//!
//! Layered YAML configuration for the daemon and CLI.
//!
//! - Layers merge in order; later documents override earlier ones key by key.
//! - Literal secrets in config are refused. Config stores env var NAMES only;
//!   [`secrets`] resolves the values.
//! - The merged document is hashed (sha256 over canonical JSON) so a run can
//!   log exactly which configuration it used.

pub mod secrets;
pub mod settings;

use anyhow::{bail, Context, Result};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::fs;

pub use secrets::{resolve_secrets_for_surface, ResolvedSecrets, Surface};
pub use settings::{DaemonSettings, Settings, SlackSettings};

/// Known secret-like prefixes. A leaf string starting with one of these
/// aborts loading with CONFIG_SECRET_DETECTED.
const SECRET_PREFIXES: &[&str] = &[
    "xoxb-",      // Slack bot token
    "xoxp-",      // Slack user token
    "xoxa-",      // Slack app token (legacy)
    "xoxe.",      // Slack rotating token
    "xapp-",      // Slack app-level token
    "-----BEGIN", // PEM private keys
    "AKIA",       // AWS access key ID
    "ghp_",       // GitHub PAT
    "sk-",        // generic API secret
];

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config_hash: String,
    pub canonical_json: String,
    pub config_json: Value,
}

impl LoadedConfig {
    /// Decode the typed settings view of this config.
    pub fn settings(&self) -> Result<Settings> {
        Settings::from_config_json(&self.config_json)
    }
}

/// Read and merge YAML files in order (base first, overrides last).
pub fn load_layered_yaml(paths: &[&str]) -> Result<LoadedConfig> {
    let docs = paths
        .iter()
        .map(|p| fs::read_to_string(p).with_context(|| format!("failed to read yaml path: {p}")))
        .collect::<Result<Vec<String>>>()?;
    let doc_refs: Vec<&str> = docs.iter().map(String::as_str).collect();
    load_layered_yaml_from_strings(&doc_refs)
}

pub fn load_layered_yaml_from_strings(yaml_docs: &[&str]) -> Result<LoadedConfig> {
    let mut merged = Value::Object(Map::new());
    for (i, raw) in yaml_docs.iter().enumerate() {
        let layer: serde_yaml::Value =
            serde_yaml::from_str(raw).with_context(|| format!("invalid yaml in layer {i}"))?;
        // An empty document parses to null; treat it as "no overrides".
        if layer.is_null() {
            continue;
        }
        let layer = serde_json::to_value(layer).context("yaml->json conversion failed")?;
        merge_into(&mut merged, layer);
    }

    if let Some(leaf) = find_secret_literal(&merged, String::new()) {
        bail!("CONFIG_SECRET_DETECTED leaf={} value=REDACTED", leaf);
    }

    // serde_json's default Map is ordered by key, so equal documents serialize identically.
    let canonical_json =
        serde_json::to_string(&merged).context("canonical json serialize failed")?;
    let config_hash = hex::encode(Sha256::digest(canonical_json.as_bytes()));

    Ok(LoadedConfig {
        config_hash,
        canonical_json,
        config_json: merged,
    })
}

/// Objects merge key by key; any other value in `layer` replaces `base`.
fn merge_into(base: &mut Value, layer: Value) {
    match (base, layer) {
        (Value::Object(base_map), Value::Object(layer_map)) => {
            for (key, layer_val) in layer_map {
                match base_map.get_mut(&key) {
                    Some(slot) => merge_into(slot, layer_val),
                    None => {
                        base_map.insert(key, layer_val);
                    }
                }
            }
        }
        (slot, other) => *slot = other,
    }
}

/// JSON pointer of the first string leaf that looks like a credential.
fn find_secret_literal(v: &Value, at: String) -> Option<String> {
    match v {
        Value::String(s) if looks_like_secret(s) => Some(if at.is_empty() { "/".to_string() } else { at }),
        Value::Object(map) => map.iter().find_map(|(k, child)| {
            let token = k.replace('~', "~0").replace('/', "~1");
            find_secret_literal(child, format!("{at}/{token}"))
        }),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .find_map(|(i, child)| find_secret_literal(child, format!("{at}/{i}"))),
        _ => None,
    }
}

fn looks_like_secret(s: &str) -> bool {
    let t = s.trim();
    t.len() >= 8 && SECRET_PREFIXES.iter().any(|p| t.starts_with(p))
}

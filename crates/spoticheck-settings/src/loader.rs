//! Settings loading with deep merge, environment and flag overrides.
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::types::{SettingsOverrides, SpoticheckSettings};

/// Resolve settings from defaults, an optional file, the process
/// environment and explicit overrides.
///
/// A missing file is an error only when the path was given explicitly.
/// Settings load before logging is up, so ignored environment values are
/// returned as warnings for the caller to report.
pub fn load_settings(path: Option<&Path>, overrides: &SettingsOverrides) -> Result<LoadedSettings> {
    let mut settings = load_settings_from_path(path)?;
    let warnings = apply_env_overrides(&mut settings, |name| std::env::var(name).ok());
    apply_overrides(&mut settings, overrides);
    Ok(LoadedSettings { settings, warnings })
}

/// Resolved settings plus notes about environment values that were ignored.
#[derive(Debug)]
pub struct LoadedSettings {
    pub settings: SpoticheckSettings,
    pub warnings: Vec<String>,
}

/// Defaults deep-merged with the file at `path`, if any.
pub fn load_settings_from_path(path: Option<&Path>) -> Result<SpoticheckSettings> {
    let defaults = serde_json::to_value(SpoticheckSettings::default())?;

    let merged = match path {
        Some(path) => {
            debug!(?path, "loading settings from file");
            let content = std::fs::read_to_string(path)?;
            let user: Value = serde_json::from_str(&content)?;
            deep_merge(defaults, user)
        }
        None => defaults,
    };

    Ok(serde_json::from_value(merged)?)
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply environment overrides read through `lookup`.
///
/// Empty values are skipped. Unparseable booleans are skipped and reported
/// in the returned warnings.
pub fn apply_env_overrides<F>(settings: &mut SpoticheckSettings, lookup: F) -> Vec<String>
where
    F: Fn(&str) -> Option<String>,
{
    let mut warnings = Vec::new();
    let read = |name: &str| lookup(name).filter(|v| !v.is_empty());

    if let Some(v) = read("TOKEN") {
        settings.token = Some(v);
    }
    if let Some(v) = read("STORAGE_URI") {
        settings.storage.uri = Some(v);
    }
    if let Some(v) = read("STORAGE_DATABASE") {
        settings.storage.database = v;
    }
    if let Some(v) = lookup("TARGET_USERS") {
        settings.watched_ids = parse_id_list(&v);
    }
    if let Some(v) = read("GATEWAY_URL") {
        settings.gateway.url = v;
    }
    if let Some(v) = read("SPOTICHECK_LOG_DIR") {
        settings.logging.dir = Some(PathBuf::from(v));
    }
    if let Some(raw) = read("SPOTICHECK_DEBUG") {
        match parse_bool(&raw) {
            Some(v) => settings.logging.debug = v,
            None => warnings.push(format!(
                "ignoring SPOTICHECK_DEBUG={raw:?}: expected true/false, 1/0, yes/no or on/off"
            )),
        }
    }
    warnings
}

/// Apply explicit overrides. Only fields that are set take effect; `debug`
/// can only be switched on.
pub fn apply_overrides(settings: &mut SpoticheckSettings, overrides: &SettingsOverrides) {
    if let Some(v) = &overrides.token {
        settings.token = Some(v.clone());
    }
    if let Some(v) = &overrides.storage_uri {
        settings.storage.uri = Some(v.clone());
    }
    if let Some(v) = &overrides.storage_database {
        settings.storage.database = v.clone();
    }
    if let Some(v) = &overrides.watched {
        settings.watched_ids = parse_id_list(v);
    }
    if let Some(v) = &overrides.gateway_url {
        settings.gateway.url = v.clone();
    }
    if let Some(v) = &overrides.log_dir {
        settings.logging.dir = Some(v.clone());
    }
    if overrides.debug {
        settings.logging.debug = true;
    }
}

/// Parse a string as a boolean.
///
/// Accepts (case-insensitive): `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Split a comma-separated id list, trimming entries and dropping blanks.
pub fn parse_id_list(val: &str) -> Vec<String> {
    spoticheck_core::WatchedSet::parse(val)
        .iter()
        .map(str::to_string)
        .collect()
}

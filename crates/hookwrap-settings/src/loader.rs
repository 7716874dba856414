//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`HookwrapSettings::default()`]
//! 2. If `~/.hookwrap/settings.json` exists, deep-merge user values over defaults
//! 3. Apply `HOOKWRAP_*` environment overrides (highest priority)
//! 4. Validate the result
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::{Result, SettingsError};
use crate::types::{HookwrapSettings, LOG_LEVELS};

/// Log level override.
pub const ENV_LOG_LEVEL: &str = "HOOKWRAP_LOG_LEVEL";
/// Default store size override.
pub const ENV_CACHE_MAX_SIZE: &str = "HOOKWRAP_CACHE_MAX_SIZE";
/// Default store lifetime override, in seconds.
pub const ENV_CACHE_MAX_AGE_SECS: &str = "HOOKWRAP_CACHE_MAX_AGE_SECS";
/// `apply_to_members` default override.
pub const ENV_APPLY_TO_MEMBERS: &str = "HOOKWRAP_APPLY_TO_MEMBERS";
/// `instance_members_only` default override.
pub const ENV_INSTANCE_MEMBERS_ONLY: &str = "HOOKWRAP_INSTANCE_MEMBERS_ONLY";

const MAX_CACHE_SIZE: usize = 100_000_000;
const MAX_CACHE_AGE_SECS: u64 = 10 * 365 * 24 * 3600;

/// Resolve the path to the settings file (`~/.hookwrap/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".hookwrap").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<HookwrapSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// A missing file yields defaults. Invalid JSON or an invalid final value
/// is an error.
pub fn load_settings_from_path(path: &Path) -> Result<HookwrapSettings> {
    let mut settings = load_file_layer(path)?;
    apply_env_overrides(&mut settings);
    validate(&settings)?;
    Ok(settings)
}

/// Defaults deep-merged with the file at `path`, without env overrides.
pub fn load_file_layer(path: &Path) -> Result<HookwrapSettings> {
    let defaults = serde_json::to_value(HookwrapSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
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
                let merged = match target_map.remove(&key) {
                    Some(target_val) => deep_merge(target_val, source_val),
                    None => source_val,
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply `HOOKWRAP_*` overrides from the process environment.
///
/// Unparseable or out-of-range values are logged and ignored.
pub fn apply_env_overrides(settings: &mut HookwrapSettings) {
    apply_overrides(settings, |name| std::env::var(name).ok());
}

/// Apply overrides read through `lookup`, which maps a variable name to its
/// raw value.
pub fn apply_overrides<F>(settings: &mut HookwrapSettings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let env = EnvReader { lookup };

    if let Some(v) = env.string(ENV_LOG_LEVEL) {
        let v = v.to_lowercase();
        if LOG_LEVELS.contains(&v.as_str()) {
            settings.logging.level = v;
        } else {
            warn!(key = ENV_LOG_LEVEL, value = %v, "unknown log level env var, ignoring");
        }
    }
    if let Some(v) = env.usize(ENV_CACHE_MAX_SIZE, 0, MAX_CACHE_SIZE) {
        settings.cache.max_size = v;
    }
    if let Some(v) = env.u64(ENV_CACHE_MAX_AGE_SECS, 0, MAX_CACHE_AGE_SECS) {
        settings.cache.max_age_secs = v;
    }
    if let Some(v) = env.bool(ENV_APPLY_TO_MEMBERS) {
        settings.wrapping.apply_to_members = v;
    }
    if let Some(v) = env.bool(ENV_INSTANCE_MEMBERS_ONLY) {
        settings.wrapping.instance_members_only = v;
    }
}

/// Check values that deserialization alone cannot constrain.
pub fn validate(settings: &HookwrapSettings) -> Result<()> {
    let level = settings.logging.level.to_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        return Err(SettingsError::InvalidValue(format!(
            "logging.level must be one of {}, got {:?}",
            LOG_LEVELS.join("/"),
            settings.logging.level
        )));
    }
    if settings.cache.max_age_secs > MAX_CACHE_AGE_SECS {
        return Err(SettingsError::InvalidValue(format!(
            "cache.maxAgeSecs must be at most {MAX_CACHE_AGE_SECS}, got {}",
            settings.cache.max_age_secs
        )));
    }
    Ok(())
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as a boolean.
///
/// Accepts (case-insensitive): `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.trim().parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a `usize` within a range.
pub fn parse_usize_range(val: &str, min: usize, max: usize) -> Option<usize> {
    let n: usize = val.trim().parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

// ── Variable readers ────────────────────────────────────────────────────────

struct EnvReader<F> {
    lookup: F,
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn string(&self, name: &str) -> Option<String> {
        (self.lookup)(name).filter(|v| !v.trim().is_empty())
    }

    fn bool(&self, name: &str) -> Option<bool> {
        let val = self.string(name)?;
        let result = parse_bool(&val);
        if result.is_none() {
            warn!(key = name, value = %val, "invalid boolean env var, ignoring");
        }
        result
    }

    fn u64(&self, name: &str, min: u64, max: u64) -> Option<u64> {
        let val = self.string(name)?;
        let result = parse_u64_range(&val, min, max);
        if result.is_none() {
            warn!(key = name, value = %val, "invalid u64 env var, ignoring");
        }
        result
    }

    fn usize(&self, name: &str, min: usize, max: usize) -> Option<usize> {
        let val = self.string(name)?;
        let result = parse_usize_range(&val, min, max);
        if result.is_none() {
            warn!(key = name, value = %val, "invalid usize env var, ignoring");
        }
        result
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    fn write_settings(body: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, body).unwrap();
        (dir, path)
    }

    // ── deep_merge ──────────────────────────────────────────────────

    #[test]
    fn merge_nested_override() {
        let target = serde_json::json!({"cache": {"maxSize": 0, "maxAgeSecs": 0}});
        let source = serde_json::json!({"cache": {"maxSize": 64}});
        let merged = deep_merge(target, source);
        assert_eq!(merged["cache"]["maxSize"], 64);
        assert_eq!(merged["cache"]["maxAgeSecs"], 0);
    }

    #[test]
    fn merge_array_replace() {
        let target = serde_json::json!({"items": [1, 2, 3]});
        let source = serde_json::json!({"items": [4]});
        assert_eq!(deep_merge(target, source)["items"], serde_json::json!([4]));
    }

    #[test]
    fn merge_null_preserves_target() {
        let target = serde_json::json!({"a": 1});
        let source = serde_json::json!({"a": null, "b": 2});
        let merged = deep_merge(target, source);
        assert_eq!(merged["a"], 1);
        assert_eq!(merged["b"], 2);
    }

    #[test]
    fn merge_primitive_replaces_object() {
        let target = serde_json::json!({"a": {"nested": true}});
        let source = serde_json::json!({"a": 42});
        assert_eq!(deep_merge(target, source)["a"], 42);
    }

    // ── file layer ──────────────────────────────────────────────────

    #[test]
    fn load_missing_file_returns_defaults() {
        let settings = load_file_layer(Path::new("/nonexistent/settings.json")).unwrap();
        assert_eq!(settings, HookwrapSettings::default());
    }

    #[test]
    fn load_partial_json_overrides() {
        let (_dir, path) = write_settings(r#"{"cache": {"maxSize": 128}, "logging": {"level": "debug"}}"#);
        let settings = load_file_layer(&path).unwrap();
        assert_eq!(settings.cache.max_size, 128);
        assert_eq!(settings.cache.max_age_secs, 0);
        assert_eq!(settings.logging.level, "debug");
        assert!(settings.wrapping.apply_to_members);
    }

    #[test]
    fn load_invalid_json_returns_error() {
        let (_dir, path) = write_settings("not valid json");
        let err = load_file_layer(&path).unwrap_err();
        assert!(matches!(err, SettingsError::Json(_)));
    }

    #[test]
    fn load_wrong_type_returns_error() {
        let (_dir, path) = write_settings(r#"{"cache": {"maxSize": "lots"}}"#);
        assert!(matches!(
            load_file_layer(&path).unwrap_err(),
            SettingsError::Json(_)
        ));
    }

    #[test]
    fn unknown_level_in_file_fails_validation() {
        let (_dir, path) = write_settings(r#"{"logging": {"level": "chatty"}}"#);
        let settings = load_file_layer(&path).unwrap();
        let err = validate(&settings).unwrap_err();
        assert!(matches!(err, SettingsError::InvalidValue(_)));
        assert!(err.to_string().contains("chatty"));
    }

    // ── overrides ───────────────────────────────────────────────────

    #[test]
    fn overrides_apply_over_file_values() {
        let (_dir, path) = write_settings(r#"{"cache": {"maxSize": 128}}"#);
        let mut settings = load_file_layer(&path).unwrap();
        apply_overrides(
            &mut settings,
            env(&[
                (ENV_CACHE_MAX_SIZE, "32"),
                (ENV_CACHE_MAX_AGE_SECS, "600"),
                (ENV_LOG_LEVEL, "TRACE"),
                (ENV_APPLY_TO_MEMBERS, "off"),
                (ENV_INSTANCE_MEMBERS_ONLY, "yes"),
            ]),
        );
        assert_eq!(settings.cache.max_size, 32);
        assert_eq!(settings.cache.max_age_secs, 600);
        assert_eq!(settings.logging.level, "trace");
        assert!(!settings.wrapping.apply_to_members);
        assert!(settings.wrapping.instance_members_only);
        assert!(validate(&settings).is_ok());
    }

    #[test]
    fn invalid_overrides_are_ignored() {
        let mut settings = HookwrapSettings::default();
        apply_overrides(
            &mut settings,
            env(&[
                (ENV_CACHE_MAX_SIZE, "-1"),
                (ENV_CACHE_MAX_AGE_SECS, "soon"),
                (ENV_LOG_LEVEL, "loud"),
                (ENV_APPLY_TO_MEMBERS, "maybe"),
                (ENV_INSTANCE_MEMBERS_ONLY, ""),
            ]),
        );
        assert_eq!(settings, HookwrapSettings::default());
    }

    #[test]
    fn no_overrides_is_identity() {
        let mut settings = HookwrapSettings::default();
        apply_overrides(&mut settings, |_| None);
        assert_eq!(settings, HookwrapSettings::default());
    }

    // ── parsing ─────────────────────────────────────────────────────

    #[test]
    fn parse_bool_variants() {
        for val in ["true", "1", "yes", "on", "TRUE", " On "] {
            assert_eq!(parse_bool(val), Some(true), "failed for {val}");
        }
        for val in ["false", "0", "no", "off", "No"] {
            assert_eq!(parse_bool(val), Some(false), "failed for {val}");
        }
        assert_eq!(parse_bool("2"), None);
        assert_eq!(parse_bool(""), None);
    }

    #[test]
    fn parse_ranges() {
        assert_eq!(parse_u64_range("30", 0, 60), Some(30));
        assert_eq!(parse_u64_range("61", 0, 60), None);
        assert_eq!(parse_u64_range("abc", 0, 60), None);
        assert_eq!(parse_usize_range("0", 0, 10), Some(0));
        assert_eq!(parse_usize_range("11", 0, 10), None);
    }
}

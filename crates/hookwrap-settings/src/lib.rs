//! # hookwrap-settings
//!
//! Layered configuration for hookwrap.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`HookwrapSettings::default()`]
//! 2. **User file**: `~/.hookwrap/settings.json`, deep-merged over defaults
//! 3. **Environment variables**: `HOOKWRAP_*` overrides
//!
//! The wrapping crate reads [`get_settings`] for its default flags and for
//! the store `memoize` builds when the caller supplies none. A host that
//! wants different defaults installs them once with [`init_settings`]
//! before the first wrap.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{
    apply_env_overrides, apply_overrides, deep_merge, load_settings, load_settings_from_path,
    settings_path, validate,
};
pub use types::*;

use std::sync::OnceLock;

use tracing::warn;

static SETTINGS: OnceLock<HookwrapSettings> = OnceLock::new();

/// Get the global settings instance.
///
/// The first call loads `~/.hookwrap/settings.json` with env overrides.
/// If loading fails the error is logged and compiled defaults are used.
pub fn get_settings() -> &'static HookwrapSettings {
    SETTINGS.get_or_init(|| {
        load_settings().unwrap_or_else(|e| {
            warn!(error = %e, "failed to load settings, using defaults");
            HookwrapSettings::default()
        })
    })
}

/// Install the global settings explicitly.
///
/// Fails with [`SettingsError::AlreadyInitialized`] once [`get_settings`]
/// or a previous `init_settings` has populated the global, and with
/// [`SettingsError::InvalidValue`] if `settings` does not validate.
pub fn init_settings(settings: HookwrapSettings) -> Result<()> {
    validate(&settings)?;
    SETTINGS
        .set(settings)
        .map_err(|_| SettingsError::AlreadyInitialized)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_path_is_under_home_dir() {
        let path = settings_path();
        assert!(path.ends_with(".hookwrap/settings.json"));
    }

    #[test]
    fn init_rejects_invalid_settings() {
        let mut settings = HookwrapSettings::default();
        settings.logging.level = "verbose".into();
        assert!(matches!(
            init_settings(settings),
            Err(SettingsError::InvalidValue(_))
        ));
    }

    #[test]
    fn global_is_set_once() {
        let first = get_settings();
        assert!(matches!(
            init_settings(HookwrapSettings::default()),
            Err(SettingsError::AlreadyInitialized)
        ));
        assert!(std::ptr::eq(first, get_settings()));
    }
}

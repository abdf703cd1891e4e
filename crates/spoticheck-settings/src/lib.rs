//! # spoticheck-settings
//!
//! Settings are resolved from four layers, lowest priority first:
//! 1. **Compiled defaults**: [`SpoticheckSettings::default()`]
//! 2. **Settings file**: optional JSON file, deep-merged over defaults
//! 3. **Environment variables**: `TOKEN`, `STORAGE_URI`, `TARGET_USERS`, ...
//! 4. **Explicit overrides**: command-line flags via [`SettingsOverrides`]

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{
    apply_env_overrides, apply_overrides, deep_merge, load_settings, parse_bool, parse_id_list,
    LoadedSettings,
};
pub use types::*;

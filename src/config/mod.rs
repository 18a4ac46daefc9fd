//! Configuration module for quarry.
//!
//! Handles the TOML settings file and environment variable expansion.

mod settings;

pub use settings::{expand_env_vars, MappingSettings, Settings, SettingsError, SqlSettings};

//! Configuration Module
//!
//! Loads and validates configuration from a TOML file layered under
//! `SIGNALER__*` environment variables.

pub mod loader;

pub use loader::{
    Config, ConfigError, LoggingSection, load_config, load_config_with_env, ENV_PREFIX, ENV_SEPARATOR,
};

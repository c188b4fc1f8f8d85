//! Configuration Loader
//!
//! Layers an optional TOML file under `SIGNALER__*` environment variables
//! and validates the result. Every key has a default, so an empty
//! configuration runs the crossover engine with production windows.

use std::collections::HashMap;
use std::path::Path;

use config::{Environment, File, FileFormat};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ports::WindowSpan;
use crate::strategy::params::{
    DEFAULT_BAND_WIDTH, DEFAULT_CONFIRM_WINDOW_SECS, DEFAULT_FAST_WINDOW_SECS, DEFAULT_PERCENTILE,
    DEFAULT_ROLLING_WINDOW_SECS, DEFAULT_SLOW_WINDOW_SECS, DEFAULT_WALLET,
};
use crate::strategy::{BandBreachParams, CrossoverParams, StrategyConfig, StrategyKind};

/// Environment variable prefix, e.g. `SIGNALER__WALLET=250`
pub const ENV_PREFIX: &str = "SIGNALER";
/// Separator between prefix and nested keys, e.g. `SIGNALER__LOGGING__LEVEL`
pub const ENV_SEPARATOR: &str = "__";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Effective runtime configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Decision engine: "crossover" or "band_breach"
    pub strategy: StrategyKind,
    /// Crossover slow window
    #[serde(alias = "slow_window")]
    pub slow_window_seconds: u64,
    /// Crossover fast window
    #[serde(alias = "fast_window")]
    pub fast_window_seconds: u64,
    /// Band breach primary window
    #[serde(alias = "rolling_window")]
    pub rolling_window_seconds: u64,
    /// Band breach confirmation window
    #[serde(alias = "confirm_window")]
    pub confirm_window_seconds: u64,
    /// Exit percentile of the primary window (1-100)
    pub percentile: u8,
    /// Bollinger band width in standard deviations
    pub band_width: f64,
    /// Capital allocated per BUY
    pub wallet: Decimal,
    pub logging: LoggingSection,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::default(),
            slow_window_seconds: DEFAULT_SLOW_WINDOW_SECS,
            fast_window_seconds: DEFAULT_FAST_WINDOW_SECS,
            rolling_window_seconds: DEFAULT_ROLLING_WINDOW_SECS,
            confirm_window_seconds: DEFAULT_CONFIRM_WINDOW_SECS,
            percentile: DEFAULT_PERCENTILE,
            band_width: DEFAULT_BAND_WIDTH,
            wallet: DEFAULT_WALLET,
            logging: LoggingSection::default(),
        }
    }
}

/// Logging configuration section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),
    #[error("Failed to render configuration: {0}")]
    SerializeError(#[from] toml::ser::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from an optional TOML file and the process environment
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    build(path, Environment::with_prefix(ENV_PREFIX))
}

/// Same as [`load_config`] but reading variables from `env` instead of the
/// process environment
pub fn load_config_with_env(path: Option<&Path>, env: HashMap<String, String>) -> Result<Config, ConfigError> {
    build(path, Environment::with_prefix(ENV_PREFIX).source(Some(env)))
}

fn build(path: Option<&Path>, env: Environment) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
    }
    let settings = builder
        .add_source(env.separator(ENV_SEPARATOR).try_parsing(true))
        .build()?;

    let config: Config = settings.try_deserialize()?;
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        StrategyConfig::from(self)
            .validate()
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

        if !LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "logging.level must be one of {}, got {}",
                LOG_LEVELS.join(", "),
                self.logging.level
            )));
        }

        Ok(())
    }

    /// Render as TOML, the same shape the loader reads
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

impl From<&Config> for StrategyConfig {
    fn from(config: &Config) -> Self {
        match config.strategy {
            StrategyKind::Crossover => StrategyConfig::Crossover(
                CrossoverParams::default()
                    .with_windows(
                        WindowSpan::seconds(config.slow_window_seconds),
                        WindowSpan::seconds(config.fast_window_seconds),
                    )
                    .with_wallet(config.wallet),
            ),
            StrategyKind::BandBreach => StrategyConfig::BandBreach(BandBreachParams {
                rolling_window: WindowSpan::seconds(config.rolling_window_seconds),
                confirm_window: WindowSpan::seconds(config.confirm_window_seconds),
                percentile: config.percentile,
                band_width: config.band_width,
                wallet: config.wallet,
                ..BandBreachParams::default()
            }),
        }
    }
}

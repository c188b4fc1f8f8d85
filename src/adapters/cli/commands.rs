//! CLI Command Definitions
//!
//! Argument parsing for the `signaler` binary.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::adapters::paper::FillMode;
use crate::strategy::StrategyKind;

/// Signaler - BBO signal engine with guarded order routing
#[derive(Parser, Debug)]
#[command(
    name = "signaler",
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
    about = "Per-instrument BBO signal engine with crossover and band-breach strategies",
    long_about = "Signaler turns best bid/offer ticks into BUY/SELL signals using either a \
                  dual-window mean crossover or a Bollinger band breach, and routes them \
                  through a one-order-in-flight guard."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replay a tick file through the signal pipeline
    Run(RunCmd),

    /// Print the effective configuration as TOML
    Config(ConfigCmd),
}

/// Replay ticks against the paper router
#[derive(Parser, Debug)]
pub struct RunCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// JSON-lines file of ticks to replay
    #[arg(short, long, value_name = "FILE")]
    pub ticks: PathBuf,

    /// Override the configured strategy (crossover, band_breach)
    #[arg(short, long, value_name = "STRATEGY")]
    pub strategy: Option<StrategyKind>,

    /// Outcome the paper router reports for every order (filled, expired, rejected)
    #[arg(long, value_name = "MODE", default_value = "filled")]
    pub fill: FillMode,

    /// Do not print signals to stdout
    #[arg(long)]
    pub no_echo: bool,
}

/// Show effective configuration
#[derive(Parser, Debug)]
pub struct ConfigCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_app_parse_run() {
        let args = vec!["signaler", "run", "--config", "test.toml", "--ticks", "ticks.jsonl"];
        let app = CliApp::try_parse_from(args).unwrap();

        match app.command {
            Command::Run(cmd) => {
                assert_eq!(cmd.config, Some(PathBuf::from("test.toml")));
                assert_eq!(cmd.ticks, PathBuf::from("ticks.jsonl"));
                assert_eq!(cmd.strategy, None);
                assert_eq!(cmd.fill, FillMode::Filled);
                assert!(!cmd.no_echo);
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_cli_app_parse_run_with_overrides() {
        let args = vec![
            "signaler", "run", "-t", "ticks.jsonl", "--strategy", "band_breach", "--fill", "expired", "--no-echo",
        ];
        let app = CliApp::try_parse_from(args).unwrap();

        match app.command {
            Command::Run(cmd) => {
                assert_eq!(cmd.config, None);
                assert_eq!(cmd.strategy, Some(StrategyKind::BandBreach));
                assert_eq!(cmd.fill, FillMode::Expired);
                assert!(cmd.no_echo);
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_run_requires_ticks() {
        let args = vec!["signaler", "run"];
        assert!(CliApp::try_parse_from(args).is_err());
    }

    #[test]
    fn test_unknown_strategy_rejected() {
        let args = vec!["signaler", "run", "--ticks", "t.jsonl", "--strategy", "momentum"];
        assert!(CliApp::try_parse_from(args).is_err());
    }

    #[test]
    fn test_cli_app_parse_config() {
        let args = vec!["signaler", "config", "-c", "signaler.toml"];
        let app = CliApp::try_parse_from(args).unwrap();

        match app.command {
            Command::Config(cmd) => assert_eq!(cmd.config, Some(PathBuf::from("signaler.toml"))),
            _ => panic!("Expected Config command"),
        }
    }

    #[test]
    fn test_global_flags() {
        let args = vec!["signaler", "-v", "--debug", "config"];
        let app = CliApp::try_parse_from(args).unwrap();

        assert!(app.verbose);
        assert!(app.debug);
    }
}

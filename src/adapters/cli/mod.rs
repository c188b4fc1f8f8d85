//! CLI Adapter
//!
//! Command-line interface for the signaler binary.
//! Uses clap derive macros for argument parsing.

mod commands;

pub use commands::{CliApp, Command, ConfigCmd, RunCmd};

/// Parse the process arguments
pub fn init() -> CliApp {
    use clap::Parser;
    CliApp::parse()
}

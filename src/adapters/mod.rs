//! Adapters Layer - Port Implementations
//!
//! This module contains implementations of the port traits:
//! - Statistics: rolling windows backed by statrs
//! - Bus: mpsc channel and stdout echo signal sinks
//! - Paper: simulated order router for replays
//! - Replay: JSON-lines tick feed
//! - CLI: Command-line interface definitions

pub mod statistics;
pub mod bus;
pub mod paper;
pub mod replay;
pub mod cli;

pub use statistics::{RollingWindow, RollingWindowFactory};
pub use bus::{ChannelSink, EchoSink};
pub use paper::{FillMode, PaperRouter};
pub use replay::{FeedError, ReplayStats, TickReplay};
pub use cli::CliApp;

//! Ports Layer - Trait definitions for external collaborators
//!
//! Following hexagonal architecture, these traits abstract:
//! - Rolling statistics windows
//! - The signal bus
//! - Order routing
//! - Decision engines, so strategies are chosen at startup

pub mod statistics;
pub mod signal_sink;
pub mod router;
pub mod engine;

pub use statistics::{BollingerBands, StatisticsError, StatisticsFactory, WindowSpan, WindowedStatistics};
pub use signal_sink::{SignalSink, SinkError};
pub use router::{OrderRouter, RouterError};
pub use engine::{DecisionEngine, EngineError};

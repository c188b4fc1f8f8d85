use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{OpenPosition, OrderLifecycleEvent, PositionError, RoutingGuard, Signal, Tick};
use crate::ports::signal_sink::SinkError;
use crate::ports::statistics::StatisticsError;

/// Decision engine errors
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Statistics fault on {instrument}, instrument quarantined: {source}")]
    StatisticsFault {
        instrument: String,
        source: StatisticsError,
    },

    #[error("Failed to emit signal for {instrument}: {source}")]
    Emit { instrument: String, source: SinkError },

    #[error("Position state rejected signal: {0}")]
    Position(#[from] PositionError),
}

/// Per-instrument signal state machine driven by ticks.
///
/// Implementations own their statistics windows and open-position markers,
/// and share a routing guard with the order dispatcher.
#[async_trait]
pub trait DecisionEngine: Send + Sync {
    fn name(&self) -> &'static str;

    fn guard(&self) -> &RoutingGuard;

    /// Process one tick, returning the signal emitted for it, if any
    async fn on_tick(&self, tick: &Tick) -> Result<Option<Signal>, EngineError>;

    async fn on_lifecycle_event(&self, event: &OrderLifecycleEvent) {
        self.guard().on_lifecycle_event(event).await;
    }

    async fn open_position(&self, instrument: &str) -> Option<OpenPosition>;
}

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::Signal;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Signal bus closed")]
    Closed,
    #[error("Failed to publish signal: {0}")]
    Publish(String),
}

/// Downstream event bus for emitted signals
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SignalSink: Send + Sync {
    async fn emit(&self, signal: Signal) -> Result<(), SinkError>;
}

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::Signal;
use crate::ports::{SignalSink, SinkError};

/// Publishes signals onto a bounded mpsc channel
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<Signal>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<Signal>) -> Self {
        Self { tx }
    }

    /// Sink plus the receiving end of a fresh channel
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Signal>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }
}

#[async_trait]
impl SignalSink for ChannelSink {
    async fn emit(&self, signal: Signal) -> Result<(), SinkError> {
        self.tx.send(signal).await.map_err(|_| SinkError::Closed)
    }
}

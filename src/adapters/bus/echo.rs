use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt, Stdout};
use tokio::sync::Mutex;

use crate::domain::Signal;
use crate::ports::{SignalSink, SinkError};

/// Writes every signal as one JSON line, optionally forwarding it on
pub struct EchoSink<W = Stdout> {
    writer: Mutex<W>,
    next: Option<Arc<dyn SignalSink>>,
}

impl EchoSink<Stdout> {
    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout())
    }
}

impl<W> EchoSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
            next: None,
        }
    }

    /// Forward each signal to `next` after it is written
    pub fn forward_to(mut self, next: Arc<dyn SignalSink>) -> Self {
        self.next = Some(next);
        self
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

#[async_trait]
impl<W> SignalSink for EchoSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn emit(&self, signal: Signal) -> Result<(), SinkError> {
        let mut line = serde_json::to_vec(&signal).map_err(|e| SinkError::Publish(e.to_string()))?;
        line.push(b'\n');

        {
            let mut writer = self.writer.lock().await;
            writer
                .write_all(&line)
                .await
                .map_err(|e| SinkError::Publish(e.to_string()))?;
            writer.flush().await.map_err(|e| SinkError::Publish(e.to_string()))?;
        }

        match &self.next {
            Some(next) => next.emit(signal).await,
            None => Ok(()),
        }
    }
}

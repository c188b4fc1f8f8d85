use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::domain::{OrderLifecycleEvent, OrderRequest, OrderStatus};
use crate::ports::{OrderRouter, RouterError};

/// Terminal outcome the paper venue reports for every order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillMode {
    #[default]
    Filled,
    Expired,
    /// Reported as an `error` lifecycle event
    Rejected,
}

impl FillMode {
    fn terminal_status(&self) -> OrderStatus {
        match self {
            FillMode::Filled => OrderStatus::Filled,
            FillMode::Expired => OrderStatus::Expired,
            FillMode::Rejected => OrderStatus::Error,
        }
    }
}

impl fmt::Display for FillMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FillMode::Filled => write!(f, "filled"),
            FillMode::Expired => write!(f, "expired"),
            FillMode::Rejected => write!(f, "rejected"),
        }
    }
}

impl FromStr for FillMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "filled" | "fill" => Ok(FillMode::Filled),
            "expired" | "expire" => Ok(FillMode::Expired),
            "rejected" | "reject" | "error" => Ok(FillMode::Rejected),
            other => Err(format!("unknown fill mode: {other}")),
        }
    }
}

pub struct PaperRouter {
    events: mpsc::UnboundedSender<OrderLifecycleEvent>,
    mode: FillMode,
    submitted: AtomicU64,
}

impl PaperRouter {
    pub fn new(events: mpsc::UnboundedSender<OrderLifecycleEvent>, mode: FillMode) -> Self {
        Self {
            events,
            mode,
            submitted: AtomicU64::new(0),
        }
    }

    pub fn submitted(&self) -> u64 {
        self.submitted.load(Ordering::Relaxed)
    }

    fn publish(&self, request: &OrderRequest, status: OrderStatus) -> Result<(), RouterError> {
        let event = OrderLifecycleEvent::new(request.instrument.clone(), request.side, status)
            .with_signal(request.signal_id);
        self.events
            .send(event)
            .map_err(|_| RouterError::Unavailable("lifecycle channel closed".to_string()))
    }
}

#[async_trait]
impl OrderRouter for PaperRouter {
    async fn submit(&self, request: &OrderRequest) -> Result<(), RouterError> {
        debug!(order = %request.id, instrument = %request.instrument, side = %request.side, "Paper order received");

        self.publish(request, OrderStatus::New)?;
        self.publish(request, self.mode.terminal_status())?;
        self.submitted.fetch_add(1, Ordering::Relaxed);

        info!(
            order = %request.id,
            instrument = %request.instrument,
            side = %request.side,
            outcome = %self.mode,
            "Paper order settled"
        );
        Ok(())
    }
}

//! Order lifecycle acknowledgements delivered by the external order system.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::signal::SignalId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "buy"),
            OrderSide::Sell => write!(f, "sell"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Venue accepted the order; it is live but unfilled
    New,
    Filled,
    Expired,
    Error,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderStatus::New => write!(f, "new"),
            OrderStatus::Filled => write!(f, "filled"),
            OrderStatus::Expired => write!(f, "expired"),
            OrderStatus::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLifecycleEvent {
    pub instrument: String,
    pub side: OrderSide,
    pub status: OrderStatus,
    /// Present on buy-side failures so they can be tied back to the signal
    #[serde(default)]
    pub signal_id: Option<SignalId>,
    pub timestamp: DateTime<Utc>,
}

impl OrderLifecycleEvent {
    pub fn new(instrument: impl Into<String>, side: OrderSide, status: OrderStatus) -> Self {
        Self {
            instrument: instrument.into(),
            side,
            status,
            signal_id: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_signal(mut self, signal_id: SignalId) -> Self {
        self.signal_id = Some(signal_id);
        self
    }
}

impl fmt::Display for OrderLifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.instrument, self.side, self.status)
    }
}

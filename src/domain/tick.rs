use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Best bid/offer update for one instrument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    pub instrument: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub bid_price: Option<f64>,
    #[serde(default)]
    pub ask_price: Option<f64>,
}

impl Tick {
    pub fn new(instrument: impl Into<String>, timestamp: DateTime<Utc>, bid_price: Option<f64>) -> Self {
        Self {
            instrument: instrument.into(),
            timestamp,
            bid_price,
            ask_price: None,
        }
    }

    /// Bid price usable for statistics, if any.
    ///
    /// Absent, zero, negative and non-finite bids are all treated as missing.
    pub fn valid_bid(&self) -> Option<f64> {
        self.bid_price.filter(|p| p.is_finite() && *p > 0.0)
    }
}

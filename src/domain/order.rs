use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::lifecycle::OrderSide;
use super::signal::{Signal, SignalId, TimeInForce};

/// Order handed to the router for a single signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub id: Uuid,
    pub signal_id: SignalId,
    pub instrument: String,
    pub side: OrderSide,
    pub quantity: Decimal,
    /// Capital to deploy on buys sized by notional
    pub total_price: Option<Decimal>,
    pub time_in_force: TimeInForce,
    pub check_position: bool,
    pub created_at: DateTime<Utc>,
}

impl OrderRequest {
    pub fn from_signal(signal: &Signal) -> Self {
        let ordering = signal.ordering();
        let (side, total_price) = match signal {
            Signal::Buy(buy) => (OrderSide::Buy, Some(buy.total_price)),
            Signal::Sell(_) => (OrderSide::Sell, None),
        };

        Self {
            id: Uuid::new_v4(),
            signal_id: signal.id(),
            instrument: signal.instrument().to_string(),
            side,
            quantity: signal.quantity(),
            total_price,
            time_in_force: ordering.time_in_force,
            check_position: ordering.check_position.unwrap_or(true),
            created_at: Utc::now(),
        }
    }
}

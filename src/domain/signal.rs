//! Trading signals emitted by the decision engines.
//!
//! A signal is immutable once built. BUY signals carry the capital to deploy,
//! SELL signals point back at the BUY they close.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier of a signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignalId(Uuid);

impl SignalId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SignalId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SignalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Order time-in-force
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TimeInForce {
    /// Good till cancelled
    #[default]
    Gtc,
    /// Immediate or cancel
    Ioc,
    /// Fill or kill
    Fok,
}

impl fmt::Display for TimeInForce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeInForce::Gtc => write!(f, "GTC"),
            TimeInForce::Ioc => write!(f, "IOC"),
            TimeInForce::Fok => write!(f, "FOK"),
        }
    }
}

/// Ordering options attached to a signal for the downstream order system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OrderingInfo {
    pub time_in_force: TimeInForce,
    /// Whether the order system should verify the held position before selling
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_position: Option<bool>,
}

impl OrderingInfo {
    pub fn gtc() -> Self {
        Self::default()
    }

    pub fn with_check_position(mut self, check: bool) -> Self {
        self.check_position = Some(check);
        self
    }
}

/// Open a position with a fixed capital allocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuySignal {
    pub id: SignalId,
    pub instrument: String,
    /// Zero lets the order system size the order from `total_price`
    pub quantity: Decimal,
    pub total_price: Decimal,
    pub ordering: OrderingInfo,
    pub normalize: bool,
    pub created_at: DateTime<Utc>,
}

/// Close the position opened by `buy_signal_id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SellSignal {
    pub id: SignalId,
    pub instrument: String,
    pub quantity: Decimal,
    pub buy_signal_id: SignalId,
    pub ordering: OrderingInfo,
    pub normalize: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "side", rename_all = "UPPERCASE")]
pub enum Signal {
    Buy(BuySignal),
    Sell(SellSignal),
}

impl Signal {
    pub fn buy(
        instrument: impl Into<String>,
        total_price: Decimal,
        ordering: OrderingInfo,
        created_at: DateTime<Utc>,
    ) -> Self {
        Signal::Buy(BuySignal {
            id: SignalId::new(),
            instrument: instrument.into(),
            quantity: Decimal::ZERO,
            total_price,
            ordering,
            normalize: true,
            created_at,
        })
    }

    pub fn sell(
        instrument: impl Into<String>,
        quantity: Decimal,
        buy_signal_id: SignalId,
        ordering: OrderingInfo,
        created_at: DateTime<Utc>,
    ) -> Self {
        Signal::Sell(SellSignal {
            id: SignalId::new(),
            instrument: instrument.into(),
            quantity,
            buy_signal_id,
            ordering,
            normalize: true,
            created_at,
        })
    }

    pub fn id(&self) -> SignalId {
        match self {
            Signal::Buy(s) => s.id,
            Signal::Sell(s) => s.id,
        }
    }

    pub fn instrument(&self) -> &str {
        match self {
            Signal::Buy(s) => &s.instrument,
            Signal::Sell(s) => &s.instrument,
        }
    }

    pub fn quantity(&self) -> Decimal {
        match self {
            Signal::Buy(s) => s.quantity,
            Signal::Sell(s) => s.quantity,
        }
    }

    pub fn ordering(&self) -> &OrderingInfo {
        match self {
            Signal::Buy(s) => &s.ordering,
            Signal::Sell(s) => &s.ordering,
        }
    }

    pub fn is_buy(&self) -> bool {
        matches!(self, Signal::Buy(_))
    }

    pub fn is_sell(&self) -> bool {
        matches!(self, Signal::Sell(_))
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Buy(s) => write!(f, "BUY {} total={} [{}]", s.instrument, s.total_price, s.id),
            Signal::Sell(s) => write!(
                f,
                "SELL {} qty={} closes={} [{}]",
                s.instrument, s.quantity, s.buy_signal_id, s.id
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_buy_signal_defaults() {
        let signal = Signal::buy("BTC-USD", dec!(100), OrderingInfo::gtc(), Utc::now());
        assert!(signal.is_buy());
        assert_eq!(signal.quantity(), Decimal::ZERO);
        assert_eq!(signal.instrument(), "BTC-USD");
        match signal {
            Signal::Buy(buy) => {
                assert_eq!(buy.total_price, dec!(100));
                assert!(buy.normalize);
            }
            Signal::Sell(_) => panic!("expected buy"),
        }
    }

    #[test]
    fn test_signal_ids_are_unique() {
        let a = Signal::buy("X", dec!(1), OrderingInfo::gtc(), Utc::now());
        let b = Signal::buy("X", dec!(1), OrderingInfo::gtc(), Utc::now());
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_sell_references_buy() {
        let buy_id = SignalId::new();
        let sell = Signal::sell("X", dec!(0), buy_id, OrderingInfo::gtc(), Utc::now());
        match sell {
            Signal::Sell(s) => assert_eq!(s.buy_signal_id, buy_id),
            Signal::Buy(_) => panic!("expected sell"),
        }
    }

    #[test]
    fn test_json_shape() {
        let ordering = OrderingInfo::gtc().with_check_position(false);
        let sell = Signal::sell("ETH-USD", dec!(0), SignalId::new(), ordering, Utc::now());
        let json = serde_json::to_value(&sell).unwrap();

        assert_eq!(json["side"], "SELL");
        assert_eq!(json["ordering"]["time_in_force"], "GTC");
        assert_eq!(json["ordering"]["check_position"], false);

        let buy = Signal::buy("ETH-USD", dec!(100), OrderingInfo::gtc(), Utc::now());
        let json = serde_json::to_value(&buy).unwrap();
        assert_eq!(json["side"], "BUY");
        assert!(json["ordering"].get("check_position").is_none());
    }
}

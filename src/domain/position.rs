use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::signal::{BuySignal, Signal, SignalId};

/// Marker for the BUY signal an instrument is waiting to close
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenPosition {
    pub buy_signal_id: SignalId,
    pub quantity: Decimal,
    pub total_price: Decimal,
    pub opened_at: DateTime<Utc>,
}

impl From<&BuySignal> for OpenPosition {
    fn from(buy: &BuySignal) -> Self {
        Self {
            buy_signal_id: buy.id,
            quantity: buy.quantity,
            total_price: buy.total_price,
            opened_at: buy.created_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionState {
    NoPosition,
    PositionOpen,
}

#[derive(Debug, Error, PartialEq)]
pub enum PositionError {
    #[error("Position is already open for {0}")]
    AlreadyOpen(String),
    #[error("No open position for {0}")]
    NotOpen(String),
    #[error("Sell {sell} does not close open buy {open}")]
    Mismatch { sell: SignalId, open: SignalId },
}

/// Per-instrument slot holding at most one open BUY
#[derive(Debug, Clone, Default)]
pub struct PositionSlot {
    open: Option<OpenPosition>,
}

impl PositionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PositionState {
        if self.open.is_some() {
            PositionState::PositionOpen
        } else {
            PositionState::NoPosition
        }
    }

    pub fn current(&self) -> Option<&OpenPosition> {
        self.open.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    /// Apply an emitted signal to the slot.
    ///
    /// BUY opens, SELL closes the matching BUY. Returns the previous marker so
    /// the transition can be undone if the signal is never delivered.
    pub fn apply(&mut self, signal: &Signal) -> Result<Option<OpenPosition>, PositionError> {
        match signal {
            Signal::Buy(buy) => {
                if self.open.is_some() {
                    return Err(PositionError::AlreadyOpen(buy.instrument.clone()));
                }
                self.open = Some(OpenPosition::from(buy));
                Ok(None)
            }
            Signal::Sell(sell) => {
                let open = self
                    .open
                    .as_ref()
                    .ok_or_else(|| PositionError::NotOpen(sell.instrument.clone()))?;
                if open.buy_signal_id != sell.buy_signal_id {
                    return Err(PositionError::Mismatch {
                        sell: sell.buy_signal_id,
                        open: open.buy_signal_id,
                    });
                }
                Ok(self.open.take())
            }
        }
    }

    /// Undo `apply(signal)`, putting back `previous`.
    ///
    /// Only reverts while the slot still holds what `apply` left there: the
    /// BUY's marker for a BUY, nothing for a SELL. Returns false when a later
    /// signal has already moved the slot on.
    pub fn revert(&mut self, signal: &Signal, previous: Option<OpenPosition>) -> bool {
        let untouched = match signal {
            Signal::Buy(buy) => self.open.as_ref().map(|open| open.buy_signal_id) == Some(buy.id),
            Signal::Sell(_) => self.open.is_none(),
        };
        if untouched {
            self.open = previous;
        }
        untouched
    }
}

//! Order Routing Guard
//!
//! Keeps at most one order in flight per instrument. A slot is armed right
//! before an order is dispatched and released by any lifecycle
//! acknowledgement for that instrument.
//!
//! Every read and write, including the `can_order` check, goes through the
//! same async mutex so lifecycle handlers cannot interleave with a check.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;

use super::lifecycle::{OrderLifecycleEvent, OrderSide, OrderStatus};
use super::order::OrderRequest;
use super::signal::{Signal, SignalId};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GuardError {
    #[error("Order already in flight for {instrument} (request {request})")]
    OrderInFlight { instrument: String, request: uuid::Uuid },

    #[error("Already holding {0}, refusing another buy")]
    AlreadyHolding(String),

    #[error("Not holding {0}, refusing sell")]
    NotHolding(String),
}

/// Whether recorded fills gate new orders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionPolicy {
    /// Only the routing slot is checked
    #[default]
    Unchecked,
    /// Buys need no recorded fill, sells need one
    RequireHolding,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RoutingSlot {
    Free,
    Routing(OrderRequest),
}

impl RoutingSlot {
    pub fn is_free(&self) -> bool {
        matches!(self, RoutingSlot::Free)
    }
}

/// Point-in-time view of the guard for monitoring
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GuardSnapshot {
    pub routing: usize,
    pub holding: usize,
    pub failures: usize,
}

#[derive(Debug, Default)]
struct GuardState {
    /// Absent key means the slot is free
    routing: HashMap<String, OrderRequest>,
    fills: HashMap<String, OrderLifecycleEvent>,
    failures: HashMap<SignalId, OrderLifecycleEvent>,
}

#[derive(Debug, Default)]
pub struct RoutingGuard {
    policy: PositionPolicy,
    state: Mutex<GuardState>,
}

impl RoutingGuard {
    pub fn new(policy: PositionPolicy) -> Self {
        Self {
            policy,
            state: Mutex::new(GuardState::default()),
        }
    }

    pub fn policy(&self) -> PositionPolicy {
        self.policy
    }

    /// Check whether an order for this signal may be submitted now
    pub async fn can_order(&self, signal: &Signal) -> bool {
        let state = self.state.lock().await;
        self.check(&state, signal).is_ok()
    }

    /// Mark the instrument as routing `request`.
    ///
    /// Must be called before the order is dispatched.
    pub async fn arm_route(&self, signal: &Signal, request: OrderRequest) {
        let mut state = self.state.lock().await;
        if let Some(previous) = state.routing.get(signal.instrument()) {
            tracing::warn!(
                instrument = signal.instrument(),
                previous = %previous.id,
                "Arming route over an order still in flight"
            );
        }
        state.routing.insert(signal.instrument().to_string(), request);
    }

    /// Check and arm in one critical section
    pub async fn try_arm(&self, signal: &Signal, request: OrderRequest) -> Result<(), GuardError> {
        let mut state = self.state.lock().await;
        self.check(&state, signal)?;
        state.routing.insert(signal.instrument().to_string(), request);
        Ok(())
    }

    pub async fn slot(&self, instrument: &str) -> RoutingSlot {
        let state = self.state.lock().await;
        match state.routing.get(instrument) {
            Some(request) => RoutingSlot::Routing(request.clone()),
            None => RoutingSlot::Free,
        }
    }

    /// Apply a lifecycle acknowledgement.
    ///
    /// Every event frees the slot, including `New`: the venue has the order
    /// but it may still be live.
    pub async fn on_lifecycle_event(&self, event: &OrderLifecycleEvent) {
        let mut state = self.state.lock().await;
        state.routing.remove(&event.instrument);

        match (event.side, event.status) {
            (OrderSide::Buy, OrderStatus::Filled) => {
                state.fills.insert(event.instrument.clone(), event.clone());
            }
            (OrderSide::Buy, OrderStatus::Expired | OrderStatus::Error) => match event.signal_id {
                Some(signal_id) => {
                    state.failures.insert(signal_id, event.clone());
                }
                None => {
                    tracing::warn!(instrument = %event.instrument, status = %event.status, "Buy failure without signal id");
                }
            },
            (OrderSide::Sell, OrderStatus::Filled) => {
                state.fills.remove(&event.instrument);
            }
            (_, OrderStatus::New) | (OrderSide::Sell, OrderStatus::Expired | OrderStatus::Error) => {}
        }

        tracing::debug!(event = %event, "Routing slot released");
    }

    /// Whether a buy fill is recorded and not yet closed by a sell fill
    pub async fn is_holding(&self, instrument: &str) -> bool {
        self.state.lock().await.fills.contains_key(instrument)
    }

    pub async fn failure(&self, signal_id: &SignalId) -> Option<OrderLifecycleEvent> {
        self.state.lock().await.failures.get(signal_id).cloned()
    }

    pub async fn snapshot(&self) -> GuardSnapshot {
        let state = self.state.lock().await;
        GuardSnapshot {
            routing: state.routing.len(),
            holding: state.fills.len(),
            failures: state.failures.len(),
        }
    }

    fn check(&self, state: &GuardState, signal: &Signal) -> Result<(), GuardError> {
        let instrument = signal.instrument();
        if let Some(request) = state.routing.get(instrument) {
            return Err(GuardError::OrderInFlight {
                instrument: instrument.to_string(),
                request: request.id,
            });
        }

        if self.policy == PositionPolicy::RequireHolding {
            let holding = state.fills.contains_key(instrument);
            match signal {
                Signal::Buy(_) if holding => {
                    return Err(GuardError::AlreadyHolding(instrument.to_string()));
                }
                Signal::Sell(_) if !holding => {
                    return Err(GuardError::NotHolding(instrument.to_string()));
                }
                _ => {}
            }
        }

        Ok(())
    }
}

//! Domain Layer - Core types and the order routing guard
//!
//! Pure domain types with no I/O. The routing guard is the only stateful
//! piece here; it is shared between the signal path and the lifecycle path.

pub mod tick;
pub mod signal;
pub mod position;
pub mod lifecycle;
pub mod order;
pub mod routing_guard;

pub use tick::Tick;
pub use signal::{BuySignal, OrderingInfo, SellSignal, Signal, SignalId, TimeInForce};
pub use position::{OpenPosition, PositionError, PositionSlot, PositionState};
pub use lifecycle::{OrderLifecycleEvent, OrderSide, OrderStatus};
pub use order::OrderRequest;
pub use routing_guard::{GuardError, GuardSnapshot, PositionPolicy, RoutingGuard, RoutingSlot};

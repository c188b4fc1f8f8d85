//! Paper Trading Router
//!
//! Simulated venue for replay runs. Every order is acknowledged immediately
//! with a `new` event followed by a fixed terminal outcome.

mod router;

pub use router::{FillMode, PaperRouter};

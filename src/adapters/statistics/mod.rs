//! Rolling statistics over trailing windows of tick prices.

pub mod rolling_window;

pub use rolling_window::{RollingWindow, RollingWindowFactory};

//! Strategy Parameters
//!
//! Parameter structs for the two decision engines. Defaults follow the
//! production settings: 4h slow / 1h fast crossover, 4h band window with a
//! 5 minute confirmation window, 99th percentile exit, 100 per buy.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::domain::TimeInForce;
use crate::ports::WindowSpan;

pub const DEFAULT_SLOW_WINDOW_SECS: u64 = 4 * 3600;
pub const DEFAULT_FAST_WINDOW_SECS: u64 = 3600;
pub const DEFAULT_ROLLING_WINDOW_SECS: u64 = 4 * 3600;
pub const DEFAULT_CONFIRM_WINDOW_SECS: u64 = 5 * 60;
pub const DEFAULT_PERCENTILE: u8 = 99;
pub const DEFAULT_BAND_WIDTH: f64 = 2.0;
pub const DEFAULT_WALLET: Decimal = dec!(100);

/// Dual-window mean crossover
#[derive(Debug, Clone, PartialEq)]
pub struct CrossoverParams {
    pub slow_window: WindowSpan,
    pub fast_window: WindowSpan,
    /// Capital per BUY
    pub wallet: Decimal,
    pub time_in_force: TimeInForce,
}

impl Default for CrossoverParams {
    fn default() -> Self {
        Self {
            slow_window: WindowSpan::seconds(DEFAULT_SLOW_WINDOW_SECS),
            fast_window: WindowSpan::seconds(DEFAULT_FAST_WINDOW_SECS),
            wallet: DEFAULT_WALLET,
            time_in_force: TimeInForce::Gtc,
        }
    }
}

impl CrossoverParams {
    pub fn with_windows(mut self, slow: WindowSpan, fast: WindowSpan) -> Self {
        self.slow_window = slow;
        self.fast_window = fast;
        self
    }

    pub fn with_wallet(mut self, wallet: Decimal) -> Self {
        self.wallet = wallet;
        self
    }

    pub fn validate(&self) -> Result<(), ParamsError> {
        validate_span("slow_window", self.slow_window)?;
        validate_span("fast_window", self.fast_window)?;
        if span_exceeds(self.fast_window, self.slow_window) {
            return Err(ParamsError::FastSlowerThanSlow);
        }
        validate_wallet(self.wallet)
    }
}

/// Percentile exit / Bollinger entry with short-window confirmation
#[derive(Debug, Clone, PartialEq)]
pub struct BandBreachParams {
    pub rolling_window: WindowSpan,
    pub confirm_window: WindowSpan,
    /// Exit threshold percentile (1-100)
    pub percentile: u8,
    /// Band width in standard deviations
    pub band_width: f64,
    pub wallet: Decimal,
    pub time_in_force: TimeInForce,
}

impl Default for BandBreachParams {
    fn default() -> Self {
        Self {
            rolling_window: WindowSpan::seconds(DEFAULT_ROLLING_WINDOW_SECS),
            confirm_window: WindowSpan::seconds(DEFAULT_CONFIRM_WINDOW_SECS),
            percentile: DEFAULT_PERCENTILE,
            band_width: DEFAULT_BAND_WIDTH,
            wallet: DEFAULT_WALLET,
            time_in_force: TimeInForce::Gtc,
        }
    }
}

impl BandBreachParams {
    pub fn with_windows(mut self, rolling: WindowSpan, confirm: WindowSpan) -> Self {
        self.rolling_window = rolling;
        self.confirm_window = confirm;
        self
    }

    pub fn with_percentile(mut self, percentile: u8) -> Self {
        self.percentile = percentile;
        self
    }

    pub fn with_band_width(mut self, band_width: f64) -> Self {
        self.band_width = band_width;
        self
    }

    pub fn validate(&self) -> Result<(), ParamsError> {
        validate_span("rolling_window", self.rolling_window)?;
        validate_span("confirm_window", self.confirm_window)?;
        if self.percentile == 0 || self.percentile > 100 {
            return Err(ParamsError::InvalidPercentile(self.percentile));
        }
        if !self.band_width.is_finite() || self.band_width <= 0.0 {
            return Err(ParamsError::InvalidBandWidth(self.band_width));
        }
        validate_wallet(self.wallet)
    }
}

fn validate_span(name: &'static str, span: WindowSpan) -> Result<(), ParamsError> {
    let empty = match span {
        WindowSpan::Time(duration) => duration <= chrono::Duration::zero(),
        WindowSpan::Ticks(n) => n == 0,
    };
    if empty {
        return Err(ParamsError::EmptyWindow(name));
    }
    Ok(())
}

fn span_exceeds(a: WindowSpan, b: WindowSpan) -> bool {
    match (a, b) {
        (WindowSpan::Time(a), WindowSpan::Time(b)) => a > b,
        (WindowSpan::Ticks(a), WindowSpan::Ticks(b)) => a > b,
        _ => false,
    }
}

fn validate_wallet(wallet: Decimal) -> Result<(), ParamsError> {
    if wallet <= Decimal::ZERO {
        return Err(ParamsError::InvalidWallet(wallet));
    }
    Ok(())
}

/// Parameter validation errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParamsError {
    #[error("Window {0} must be longer than zero")]
    EmptyWindow(&'static str),
    #[error("Fast window must not be longer than the slow window")]
    FastSlowerThanSlow,
    #[error("Invalid percentile: {0} (must be 1-100)")]
    InvalidPercentile(u8),
    #[error("Invalid band width: {0} (must be > 0)")]
    InvalidBandWidth(f64),
    #[error("Invalid wallet allocation: {0} (must be > 0)")]
    InvalidWallet(Decimal),
}

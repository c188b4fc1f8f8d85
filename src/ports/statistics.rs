use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

/// Statistics error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StatisticsError {
    #[error("{aggregate} unavailable on {role} window")]
    Unavailable { role: &'static str, aggregate: &'static str },

    #[error("{aggregate} on {role} window is not finite: {value}")]
    NonFinite {
        role: &'static str,
        aggregate: &'static str,
        value: f64,
    },
}

/// How much history a window keeps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowSpan {
    /// Trailing wall-clock span measured on tick timestamps
    Time(Duration),
    /// Last N observations
    Ticks(usize),
}

impl WindowSpan {
    pub fn seconds(secs: u64) -> Self {
        WindowSpan::Time(Duration::seconds(secs as i64))
    }
}

/// Mean with bands `k` standard deviations above and below
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollingerBands {
    pub mean: f64,
    pub upper: f64,
    pub lower: f64,
}

/// Rolling aggregates over one instrument's prices.
///
/// Aggregates return `None` when the window holds no observations.
pub trait WindowedStatistics: Send {
    fn update(&mut self, timestamp: DateTime<Utc>, price: f64);

    /// Whether enough history has been observed to cover the span
    fn is_full(&self) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn mean(&self) -> Option<f64>;

    /// Percentile in 0..=100
    fn percentile(&self, p: u8) -> Option<f64>;

    fn bollinger(&self, k: f64) -> Option<BollingerBands>;

    /// Earliest price in the window
    fn open(&self) -> Option<f64>;

    /// Latest price in the window
    fn close(&self) -> Option<f64>;
}

/// Creates windows on first sight of an instrument
pub trait StatisticsFactory: Send + Sync {
    type Window: WindowedStatistics;

    fn create(&self, span: WindowSpan) -> Self::Window;
}

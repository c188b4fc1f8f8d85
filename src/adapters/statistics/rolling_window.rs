//! Rolling Window
//!
//! Trailing window of `(timestamp, price)` observations with the aggregates
//! the decision engines read. Time spans evict by tick timestamp, tick spans
//! keep the last N observations.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use statrs::statistics::{Data, OrderStatistics, Statistics};

use crate::ports::statistics::{BollingerBands, StatisticsFactory, WindowSpan, WindowedStatistics};

#[derive(Debug, Clone)]
pub struct RollingWindow {
    span: WindowSpan,
    samples: VecDeque<(DateTime<Utc>, f64)>,
    first_seen: Option<DateTime<Utc>>,
    full: bool,
}

impl RollingWindow {
    pub fn new(span: WindowSpan) -> Self {
        let capacity = match span {
            WindowSpan::Ticks(n) => n.max(1),
            WindowSpan::Time(_) => 0,
        };
        Self {
            span,
            samples: VecDeque::with_capacity(capacity),
            first_seen: None,
            full: false,
        }
    }

    pub fn span(&self) -> WindowSpan {
        self.span
    }

    fn latest_timestamp(&self) -> Option<DateTime<Utc>> {
        self.samples.back().map(|(ts, _)| *ts)
    }

    fn prices(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().map(|(_, price)| *price)
    }

    fn evict(&mut self, now: DateTime<Utc>) {
        match self.span {
            WindowSpan::Time(duration) => {
                let cutoff = now - duration;
                while self.samples.front().map_or(false, |(ts, _)| *ts < cutoff) {
                    self.samples.pop_front();
                }
                if let Some(first) = self.first_seen {
                    if now - first >= duration {
                        self.full = true;
                    }
                }
            }
            WindowSpan::Ticks(n) => {
                let n = n.max(1);
                while self.samples.len() > n {
                    self.samples.pop_front();
                }
                if self.samples.len() >= n {
                    self.full = true;
                }
            }
        }
    }
}

impl WindowedStatistics for RollingWindow {
    fn update(&mut self, timestamp: DateTime<Utc>, price: f64) {
        // Late ticks are folded in at the latest timestamp so the deque stays ordered
        let timestamp = match self.latest_timestamp() {
            Some(latest) if timestamp < latest => latest,
            _ => timestamp,
        };

        self.first_seen.get_or_insert(timestamp);
        self.samples.push_back((timestamp, price));
        self.evict(timestamp);
    }

    fn is_full(&self) -> bool {
        self.full
    }

    fn len(&self) -> usize {
        self.samples.len()
    }

    fn mean(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        Some(self.prices().mean())
    }

    fn percentile(&self, p: u8) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        let mut data = Data::new(self.prices().collect::<Vec<f64>>());
        Some(data.percentile(p as usize))
    }

    fn bollinger(&self, k: f64) -> Option<BollingerBands> {
        let mean = self.mean()?;
        // Zero for a single sample, so the bands collapse onto the mean
        let std_dev = self.prices().population_std_dev();

        Some(BollingerBands {
            mean,
            upper: mean + k * std_dev,
            lower: mean - k * std_dev,
        })
    }

    fn open(&self) -> Option<f64> {
        self.samples.front().map(|(_, price)| *price)
    }

    fn close(&self) -> Option<f64> {
        self.samples.back().map(|(_, price)| *price)
    }
}

/// Builds a fresh [`RollingWindow`] per instrument and role
#[derive(Debug, Clone, Copy, Default)]
pub struct RollingWindowFactory;

impl StatisticsFactory for RollingWindowFactory {
    type Window = RollingWindow;

    fn create(&self, span: WindowSpan) -> Self::Window {
        RollingWindow::new(span)
    }
}

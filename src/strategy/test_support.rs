//! Shared fixtures for engine tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use tokio::sync::Notify;

use crate::domain::{Signal, Tick};
use crate::ports::signal_sink::MockSignalSink;
use crate::ports::{BollingerBands, SignalSink, SinkError, StatisticsFactory, WindowSpan, WindowedStatistics};

pub(crate) fn accepting_sink() -> Arc<dyn SignalSink> {
    let mut sink = MockSignalSink::new();
    sink.expect_emit().returning(|_| Ok(()));
    Arc::new(sink)
}

/// Accepts BUYs. Holds each SELL until `release`, then fails it.
#[derive(Debug, Default)]
pub(crate) struct HeldSellSink {
    pub entered: Notify,
    pub release: Notify,
}

#[async_trait]
impl SignalSink for HeldSellSink {
    async fn emit(&self, signal: Signal) -> Result<(), SinkError> {
        if signal.is_buy() {
            return Ok(());
        }
        self.entered.notify_one();
        self.release.notified().await;
        Err(SinkError::Publish("bus unavailable".to_string()))
    }
}

pub(crate) fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000, 0).unwrap() + Duration::seconds(secs)
}

pub(crate) fn tick(instrument: &str, secs: i64, bid: Option<f64>) -> Tick {
    Tick::new(instrument, at(secs), bid)
}

/// Values every scripted window reports
#[derive(Debug, Clone, Default)]
pub(crate) struct Script {
    pub full: bool,
    pub mean: Option<f64>,
    pub percentile: Option<f64>,
    pub bands: Option<BollingerBands>,
    pub open: Option<f64>,
    pub close: Option<f64>,
}

/// Factory whose windows ignore their input and read a shared script
#[derive(Debug, Clone, Default)]
pub(crate) struct ScriptedFactory {
    script: Arc<Mutex<Script>>,
}

impl ScriptedFactory {
    pub fn set(&self, edit: impl FnOnce(&mut Script)) {
        edit(&mut self.script.lock().unwrap());
    }
}

impl StatisticsFactory for ScriptedFactory {
    type Window = ScriptedWindow;

    fn create(&self, _span: WindowSpan) -> Self::Window {
        ScriptedWindow {
            script: self.script.clone(),
            updates: 0,
        }
    }
}

#[derive(Debug)]
pub(crate) struct ScriptedWindow {
    script: Arc<Mutex<Script>>,
    updates: usize,
}

impl ScriptedWindow {
    fn read<T>(&self, f: impl FnOnce(&Script) -> T) -> T {
        f(&self.script.lock().unwrap())
    }
}

impl WindowedStatistics for ScriptedWindow {
    fn update(&mut self, _timestamp: DateTime<Utc>, _price: f64) {
        self.updates += 1;
    }

    fn is_full(&self) -> bool {
        self.read(|s| s.full)
    }

    fn len(&self) -> usize {
        self.updates
    }

    fn mean(&self) -> Option<f64> {
        self.read(|s| s.mean)
    }

    fn percentile(&self, _p: u8) -> Option<f64> {
        self.read(|s| s.percentile)
    }

    fn bollinger(&self, _k: f64) -> Option<BollingerBands> {
        self.read(|s| s.bands)
    }

    fn open(&self) -> Option<f64> {
        self.read(|s| s.open)
    }

    fn close(&self) -> Option<f64> {
        self.read(|s| s.close)
    }
}

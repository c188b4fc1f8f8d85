//! Per-instrument engine state shared by both strategies.

use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::domain::{OpenPosition, PositionSlot, Signal};
use crate::ports::{EngineError, SignalSink, StatisticsError};

/// What a strategy rule concluded for one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Hold,
    Open,
    Close,
}

#[derive(Debug)]
pub(crate) struct InstrumentState<S> {
    pub windows: S,
    pub position: PositionSlot,
    /// Set after a statistics fault; ticks are ignored from then on
    pub quarantined: bool,
}

#[derive(Debug)]
pub(crate) struct InstrumentTable<S> {
    instruments: HashMap<String, InstrumentState<S>>,
}

impl<S> Default for InstrumentTable<S> {
    fn default() -> Self {
        Self {
            instruments: HashMap::new(),
        }
    }
}

impl<S> InstrumentTable<S> {
    /// State for `instrument`, creating its windows on first sight
    pub fn get_or_create(&mut self, instrument: &str, create: impl FnOnce() -> S) -> &mut InstrumentState<S> {
        if !self.instruments.contains_key(instrument) {
            tracing::debug!(instrument, "Creating statistics windows");
        }
        self.instruments
            .entry(instrument.to_string())
            .or_insert_with(|| InstrumentState {
                windows: create(),
                position: PositionSlot::new(),
                quarantined: false,
            })
    }

    pub fn get_mut(&mut self, instrument: &str) -> Option<&mut InstrumentState<S>> {
        self.instruments.get_mut(instrument)
    }

    pub fn open_position(&self, instrument: &str) -> Option<OpenPosition> {
        self.instruments
            .get(instrument)
            .and_then(|state| state.position.current().cloned())
    }
}

/// Reject missing or non-finite aggregates
pub(crate) fn finite(role: &'static str, aggregate: &'static str, value: Option<f64>) -> Result<f64, StatisticsError> {
    match value {
        None => Err(StatisticsError::Unavailable { role, aggregate }),
        Some(v) if !v.is_finite() => Err(StatisticsError::NonFinite { role, aggregate, value: v }),
        Some(v) => Ok(v),
    }
}

pub(crate) fn quarantine<S>(state: &mut InstrumentState<S>, instrument: &str, source: StatisticsError) -> EngineError {
    state.quarantined = true;
    tracing::error!(instrument, error = %source, "Statistics fault, instrument quarantined");
    EngineError::StatisticsFault {
        instrument: instrument.to_string(),
        source,
    }
}

/// Hand a committed signal to the sink, undoing the marker change if it
/// never gets there and no later signal has moved the marker since. The
/// table lock is not held across the sink call.
pub(crate) async fn deliver<S>(
    table: &Mutex<InstrumentTable<S>>,
    sink: &dyn SignalSink,
    signal: Signal,
    previous: Option<OpenPosition>,
) -> Result<Signal, EngineError> {
    match sink.emit(signal.clone()).await {
        Ok(()) => {
            tracing::info!(signal = %signal, "Signal emitted");
            Ok(signal)
        }
        Err(source) => {
            let instrument = signal.instrument().to_string();
            let reverted = match table.lock().await.get_mut(&instrument) {
                Some(state) => state.position.revert(&signal, previous),
                None => false,
            };
            if reverted {
                tracing::error!(instrument = %instrument, error = %source, "Signal not delivered, position marker reverted");
            } else {
                tracing::error!(
                    instrument = %instrument,
                    error = %source,
                    "Signal not delivered, position marker already superseded"
                );
            }
            Err(EngineError::Emit { instrument, source })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finite() {
        assert_eq!(finite("slow", "mean", Some(1.5)), Ok(1.5));
        assert!(matches!(
            finite("slow", "mean", None),
            Err(StatisticsError::Unavailable { role: "slow", aggregate: "mean" })
        ));
        assert!(matches!(
            finite("slow", "mean", Some(f64::INFINITY)),
            Err(StatisticsError::NonFinite { .. })
        ));
    }

    #[test]
    fn test_windows_created_once() {
        let mut table: InstrumentTable<u32> = InstrumentTable::default();
        let mut created = 0;
        table.get_or_create("X", || {
            created += 1;
            7
        });
        table.get_or_create("X", || {
            created += 1;
            8
        });
        assert_eq!(created, 1);
        assert_eq!(table.get_mut("X").unwrap().windows, 7);
        assert!(table.open_position("X").is_none());
        assert!(table.open_position("Y").is_none());
    }
}

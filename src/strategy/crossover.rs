//! Mean Crossover Engine
//!
//! Buys when the fast rolling mean rises above the slow one and sells the
//! open position when it falls back below. The slow window gates warm-up.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::adapters::statistics::RollingWindowFactory;
use crate::domain::{OpenPosition, OrderingInfo, PositionPolicy, RoutingGuard, Signal, Tick};
use crate::ports::{
    DecisionEngine, EngineError, SignalSink, StatisticsError, StatisticsFactory, WindowedStatistics,
};
use crate::strategy::params::CrossoverParams;
use crate::strategy::state::{deliver, finite, quarantine, Decision, InstrumentTable};

#[derive(Debug)]
struct CrossoverWindows<W> {
    slow: W,
    fast: W,
}

/// Compare rolling means for one tick
pub fn crossover_decision(slow_mean: f64, fast_mean: f64, has_position: bool) -> Decision {
    if !has_position && slow_mean < fast_mean {
        Decision::Open
    } else if has_position && fast_mean < slow_mean {
        Decision::Close
    } else {
        Decision::Hold
    }
}

pub struct CrossoverEngine<F: StatisticsFactory = RollingWindowFactory> {
    params: CrossoverParams,
    factory: F,
    guard: RoutingGuard,
    sink: Arc<dyn SignalSink>,
    instruments: Mutex<InstrumentTable<CrossoverWindows<F::Window>>>,
}

impl CrossoverEngine<RollingWindowFactory> {
    pub fn new(params: CrossoverParams, sink: Arc<dyn SignalSink>) -> Self {
        Self::with_factory(params, RollingWindowFactory, sink)
    }
}

impl<F: StatisticsFactory> CrossoverEngine<F> {
    pub fn with_factory(params: CrossoverParams, factory: F, sink: Arc<dyn SignalSink>) -> Self {
        Self {
            params,
            factory,
            guard: RoutingGuard::new(PositionPolicy::Unchecked),
            sink,
            instruments: Mutex::new(InstrumentTable::default()),
        }
    }

    fn means(windows: &CrossoverWindows<F::Window>) -> Result<(f64, f64), StatisticsError> {
        let slow = finite("slow", "mean", windows.slow.mean())?;
        let fast = finite("fast", "mean", windows.fast.mean())?;
        Ok((slow, fast))
    }
}

#[async_trait]
impl<F: StatisticsFactory> DecisionEngine for CrossoverEngine<F> {
    fn name(&self) -> &'static str {
        "crossover"
    }

    fn guard(&self) -> &RoutingGuard {
        &self.guard
    }

    async fn on_tick(&self, tick: &Tick) -> Result<Option<Signal>, EngineError> {
        let Some(price) = tick.valid_bid() else {
            tracing::debug!(instrument = %tick.instrument, "Tick without bid price ignored");
            return Ok(None);
        };

        let (signal, previous) = {
            let mut table = self.instruments.lock().await;
            let state = table.get_or_create(&tick.instrument, || CrossoverWindows {
                slow: self.factory.create(self.params.slow_window),
                fast: self.factory.create(self.params.fast_window),
            });
            if state.quarantined {
                return Ok(None);
            }

            state.windows.slow.update(tick.timestamp, price);
            state.windows.fast.update(tick.timestamp, price);

            if !state.windows.slow.is_full() {
                tracing::debug!(instrument = %tick.instrument, "Warming up");
                return Ok(None);
            }

            let (slow_mean, fast_mean) = match Self::means(&state.windows) {
                Ok(means) => means,
                Err(source) => return Err(quarantine(state, &tick.instrument, source)),
            };

            let decision = crossover_decision(slow_mean, fast_mean, state.position.is_open());
            let signal = match (decision, state.position.current()) {
                (Decision::Open, _) => Signal::buy(
                    tick.instrument.clone(),
                    self.params.wallet,
                    OrderingInfo {
                        time_in_force: self.params.time_in_force,
                        check_position: None,
                    },
                    tick.timestamp,
                ),
                (Decision::Close, Some(open)) => Signal::sell(
                    tick.instrument.clone(),
                    open.quantity,
                    open.buy_signal_id,
                    OrderingInfo {
                        time_in_force: self.params.time_in_force,
                        check_position: None,
                    },
                    tick.timestamp,
                ),
                _ => return Ok(None),
            };

            tracing::debug!(
                instrument = %tick.instrument,
                slow_mean,
                fast_mean,
                "Crossover triggered"
            );
            let previous = state.position.apply(&signal)?;
            (signal, previous)
        };

        deliver(&self.instruments, self.sink.as_ref(), signal, previous)
            .await
            .map(Some)
    }

    async fn open_position(&self, instrument: &str) -> Option<OpenPosition> {
        self.instruments.lock().await.open_position(instrument)
    }
}

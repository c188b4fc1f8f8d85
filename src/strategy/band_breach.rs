//! Band Breach Engine
//!
//! Entry: within the short confirmation window price opened below the lower
//! Bollinger band of the primary window and closed back above it.
//! Exit: price opened above the primary window's high percentile and closed
//! below it.
//!
//! Orders from this engine are position-gated: the routing guard refuses a
//! buy while a fill is held and a sell while none is.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::adapters::statistics::RollingWindowFactory;
use crate::domain::{OpenPosition, OrderingInfo, PositionPolicy, RoutingGuard, Signal, Tick};
use crate::ports::{
    DecisionEngine, EngineError, SignalSink, StatisticsError, StatisticsFactory, WindowedStatistics,
};
use crate::strategy::params::BandBreachParams;
use crate::strategy::state::{deliver, finite, quarantine, Decision, InstrumentTable};

#[derive(Debug)]
struct BandWindows<W> {
    primary: W,
    confirm: W,
}

/// Levels read from the windows for one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandLevels {
    pub high_percentile: f64,
    pub lower_band: f64,
    pub confirm_open: f64,
    pub confirm_close: f64,
}

/// Strict breach-and-reclaim / breach-and-drop rule
pub fn band_decision(levels: &BandLevels, has_position: bool) -> Decision {
    let BandLevels {
        high_percentile,
        lower_band,
        confirm_open,
        confirm_close,
    } = *levels;

    if !has_position && confirm_open < lower_band && lower_band < confirm_close {
        Decision::Open
    } else if has_position && confirm_close < high_percentile && high_percentile < confirm_open {
        Decision::Close
    } else {
        Decision::Hold
    }
}

pub struct BandBreachEngine<F: StatisticsFactory = RollingWindowFactory> {
    params: BandBreachParams,
    factory: F,
    guard: RoutingGuard,
    sink: Arc<dyn SignalSink>,
    instruments: Mutex<InstrumentTable<BandWindows<F::Window>>>,
}

impl BandBreachEngine<RollingWindowFactory> {
    pub fn new(params: BandBreachParams, sink: Arc<dyn SignalSink>) -> Self {
        Self::with_factory(params, RollingWindowFactory, sink)
    }
}

impl<F: StatisticsFactory> BandBreachEngine<F> {
    pub fn with_factory(params: BandBreachParams, factory: F, sink: Arc<dyn SignalSink>) -> Self {
        Self {
            params,
            factory,
            guard: RoutingGuard::new(PositionPolicy::RequireHolding),
            sink,
            instruments: Mutex::new(InstrumentTable::default()),
        }
    }

    fn levels(&self, windows: &BandWindows<F::Window>) -> Result<BandLevels, StatisticsError> {
        let high_percentile = finite("primary", "percentile", windows.primary.percentile(self.params.percentile))?;
        let bands = windows
            .primary
            .bollinger(self.params.band_width)
            .ok_or(StatisticsError::Unavailable {
                role: "primary",
                aggregate: "bollinger",
            })?;
        let lower_band = finite("primary", "lower band", Some(bands.lower))?;
        let confirm_open = finite("confirm", "open", windows.confirm.open())?;
        let confirm_close = finite("confirm", "close", windows.confirm.close())?;

        Ok(BandLevels {
            high_percentile,
            lower_band,
            confirm_open,
            confirm_close,
        })
    }
}

#[async_trait]
impl<F: StatisticsFactory> DecisionEngine for BandBreachEngine<F> {
    fn name(&self) -> &'static str {
        "band_breach"
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
            let state = table.get_or_create(&tick.instrument, || BandWindows {
                primary: self.factory.create(self.params.rolling_window),
                confirm: self.factory.create(self.params.confirm_window),
            });
            if state.quarantined {
                return Ok(None);
            }

            state.windows.primary.update(tick.timestamp, price);
            state.windows.confirm.update(tick.timestamp, price);

            if !state.windows.primary.is_full() {
                tracing::debug!(instrument = %tick.instrument, "Warming up");
                return Ok(None);
            }

            let levels = match self.levels(&state.windows) {
                Ok(levels) => levels,
                Err(source) => return Err(quarantine(state, &tick.instrument, source)),
            };

            let ordering = OrderingInfo {
                time_in_force: self.params.time_in_force,
                check_position: None,
            };
            let decision = band_decision(&levels, state.position.is_open());
            let signal = match (decision, state.position.current()) {
                (Decision::Open, _) => Signal::buy(
                    tick.instrument.clone(),
                    self.params.wallet,
                    ordering,
                    tick.timestamp,
                ),
                (Decision::Close, Some(open)) => Signal::sell(
                    tick.instrument.clone(),
                    open.quantity,
                    open.buy_signal_id,
                    ordering.with_check_position(false),
                    tick.timestamp,
                ),
                _ => return Ok(None),
            };

            tracing::debug!(instrument = %tick.instrument, ?levels, "Band breach triggered");
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

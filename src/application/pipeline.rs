//! Signal Pipeline
//!
//! Drives a decision engine from the tick stream and routes the signals it
//! emits. One loop consumes three channels:
//! - lifecycle events from the order system, applied to the routing guard
//! - signals published by the engine, turned into guarded order requests
//! - ticks, handed to the engine
//!
//! Lifecycle events and signals are drained before the next tick so the
//! guard always sees acknowledgements in arrival order.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::{mpsc, watch, RwLock};

use crate::domain::{GuardSnapshot, OrderLifecycleEvent, OrderRequest, OrderStatus, Signal, Tick};
use crate::ports::{DecisionEngine, EngineError, OrderRouter};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Pipeline is already running")]
    AlreadyRunning,
}

/// Receiving ends the pipeline consumes
pub struct PipelineInputs {
    pub ticks: mpsc::Receiver<Tick>,
    pub lifecycle: mpsc::UnboundedReceiver<OrderLifecycleEvent>,
    pub signals: mpsc::Receiver<Signal>,
}

/// Counters for one pipeline run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineReport {
    pub ticks: u64,
    pub signals: u64,
    pub orders_routed: u64,
    pub orders_refused: u64,
    pub submit_failures: u64,
    pub lifecycle_events: u64,
    pub engine_errors: u64,
}

/// Status snapshot of the pipeline
#[derive(Debug, Clone)]
pub struct PipelineStatus {
    pub is_running: bool,
    pub strategy: &'static str,
    pub guard: GuardSnapshot,
}

pub struct SignalPipeline {
    engine: Arc<dyn DecisionEngine>,
    router: Arc<dyn OrderRouter>,
    is_running: Arc<RwLock<bool>>,
    stop: watch::Sender<bool>,
}

impl SignalPipeline {
    pub fn new(engine: Arc<dyn DecisionEngine>, router: Arc<dyn OrderRouter>) -> Self {
        Self {
            engine,
            router,
            is_running: Arc::new(RwLock::new(false)),
            stop: watch::Sender::new(false),
        }
    }

    pub fn engine(&self) -> &Arc<dyn DecisionEngine> {
        &self.engine
    }

    /// Run until the tick stream ends or [`stop`](Self::stop) is called
    pub async fn run(&self, inputs: PipelineInputs) -> Result<PipelineReport, PipelineError> {
        {
            let mut running = self.is_running.write().await;
            if *running {
                return Err(PipelineError::AlreadyRunning);
            }
            *running = true;
        }

        // A stop requested outside a run does not carry over into this one
        self.stop.send_replace(false);
        let mut stop = self.stop.subscribe();

        let PipelineInputs {
            mut ticks,
            mut lifecycle,
            mut signals,
        } = inputs;
        let mut report = PipelineReport::default();

        tracing::info!(strategy = self.engine.name(), "Signal pipeline started");

        loop {
            tokio::select! {
                biased;

                _ = async { stop.wait_for(|stopped| *stopped).await.map(|_| ()) } => {
                    tracing::info!("Stop requested");
                    break;
                }
                Some(event) = lifecycle.recv() => {
                    self.apply_lifecycle(&event, &mut report).await;
                }
                Some(signal) = signals.recv() => {
                    self.dispatch(signal, &mut report).await;
                }
                tick = ticks.recv() => match tick {
                    Some(tick) => self.handle_tick(&tick, &mut report).await,
                    None => {
                        tracing::info!("Tick stream ended");
                        break;
                    }
                },
            }
        }

        // Work already queued when the loop ended is still applied
        loop {
            if let Ok(event) = lifecycle.try_recv() {
                self.apply_lifecycle(&event, &mut report).await;
            } else if let Ok(signal) = signals.try_recv() {
                self.dispatch(signal, &mut report).await;
            } else {
                break;
            }
        }

        *self.is_running.write().await = false;
        tracing::info!(?report, "Signal pipeline stopped");
        Ok(report)
    }

    /// Stop the current run at its next iteration. Has no effect on a run
    /// started afterwards.
    pub fn stop(&self) {
        self.stop.send_replace(true);
        tracing::info!("Stop signal sent to pipeline");
    }

    pub async fn status(&self) -> PipelineStatus {
        PipelineStatus {
            is_running: *self.is_running.read().await,
            strategy: self.engine.name(),
            guard: self.engine.guard().snapshot().await,
        }
    }

    async fn handle_tick(&self, tick: &Tick, report: &mut PipelineReport) {
        report.ticks += 1;
        match self.engine.on_tick(tick).await {
            Ok(Some(_)) => report.signals += 1,
            Ok(None) => {}
            Err(e @ EngineError::StatisticsFault { .. }) => {
                report.engine_errors += 1;
                tracing::warn!(error = %e, "Instrument dropped from trading");
            }
            Err(e) => {
                report.engine_errors += 1;
                tracing::error!(instrument = %tick.instrument, error = %e, "Tick processing failed");
            }
        }
    }

    async fn apply_lifecycle(&self, event: &OrderLifecycleEvent, report: &mut PipelineReport) {
        report.lifecycle_events += 1;
        tracing::debug!(
            instrument = %event.instrument,
            side = %event.side,
            status = %event.status,
            "Lifecycle event"
        );
        self.engine.on_lifecycle_event(event).await;
    }

    /// Arm the guard and submit one order for `signal`
    async fn dispatch(&self, signal: Signal, report: &mut PipelineReport) {
        let request = OrderRequest::from_signal(&signal);

        if let Err(e) = self.engine.guard().try_arm(&signal, request.clone()).await {
            report.orders_refused += 1;
            tracing::warn!(signal = %signal.id(), error = %e, "Order refused by routing guard");
            return;
        }

        match self.router.submit(&request).await {
            Ok(()) => {
                report.orders_routed += 1;
                tracing::info!(
                    order = %request.id,
                    signal = %request.signal_id,
                    instrument = %request.instrument,
                    side = %request.side,
                    "Order routed"
                );
            }
            Err(e) => {
                report.submit_failures += 1;
                tracing::error!(order = %request.id, error = %e, "Order submission failed");

                // Release the slot as if the venue had reported the failure
                let event = OrderLifecycleEvent::new(request.instrument.clone(), request.side, OrderStatus::Error)
                    .with_signal(request.signal_id);
                self.engine.on_lifecycle_event(&event).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::bus::ChannelSink;
    use crate::adapters::paper::{FillMode, PaperRouter};
    use crate::domain::{PositionPolicy, RoutingSlot};
    use crate::ports::router::MockOrderRouter;
    use crate::ports::{RouterError, WindowSpan};
    use crate::strategy::{CrossoverEngine, CrossoverParams};
    use chrono::{Duration, TimeZone, Utc};

    struct Harness {
        pipeline: Arc<SignalPipeline>,
        inputs: PipelineInputs,
        tick_tx: mpsc::Sender<Tick>,
    }

    fn harness(slow: usize, fast: usize, router: Option<Arc<dyn OrderRouter>>, fill: FillMode) -> Harness {
        let (sink, signals) = ChannelSink::channel(16);
        let params = CrossoverParams::default().with_windows(WindowSpan::Ticks(slow), WindowSpan::Ticks(fast));
        let engine: Arc<dyn DecisionEngine> = Arc::new(CrossoverEngine::new(params, Arc::new(sink)));

        let (lifecycle_tx, lifecycle) = mpsc::unbounded_channel();
        let router: Arc<dyn OrderRouter> = match router {
            Some(router) => router,
            None => Arc::new(PaperRouter::new(lifecycle_tx, fill)),
        };
        let (tick_tx, ticks) = mpsc::channel(64);

        Harness {
            pipeline: Arc::new(SignalPipeline::new(engine, router)),
            inputs: PipelineInputs {
                ticks,
                lifecycle,
                signals,
            },
            tick_tx,
        }
    }

    async fn send_prices(tx: &mpsc::Sender<Tick>, instrument: &str, prices: &[f64]) {
        let start = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        for (i, price) in prices.iter().enumerate() {
            let tick = Tick::new(instrument, start + Duration::seconds(i as i64), Some(*price));
            tx.send(tick).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_replay_routes_buy_then_sell() {
        let Harness { pipeline, inputs, tick_tx } = harness(3, 1, None, FillMode::Filled);

        send_prices(&tick_tx, "X", &[10.0, 10.0, 10.0, 9.0, 9.0, 9.0, 11.0, 11.0, 11.0, 5.0]).await;
        drop(tick_tx);

        let report = pipeline.run(inputs).await.unwrap();
        assert_eq!(report.ticks, 10);
        assert_eq!(report.signals, 2);
        assert_eq!(report.orders_routed, 2);
        assert_eq!(report.orders_refused, 0);
        // New + Filled per order
        assert_eq!(report.lifecycle_events, 4);

        let status = pipeline.status().await;
        assert!(!status.is_running);
        assert_eq!(status.strategy, "crossover");
        assert_eq!(status.guard, GuardSnapshot::default());
    }

    #[tokio::test]
    async fn test_unacknowledged_order_blocks_next() {
        let mut router = MockOrderRouter::new();
        router.expect_submit().times(1).returning(|_| Ok(()));
        let Harness { pipeline, inputs, tick_tx } = harness(2, 1, Some(Arc::new(router)), FillMode::Filled);

        // 11 crosses above the slow mean, 5 crosses below it
        send_prices(&tick_tx, "X", &[10.0, 11.0, 5.0]).await;
        drop(tick_tx);

        let report = pipeline.run(inputs).await.unwrap();
        assert_eq!(report.signals, 2);
        assert_eq!(report.orders_routed, 1);
        assert_eq!(report.orders_refused, 1);
        assert!(matches!(
            pipeline.engine().guard().slot("X").await,
            RoutingSlot::Routing(_)
        ));
    }

    #[tokio::test]
    async fn test_submit_failure_releases_slot() {
        let mut router = MockOrderRouter::new();
        router
            .expect_submit()
            .returning(|_| Err(RouterError::Unavailable("venue down".to_string())));
        let Harness { pipeline, inputs, tick_tx } = harness(2, 1, Some(Arc::new(router)), FillMode::Filled);

        send_prices(&tick_tx, "X", &[10.0, 11.0]).await;
        drop(tick_tx);

        let report = pipeline.run(inputs).await.unwrap();
        assert_eq!(report.submit_failures, 1);

        let engine = pipeline.engine();
        assert!(engine.guard().slot("X").await.is_free());
        let buy = engine.open_position("X").await.unwrap();
        let failure = engine.guard().failure(&buy.buy_signal_id).await.unwrap();
        assert_eq!(failure.status, OrderStatus::Error);
    }

    #[tokio::test]
    async fn test_expired_buy_leaves_nothing_held() {
        let Harness { pipeline, inputs, tick_tx } = harness(2, 1, None, FillMode::Expired);

        send_prices(&tick_tx, "X", &[10.0, 11.0]).await;
        drop(tick_tx);

        pipeline.run(inputs).await.unwrap();
        let guard = pipeline.engine().guard();
        assert_eq!(guard.policy(), PositionPolicy::Unchecked);
        assert!(!guard.is_holding("X").await);
        assert_eq!(guard.snapshot().await.failures, 1);
    }

    #[tokio::test]
    async fn test_stop_ends_run() {
        let Harness { pipeline, inputs, tick_tx } = harness(2, 1, None, FillMode::Filled);

        let runner = pipeline.clone();
        let handle = tokio::spawn(async move { runner.run(inputs).await });
        while !pipeline.status().await.is_running {
            tokio::task::yield_now().await;
        }

        pipeline.stop();
        let report = handle.await.unwrap().unwrap();
        assert_eq!(report.ticks, 0);
        assert!(!pipeline.status().await.is_running);
        drop(tick_tx);
    }

    #[tokio::test]
    async fn test_stop_before_run_is_not_carried_over() {
        let Harness { pipeline, inputs, tick_tx } = harness(3, 1, None, FillMode::Filled);

        pipeline.stop();
        send_prices(&tick_tx, "X", &[10.0, 10.0, 10.0, 12.0]).await;
        drop(tick_tx);

        let report = pipeline.run(inputs).await.unwrap();
        assert_eq!(report.ticks, 4);
        assert_eq!(report.orders_routed, 1);
    }

    #[tokio::test]
    async fn test_engine_errors_counted() {
        let mut router = MockOrderRouter::new();
        router.expect_submit().never();

        let (sink, signals) = ChannelSink::channel(1);
        drop(signals);
        let params = CrossoverParams::default().with_windows(WindowSpan::Ticks(2), WindowSpan::Ticks(1));
        let engine: Arc<dyn DecisionEngine> = Arc::new(CrossoverEngine::new(params, Arc::new(sink)));
        let pipeline = SignalPipeline::new(engine, Arc::new(router));

        let (tick_tx, ticks) = mpsc::channel(8);
        let (_lifecycle_tx, lifecycle) = mpsc::unbounded_channel();
        let (_signal_tx, signals) = mpsc::channel(1);
        send_prices(&tick_tx, "X", &[10.0, 11.0]).await;
        drop(tick_tx);

        let report = pipeline
            .run(PipelineInputs {
                ticks,
                lifecycle,
                signals,
            })
            .await
            .unwrap();
        assert_eq!(report.engine_errors, 1);
        assert_eq!(report.signals, 0);
    }
}

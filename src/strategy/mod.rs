//! Strategy Layer - Windowed Decision Engines
//!
//! Two interchangeable engines turn per-instrument BBO ticks into BUY/SELL
//! signals:
//! - `CrossoverEngine`: fast mean crossing the slow mean
//! - `BandBreachEngine`: breach of the lower Bollinger band / high percentile,
//!   confirmed over a short window
//!
//! Both keep one position marker per instrument so signals strictly alternate
//! BUY, SELL, BUY, ... and every SELL references the BUY that opened it.

pub mod params;
pub mod crossover;
pub mod band_breach;
mod state;

#[cfg(test)]
pub(crate) mod test_support;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::ports::{DecisionEngine, SignalSink};

pub use params::{BandBreachParams, CrossoverParams, ParamsError};
pub use crossover::{crossover_decision, CrossoverEngine};
pub use band_breach::{band_decision, BandBreachEngine, BandLevels};
pub use state::Decision;

/// Engine selected at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    #[default]
    Crossover,
    BandBreach,
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StrategyKind::Crossover => write!(f, "crossover"),
            StrategyKind::BandBreach => write!(f, "band_breach"),
        }
    }
}

impl std::str::FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "crossover" => Ok(StrategyKind::Crossover),
            "band_breach" | "band-breach" => Ok(StrategyKind::BandBreach),
            other => Err(format!("unknown strategy: {other}")),
        }
    }
}

/// Fully parameterised engine choice
#[derive(Debug, Clone, PartialEq)]
pub enum StrategyConfig {
    Crossover(CrossoverParams),
    BandBreach(BandBreachParams),
}

impl StrategyConfig {
    pub fn validate(&self) -> Result<(), ParamsError> {
        match self {
            StrategyConfig::Crossover(params) => params.validate(),
            StrategyConfig::BandBreach(params) => params.validate(),
        }
    }

    /// Validate and construct the engine, wired to `sink`
    pub fn build(&self, sink: Arc<dyn SignalSink>) -> Result<Arc<dyn DecisionEngine>, ParamsError> {
        self.validate()?;
        let engine: Arc<dyn DecisionEngine> = match self {
            StrategyConfig::Crossover(params) => Arc::new(CrossoverEngine::new(params.clone(), sink)),
            StrategyConfig::BandBreach(params) => Arc::new(BandBreachEngine::new(params.clone(), sink)),
        };
        tracing::info!(strategy = engine.name(), "Decision engine ready");
        Ok(engine)
    }
}

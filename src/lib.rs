//! Signaler - BBO Signal Engine Library
//!
//! Per-instrument decision engines that turn best bid/offer ticks into
//! BUY/SELL signals, plus a routing guard that keeps one order in flight per
//! instrument.
//!
//! # Modules
//!
//! - `domain`: Core types (Tick, Signal, PositionSlot, RoutingGuard)
//! - `ports`: Trait abstractions (WindowedStatistics, SignalSink, OrderRouter, DecisionEngine)
//! - `strategy`: Decision engines (CrossoverEngine, BandBreachEngine)
//! - `adapters`: Implementations (RollingWindow, ChannelSink, PaperRouter, TickReplay, CLI)
//! - `config`: Configuration loading and validation
//! - `application`: Signal pipeline

pub mod domain;
pub mod ports;
pub mod strategy;
pub mod adapters;
pub mod config;
pub mod application;

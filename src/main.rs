//! Signaler - BBO Signal Engine
//!
//! Replays recorded ticks through a decision engine and the paper router.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing_subscriber::{fmt, EnvFilter};

use bbo_signaler::adapters::cli::{self, CliApp, Command, ConfigCmd, RunCmd};
use bbo_signaler::adapters::{ChannelSink, EchoSink, FeedError, PaperRouter, TickReplay};
use bbo_signaler::application::{PipelineInputs, SignalPipeline};
use bbo_signaler::config::{load_config, Config};
use bbo_signaler::ports::SignalSink;
use bbo_signaler::strategy::StrategyConfig;

const TICK_BUFFER: usize = 1024;
const SIGNAL_BUFFER: usize = 64;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists
    dotenvy::dotenv().ok();

    let app = cli::init();
    match app.command {
        Command::Run(ref cmd) => run_command(&app, cmd).await,
        Command::Config(ref cmd) => config_command(&app, cmd),
    }
}

/// `--debug` and `--verbose` win over the configured level; `RUST_LOG` wins over all
fn init_logging(app: &CliApp, config: &Config) -> Result<()> {
    let level = if app.debug {
        "debug"
    } else if app.verbose {
        "info"
    } else {
        config.logging.level.as_str()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn expand(path: &Path) -> Result<PathBuf> {
    let raw = path.to_string_lossy();
    let expanded = shellexpand::full(&raw).with_context(|| format!("Failed to expand path {}", raw))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

fn load(config: &Option<PathBuf>) -> Result<Config> {
    let path = config.as_deref().map(expand).transpose()?;
    load_config(path.as_deref()).context("Failed to load configuration")
}

async fn run_command(app: &CliApp, cmd: &RunCmd) -> Result<()> {
    let mut config = load(&cmd.config)?;
    if let Some(strategy) = cmd.strategy {
        config.strategy = strategy;
    }
    config.validate().context("Invalid configuration")?;
    init_logging(app, &config)?;

    tracing::info!(strategy = %config.strategy, fill = %cmd.fill, "Starting signaler");

    // Signals reach the pipeline through the channel, optionally echoed first
    let (channel, signals) = ChannelSink::channel(SIGNAL_BUFFER);
    let sink: Arc<dyn SignalSink> = if cmd.no_echo {
        Arc::new(channel)
    } else {
        Arc::new(EchoSink::stdout().forward_to(Arc::new(channel)))
    };

    let engine = StrategyConfig::from(&config)
        .build(sink)
        .context("Failed to build decision engine")?;

    let (lifecycle_tx, lifecycle) = mpsc::unbounded_channel();
    let router = Arc::new(PaperRouter::new(lifecycle_tx, cmd.fill));
    let pipeline = Arc::new(SignalPipeline::new(engine, router));

    let (tick_tx, ticks) = mpsc::channel(TICK_BUFFER);
    let replay = TickReplay::new(expand(&cmd.ticks)?);
    let feed = tokio::spawn(async move { replay.run(tick_tx).await });

    let stopper = pipeline.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("Shutdown signal received");
        stopper.stop();
    });

    let report = pipeline
        .run(PipelineInputs {
            ticks,
            lifecycle,
            signals,
        })
        .await
        .context("Signal pipeline failed")?;

    match feed.await.context("Tick feed task panicked")? {
        Ok(stats) => tracing::info!(ticks = stats.ticks, skipped = stats.skipped, "Replay complete"),
        // Pipeline stopped before the file was exhausted
        Err(FeedError::ChannelClosed) => tracing::warn!("Replay interrupted"),
        Err(e) => return Err(e).context("Tick replay failed"),
    }

    tracing::info!(
        ticks = report.ticks,
        signals = report.signals,
        routed = report.orders_routed,
        refused = report.orders_refused,
        "Signaler stopped"
    );
    Ok(())
}

fn config_command(app: &CliApp, cmd: &ConfigCmd) -> Result<()> {
    let config = load(&cmd.config)?;
    init_logging(app, &config)?;

    print!("{}", config.to_toml().context("Failed to render configuration")?);
    Ok(())
}

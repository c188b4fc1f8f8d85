use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::domain::Tick;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Failed to open tick file {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to read tick file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Tick channel closed")]
    ChannelClosed,
}

/// Line counters for one replay run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayStats {
    pub lines: u64,
    pub ticks: u64,
    pub skipped: u64,
}

/// Parse one JSON-lines record; `None` for blank lines
pub fn parse_tick_line(line: &str) -> Option<Result<Tick, serde_json::Error>> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(serde_json::from_str(trimmed))
}

#[derive(Debug, Clone)]
pub struct TickReplay {
    path: PathBuf,
}

impl TickReplay {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Send every tick in the file to `tx`, in file order
    pub async fn run(&self, tx: mpsc::Sender<Tick>) -> Result<ReplayStats, FeedError> {
        let file = File::open(&self.path).await.map_err(|source| FeedError::Open {
            path: self.path.clone(),
            source,
        })?;
        info!(path = %self.path.display(), "Replaying ticks");

        let stats = replay_lines(BufReader::new(file), tx).await?;
        info!(
            lines = stats.lines,
            ticks = stats.ticks,
            skipped = stats.skipped,
            "Tick replay finished"
        );
        Ok(stats)
    }
}

pub(crate) async fn replay_lines<R>(reader: R, tx: mpsc::Sender<Tick>) -> Result<ReplayStats, FeedError>
where
    R: AsyncBufRead + Unpin,
{
    let mut stats = ReplayStats::default();
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        stats.lines += 1;
        match parse_tick_line(&line) {
            None => continue,
            Some(Ok(tick)) => {
                tx.send(tick).await.map_err(|_| FeedError::ChannelClosed)?;
                stats.ticks += 1;
            }
            Some(Err(e)) => {
                stats.skipped += 1;
                warn!(line = stats.lines, error = %e, "Skipping malformed tick line");
            }
        }
    }

    debug!(?stats, "Tick stream exhausted");
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"{"instrument":"X","timestamp":"2024-01-01T00:00:00Z","bid_price":10.0}
{"instrument":"X","timestamp":"2024-01-01T00:00:01Z","bid_price":10.5,"ask_price":10.6}

not json
{"instrument":"Y","timestamp":"2024-01-01T00:00:02Z"}
"#;

    #[test]
    fn test_parse_tick_line() {
        assert!(parse_tick_line("   ").is_none());
        assert!(parse_tick_line("{").unwrap().is_err());

        let tick = parse_tick_line(r#"{"instrument":"X","timestamp":"2024-01-01T00:00:00Z","bid_price":1.5}"#)
            .unwrap()
            .unwrap();
        assert_eq!(tick.instrument, "X");
        assert_eq!(tick.bid_price, Some(1.5));
        assert_eq!(tick.ask_price, None);
    }

    #[tokio::test]
    async fn test_replay_skips_malformed_lines() {
        let (tx, mut rx) = mpsc::channel(16);
        let stats = replay_lines(SAMPLE.as_bytes(), tx).await.unwrap();

        assert_eq!(stats, ReplayStats { lines: 5, ticks: 3, skipped: 1 });

        let first = rx.recv().await.unwrap();
        assert_eq!(first.bid_price, Some(10.0));
        let second = rx.recv().await.unwrap();
        assert_eq!(second.ask_price, Some(10.6));
        let third = rx.recv().await.unwrap();
        assert_eq!(third.instrument, "Y");
        assert_eq!(third.bid_price, None);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_replay_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let (tx, mut rx) = mpsc::channel(16);
        let stats = TickReplay::new(file.path()).run(tx).await.unwrap();
        assert_eq!(stats.ticks, 3);
        assert_eq!(rx.recv().await.unwrap().instrument, "X");
    }

    #[tokio::test]
    async fn test_missing_file() {
        let (tx, _rx) = mpsc::channel(1);
        let result = TickReplay::new("/nonexistent/ticks.jsonl").run(tx).await;
        assert!(matches!(result, Err(FeedError::Open { .. })));
    }

    #[tokio::test]
    async fn test_closed_channel() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let result = replay_lines(SAMPLE.as_bytes(), tx).await;
        assert!(matches!(result, Err(FeedError::ChannelClosed)));
    }
}

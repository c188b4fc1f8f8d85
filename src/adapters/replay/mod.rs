//! Tick Replay Feed
//!
//! Streams recorded BBO ticks from a JSON-lines file into the tick channel.
//! One tick object per line; blank lines are ignored and malformed lines are
//! skipped with a warning.

mod tick_file;

pub use tick_file::{parse_tick_line, FeedError, ReplayStats, TickReplay};

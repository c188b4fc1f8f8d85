//! Signal Bus Adapters
//!
//! In-process implementations of the `SignalSink` port:
//! - `ChannelSink`: forwards each signal onto a tokio mpsc channel
//! - `EchoSink`: writes each signal as a JSON line, then forwards it

mod channel;
mod echo;

pub use channel::ChannelSink;
pub use echo::EchoSink;

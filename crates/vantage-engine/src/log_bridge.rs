//! Capture of emitted log lines for observers.
//!
//! [`LogBridge`] is a cloneable handle; [`LogBridge::layer`] gives a
//! `tracing-subscriber` layer that renders every event it sees into one
//! plain-text line and fans it out to every subscriber. Lines at `ERROR`
//! go to [`LogChannel::LogErr`], everything else to [`LogChannel::Log`].
//!
//! ```
//! use tracing_subscriber::layer::SubscriberExt;
//! use vantage_core::LogChannel;
//! use vantage_engine::LogBridge;
//!
//! let bridge = LogBridge::new();
//! let lines = bridge.subscribe();
//! let subscriber = tracing_subscriber::registry().with(bridge.layer());
//!
//! tracing::subscriber::with_default(subscriber, || {
//!     tracing::error!(target: "arena", code = 7, "wall collision");
//! });
//!
//! let line = lines.try_recv().unwrap();
//! assert_eq!(line.channel, LogChannel::LogErr);
//! assert_eq!(line.text, "ERROR arena: wall collision code=7");
//! ```

use std::fmt::{self, Write as _};
use std::sync::{Arc, Mutex, PoisonError};

use crossbeam_channel::{unbounded, Receiver, Sender};
use smallvec::SmallVec;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use vantage_core::LogChannel;

/// One captured log line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogLine {
    /// Stream the line belongs to.
    pub channel: LogChannel,
    /// Rendered text, without trailing newline or colour codes.
    pub text: String,
}

type Subscribers = SmallVec<[Sender<LogLine>; 2]>;

/// Fan-out point for captured log lines.
#[derive(Clone, Default)]
pub struct LogBridge {
    subscribers: Arc<Mutex<Subscribers>>,
}

impl fmt::Debug for LogBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogBridge")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl LogBridge {
    /// A bridge with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// A layer feeding this bridge.
    pub fn layer(&self) -> LogBridgeLayer {
        LogBridgeLayer {
            bridge: self.clone(),
        }
    }

    /// Receive every line published from now on.
    pub fn subscribe(&self) -> Receiver<LogLine> {
        let (tx, rx) = unbounded();
        self.lock().push(tx);
        rx
    }

    /// Hand a line to every live subscriber. Subscribers whose receiver
    /// was dropped are removed.
    pub fn publish(&self, line: LogLine) {
        self.lock().retain(|tx| tx.send(line.clone()).is_ok());
    }

    /// Number of registered subscribers, including ones not yet pruned.
    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Subscribers> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Channel a line at `level` is published on.
pub fn channel_for(level: &Level) -> LogChannel {
    if *level == Level::ERROR {
        LogChannel::LogErr
    } else {
        LogChannel::Log
    }
}

// ── Layer ──────────────────────────────────────────────────────────

/// `tracing-subscriber` layer created by [`LogBridge::layer`].
#[derive(Clone, Debug)]
pub struct LogBridgeLayer {
    bridge: LogBridge,
}

impl<S: Subscriber> Layer<S> for LogBridgeLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        let mut visitor = LineVisitor::default();
        event.record(&mut visitor);

        let mut text = format!("{} {}: {}", meta.level(), meta.target(), visitor.message);
        if !visitor.fields.is_empty() {
            text.push(' ');
            text.push_str(&visitor.fields);
        }
        self.bridge.publish(LogLine {
            channel: channel_for(meta.level()),
            text,
        });
    }
}

/// Collects the message and the remaining fields as `key=value` pairs.
#[derive(Default)]
struct LineVisitor {
    message: String,
    fields: String,
}

impl LineVisitor {
    fn push_field(&mut self, name: &str, value: fmt::Arguments<'_>) {
        if !self.fields.is_empty() {
            self.fields.push(' ');
        }
        let _ = write!(self.fields, "{name}={value}");
    }
}

impl Visit for LineVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            self.push_field(field.name(), format_args!("{value}"));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{value:?}");
        } else {
            self.push_field(field.name(), format_args!("{value:?}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::layer::SubscriberExt;

    fn capture(bridge: &LogBridge, f: impl FnOnce()) {
        let subscriber = tracing_subscriber::registry().with(bridge.layer());
        tracing::subscriber::with_default(subscriber, f);
    }

    #[test]
    fn levels_map_to_channels() {
        let bridge = LogBridge::new();
        let rx = bridge.subscribe();
        capture(&bridge, || {
            tracing::info!(target: "t", "started");
            tracing::warn!(target: "t", "slow");
            tracing::error!(target: "t", "failed");
        });
        let lines: Vec<_> = rx.try_iter().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].channel, LogChannel::Log);
        assert_eq!(lines[0].text, "INFO t: started");
        assert_eq!(lines[1].channel, LogChannel::Log);
        assert_eq!(lines[1].text, "WARN t: slow");
        assert_eq!(lines[2].channel, LogChannel::LogErr);
    }

    #[test]
    fn fields_follow_the_message() {
        let bridge = LogBridge::new();
        let rx = bridge.subscribe();
        capture(&bridge, || {
            tracing::warn!(target: "pacer", elapsed_ms = 120u64, expected_ms = 100u64, "tick late");
            tracing::info!(target: "driver", phase = %"EXPERIMENT_PLAYING", "state");
            tracing::info!(target: "driver", name = "fb0", "quoted");
        });
        let texts: Vec<_> = rx.try_iter().map(|l| l.text).collect();
        assert_eq!(texts[0], "WARN pacer: tick late elapsed_ms=120 expected_ms=100");
        assert_eq!(texts[1], "INFO driver: state phase=EXPERIMENT_PLAYING");
        assert_eq!(texts[2], "INFO driver: quoted name=fb0");
    }

    #[test]
    fn every_subscriber_gets_every_line() {
        let bridge = LogBridge::new();
        let a = bridge.subscribe();
        let b = bridge.subscribe();
        capture(&bridge, || tracing::info!("hello"));
        assert_eq!(a.try_iter().count(), 1);
        assert_eq!(b.try_iter().count(), 1);
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let bridge = LogBridge::new();
        let keep = bridge.subscribe();
        let gone = bridge.subscribe();
        drop(gone);
        assert_eq!(bridge.subscriber_count(), 2);

        bridge.publish(LogLine {
            channel: LogChannel::Log,
            text: "x".into(),
        });
        assert_eq!(bridge.subscriber_count(), 1);
        assert_eq!(keep.try_recv().unwrap().text, "x");
    }

    #[test]
    fn clones_share_subscribers() {
        let bridge = LogBridge::new();
        let rx = bridge.clone().subscribe();
        bridge.publish(LogLine {
            channel: LogChannel::LogErr,
            text: "shared".into(),
        });
        assert_eq!(rx.try_recv().unwrap().channel, LogChannel::LogErr);
    }
}

//! Outbound messages and a channel-backed [`Broadcaster`].

use std::sync::Arc;

use crossbeam_channel::{unbounded, Receiver, Sender};
use serde_json::{json, Value};
use vantage_core::{Broadcaster, LogChannel, RunEvent, RunPhase, Snapshot};

/// One message destined for observers.
#[derive(Clone, Debug, PartialEq)]
pub enum Outbound {
    /// A world snapshot.
    Broadcast(Arc<Snapshot>),
    /// A run event and the phase it left behind.
    Event {
        /// The event.
        event: RunEvent,
        /// Phase after the event.
        state: RunPhase,
    },
    /// A captured log line.
    Log {
        /// `LOG` or `LOGERR`.
        channel: LogChannel,
        /// The line, verbatim.
        message: String,
    },
}

impl Outbound {
    /// Wire form of the message.
    ///
    /// ```
    /// use vantage_core::{RunEvent, RunPhase};
    /// use vantage_engine::Outbound;
    ///
    /// let msg = Outbound::Event { event: RunEvent::Paused, state: RunPhase::Paused };
    /// assert_eq!(
    ///     msg.to_json().to_string(),
    ///     r#"{"event":"Experiment paused","state":"EXPERIMENT_PAUSED","type":"event"}"#
    /// );
    /// ```
    pub fn to_json(&self) -> Value {
        match self {
            Self::Broadcast(snapshot) => {
                let mut value = snapshot.to_json();
                if let Value::Object(map) = &mut value {
                    map.insert("type".to_owned(), Value::from("broadcast"));
                }
                value
            }
            Self::Event { event, state } => json!({
                "type": "event",
                "event": event.as_str(),
                "state": state.as_str(),
            }),
            Self::Log { channel, message } => json!({
                "type": "log",
                "channel": channel.as_str(),
                "message": message,
            }),
        }
    }

    /// The `type` field of the wire form.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Broadcast(_) => "broadcast",
            Self::Event { .. } => "event",
            Self::Log { .. } => "log",
        }
    }
}

/// A [`Broadcaster`] that turns every call into an [`Outbound`] message
/// on an unbounded channel.
///
/// Messages sent after the receiver is dropped are discarded.
#[derive(Clone, Debug)]
pub struct ChannelBroadcaster {
    tx: Sender<Outbound>,
}

impl ChannelBroadcaster {
    /// A broadcaster and the receiving end of its channel.
    pub fn new() -> (Self, Receiver<Outbound>) {
        let (tx, rx) = unbounded();
        (Self { tx }, rx)
    }

    fn send(&self, message: Outbound) {
        let _ = self.tx.send(message);
    }
}

impl Broadcaster for ChannelBroadcaster {
    fn broadcast(&self, snapshot: Arc<Snapshot>) {
        self.send(Outbound::Broadcast(snapshot));
    }

    fn emit_event(&self, event: RunEvent, phase: RunPhase) {
        self.send(Outbound::Event {
            event,
            state: phase,
        });
    }

    fn emit_log(&self, channel: LogChannel, line: &str) {
        self.send(Outbound::Log {
            channel,
            message: line.to_owned(),
        });
    }
}

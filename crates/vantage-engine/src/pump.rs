//! Broadcast pump: forwards snapshots at the broadcast frequency, plus
//! run events and log lines as they arrive.

use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{never, select, tick, Receiver};
use tracing::{info, info_span};
use vantage_core::{Broadcaster, RunEvent, RunPhase};

use crate::driver::EventMessage;
use crate::log_bridge::LogLine;
use crate::metrics::PumpStats;
use crate::ring::SnapshotRing;

/// Receiving ends consumed by the pump.
pub(crate) struct PumpChannels {
    pub events: Receiver<EventMessage>,
    pub logs: Option<Receiver<LogLine>>,
    /// Disconnected by the session to stop the pump.
    pub stop: Receiver<()>,
}

enum Wake {
    Event(Option<EventMessage>),
    Log(Option<LogLine>),
    Tick,
    Stop,
}

/// State owned by the broadcast thread.
pub(crate) struct BroadcastPump {
    broadcaster: Arc<dyn Broadcaster>,
    ring: Arc<SnapshotRing>,
    interval: Duration,
    /// Publication number of the last forwarded snapshot.
    sent_pos: Option<u64>,
    stats: PumpStats,
}

impl BroadcastPump {
    pub fn new(broadcaster: Arc<dyn Broadcaster>, ring: Arc<SnapshotRing>, interval: Duration) -> Self {
        Self {
            broadcaster,
            ring,
            interval,
            sent_pos: None,
            stats: PumpStats::default(),
        }
    }

    /// Forward traffic until `stop` disconnects, then flush.
    pub fn run(mut self, channels: PumpChannels) -> PumpStats {
        let span = info_span!("broadcast");
        let _guard = span.enter();
        info!(interval_ms = self.interval.as_millis() as u64, "broadcast pump started");

        let PumpChannels { events, logs, stop } = channels;
        let ticker = tick(self.interval);
        let mut events_rx = events.clone();
        let mut logs_rx = logs.clone().unwrap_or_else(never);

        loop {
            let wake = select! {
                recv(events_rx) -> msg => Wake::Event(msg.ok()),
                recv(logs_rx) -> msg => Wake::Log(msg.ok()),
                recv(ticker) -> _ => Wake::Tick,
                recv(stop) -> _ => Wake::Stop,
            };
            match wake {
                Wake::Event(Some((event, phase))) => self.forward_event(event, phase),
                Wake::Event(None) => events_rx = never(),
                Wake::Log(Some(line)) => self.forward_log(line),
                Wake::Log(None) => logs_rx = never(),
                Wake::Tick => self.forward_latest(),
                Wake::Stop => break,
            }
        }

        for (event, phase) in events.try_iter() {
            self.forward_event(event, phase);
        }
        if let Some(logs) = &logs {
            for line in logs.try_iter() {
                self.forward_log(line);
            }
        }
        self.forward_latest();

        self.stats
    }

    fn forward_event(&mut self, event: RunEvent, phase: RunPhase) {
        self.broadcaster.emit_event(event, phase);
        self.stats.events_sent += 1;
    }

    fn forward_log(&mut self, line: LogLine) {
        self.broadcaster.emit_log(line.channel, &line.text);
        self.stats.log_lines_sent += 1;
    }

    /// Forward the newest snapshot unless it was already sent.
    fn forward_latest(&mut self) {
        let Some((pos, snapshot)) = self.ring.latest_with_pos() else {
            return;
        };
        if self.sent_pos.is_some_and(|sent| pos <= sent) {
            return;
        }
        self.broadcaster.broadcast(snapshot);
        self.stats.snapshots_sent += 1;
        self.sent_pos = Some(pos);
    }
}

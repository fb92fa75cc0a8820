//! User-facing [`RemoteSession`] API and shutdown sequence.
//!
//! ```text
//! Caller thread(s)             Driver thread              Broadcast thread
//!     |                             |                            |
//!     |--play()/pause()/...-------->| cmd_rx.try_recv()          |
//!     |   [cmd_tx: bounded(64)]     | apply request              |
//!     |<--receipt via reply_tx------| emit event ----------------> emit_event()
//!     |                             | engine.step() x burst      |
//!     |                             | ring.push(snapshot)        |
//!     |                             | wait(budget - elapsed)     | tick(1 / frequency)
//!     |                             |                            | ring.latest() -> broadcast()
//!     |                             |                 log lines -> emit_log()
//! ```

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam_channel::{bounded, unbounded, Sender, TrySendError};
use tracing::{info, warn};
use vantage_core::{
    Broadcaster, ControlError, ControlOp, ControlReceipt, RunPhase, SimulationEngine, Snapshot,
};

use crate::config::{ConfigError, SessionConfig};
use crate::control::ControlRequest;
use crate::driver::{DriverChannels, DriverState};
use crate::log_bridge::LogBridge;
use crate::metrics::{DriverStats, PumpStats};
use crate::pump::{BroadcastPump, PumpChannels};
use crate::ring::SnapshotRing;
use crate::snapshot::{ConverterRegistry, SnapshotBuilder};
use crate::state::SharedPhase;

// ── ShutdownReport ─────────────────────────────────────────────────

/// Report from [`RemoteSession::shutdown`].
#[derive(Debug)]
pub struct ShutdownReport {
    /// Total time spent in the shutdown sequence.
    pub total_ms: u64,
    /// Whether the driver thread was joined without panicking.
    pub driver_joined: bool,
    /// Whether the broadcast thread was joined without panicking.
    pub pump_joined: bool,
    /// Driver counters, if the driver was joined by this call.
    pub driver: Option<DriverStats>,
    /// Pump counters, if the pump was joined by this call.
    pub pump: Option<PumpStats>,
}

// ── SessionBuilder ─────────────────────────────────────────────────

/// Collects the optional parts of a session before spawning it.
#[derive(Debug)]
pub struct SessionBuilder {
    config: SessionConfig,
    converters: ConverterRegistry,
    log_bridge: Option<LogBridge>,
}

impl SessionBuilder {
    /// Entity converters used for snapshots. Default: none.
    pub fn converters(mut self, registry: ConverterRegistry) -> Self {
        self.converters = registry;
        self
    }

    /// Forward the lines captured by `bridge` to the broadcaster.
    pub fn log_bridge(mut self, bridge: &LogBridge) -> Self {
        self.log_bridge = Some(bridge.clone());
        self
    }

    /// Validate the configuration, spawn the driver and broadcast
    /// threads, and return the running session in `Initialized`.
    pub fn spawn<E>(
        self,
        engine: E,
        broadcaster: Arc<dyn Broadcaster>,
    ) -> Result<RemoteSession, ConfigError>
    where
        E: SimulationEngine + 'static,
    {
        let SessionBuilder {
            config,
            converters,
            log_bridge,
        } = self;
        config.validate()?;

        let ring = Arc::new(SnapshotRing::new(config.snapshot_history));
        let shared = SharedPhase::new();

        let (cmd_tx, cmd_rx) = bounded(config.command_capacity);
        let (event_tx, event_rx) = unbounded();
        let (stop_tx, stop_rx) = bounded::<()>(0);

        let pump = BroadcastPump::new(
            broadcaster,
            Arc::clone(&ring),
            config.viz.broadcast_interval(),
        );
        let pump_channels = PumpChannels {
            events: event_rx,
            logs: log_bridge.as_ref().map(LogBridge::subscribe),
            stop: stop_rx,
        };
        let pump_thread = thread::Builder::new()
            .name("vantage-broadcast".into())
            .spawn(move || pump.run(pump_channels))
            .map_err(|e| ConfigError::ThreadSpawnFailed {
                reason: format!("broadcast thread: {e}"),
            })?;

        let driver = DriverState::new(
            Box::new(engine),
            SnapshotBuilder::new(converters),
            Arc::clone(&ring),
            shared.clone(),
            DriverChannels {
                commands: cmd_rx,
                events: event_tx,
            },
            &config,
        );
        let driver_thread = match thread::Builder::new()
            .name("vantage-driver".into())
            .spawn(move || driver.run())
        {
            Ok(handle) => handle,
            Err(e) => {
                drop(stop_tx);
                let _ = pump_thread.join();
                return Err(ConfigError::ThreadSpawnFailed {
                    reason: format!("driver thread: {e}"),
                });
            }
        };

        info!(
            port = config.viz.port,
            broadcast_frequency = config.viz.broadcast_frequency,
            ff_draw_frames_every = config.viz.ff_draw_frames_every,
            "session started"
        );

        Ok(RemoteSession {
            config,
            ring,
            phase: shared,
            cmd_tx: Some(cmd_tx),
            stop_tx: Some(stop_tx),
            driver_thread: Some(driver_thread),
            pump_thread: Some(pump_thread),
        })
    }
}

// ── RemoteSession ──────────────────────────────────────────────────

/// A simulation run driven on a background thread and controlled
/// remotely.
///
/// The engine is moved into the driver thread; every control method
/// sends a request there and blocks until it has been applied, which
/// happens within one engine step. Snapshots, run events and captured
/// log lines reach the [`Broadcaster`] from a second thread.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use vantage_engine::{ChannelBroadcaster, RemoteSession, SessionConfig};
/// # fn engine() -> Box<dyn vantage_core::SimulationEngine> { unimplemented!() }
///
/// let (broadcaster, outbound) = ChannelBroadcaster::new();
/// let mut session = RemoteSession::builder(SessionConfig::default())
///     .spawn(engine(), Arc::new(broadcaster))
///     .unwrap();
///
/// session.play().unwrap();
/// for message in outbound.iter().take(10) {
///     println!("{}", message.to_json());
/// }
/// session.pause().unwrap();
/// let report = session.shutdown();
/// assert!(report.driver_joined);
/// ```
pub struct RemoteSession {
    config: SessionConfig,
    ring: Arc<SnapshotRing>,
    phase: SharedPhase,
    cmd_tx: Option<Sender<ControlRequest>>,
    stop_tx: Option<Sender<()>>,
    driver_thread: Option<JoinHandle<DriverStats>>,
    pump_thread: Option<JoinHandle<PumpStats>>,
}

const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<RemoteSession>();
};

impl RemoteSession {
    /// Start configuring a session.
    pub fn builder(config: SessionConfig) -> SessionBuilder {
        SessionBuilder {
            config,
            converters: ConverterRegistry::new(),
            log_bridge: None,
        }
    }

    /// Start or resume the run at real-time pace.
    pub fn play(&self) -> Result<ControlReceipt, ControlError> {
        self.request(ControlOp::Play)
    }

    /// Pause a running run.
    pub fn pause(&self) -> Result<ControlReceipt, ControlError> {
        self.request(ControlOp::Pause)
    }

    /// Run in bursts of `ff_draw_frames_every` steps per cycle.
    pub fn fast_forward(&self) -> Result<ControlReceipt, ControlError> {
        self.request(ControlOp::FastForward)
    }

    /// Advance exactly one step from a stopped run.
    ///
    /// While running this only pauses the run; call it again to step.
    pub fn step(&self) -> Result<ControlReceipt, ControlError> {
        self.request(ControlOp::Step)
    }

    /// Return the engine and the run to their initial state.
    pub fn reset(&self) -> Result<ControlReceipt, ControlError> {
        self.request(ControlOp::Reset)
    }

    /// Send `op` to the driver and wait for its verdict.
    pub fn request(&self, op: ControlOp) -> Result<ControlReceipt, ControlError> {
        let cmd_tx = self.cmd_tx.as_ref().ok_or(ControlError::DriverStopped)?;

        let (reply_tx, reply_rx) = bounded(1);
        cmd_tx
            .try_send(ControlRequest {
                op,
                reply: reply_tx,
            })
            .map_err(|e| match e {
                TrySendError::Full(_) => ControlError::ChannelFull,
                TrySendError::Disconnected(_) => ControlError::DriverStopped,
            })?;

        reply_rx.recv().map_err(|_| ControlError::DriverStopped)?
    }

    /// The most recently published phase.
    pub fn phase(&self) -> RunPhase {
        self.phase.load()
    }

    /// The most recently published snapshot.
    pub fn latest_snapshot(&self) -> Option<Arc<Snapshot>> {
        self.ring.latest()
    }

    /// The retained snapshot history, oldest first.
    ///
    /// Holds up to [`SessionConfig::snapshot_history`] entries, for
    /// observers that join mid-run and want the recent trajectory.
    pub fn recent_snapshots(&self) -> Vec<Arc<Snapshot>> {
        self.ring.recent()
    }

    /// Total snapshots published by the driver.
    pub fn snapshots_published(&self) -> u64 {
        self.ring.write_pos()
    }

    /// Whether the driver thread is still alive.
    pub fn is_driver_running(&self) -> bool {
        self.driver_thread
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// The configuration the session was spawned with.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Stop both threads and join them.
    ///
    /// The driver exits at its next command check; an engine step in
    /// progress runs to completion first. The pump is stopped after the
    /// driver so the final events and snapshot are flushed. Calling this
    /// again returns an empty report.
    pub fn shutdown(&mut self) -> ShutdownReport {
        let start = Instant::now();

        self.cmd_tx.take();
        let (driver_joined, driver) = match self.driver_thread.take() {
            Some(handle) => match handle.join() {
                Ok(stats) => (true, Some(stats)),
                Err(_) => {
                    warn!("driver thread panicked");
                    (false, None)
                }
            },
            None => (true, None),
        };

        self.stop_tx.take();
        let (pump_joined, pump) = match self.pump_thread.take() {
            Some(handle) => match handle.join() {
                Ok(stats) => (true, Some(stats)),
                Err(_) => {
                    warn!("broadcast thread panicked");
                    (false, None)
                }
            },
            None => (true, None),
        };

        let total_ms = start.elapsed().as_millis() as u64;
        if driver.is_some() {
            info!(total_ms, "session shut down");
        }
        ShutdownReport {
            total_ms,
            driver_joined,
            pump_joined,
            driver,
            pump,
        }
    }
}

impl Drop for RemoteSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}

//! Driver loop: control request handling, stepping, pacing, and run
//! completion.
//!
//! The driver thread owns the engine and the [`RunState`] exclusively
//! (moved in via `thread::spawn`). Callers reach it only through the
//! bounded command channel; each request carries a oneshot reply
//! channel for its verdict.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use smallvec::SmallVec;
use tracing::{debug, info, info_span, warn};
use vantage_core::{
    ControlError, ControlOp, ControlOutcome, ControlReceipt, RunEvent, RunPhase, SimulationEngine,
};

use crate::config::{CompletionPolicy, SessionConfig};
use crate::control::{gate, ControlRequest, Gate};
use crate::metrics::DriverStats;
use crate::pacer::{Pace, TickPacer};
use crate::ring::SnapshotRing;
use crate::snapshot::SnapshotBuilder;
use crate::state::{tick_duration_for, RunState, SharedPhase};

/// A run event paired with the phase it left behind.
pub(crate) type EventMessage = (RunEvent, RunPhase);

/// Channel ends owned by the driver.
pub(crate) struct DriverChannels {
    pub commands: Receiver<ControlRequest>,
    pub events: Sender<EventMessage>,
}

/// Why the driver loop returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ExitReason {
    /// The command channel was closed.
    Shutdown,
    /// A run completed under [`CompletionPolicy::Exit`].
    RunCompleted,
}

/// State owned by the driver thread.
pub(crate) struct DriverState {
    engine: Box<dyn SimulationEngine>,
    run: RunState,
    pacer: TickPacer,
    builder: SnapshotBuilder,
    ring: Arc<SnapshotRing>,
    commands: Receiver<ControlRequest>,
    events: Sender<EventMessage>,
    completion: CompletionPolicy,
    idle_interval: Duration,
    stats: DriverStats,
    exit: Option<ExitReason>,
}

impl DriverState {
    pub fn new(
        engine: Box<dyn SimulationEngine>,
        builder: SnapshotBuilder,
        ring: Arc<SnapshotRing>,
        shared: SharedPhase,
        channels: DriverChannels,
        config: &SessionConfig,
    ) -> Self {
        Self {
            engine,
            run: RunState::new(u32::from(config.viz.ff_draw_frames_every), shared),
            pacer: TickPacer::new(),
            builder,
            ring,
            commands: channels.commands,
            events: channels.events,
            completion: config.completion,
            idle_interval: config.idle_interval,
            stats: DriverStats::default(),
            exit: None,
        }
    }

    /// Run until the command channel closes or a run completes under
    /// [`CompletionPolicy::Exit`].
    pub fn run(mut self) -> DriverStats {
        let span = info_span!("driver");
        let _guard = span.enter();
        info!(phase = %self.run.phase(), "driver started");

        while self.exit.is_none() {
            self.drain_requests();
            if self.exit.is_some() {
                break;
            }
            if self.run.is_running() {
                self.run_cycle();
            } else {
                self.publish_snapshot();
                self.wait_for_requests(self.idle_interval);
            }
        }

        info!(
            reason = ?self.exit,
            steps = self.stats.steps_executed,
            runs_completed = self.stats.runs_completed,
            "driver stopped"
        );
        self.stats
    }

    // ── Stepping ───────────────────────────────────────────────────

    /// One running iteration: a burst of steps, one snapshot, pacing.
    fn run_cycle(&mut self) {
        if self.engine.is_finished() {
            self.complete_run();
            return;
        }

        self.engine.pre_step();
        let mut burst = self.run.burst_size();
        while burst > 0 && !self.engine.is_finished() && self.run.is_running() {
            self.engine.step();
            self.stats.steps_executed += 1;
            burst -= 1;
            self.apply_while_running();
            if self.exit.is_some() {
                break;
            }
        }
        self.stats.bursts += 1;
        self.publish_snapshot();
        self.engine.post_step();

        if self.engine.is_finished() {
            self.complete_run();
            return;
        }

        match self.pacer.settle(self.run.tick_duration()) {
            Pace::Sleep(remaining) => {
                if !remaining.is_zero() {
                    self.wait_for_requests(remaining);
                }
            }
            Pace::Overrun { .. } => self.stats.overruns += 1,
        }
        self.pacer.restart();
    }

    /// Post-experiment hook, reset, "done" event, then the completion policy.
    fn complete_run(&mut self) {
        self.engine.post_experiment();
        self.reset_run();
        self.emit(RunEvent::Done);
        self.stats.runs_completed += 1;
        info!(runs_completed = self.stats.runs_completed, "experiment done");

        if self.completion == CompletionPolicy::Exit {
            self.exit = Some(ExitReason::RunCompleted);
        }
    }

    // ── Request handling ───────────────────────────────────────────

    /// Apply every request currently queued, without blocking.
    fn drain_requests(&mut self) {
        let mut batch: SmallVec<[ControlRequest; 4]> = SmallVec::new();
        let mut disconnected = false;
        loop {
            match self.commands.try_recv() {
                Ok(request) => batch.push(request),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    disconnected = true;
                    break;
                }
            }
        }
        for request in batch {
            self.apply(request);
        }
        if disconnected && self.exit.is_none() {
            self.exit = Some(ExitReason::Shutdown);
        }
    }

    /// Apply queued requests mid-burst until one leaves the run
    /// stopped. Whatever is queued behind it waits for the next drain,
    /// after the cycle's post-step hook.
    fn apply_while_running(&mut self) {
        while self.run.is_running() && self.exit.is_none() {
            match self.commands.try_recv() {
                Ok(request) => self.apply(request),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.exit = Some(ExitReason::Shutdown);
                }
            }
        }
    }

    /// Block for up to `timeout`, applying requests as they arrive.
    ///
    /// Returns early when a request flips the run between running and
    /// not running, or when the driver is about to exit.
    fn wait_for_requests(&mut self, timeout: Duration) {
        let deadline = Instant::now() + timeout;
        let was_running = self.run.is_running();
        loop {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            match self.commands.recv_timeout(deadline - now) {
                Ok(request) => {
                    self.apply(request);
                    self.drain_requests();
                }
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => {
                    self.exit.get_or_insert(ExitReason::Shutdown);
                    break;
                }
            }
            if self.exit.is_some() || self.run.is_running() != was_running {
                break;
            }
        }
    }

    fn apply(&mut self, request: ControlRequest) {
        let result = if self.exit.is_some() {
            Err(ControlError::DriverStopped)
        } else {
            self.handle(request.op)
        };
        self.stats.requests_handled += 1;
        // Best-effort reply: the caller may have given up waiting.
        let _ = request.reply.send(result);
    }

    /// Apply one control operation to the run.
    fn handle(&mut self, op: ControlOp) -> Result<ControlReceipt, ControlError> {
        let phase = self.run.phase();
        let outcome = match gate(op, phase) {
            Gate::Reject => {
                warn!(op = %op, phase = %phase, "control request rejected in current state");
                return Err(ControlError::IllegalTransition { op, phase });
            }
            Gate::Ignore => {
                warn!(op = %op, phase = %phase, "control request called in wrong state, ignored");
                ControlOutcome::Ignored
            }
            Gate::Defer => {
                warn!(
                    op = %op,
                    phase = %phase,
                    "step requested while running, pausing the experiment instead"
                );
                self.run.enter_paused();
                ControlOutcome::Deferred
            }
            Gate::Force => {
                warn!(op = %op, phase = %phase, "control request called in wrong state, proceeding");
                self.perform(op);
                ControlOutcome::Forced { from: phase }
            }
            Gate::Proceed => self.perform(op),
        };
        debug!(op = %op, from = %phase, to = %self.run.phase(), ?outcome, "control applied");
        Ok(ControlReceipt {
            op,
            outcome,
            phase: self.run.phase(),
        })
    }

    fn perform(&mut self, op: ControlOp) -> ControlOutcome {
        match op {
            ControlOp::Play => {
                let tick = tick_duration_for(self.engine.clock_tick_secs());
                self.run.enter_playing(tick);
                self.emit(RunEvent::Playing);
                self.pacer.restart();
                info!(tick_ms = tick.as_millis() as u64, "experiment playing");
                ControlOutcome::Applied
            }
            ControlOp::FastForward => {
                let tick = tick_duration_for(self.engine.clock_tick_secs());
                self.run.enter_fast_forwarding(tick);
                self.emit(RunEvent::FastForwarding);
                self.pacer.restart();
                info!(
                    tick_ms = tick.as_millis() as u64,
                    burst = self.run.frames_per_ff_burst(),
                    "experiment fast-forwarding"
                );
                ControlOutcome::Applied
            }
            ControlOp::Pause => {
                self.run.enter_paused();
                self.emit(RunEvent::Paused);
                info!("experiment paused");
                ControlOutcome::Applied
            }
            ControlOp::Step => self.step_once(),
            ControlOp::Reset => {
                self.reset_run();
                ControlOutcome::Applied
            }
        }
    }

    fn step_once(&mut self) -> ControlOutcome {
        if self.engine.is_finished() {
            self.complete_run();
            self.publish_snapshot();
            return ControlOutcome::RunCompleted;
        }
        self.engine.pre_step();
        self.engine.step();
        self.stats.steps_executed += 1;
        self.engine.post_step();
        self.emit(RunEvent::StepDone);
        self.publish_snapshot();
        ControlOutcome::Applied
    }

    fn reset_run(&mut self) {
        self.engine.reset();
        self.run.enter_initialized();
        self.emit(RunEvent::Reset);
        self.publish_snapshot();
        info!("experiment reset");
    }

    // ── Output ─────────────────────────────────────────────────────

    fn emit(&self, event: RunEvent) {
        // The pump may already be gone during shutdown.
        let _ = self.events.send((event, self.run.phase()));
    }

    fn publish_snapshot(&mut self) {
        let snapshot = self.builder.build(&*self.engine, self.run.phase());
        self.ring.push(snapshot);
        self.stats.snapshots_published += 1;
    }
}

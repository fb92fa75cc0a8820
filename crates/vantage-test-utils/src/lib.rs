//! Test utilities and fake collaborators for Vantage development.
//!
//! Provides a [`ScriptedEngine`] whose hook calls are counted by a
//! shared [`EngineProbe`], a [`RecordingBroadcaster`] that keeps every
//! outbound call, fixture entities in [`fixtures`], and a polling helper
//! for assertions on background threads.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use vantage_core::{
    ArenaGeometry, Broadcaster, Entity, LogChannel, RunEvent, RunPhase, SimulationEngine,
    Snapshot, Vec3,
};

pub use fixtures::{FootBot, Light};

// ── EngineProbe ────────────────────────────────────────────────────

/// Call counters shared between a [`ScriptedEngine`] and the test.
///
/// Counters are cumulative: [`SimulationEngine::reset`] does not clear
/// them.
#[derive(Debug, Default)]
pub struct EngineProbe {
    pre_steps: AtomicU64,
    steps: AtomicU64,
    post_steps: AtomicU64,
    post_experiments: AtomicU64,
    resets: AtomicU64,
}

impl EngineProbe {
    pub fn pre_steps(&self) -> u64 {
        self.pre_steps.load(Ordering::SeqCst)
    }

    pub fn steps(&self) -> u64 {
        self.steps.load(Ordering::SeqCst)
    }

    pub fn post_steps(&self) -> u64 {
        self.post_steps.load(Ordering::SeqCst)
    }

    pub fn post_experiments(&self) -> u64 {
        self.post_experiments.load(Ordering::SeqCst)
    }

    pub fn resets(&self) -> u64 {
        self.resets.load(Ordering::SeqCst)
    }

    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::SeqCst);
    }
}

// ── ScriptedEngine ─────────────────────────────────────────────────

/// A deterministic engine that counts steps and optionally finishes
/// after a fixed number of them.
///
/// ```
/// use vantage_core::SimulationEngine;
/// use vantage_test_utils::ScriptedEngine;
///
/// let mut engine = ScriptedEngine::new().finish_after(2);
/// let probe = engine.probe();
/// engine.step();
/// engine.step();
/// assert!(engine.is_finished());
/// engine.reset();
/// assert_eq!(engine.steps(), 0);
/// assert_eq!(probe.steps(), 2);
/// ```
pub struct ScriptedEngine {
    steps: u64,
    finish_after: Option<u64>,
    clock_tick_secs: f64,
    step_delay: Duration,
    arena: ArenaGeometry,
    entities: Vec<Box<dyn Entity + Send>>,
    probe: Arc<EngineProbe>,
}

impl Default for ScriptedEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedEngine {
    /// An engine that never finishes, with a 10 ms clock tick.
    pub fn new() -> Self {
        Self {
            steps: 0,
            finish_after: None,
            clock_tick_secs: 0.01,
            step_delay: Duration::ZERO,
            arena: ArenaGeometry {
                size: Vec3::new(10.0, 10.0, 2.0),
                center: Vec3::new(0.0, 0.0, 1.0),
            },
            entities: Vec::new(),
            probe: Arc::new(EngineProbe::default()),
        }
    }

    /// Report finished once `steps` ticks have run since the last reset.
    pub fn finish_after(mut self, steps: u64) -> Self {
        self.finish_after = Some(steps);
        self
    }

    /// Simulated seconds per tick.
    pub fn clock_tick(mut self, secs: f64) -> Self {
        self.clock_tick_secs = secs;
        self
    }

    /// Wall-clock time each [`step`](SimulationEngine::step) takes.
    pub fn step_delay(mut self, delay: Duration) -> Self {
        self.step_delay = delay;
        self
    }

    pub fn with_entity(mut self, entity: impl Entity + Send) -> Self {
        self.entities.push(Box::new(entity));
        self
    }

    /// Shared counters for this engine.
    pub fn probe(&self) -> Arc<EngineProbe> {
        Arc::clone(&self.probe)
    }
}

impl SimulationEngine for ScriptedEngine {
    fn pre_step(&mut self) {
        EngineProbe::bump(&self.probe.pre_steps);
    }

    fn step(&mut self) {
        if !self.step_delay.is_zero() {
            thread::sleep(self.step_delay);
        }
        self.steps += 1;
        EngineProbe::bump(&self.probe.steps);
    }

    fn post_step(&mut self) {
        EngineProbe::bump(&self.probe.post_steps);
    }

    fn post_experiment(&mut self) {
        EngineProbe::bump(&self.probe.post_experiments);
    }

    fn is_finished(&self) -> bool {
        self.finish_after.is_some_and(|n| self.steps >= n)
    }

    fn reset(&mut self) {
        self.steps = 0;
        EngineProbe::bump(&self.probe.resets);
    }

    fn clock_tick_secs(&self) -> f64 {
        self.clock_tick_secs
    }

    fn steps(&self) -> u64 {
        self.steps
    }

    fn arena(&self) -> ArenaGeometry {
        self.arena
    }

    fn entities(&self) -> Vec<&dyn Entity> {
        self.entities
            .iter()
            .map(|e| e.as_ref() as &dyn Entity)
            .collect()
    }
}

// ── RecordingBroadcaster ───────────────────────────────────────────

/// A [`Broadcaster`] that records every call.
#[derive(Debug, Default)]
pub struct RecordingBroadcaster {
    snapshots: Mutex<Vec<Arc<Snapshot>>>,
    events: Mutex<Vec<(RunEvent, RunPhase)>>,
    logs: Mutex<Vec<(LogChannel, String)>>,
}

impl RecordingBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshots(&self) -> Vec<Arc<Snapshot>> {
        self.snapshots.lock().unwrap().clone()
    }

    pub fn events(&self) -> Vec<(RunEvent, RunPhase)> {
        self.events.lock().unwrap().clone()
    }

    /// Recorded events without their phases.
    pub fn event_kinds(&self) -> Vec<RunEvent> {
        self.events().into_iter().map(|(event, _)| event).collect()
    }

    pub fn logs(&self) -> Vec<(LogChannel, String)> {
        self.logs.lock().unwrap().clone()
    }
}

impl Broadcaster for RecordingBroadcaster {
    fn broadcast(&self, snapshot: Arc<Snapshot>) {
        self.snapshots.lock().unwrap().push(snapshot);
    }

    fn emit_event(&self, event: RunEvent, phase: RunPhase) {
        self.events.lock().unwrap().push((event, phase));
    }

    fn emit_log(&self, channel: LogChannel, line: &str) {
        self.logs.lock().unwrap().push((channel, line.to_owned()));
    }
}

// ── Polling ────────────────────────────────────────────────────────

/// Poll `cond` every millisecond until it holds or `timeout` elapses.
/// Returns whether it held.
pub fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if cond() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(Duration::from_millis(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_survives_reset() {
        let mut engine = ScriptedEngine::new();
        let probe = engine.probe();
        engine.pre_step();
        engine.step();
        engine.post_step();
        engine.reset();
        assert_eq!(engine.steps(), 0);
        assert_eq!(probe.pre_steps(), 1);
        assert_eq!(probe.steps(), 1);
        assert_eq!(probe.post_steps(), 1);
        assert_eq!(probe.resets(), 1);
    }

    #[test]
    fn finish_after_zero_is_finished_immediately() {
        assert!(ScriptedEngine::new().finish_after(0).is_finished());
        assert!(!ScriptedEngine::new().is_finished());
    }

    #[test]
    fn recorder_keeps_order() {
        let rec = RecordingBroadcaster::new();
        rec.emit_event(RunEvent::Playing, RunPhase::Playing);
        rec.emit_event(RunEvent::Paused, RunPhase::Paused);
        assert_eq!(rec.event_kinds(), [RunEvent::Playing, RunEvent::Paused]);
    }

    #[test]
    fn wait_until_times_out() {
        assert!(!wait_until(Duration::from_millis(5), || false));
        assert!(wait_until(Duration::from_millis(5), || true));
    }
}

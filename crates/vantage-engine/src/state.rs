//! Run-state register owned by the driver thread.
//!
//! [`RunState`] is never shared: the driver thread owns it and is the
//! only writer. Callers observe the phase through [`SharedPhase`], which
//! the register updates after every transition.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::warn;
use vantage_core::RunPhase;

/// Lock-free mirror of the current phase.
#[derive(Clone, Debug, Default)]
pub struct SharedPhase(Arc<AtomicU8>);

impl SharedPhase {
    /// A cell holding `Initialized`.
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently published phase.
    pub fn load(&self) -> RunPhase {
        RunPhase::from_u8(self.0.load(Ordering::Acquire)).unwrap_or_default()
    }

    fn store(&self, phase: RunPhase) {
        self.0.store(phase.to_u8(), Ordering::Release);
    }
}

/// Convert the engine's clock tick (simulated seconds per tick) into the
/// wall-clock budget for one tick, truncated to whole milliseconds.
///
/// A non-finite or non-positive clock tick disables pacing.
pub fn tick_duration_for(clock_tick_secs: f64) -> Duration {
    if !clock_tick_secs.is_finite() || clock_tick_secs <= 0.0 {
        warn!(clock_tick_secs, "engine clock tick is not positive, pacing disabled");
        return Duration::ZERO;
    }
    Duration::from_millis((clock_tick_secs * 1000.0) as u64)
}

/// The run's phase, tick budget, and burst size.
///
/// Fast-forwarding is derived from the phase, so the flag can never
/// disagree with it.
#[derive(Debug)]
pub struct RunState {
    phase: RunPhase,
    tick_duration: Duration,
    frames_per_ff_burst: u32,
    shared: SharedPhase,
}

impl RunState {
    /// A register in `Initialized` that publishes into `shared`.
    pub fn new(frames_per_ff_burst: u32, shared: SharedPhase) -> Self {
        shared.store(RunPhase::Initialized);
        Self {
            phase: RunPhase::Initialized,
            tick_duration: Duration::ZERO,
            frames_per_ff_burst: frames_per_ff_burst.max(1),
            shared,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Whether the driver steps the engine.
    pub fn is_running(&self) -> bool {
        self.phase.is_running()
    }

    /// True iff the phase is `FastForwarding`.
    pub fn is_fast_forwarding(&self) -> bool {
        self.phase == RunPhase::FastForwarding
    }

    /// Wall-clock budget per tick, as of the last Play/FastForward.
    pub fn tick_duration(&self) -> Duration {
        self.tick_duration
    }

    /// Configured steps per fast-forward iteration.
    pub fn frames_per_ff_burst(&self) -> u32 {
        self.frames_per_ff_burst
    }

    /// Engine steps for the next driver iteration.
    pub fn burst_size(&self) -> u32 {
        if self.is_fast_forwarding() {
            self.frames_per_ff_burst
        } else {
            1
        }
    }

    /// Enter `Playing` with a freshly computed tick budget.
    pub fn enter_playing(&mut self, tick_duration: Duration) {
        self.tick_duration = tick_duration;
        self.set(RunPhase::Playing);
    }

    /// Enter `FastForwarding` with a freshly computed tick budget.
    pub fn enter_fast_forwarding(&mut self, tick_duration: Duration) {
        self.tick_duration = tick_duration;
        self.set(RunPhase::FastForwarding);
    }

    /// Enter `Paused`.
    pub fn enter_paused(&mut self) {
        self.set(RunPhase::Paused);
    }

    /// Enter `Initialized`.
    pub fn enter_initialized(&mut self) {
        self.set(RunPhase::Initialized);
    }

    fn set(&mut self, phase: RunPhase) {
        self.phase = phase;
        self.shared.store(phase);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_initialized_and_publishes() {
        let shared = SharedPhase::new();
        let mut state = RunState::new(3, shared.clone());
        assert_eq!(state.phase(), RunPhase::Initialized);
        assert_eq!(shared.load(), RunPhase::Initialized);

        state.enter_fast_forwarding(Duration::from_millis(10));
        assert_eq!(shared.load(), RunPhase::FastForwarding);
        assert!(state.is_fast_forwarding());
        assert_eq!(state.burst_size(), 3);

        state.enter_paused();
        assert_eq!(shared.load(), RunPhase::Paused);
        assert!(!state.is_fast_forwarding());
        assert_eq!(state.burst_size(), 1);
    }

    #[test]
    fn fast_forward_flag_tracks_phase() {
        let mut state = RunState::new(2, SharedPhase::new());
        state.enter_fast_forwarding(Duration::ZERO);
        state.enter_playing(Duration::ZERO);
        assert!(!state.is_fast_forwarding());
        state.enter_fast_forwarding(Duration::ZERO);
        state.enter_initialized();
        assert!(!state.is_fast_forwarding());
    }

    #[test]
    fn zero_burst_clamped_to_one() {
        let mut state = RunState::new(0, SharedPhase::new());
        state.enter_fast_forwarding(Duration::ZERO);
        assert_eq!(state.burst_size(), 1);
    }

    #[test]
    fn tick_duration_truncates_to_millis() {
        assert_eq!(tick_duration_for(0.1), Duration::from_millis(100));
        assert_eq!(tick_duration_for(0.0105), Duration::from_millis(10));
        assert_eq!(tick_duration_for(0.0), Duration::ZERO);
        assert_eq!(tick_duration_for(-1.0), Duration::ZERO);
        assert_eq!(tick_duration_for(f64::NAN), Duration::ZERO);
    }
}

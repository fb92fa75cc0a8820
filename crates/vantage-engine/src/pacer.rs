//! Wall-clock pacing of driver cycles.

use std::time::{Duration, Instant};

use tracing::warn;

/// What the driver should do once a cycle's work is done.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pace {
    /// The cycle finished early; wait out the remainder.
    Sleep(Duration),
    /// The cycle took longer than its budget.
    Overrun {
        /// Time the cycle actually took.
        elapsed: Duration,
        /// The budget it was given.
        expected: Duration,
    },
}

/// Cycle timer. Restarted after every cycle, so lateness never carries
/// over into the next budget.
#[derive(Debug)]
pub struct TickPacer {
    started: Instant,
}

impl Default for TickPacer {
    fn default() -> Self {
        Self::new()
    }
}

impl TickPacer {
    /// A timer started now.
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    /// Start a new cycle.
    pub fn restart(&mut self) {
        self.started = Instant::now();
    }

    /// When the current cycle started.
    pub fn started(&self) -> Instant {
        self.started
    }

    /// Compare the time spent since [`restart`](Self::restart) against `budget`.
    pub fn settle(&self, budget: Duration) -> Pace {
        self.settle_at(Instant::now(), budget)
    }

    /// [`settle`](Self::settle) against an explicit clock reading.
    ///
    /// A zero budget means pacing is off: no wait, no overrun.
    pub fn settle_at(&self, now: Instant, budget: Duration) -> Pace {
        if budget.is_zero() {
            return Pace::Sleep(Duration::ZERO);
        }
        let elapsed = now.saturating_duration_since(self.started);
        if elapsed < budget {
            Pace::Sleep(budget - elapsed)
        } else {
            warn!(
                elapsed_ms = elapsed.as_millis() as u64,
                expected_ms = budget.as_millis() as u64,
                "clock tick took longer than expected"
            );
            Pace::Overrun {
                elapsed,
                expected: budget,
            }
        }
    }
}

//! Counters reported by the session threads when they stop.

/// Counters collected by the driver thread over its lifetime.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DriverStats {
    /// Engine steps executed, including single steps.
    pub steps_executed: u64,
    /// Driver iterations that stepped the engine while running.
    pub bursts: u64,
    /// Snapshots pushed into the ring.
    pub snapshots_published: u64,
    /// Cycles that exceeded their tick duration.
    pub overruns: u64,
    /// Runs that reached their end.
    pub runs_completed: u64,
    /// Control requests answered.
    pub requests_handled: u64,
}

/// Counters collected by the broadcast pump over its lifetime.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PumpStats {
    /// Snapshots handed to the broadcaster.
    pub snapshots_sent: u64,
    /// Run events handed to the broadcaster.
    pub events_sent: u64,
    /// Log lines handed to the broadcaster.
    pub log_lines_sent: u64,
}

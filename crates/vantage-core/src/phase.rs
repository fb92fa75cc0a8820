//! The run phase: the session's current mode of operation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The mode a run is in. Exactly one phase is current at any instant.
///
/// Phases cycle; none is terminal. The wire form (used in snapshots and
/// events) is the `EXPERIMENT_*` string returned by [`as_str`](Self::as_str).
///
/// # Examples
///
/// ```
/// use vantage_core::RunPhase;
///
/// assert_eq!(RunPhase::default(), RunPhase::Initialized);
/// assert_eq!(RunPhase::FastForwarding.as_str(), "EXPERIMENT_FAST_FORWARDING");
/// assert!(RunPhase::Playing.is_running());
/// assert!(!RunPhase::Paused.is_running());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum RunPhase {
    /// Freshly constructed or reset; no stepping.
    #[default]
    #[serde(rename = "EXPERIMENT_INITIALIZED")]
    Initialized = 0,
    /// Stepping one tick per driver iteration at real-time pace.
    #[serde(rename = "EXPERIMENT_PLAYING")]
    Playing = 1,
    /// Stepping suspended; Step and Play are accepted.
    #[serde(rename = "EXPERIMENT_PAUSED")]
    Paused = 2,
    /// Stepping a burst of ticks per driver iteration.
    #[serde(rename = "EXPERIMENT_FAST_FORWARDING")]
    FastForwarding = 3,
}

impl RunPhase {
    /// All phases, in discriminant order.
    pub const ALL: [RunPhase; 4] = [
        RunPhase::Initialized,
        RunPhase::Playing,
        RunPhase::Paused,
        RunPhase::FastForwarding,
    ];

    /// Wire string for snapshots and events.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Initialized => "EXPERIMENT_INITIALIZED",
            Self::Playing => "EXPERIMENT_PLAYING",
            Self::Paused => "EXPERIMENT_PAUSED",
            Self::FastForwarding => "EXPERIMENT_FAST_FORWARDING",
        }
    }

    /// Whether the driver steps the engine in this phase.
    pub fn is_running(self) -> bool {
        matches!(self, Self::Playing | Self::FastForwarding)
    }

    /// Whether Play is accepted from this phase.
    pub fn accepts_play(self) -> bool {
        matches!(self, Self::Initialized | Self::Paused)
    }

    /// Compact encoding for lock-free publication.
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Decode a value produced by [`to_u8`](Self::to_u8).
    ///
    /// Returns `None` for values that do not name a phase.
    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.get(value as usize).copied()
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

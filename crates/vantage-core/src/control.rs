//! Control operations and the receipts returned for them.

use std::fmt;

use crate::phase::RunPhase;

/// One of the five operations a remote operator can request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ControlOp {
    /// Start or resume real-time stepping.
    Play,
    /// Suspend stepping.
    Pause,
    /// Step in bursts without waiting for rendering.
    FastForward,
    /// Execute exactly one step cycle.
    Step,
    /// Return the engine to its initial configuration.
    Reset,
}

impl ControlOp {
    /// All operations.
    pub const ALL: [ControlOp; 5] = [
        ControlOp::Play,
        ControlOp::Pause,
        ControlOp::FastForward,
        ControlOp::Step,
        ControlOp::Reset,
    ];

    /// Lowercase verb used in messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Play => "play",
            Self::Pause => "pause",
            Self::FastForward => "fast-forward",
            Self::Step => "step",
            Self::Reset => "reset",
        }
    }
}

impl fmt::Display for ControlOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a control request was handled.
///
/// Soft failures (the request came in the wrong phase but the session
/// decided what to do about it) are reported here rather than as errors;
/// see [`is_warning`](Self::is_warning).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlOutcome {
    /// The transition happened as requested.
    Applied,
    /// FastForward requested outside `Initialized`/`Paused`; applied anyway.
    Forced {
        /// Phase the run was in when the request arrived.
        from: RunPhase,
    },
    /// Play requested outside `Initialized`/`Paused`; nothing changed.
    Ignored,
    /// Step requested while running; the run was paused instead and the
    /// caller must Step again.
    Deferred,
    /// Step found the run finished; the completion routine ran instead.
    RunCompleted,
}

impl ControlOutcome {
    /// Whether the request arrived in a phase that does not permit it.
    pub fn is_warning(self) -> bool {
        matches!(self, Self::Forced { .. } | Self::Ignored | Self::Deferred)
    }
}

/// Receipt returned for every control request the driver handled.
///
/// # Examples
///
/// ```
/// use vantage_core::{ControlOp, ControlOutcome, ControlReceipt, RunPhase};
///
/// let receipt = ControlReceipt {
///     op: ControlOp::Play,
///     outcome: ControlOutcome::Ignored,
///     phase: RunPhase::Playing,
/// };
/// assert!(receipt.outcome.is_warning());
/// assert!(!receipt.changed_phase(RunPhase::Playing));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ControlReceipt {
    /// The requested operation.
    pub op: ControlOp,
    /// How the request was handled.
    pub outcome: ControlOutcome,
    /// Phase after the request was handled.
    pub phase: RunPhase,
}

impl ControlReceipt {
    /// Whether the resulting phase differs from `before`.
    pub fn changed_phase(&self, before: RunPhase) -> bool {
        self.phase != before
    }
}

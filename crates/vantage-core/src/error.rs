//! Error types for control requests.

use thiserror::Error;

use crate::control::ControlOp;
use crate::phase::RunPhase;

/// Hard failures of a control request.
///
/// Only Pause has a hard legality gate; the other operations report
/// wrong-phase requests through
/// [`ControlOutcome`](crate::ControlOutcome) warnings instead.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ControlError {
    /// The operation is not permitted from the current phase.
    #[error("cannot {op} the experiment, current state: {phase}")]
    IllegalTransition {
        /// The rejected operation.
        op: ControlOp,
        /// Phase the run was (and still is) in.
        phase: RunPhase,
    },
    /// The driver thread has exited or the session is shut down.
    #[error("driver thread has stopped")]
    DriverStopped,
    /// The control channel is full (back-pressure).
    #[error("control channel full")]
    ChannelFull,
}

impl ControlError {
    /// Whether the failure was caused by the request itself rather than
    /// by the session's condition. Transports use this to decide what a
    /// remote client gets to see.
    pub fn is_client_fault(&self) -> bool {
        matches!(self, Self::IllegalTransition { .. })
    }
}

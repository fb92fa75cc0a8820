//! Control requests and the legality rule of each operation.

use crossbeam_channel::Sender;
use vantage_core::{ControlError, ControlOp, ControlReceipt, RunPhase};

/// A control request submitted by a caller, paired with a reply channel
/// for the driver's verdict.
pub(crate) struct ControlRequest {
    pub op: ControlOp,
    pub reply: Sender<Result<ControlReceipt, ControlError>>,
}

/// How an operation treats the phase it is applied in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gate {
    /// Perform the operation.
    Proceed,
    /// Perform the operation, but warn that the phase was unexpected.
    Force,
    /// Warn and leave everything unchanged.
    Ignore,
    /// Coerce the phase to `Paused` without doing the operation's work.
    Defer,
    /// Fail with [`ControlError::IllegalTransition`].
    Reject,
}

/// The legality rule for `op` applied in `phase`.
///
/// | op | Initialized / Paused | Playing / FastForwarding |
/// |----|----------------------|--------------------------|
/// | Play | Proceed | Ignore |
/// | FastForward | Proceed | Force |
/// | Pause | Reject | Proceed |
/// | Step | Proceed | Defer |
/// | Reset | Proceed | Proceed |
pub fn gate(op: ControlOp, phase: RunPhase) -> Gate {
    let running = phase.is_running();
    match op {
        ControlOp::Play if running => Gate::Ignore,
        ControlOp::FastForward if running => Gate::Force,
        ControlOp::Pause if !running => Gate::Reject,
        ControlOp::Step if running => Gate::Defer,
        _ => Gate::Proceed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn performs(gate: Gate) -> bool {
        matches!(gate, Gate::Proceed | Gate::Force)
    }

    /// Phase an operation leaves behind, ignoring run completion.
    fn target_phase(op: ControlOp, phase: RunPhase) -> RunPhase {
        match (op, gate(op, phase)) {
            (_, Gate::Ignore | Gate::Reject) => phase,
            (_, Gate::Defer) => RunPhase::Paused,
            (ControlOp::Play, _) => RunPhase::Playing,
            (ControlOp::FastForward, _) => RunPhase::FastForwarding,
            (ControlOp::Pause, _) => RunPhase::Paused,
            (ControlOp::Step, _) => phase,
            (ControlOp::Reset, _) => RunPhase::Initialized,
        }
    }

    fn any_op() -> impl Strategy<Value = ControlOp> {
        proptest::sample::select(ControlOp::ALL.to_vec())
    }

    fn any_phase() -> impl Strategy<Value = RunPhase> {
        proptest::sample::select(RunPhase::ALL.to_vec())
    }

    #[test]
    fn play_table() {
        assert_eq!(gate(ControlOp::Play, RunPhase::Initialized), Gate::Proceed);
        assert_eq!(gate(ControlOp::Play, RunPhase::Paused), Gate::Proceed);
        assert_eq!(gate(ControlOp::Play, RunPhase::Playing), Gate::Ignore);
        assert_eq!(gate(ControlOp::Play, RunPhase::FastForwarding), Gate::Ignore);
    }

    #[test]
    fn fast_forward_is_never_refused() {
        for phase in RunPhase::ALL {
            assert!(performs(gate(ControlOp::FastForward, phase)));
            assert_eq!(
                target_phase(ControlOp::FastForward, phase),
                RunPhase::FastForwarding
            );
        }
    }

    #[test]
    fn pause_requires_running() {
        assert_eq!(gate(ControlOp::Pause, RunPhase::Initialized), Gate::Reject);
        assert_eq!(gate(ControlOp::Pause, RunPhase::Paused), Gate::Reject);
        assert_eq!(gate(ControlOp::Pause, RunPhase::Playing), Gate::Proceed);
    }

    #[test]
    fn step_while_running_defers_to_paused() {
        assert_eq!(gate(ControlOp::Step, RunPhase::FastForwarding), Gate::Defer);
        assert_eq!(
            target_phase(ControlOp::Step, RunPhase::Playing),
            RunPhase::Paused
        );
        assert_eq!(
            target_phase(ControlOp::Step, RunPhase::Initialized),
            RunPhase::Initialized
        );
    }

    proptest! {
        #[test]
        fn refused_ops_keep_the_phase(op in any_op(), phase in any_phase()) {
            if !performs(gate(op, phase)) && gate(op, phase) != Gate::Defer {
                prop_assert_eq!(target_phase(op, phase), phase);
            }
        }

        #[test]
        fn reset_always_initializes(phase in any_phase()) {
            prop_assert_eq!(gate(ControlOp::Reset, phase), Gate::Proceed);
            prop_assert_eq!(target_phase(ControlOp::Reset, phase), RunPhase::Initialized);
        }

        #[test]
        fn only_fast_forward_forces(op in any_op(), phase in any_phase()) {
            if gate(op, phase) == Gate::Force {
                prop_assert_eq!(op, ControlOp::FastForward);
                prop_assert!(phase.is_running());
            }
        }
    }
}

//! Collaborator traits: the simulation engine, its entities, and the
//! transport that carries outbound traffic to observers.

use std::any::Any;
use std::sync::Arc;

use crate::event::{LogChannel, RunEvent};
use crate::geometry::ArenaGeometry;
use crate::phase::RunPhase;
use crate::snapshot::Snapshot;

/// An entity held by the engine.
///
/// Snapshot assembly looks up a converter by [`type_tag`](Self::type_tag)
/// and hands it the entity; converters recover the concrete type through
/// [`as_any`](Self::as_any).
pub trait Entity: Any {
    /// Type tag used to select a converter (e.g. `"foot-bot"`).
    fn type_tag(&self) -> &str;

    /// Identifier unique within the engine.
    fn id(&self) -> &str;

    /// Upcast for downcasting to the concrete entity type.
    fn as_any(&self) -> &dyn Any;
}

/// A deterministic simulation engine driven by a session.
///
/// The session moves the engine into its driver thread, which is the
/// only thread that ever calls these methods. The hook methods default
/// to no-ops.
pub trait SimulationEngine: Send {
    /// User hook run before each step cycle.
    fn pre_step(&mut self) {}

    /// Advance the simulation by one tick.
    fn step(&mut self);

    /// User hook run after each step cycle.
    fn post_step(&mut self) {}

    /// User hook run once when the run reaches its end.
    fn post_experiment(&mut self) {}

    /// Whether the run has reached its end.
    fn is_finished(&self) -> bool;

    /// Return to the initial configuration (step counter back to zero).
    fn reset(&mut self);

    /// Simulated seconds per tick, read fresh on every Play/FastForward.
    fn clock_tick_secs(&self) -> f64;

    /// Cumulative number of ticks since the last reset.
    fn steps(&self) -> u64;

    /// Arena size and center.
    fn arena(&self) -> ArenaGeometry;

    /// Root entities, in engine order.
    fn entities(&self) -> Vec<&dyn Entity>;
}

impl<E: SimulationEngine + ?Sized> SimulationEngine for Box<E> {
    fn pre_step(&mut self) {
        (**self).pre_step()
    }

    fn step(&mut self) {
        (**self).step()
    }

    fn post_step(&mut self) {
        (**self).post_step()
    }

    fn post_experiment(&mut self) {
        (**self).post_experiment()
    }

    fn is_finished(&self) -> bool {
        (**self).is_finished()
    }

    fn reset(&mut self) {
        (**self).reset()
    }

    fn clock_tick_secs(&self) -> f64 {
        (**self).clock_tick_secs()
    }

    fn steps(&self) -> u64 {
        (**self).steps()
    }

    fn arena(&self) -> ArenaGeometry {
        (**self).arena()
    }

    fn entities(&self) -> Vec<&dyn Entity> {
        (**self).entities()
    }
}

/// Outbound side of the transport.
///
/// Implementations must not block for long: they are called from the
/// broadcast pump thread, which also carries events and log lines.
pub trait Broadcaster: Send + Sync {
    /// Deliver a snapshot to all observers.
    fn broadcast(&self, snapshot: Arc<Snapshot>);

    /// Deliver a run event together with the resulting phase.
    fn emit_event(&self, event: RunEvent, phase: RunPhase);

    /// Deliver a captured log line verbatim.
    fn emit_log(&self, channel: LogChannel, line: &str);
}

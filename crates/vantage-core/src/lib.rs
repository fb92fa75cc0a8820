//! Core types and collaborator traits for Vantage simulation sessions.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the vocabulary shared by the session engine and its collaborators:
//! run phases, events, control receipts, snapshots, and the traits a
//! simulation engine, its entities, and a transport implement.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod control;
pub mod error;
pub mod event;
pub mod geometry;
pub mod phase;
pub mod snapshot;
pub mod traits;

pub use control::{ControlOp, ControlOutcome, ControlReceipt};
pub use error::ControlError;
pub use event::{LogChannel, RunEvent};
pub use geometry::{ArenaGeometry, Vec3};
pub use phase::RunPhase;
pub use snapshot::Snapshot;
pub use traits::{Broadcaster, Entity, SimulationEngine};

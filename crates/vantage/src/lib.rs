//! Vantage: remotely controlled, remotely observed simulation sessions.
//!
//! This is the top-level facade crate that re-exports the public API from
//! the Vantage sub-crates. For most users, adding `vantage` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use vantage::prelude::*;
//!
//! // A counter that finishes after 1000 ticks of 1 ms each.
//! struct Counter(u64);
//!
//! impl SimulationEngine for Counter {
//!     fn step(&mut self) { self.0 += 1; }
//!     fn is_finished(&self) -> bool { self.0 >= 1000 }
//!     fn reset(&mut self) { self.0 = 0; }
//!     fn clock_tick_secs(&self) -> f64 { 0.001 }
//!     fn steps(&self) -> u64 { self.0 }
//!     fn arena(&self) -> ArenaGeometry { ArenaGeometry::default() }
//!     fn entities(&self) -> Vec<&dyn Entity> { Vec::new() }
//! }
//!
//! let (broadcaster, outbound) = ChannelBroadcaster::new();
//! let mut session = RemoteSession::builder(SessionConfig::default())
//!     .spawn(Counter(0), Arc::new(broadcaster))
//!     .unwrap();
//!
//! let receipt = session.play().unwrap();
//! assert_eq!(receipt.phase, RunPhase::Playing);
//! std::thread::sleep(Duration::from_millis(20));
//! session.pause().unwrap();
//!
//! let report = session.shutdown();
//! assert!(report.driver.unwrap().steps_executed > 0);
//! assert!(outbound.try_iter().any(|m| matches!(m, Outbound::Event { .. })));
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `vantage-core` | Phases, events, receipts, snapshots, collaborator traits |
//! | [`engine`] | `vantage-engine` | Sessions, configuration, driver, broadcast pump, log bridge |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types and collaborator traits (`vantage-core`).
///
/// Contains [`types::RunPhase`], [`types::RunEvent`], control receipts and
/// errors, [`types::Snapshot`], and the [`types::SimulationEngine`],
/// [`types::Entity`] and [`types::Broadcaster`] traits.
pub use vantage_core as types;

/// Session engine (`vantage-engine`).
///
/// [`engine::RemoteSession`] owns the driver and broadcast threads;
/// [`engine::LogBridge`] captures log lines for observers.
pub use vantage_engine as engine;

/// Common imports for typical Vantage usage.
///
/// ```rust
/// use vantage::prelude::*;
/// ```
pub mod prelude {
    // Core types and traits
    pub use vantage_core::{
        ArenaGeometry, Broadcaster, ControlOp, ControlOutcome, ControlReceipt, Entity, LogChannel,
        RunEvent, RunPhase, SimulationEngine, Snapshot, Vec3,
    };

    // Errors
    pub use vantage_core::ControlError;
    pub use vantage_engine::ConfigError;

    // Engine
    pub use vantage_engine::{
        ChannelBroadcaster, CompletionPolicy, ConverterRegistry, LogBridge, Outbound,
        RemoteSession, SessionConfig, ShutdownReport, VizConfig,
    };
}

//! Session engine for remotely controlled Vantage simulations.
//!
//! [`RemoteSession`] moves a [`SimulationEngine`](vantage_core::SimulationEngine)
//! onto a dedicated driver thread, paces it against the wall clock, and
//! accepts Play, Pause, FastForward, Step and Reset requests from any
//! thread. A second thread forwards snapshots at the configured broadcast
//! frequency, together with run events and the log lines captured by a
//! [`LogBridge`], to a [`Broadcaster`](vantage_core::Broadcaster).

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod broadcast;
pub mod config;
pub mod control;
mod driver;
pub mod log_bridge;
pub mod metrics;
pub mod pacer;
mod pump;
pub mod ring;
pub mod session;
pub mod snapshot;
pub mod state;

pub use broadcast::{ChannelBroadcaster, Outbound};
pub use config::{CompletionPolicy, ConfigError, SessionConfig, VizConfig};
pub use log_bridge::{LogBridge, LogBridgeLayer, LogLine};
pub use metrics::{DriverStats, PumpStats};
pub use ring::SnapshotRing;
pub use session::{RemoteSession, SessionBuilder, ShutdownReport};
pub use snapshot::{ConverterRegistry, EntityConverter, SnapshotBuilder};

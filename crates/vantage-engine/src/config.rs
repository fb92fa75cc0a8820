//! Session configuration, validation, and error types.
//!
//! [`VizConfig`] carries the three options an operator sets on the
//! visualization (port, broadcast frequency, fast-forward burst size) and
//! deserializes from JSON using the same keys. [`SessionConfig`] wraps it
//! with the session-level knobs. [`validate()`](SessionConfig::validate)
//! checks every invariant at startup; the session constructor calls it
//! before any thread is spawned.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lowest accepted broadcast frequency (Hz).
pub const MIN_BROADCAST_FREQUENCY: u16 = 1;

/// Highest accepted broadcast frequency (Hz).
pub const MAX_BROADCAST_FREQUENCY: u16 = 10;

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected while building or validating a session configuration.
///
/// Every variant is fatal to startup: no thread is spawned.
#[derive(Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// `broadcast_frequency` lies outside `[1, 10]`.
    #[error("broadcast_frequency {value} is out of range [1, 10]")]
    BroadcastFrequencyOutOfRange {
        /// The rejected value.
        value: u16,
    },
    /// `ff_draw_frames_every` is zero, so fast-forward would never step.
    #[error("ff_draw_frames_every must be at least 1")]
    ZeroBurst,
    /// Snapshot history is below the minimum of 2.
    #[error("snapshot_history {configured} is below minimum of 2")]
    HistoryTooSmall {
        /// The configured size that was too small.
        configured: usize,
    },
    /// Control channel capacity is zero.
    #[error("command_capacity must be at least 1")]
    CommandCapacityZero,
    /// The configuration document could not be parsed.
    #[error("invalid configuration document: {0}")]
    Parse(String),
    /// A session thread could not be spawned.
    #[error("thread spawn failed: {reason}")]
    ThreadSpawnFailed {
        /// Description of which thread failed.
        reason: String,
    },
}

// ── VizConfig ──────────────────────────────────────────────────────

/// Operator-facing options.
///
/// Missing keys take their defaults when deserializing.
///
/// # Examples
///
/// ```
/// use vantage_engine::VizConfig;
///
/// let cfg = VizConfig::from_json_str(r#"{"port": 8080}"#).unwrap();
/// assert_eq!(cfg.port, 8080);
/// assert_eq!(cfg.broadcast_frequency, 10);
/// assert_eq!(cfg.ff_draw_frames_every, 2);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VizConfig {
    /// Network port handed to the transport uninterpreted. Default: 3000.
    pub port: u16,
    /// Snapshots forwarded per second. Default: 10. Range: `[1, 10]`.
    pub broadcast_frequency: u16,
    /// Engine steps per driver iteration while fast-forwarding. Default: 2.
    pub ff_draw_frames_every: u16,
}

impl Default for VizConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            broadcast_frequency: 10,
            ff_draw_frames_every: 2,
        }
    }
}

impl VizConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(doc: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(doc).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the operator-facing invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_BROADCAST_FREQUENCY..=MAX_BROADCAST_FREQUENCY)
            .contains(&self.broadcast_frequency)
        {
            return Err(ConfigError::BroadcastFrequencyOutOfRange {
                value: self.broadcast_frequency,
            });
        }
        if self.ff_draw_frames_every == 0 {
            return Err(ConfigError::ZeroBurst);
        }
        Ok(())
    }

    /// Interval between two forwarded snapshots.
    ///
    /// Only meaningful once [`validate()`](Self::validate) has passed.
    pub fn broadcast_interval(&self) -> Duration {
        Duration::from_secs(1) / u32::from(self.broadcast_frequency.max(1))
    }
}

// ── CompletionPolicy ───────────────────────────────────────────────

/// What the driver thread does after a run reaches its end.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionPolicy {
    /// Stay alive in `Initialized`; a later Play starts a fresh run.
    #[default]
    Rearm,
    /// Exit the driver thread; later control requests fail with
    /// `DriverStopped`.
    Exit,
}

// ── SessionConfig ──────────────────────────────────────────────────

/// Complete configuration for spawning a [`RemoteSession`](crate::RemoteSession).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    /// Operator-facing options.
    pub viz: VizConfig,
    /// Driver behaviour after a run completes. Default: `Rearm`.
    pub completion: CompletionPolicy,
    /// Wait between two idle snapshots while not running. Default: 250 ms.
    pub idle_interval: Duration,
    /// Snapshots retained in the ring. Default: 8. Minimum: 2.
    pub snapshot_history: usize,
    /// Pending control requests before back-pressure. Default: 64.
    pub command_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            viz: VizConfig::default(),
            completion: CompletionPolicy::default(),
            idle_interval: Duration::from_millis(250),
            snapshot_history: 8,
            command_capacity: 64,
        }
    }
}

impl SessionConfig {
    /// Session configuration around the given operator options.
    pub fn from_viz(viz: VizConfig) -> Self {
        Self {
            viz,
            ..Self::default()
        }
    }

    /// Validate all invariants, returning the first violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.viz.validate()?;
        if self.snapshot_history < 2 {
            return Err(ConfigError::HistoryTooSmall {
                configured: self.snapshot_history,
            });
        }
        if self.command_capacity == 0 {
            return Err(ConfigError::CommandCapacityZero);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_frequency(value: u16) -> VizConfig {
        VizConfig {
            broadcast_frequency: value,
            ..VizConfig::default()
        }
    }

    #[test]
    fn defaults_validate() {
        assert!(SessionConfig::default().validate().is_ok());
        let viz = VizConfig::default();
        assert_eq!(viz.port, 3000);
        assert_eq!(viz.broadcast_frequency, 10);
        assert_eq!(viz.ff_draw_frames_every, 2);
    }

    #[test]
    fn broadcast_frequency_bounds() {
        assert!(with_frequency(1).validate().is_ok());
        assert!(with_frequency(10).validate().is_ok());
        assert_eq!(
            with_frequency(0).validate(),
            Err(ConfigError::BroadcastFrequencyOutOfRange { value: 0 })
        );
        assert_eq!(
            with_frequency(11).validate(),
            Err(ConfigError::BroadcastFrequencyOutOfRange { value: 11 })
        );
    }

    #[test]
    fn range_message_matches_enforced_bounds() {
        let msg = ConfigError::BroadcastFrequencyOutOfRange { value: 11 }.to_string();
        let range = format!("[{MIN_BROADCAST_FREQUENCY}, {MAX_BROADCAST_FREQUENCY}]");
        assert!(msg.contains(&range), "{msg}");
    }

    #[test]
    fn zero_burst_rejected() {
        let viz = VizConfig {
            ff_draw_frames_every: 0,
            ..VizConfig::default()
        };
        assert_eq!(viz.validate(), Err(ConfigError::ZeroBurst));
    }

    #[test]
    fn session_limits_rejected() {
        let cfg = SessionConfig {
            snapshot_history: 1,
            ..SessionConfig::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::HistoryTooSmall { configured: 1 })
        );

        let cfg = SessionConfig {
            command_capacity: 0,
            ..SessionConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::CommandCapacityZero));
    }

    #[test]
    fn json_document_is_validated() {
        let err = VizConfig::from_json_str(r#"{"broadcast_frequency": 1000}"#).unwrap_err();
        assert_eq!(
            err,
            ConfigError::BroadcastFrequencyOutOfRange { value: 1000 }
        );
        assert!(matches!(
            VizConfig::from_json_str("{not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn broadcast_interval_follows_frequency() {
        assert_eq!(with_frequency(10).broadcast_interval(), Duration::from_millis(100));
        assert_eq!(with_frequency(1).broadcast_interval(), Duration::from_secs(1));
        assert_eq!(with_frequency(4).broadcast_interval(), Duration::from_millis(250));
    }
}

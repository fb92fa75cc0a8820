//! Discrete run events and log channels pushed to observers.

use std::fmt;

use serde::{Serialize, Serializer};

/// A named, discrete notification emitted when the run changes mode.
///
/// Every emitted event is paired with the phase that resulted from the
/// change (see [`Broadcaster::emit_event`](crate::Broadcaster::emit_event)).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RunEvent {
    /// Play was accepted.
    Playing,
    /// FastForward was applied.
    FastForwarding,
    /// Pause was accepted.
    Paused,
    /// A single Step cycle finished.
    StepDone,
    /// The engine was reset to its initial configuration.
    Reset,
    /// The run reached its end and was reset.
    Done,
}

impl RunEvent {
    /// Wire name of the event.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Playing => "Experiment playing",
            Self::FastForwarding => "Experiment fast-forwarding",
            Self::Paused => "Experiment paused",
            Self::StepDone => "Experiment step done",
            Self::Reset => "Experiment reset",
            Self::Done => "Experiment done",
        }
    }
}

impl fmt::Display for RunEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for RunEvent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Named stream a captured log line is forwarded on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LogChannel {
    /// Regular output (`"LOG"`).
    Log,
    /// Error output (`"LOGERR"`).
    LogErr,
}

impl LogChannel {
    /// Wire name of the channel.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Log => "LOG",
            Self::LogErr => "LOGERR",
        }
    }
}

impl fmt::Display for LogChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for LogChannel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_names_match_wire_protocol() {
        assert_eq!(RunEvent::Playing.as_str(), "Experiment playing");
        assert_eq!(RunEvent::FastForwarding.as_str(), "Experiment fast-forwarding");
        assert_eq!(RunEvent::Paused.as_str(), "Experiment paused");
        assert_eq!(RunEvent::StepDone.as_str(), "Experiment step done");
        assert_eq!(RunEvent::Reset.as_str(), "Experiment reset");
        assert_eq!(RunEvent::Done.as_str(), "Experiment done");
    }

    #[test]
    fn channels_serialize_as_names() {
        assert_eq!(serde_json::to_string(&LogChannel::Log).unwrap(), "\"LOG\"");
        assert_eq!(serde_json::to_string(&LogChannel::LogErr).unwrap(), "\"LOGERR\"");
    }
}

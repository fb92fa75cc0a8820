//! Point-in-time projection of world and run state.

use serde::Serialize;
use serde_json::Value;

use crate::geometry::ArenaGeometry;
use crate::phase::RunPhase;

/// A snapshot sent to observers.
///
/// Built fresh for every publication and never mutated afterwards. The
/// JSON form always carries `entities`, `arena.size`, `arena.center`,
/// `timestamp`, `state` and `steps`, even when there are no entities.
///
/// # Examples
///
/// ```
/// use vantage_core::{ArenaGeometry, RunPhase, Snapshot};
///
/// let snap = Snapshot {
///     entities: Vec::new(),
///     arena: ArenaGeometry::default(),
///     timestamp: 1_700_000_000_000,
///     state: RunPhase::Paused,
///     steps: 12,
/// };
/// let json = snap.to_json();
/// assert_eq!(json["state"], "EXPERIMENT_PAUSED");
/// assert_eq!(json["arena"]["size"]["x"], 0.0);
/// assert!(json["entities"].as_array().unwrap().is_empty());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Snapshot {
    /// JSON projections of the entities that could be converted.
    pub entities: Vec<Value>,
    /// Arena size and center, verbatim from the engine.
    pub arena: ArenaGeometry,
    /// Wall-clock assembly time, milliseconds since the Unix epoch.
    pub timestamp: u64,
    /// Run phase at assembly time.
    pub state: RunPhase,
    /// The engine's cumulative step counter.
    pub steps: u64,
}

impl Snapshot {
    /// Render the snapshot as a JSON value.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or_default()
    }

    /// Number of converted entities.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Vec3;
    use serde_json::json;

    #[test]
    fn json_layout_is_stable() {
        let snap = Snapshot {
            entities: vec![json!({"type": "box", "id": "b0"})],
            arena: ArenaGeometry {
                size: Vec3::new(4.0, 4.0, 1.0),
                center: Vec3::new(0.0, 0.0, 0.5),
            },
            timestamp: 42,
            state: RunPhase::Playing,
            steps: 7,
        };
        assert_eq!(
            snap.to_json(),
            json!({
                "entities": [{"type": "box", "id": "b0"}],
                "arena": {
                    "size": {"x": 4.0, "y": 4.0, "z": 1.0},
                    "center": {"x": 0.0, "y": 0.0, "z": 0.5}
                },
                "timestamp": 42,
                "state": "EXPERIMENT_PLAYING",
                "steps": 7
            })
        );
    }
}

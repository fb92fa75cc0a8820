//! Snapshot assembly and the entity converter registry.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use indexmap::IndexMap;
use serde_json::Value;
use tracing::error;
use vantage_core::{Entity, RunPhase, SimulationEngine, Snapshot};

/// A type-erased entity converter.
///
/// Returns `None` when the entity cannot be projected.
pub type EntityConverter = Box<dyn Fn(&dyn Entity) -> Option<Value> + Send + Sync>;

// ── ConverterRegistry ──────────────────────────────────────────────

/// Maps an entity type tag to the function projecting it into JSON.
///
/// # Examples
///
/// ```
/// use std::any::Any;
/// use serde_json::json;
/// use vantage_core::Entity;
/// use vantage_engine::ConverterRegistry;
///
/// struct Lamp { id: String, on: bool }
///
/// impl Entity for Lamp {
///     fn type_tag(&self) -> &str { "lamp" }
///     fn id(&self) -> &str { &self.id }
///     fn as_any(&self) -> &dyn Any { self }
/// }
///
/// let mut registry = ConverterRegistry::new();
/// registry.register("lamp", |lamp: &Lamp| json!({ "id": lamp.id, "on": lamp.on }));
///
/// let lamp = Lamp { id: "l0".into(), on: true };
/// assert_eq!(registry.convert(&lamp), Some(json!({ "id": "l0", "on": true })));
/// ```
#[derive(Default)]
pub struct ConverterRegistry {
    converters: IndexMap<String, EntityConverter>,
}

impl ConverterRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a converter for the concrete entity type `E`.
    ///
    /// An entity carrying `tag` that is not actually an `E` fails to
    /// convert. Registering a tag again replaces the earlier converter.
    pub fn register<E, F>(&mut self, tag: impl Into<String>, convert: F) -> &mut Self
    where
        E: Entity,
        F: Fn(&E) -> Value + Send + Sync + 'static,
    {
        self.register_dyn(
            tag,
            Box::new(move |entity: &dyn Entity| {
                entity.as_any().downcast_ref::<E>().map(&convert)
            }),
        )
    }

    /// Register a converter that works on the trait object directly.
    pub fn register_dyn(&mut self, tag: impl Into<String>, convert: EntityConverter) -> &mut Self {
        self.converters.insert(tag.into(), convert);
        self
    }

    /// Project one entity, or `None` if no converter accepts it.
    pub fn convert(&self, entity: &dyn Entity) -> Option<Value> {
        self.converters
            .get(entity.type_tag())
            .and_then(|convert| convert(entity))
    }

    /// Whether a converter is registered for `tag`.
    pub fn contains(&self, tag: &str) -> bool {
        self.converters.contains_key(tag)
    }

    /// Registered tags, in registration order.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.converters.keys().map(String::as_str)
    }

    /// Number of registered converters.
    pub fn len(&self) -> usize {
        self.converters.len()
    }

    /// Whether no converter is registered.
    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }
}

impl fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterRegistry")
            .field("tags", &self.converters.keys().collect::<Vec<_>>())
            .finish()
    }
}

// ── SnapshotBuilder ────────────────────────────────────────────────

/// Builds snapshots from engine state.
#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    registry: ConverterRegistry,
}

impl SnapshotBuilder {
    /// A builder using `registry` for entity projection.
    pub fn new(registry: ConverterRegistry) -> Self {
        Self { registry }
    }

    /// Assemble a snapshot of `engine` in `phase`.
    ///
    /// Entities that cannot be converted are logged and left out; the
    /// snapshot is produced regardless.
    pub fn build(&self, engine: &dyn SimulationEngine, phase: RunPhase) -> Snapshot {
        let entities = engine
            .entities()
            .into_iter()
            .filter_map(|entity| {
                let converted = self.registry.convert(entity);
                if converted.is_none() {
                    error!(
                        entity_type = entity.type_tag(),
                        entity_id = entity.id(),
                        "entity type is not supported"
                    );
                }
                converted
            })
            .collect();

        Snapshot {
            entities,
            arena: engine.arena(),
            timestamp: epoch_millis(),
            state: phase,
            steps: engine.steps(),
        }
    }
}

/// Milliseconds since the Unix epoch; zero if the clock is before it.
pub fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::any::Any;

    use serde_json::json;
    use vantage_core::{ArenaGeometry, Vec3};

    use super::*;

    struct Bot {
        id: String,
        x: f64,
    }

    impl Entity for Bot {
        fn type_tag(&self) -> &str {
            "bot"
        }
        fn id(&self) -> &str {
            &self.id
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    // Claims the "bot" tag without being a `Bot`.
    struct Impostor;

    impl Entity for Impostor {
        fn type_tag(&self) -> &str {
            "bot"
        }
        fn id(&self) -> &str {
            "impostor"
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    struct Rock;

    impl Entity for Rock {
        fn type_tag(&self) -> &str {
            "rock"
        }
        fn id(&self) -> &str {
            "r0"
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    struct World {
        entities: Vec<Box<dyn Entity + Send>>,
        steps: u64,
    }

    impl SimulationEngine for World {
        fn step(&mut self) {
            self.steps += 1;
        }
        fn is_finished(&self) -> bool {
            false
        }
        fn reset(&mut self) {
            self.steps = 0;
        }
        fn clock_tick_secs(&self) -> f64 {
            0.1
        }
        fn steps(&self) -> u64 {
            self.steps
        }
        fn arena(&self) -> ArenaGeometry {
            ArenaGeometry {
                size: Vec3::new(4.0, 4.0, 1.0),
                center: Vec3::new(0.0, 0.0, 0.5),
            }
        }
        fn entities(&self) -> Vec<&dyn Entity> {
            self.entities.iter().map(|e| e.as_ref() as &dyn Entity).collect()
        }
    }

    fn registry() -> ConverterRegistry {
        let mut registry = ConverterRegistry::new();
        registry.register("bot", |bot: &Bot| json!({ "id": bot.id, "x": bot.x }));
        registry
    }

    #[test]
    fn registry_keeps_insertion_order() {
        let mut registry = registry();
        registry.register_dyn("light", Box::new(|_| Some(Value::Null)));
        registry.register_dyn("box", Box::new(|_| Some(Value::Null)));
        assert_eq!(registry.tags().collect::<Vec<_>>(), ["bot", "light", "box"]);
        assert_eq!(registry.len(), 3);
        assert!(registry.contains("light"));
        assert!(!registry.contains("rock"));
    }

    #[test]
    fn downcast_failure_is_a_conversion_failure() {
        let registry = registry();
        assert!(registry.convert(&Impostor).is_none());
        assert!(registry.convert(&Rock).is_none());
    }

    #[test]
    fn unsupported_entities_are_omitted() {
        let world = World {
            entities: vec![
                Box::new(Bot { id: "b0".into(), x: 1.5 }),
                Box::new(Rock),
                Box::new(Bot { id: "b1".into(), x: -2.0 }),
            ],
            steps: 7,
        };
        let snap = SnapshotBuilder::new(registry()).build(&world, RunPhase::Playing);
        assert_eq!(snap.entity_count(), 2);
        assert_eq!(snap.entities[0]["id"], "b0");
        assert_eq!(snap.entities[1]["id"], "b1");
        assert_eq!(snap.steps, 7);
        assert_eq!(snap.state, RunPhase::Playing);
        assert_eq!(snap.arena.size, Vec3::new(4.0, 4.0, 1.0));
        assert!(snap.timestamp > 0);
    }

    #[test]
    fn empty_world_still_has_entities_key() {
        let world = World {
            entities: Vec::new(),
            steps: 0,
        };
        let json = SnapshotBuilder::default()
            .build(&world, RunPhase::Initialized)
            .to_json();
        for key in ["entities", "arena", "timestamp", "state", "steps"] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert_eq!(json["entities"], json!([]));
        assert_eq!(json["arena"]["center"]["z"], 0.5);
        assert_eq!(json["state"], "EXPERIMENT_INITIALIZED");
    }
}

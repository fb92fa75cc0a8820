//! Arena geometry reported by the engine.

use serde::{Deserialize, Serialize};

/// A three-component vector, serialized as `{"x": .., "y": .., "z": ..}`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
    /// Z component.
    pub z: f64,
}

impl Vec3 {
    /// Build a vector from its components.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Size and center of the simulated arena.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ArenaGeometry {
    /// Extent along each axis.
    pub size: Vec3,
    /// Position of the arena's center.
    pub center: Vec3,
}

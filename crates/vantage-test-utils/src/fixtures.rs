//! Fixture entities.
//!
//! - [`FootBot`]: a wheeled robot with a position and heading.
//! - [`Light`]: a coloured light source.
//!
//! Each carries a `to_json` projection suitable for registering as a
//! snapshot converter.

use std::any::Any;

use serde_json::{json, Value};
use vantage_core::{Entity, Vec3};

/// A robot tagged `"foot-bot"`.
#[derive(Clone, Debug, PartialEq)]
pub struct FootBot {
    pub id: String,
    pub position: Vec3,
    pub heading: f64,
}

impl FootBot {
    pub fn new(id: impl Into<String>, position: Vec3) -> Self {
        Self {
            id: id.into(),
            position,
            heading: 0.0,
        }
    }

    pub fn to_json(&self) -> Value {
        json!({
            "type": "foot-bot",
            "id": self.id,
            "position": { "x": self.position.x, "y": self.position.y, "z": self.position.z },
            "heading": self.heading,
        })
    }
}

impl Entity for FootBot {
    fn type_tag(&self) -> &str {
        "foot-bot"
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A light tagged `"light"`.
#[derive(Clone, Debug, PartialEq)]
pub struct Light {
    pub id: String,
    pub color: String,
}

impl Light {
    pub fn new(id: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            color: color.into(),
        }
    }

    pub fn to_json(&self) -> Value {
        json!({ "type": "light", "id": self.id, "color": self.color })
    }
}

impl Entity for Light {
    fn type_tag(&self) -> &str {
        "light"
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

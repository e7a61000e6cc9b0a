// src/payload/mod.rs
//! Rendering the spec model into the Notion API's strict object shapes.
//!
//! The model layer parses whatever the generator produced; this layer
//! owns the wire conventions — block objects, property schema objects,
//! property value objects — and nothing here performs I/O.

pub mod blocks;
pub mod properties;
pub mod rich_text;
pub mod rows;

use crate::types::PropertyName;
use indexmap::IndexMap;
use serde_json::Value;

/// Flattens an ordered property map into the JSON object the API expects.
pub fn properties_value(properties: &IndexMap<PropertyName, Value>) -> Value {
    let mut map = serde_json::Map::new();
    for (name, schema) in properties {
        map.insert(name.as_str().to_string(), schema.clone());
    }
    Value::Object(map)
}

// src/payload/rows.rs
//! Sample data records → Notion property value objects.
//!
//! Values are matched against the declared properties by name. Keys the
//! schema doesn't know are silently ignored (the generator emits extra
//! fields), and values that can't be coerced are dropped rather than
//! sent malformed. Relation and rollup values are never emitted here:
//! populating a relation requires the related row to already exist,
//! which is outside the deployment's single pass over rows.

use crate::model::{PropertyKind, SpecProperty};
use crate::types::PropertyName;
use chrono::NaiveDate;
use indexmap::IndexMap;
use serde_json::{json, Map, Value};

/// Converts one sample record into the property values for row creation.
pub fn transform_sample_row(
    record: &Map<String, Value>,
    properties: &[SpecProperty],
) -> IndexMap<PropertyName, Value> {
    let mut values = IndexMap::new();

    for (key, raw) in record {
        let Some(prop) = properties.iter().find(|p| &p.name == key) else {
            continue;
        };
        // Null means "absent" for everything except checkbox, which
        // defaults to unchecked.
        if raw.is_null() && prop.kind != PropertyKind::Checkbox {
            continue;
        }
        if let Some(value) = property_value(&prop.kind, raw) {
            values.insert(PropertyName::new(key.as_str()), value);
        }
    }

    values
}

/// Coerces one raw value into the API shape for its property type.
/// Returns `None` when the value can't be represented — the field is
/// dropped from the row.
fn property_value(kind: &PropertyKind, raw: &Value) -> Option<Value> {
    match kind {
        PropertyKind::Title => Some(json!({ "title": text_value(raw) })),
        PropertyKind::RichText | PropertyKind::Unknown(_) => {
            Some(json!({ "rich_text": text_value(raw) }))
        }
        PropertyKind::Number => number_value(raw).map(|n| json!({ "number": n })),
        PropertyKind::Select => name_object(raw).map(|o| json!({ "select": o })),
        PropertyKind::Status => name_object(raw).map(|o| json!({ "status": o })),
        PropertyKind::MultiSelect => Some(json!({ "multi_select": name_objects(raw) })),
        PropertyKind::Date => date_value(raw).map(|d| json!({ "date": d })),
        PropertyKind::Checkbox => Some(json!({ "checkbox": raw.as_bool().unwrap_or(false) })),
        PropertyKind::Url => raw.as_str().map(|s| json!({ "url": s })),
        PropertyKind::Email => raw.as_str().map(|s| json!({ "email": s })),
        PropertyKind::PhoneNumber => raw.as_str().map(|s| json!({ "phone_number": s })),
        // Relations need the related row to exist; rollups and the
        // timestamp/people/files kinds are computed or read-only.
        PropertyKind::Relation
        | PropertyKind::Rollup
        | PropertyKind::Formula
        | PropertyKind::People
        | PropertyKind::Files
        | PropertyKind::CreatedTime
        | PropertyKind::CreatedBy
        | PropertyKind::LastEditedTime
        | PropertyKind::LastEditedBy => None,
    }
}

/// Any scalar becomes a one-run rich text array.
fn text_value(raw: &Value) -> Vec<Value> {
    let content = match raw {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return vec![],
    };
    if content.is_empty() {
        return vec![];
    }
    vec![json!({ "text": { "content": content } })]
}

/// Numbers arrive as JSON numbers or as strings; anything unparseable
/// is dropped entirely — the API rejects NaN and non-numeric values.
fn number_value(raw: &Value) -> Option<Value> {
    match raw {
        Value::Number(n) => Some(Value::Number(n.clone())),
        Value::String(s) => {
            let trimmed = s.trim();
            if let Ok(int) = trimmed.parse::<i64>() {
                return Some(json!(int));
            }
            trimmed
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(|f| json!(f))
        }
        _ => None,
    }
}

/// Select/status values: a bare string or a `{name}` object.
fn name_object(raw: &Value) -> Option<Value> {
    match raw {
        Value::String(s) if !s.trim().is_empty() => Some(json!({ "name": s })),
        Value::Object(obj) => obj
            .get("name")
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .map(|name| json!({ "name": name })),
        _ => None,
    }
}

/// Multi-select values: an array of strings or `{name}` objects.
fn name_objects(raw: &Value) -> Vec<Value> {
    match raw {
        Value::Array(items) => items.iter().filter_map(name_object).collect(),
        other => name_object(other).into_iter().collect(),
    }
}

/// Dates: a bare ISO string wrapped as `{start}`, or an already-shaped
/// `{start, ...}` object passed through.
fn date_value(raw: &Value) -> Option<Value> {
    match raw {
        Value::String(s) if !s.trim().is_empty() => {
            let looks_iso = NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
                || chrono::DateTime::parse_from_rfc3339(s).is_ok();
            if !looks_iso {
                log::debug!("Date value \"{}\" is not ISO-shaped; passing through", s);
            }
            Some(json!({ "start": s }))
        }
        Value::Object(obj) if obj.get("start").and_then(Value::as_str).is_some() => {
            Some(raw.clone())
        }
        _ => None,
    }
}

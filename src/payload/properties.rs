// src/payload/properties.rs
//! Property declarations → Notion database schema objects.
//!
//! First-pass transformation only: `relation` and `rollup` are deferred
//! because their targets (other databases, other properties) may not
//! exist yet. The orchestrator wires them in later passes.

use crate::constants::{NOTION_MAX_PROPERTIES_PER_DATABASE, SYNTHETIC_TITLE_PROPERTY};
use crate::model::{PropertyKind, SpecDatabase, SpecProperty};
use crate::types::PropertyName;
use indexmap::IndexMap;
use serde_json::{json, Value};

/// The outcome of transforming one declared property.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaOutcome {
    /// A usable schema entry.
    Entry { name: PropertyName, schema: Value },
    /// Relation/rollup — wired in a later pass, nothing emitted now.
    Deferred,
    /// Blank property name — the API forbids empty keys.
    Skipped,
}

/// Emits the minimal valid schema shape for one property.
///
/// Unknown type strings fall back to `rich_text`: preserving the data
/// column beats failing the whole database.
pub fn transform_property(prop: &SpecProperty) -> SchemaOutcome {
    let name = prop.name.trim();
    if name.is_empty() {
        return SchemaOutcome::Skipped;
    }

    let schema = match &prop.kind {
        PropertyKind::Title => json!({ "title": {} }),
        PropertyKind::RichText | PropertyKind::Unknown(_) => json!({ "rich_text": {} }),
        PropertyKind::Number => json!({ "number": { "format": "number" } }),
        PropertyKind::Select => json!({ "select": { "options": option_payloads(prop) } }),
        PropertyKind::MultiSelect => {
            json!({ "multi_select": { "options": option_payloads(prop) } })
        }
        // The API rejects option lists on status creation; options are
        // left to Notion's defaults.
        PropertyKind::Status => json!({ "status": {} }),
        PropertyKind::Date => json!({ "date": {} }),
        PropertyKind::People => json!({ "people": {} }),
        PropertyKind::Files => json!({ "files": {} }),
        PropertyKind::Checkbox => json!({ "checkbox": {} }),
        PropertyKind::Url => json!({ "url": {} }),
        PropertyKind::Email => json!({ "email": {} }),
        PropertyKind::PhoneNumber => json!({ "phone_number": {} }),
        PropertyKind::Formula => json!({
            // "1" is a safe no-op expression when the generator forgot one.
            "formula": { "expression": prop.formula_expression().unwrap_or("1") }
        }),
        PropertyKind::CreatedTime => json!({ "created_time": {} }),
        PropertyKind::CreatedBy => json!({ "created_by": {} }),
        PropertyKind::LastEditedTime => json!({ "last_edited_time": {} }),
        PropertyKind::LastEditedBy => json!({ "last_edited_by": {} }),
        PropertyKind::Relation | PropertyKind::Rollup => return SchemaOutcome::Deferred,
    };

    SchemaOutcome::Entry {
        name: PropertyName::new(name),
        schema,
    }
}

fn option_payloads(prop: &SpecProperty) -> Vec<Value> {
    prop.options()
        .iter()
        .filter(|option| !option.name().trim().is_empty())
        .map(|option| {
            json!({
                "name": option.name(),
                "color": option.color().unwrap_or("default"),
            })
        })
        .collect()
}

/// A database's first-pass schema with the invariants the API enforces
/// already applied.
#[derive(Debug, Clone, Default)]
pub struct DatabaseSchema {
    pub properties: IndexMap<PropertyName, Value>,
    /// How many declared properties were dropped past the 100 cap.
    pub truncated: usize,
    /// Whether a synthetic `Name: title` entry had to be injected.
    pub injected_title: bool,
}

/// Builds the complete creation schema for one database.
///
/// Invariants: the result always has ≥1 entry, always has a title-shaped
/// entry, and never exceeds the API's 100-property cap.
pub fn build_database_schema(db: &SpecDatabase) -> DatabaseSchema {
    let mut schema = DatabaseSchema::default();

    for prop in &db.properties {
        if let SchemaOutcome::Entry { name, schema: value } = transform_property(prop) {
            schema.properties.insert(name, value);
        }
    }

    if schema.properties.len() > NOTION_MAX_PROPERTIES_PER_DATABASE {
        schema.truncated = schema.properties.len() - NOTION_MAX_PROPERTIES_PER_DATABASE;
        schema.properties.truncate(NOTION_MAX_PROPERTIES_PER_DATABASE);
    }

    let has_title = schema
        .properties
        .values()
        .any(|value| value.get("title").is_some());
    if !has_title {
        if schema.properties.len() >= NOTION_MAX_PROPERTIES_PER_DATABASE {
            schema.properties.pop();
        }
        schema
            .properties
            .insert(PropertyName::new(SYNTHETIC_TITLE_PROPERTY), json!({ "title": {} }));
        schema.injected_title = true;
    }

    schema
}

/// The update payload wiring one relation property (pass 2).
pub fn relation_schema(property: &str, target_database_id: &str, dual: bool) -> Value {
    let relation = if dual {
        json!({
            "database_id": target_database_id,
            "type": "dual_property",
            "dual_property": {},
        })
    } else {
        json!({
            "database_id": target_database_id,
            "type": "single_property",
            "single_property": {},
        })
    };
    let mut map = serde_json::Map::new();
    map.insert(property.to_string(), json!({ "relation": relation }));
    Value::Object(map)
}

/// The update payload wiring one rollup property (pass 3). Must run
/// after the named relation property has been wired.
pub fn rollup_schema(
    property: &str,
    relation_property: &str,
    rollup_property: &str,
    function: &str,
) -> Value {
    let mut map = serde_json::Map::new();
    map.insert(
        property.to_string(),
        json!({
            "rollup": {
                "relation_property_name": relation_property,
                "rollup_property_name": rollup_property,
                "function": function,
            }
        }),
    );
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SpecDatabase;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn property(name: &str, kind: &str) -> SpecProperty {
        SpecProperty {
            name: name.to_string(),
            kind: PropertyKind::parse(kind),
            ..Default::default()
        }
    }

    fn database(properties: Vec<SpecProperty>) -> SpecDatabase {
        SpecDatabase {
            name: "Test".to_string(),
            properties,
            ..Default::default()
        }
    }

    #[test]
    fn select_options_default_color() {
        let prop: SpecProperty = serde_json::from_value(json!({
            "name": "Stage",
            "type": "select",
            "options": ["New", {"name": "Won", "color": "green"}]
        }))
        .unwrap();
        let SchemaOutcome::Entry { schema, .. } = transform_property(&prop) else {
            panic!("expected an entry");
        };
        assert_eq!(
            schema["select"]["options"],
            json!([
                {"name": "New", "color": "default"},
                {"name": "Won", "color": "green"}
            ])
        );
    }

    #[test]
    fn formula_defaults_to_noop_expression() {
        let SchemaOutcome::Entry { schema, .. } = transform_property(&property("F", "formula"))
        else {
            panic!("expected an entry");
        };
        assert_eq!(schema["formula"]["expression"], "1");
    }

    #[test]
    fn relation_and_rollup_are_deferred() {
        assert_eq!(
            transform_property(&property("Linked", "relation")),
            SchemaOutcome::Deferred
        );
        assert_eq!(
            transform_property(&property("Total", "rollup")),
            SchemaOutcome::Deferred
        );
    }

    #[test]
    fn blank_names_are_skipped() {
        assert_eq!(
            transform_property(&property("   ", "checkbox")),
            SchemaOutcome::Skipped
        );
    }

    #[test]
    fn unknown_type_falls_back_to_rich_text() {
        let SchemaOutcome::Entry { schema, .. } =
            transform_property(&property("Mystery", "bogus_type"))
        else {
            panic!("expected an entry");
        };
        assert_eq!(schema, json!({ "rich_text": {} }));
    }

    #[test]
    fn empty_database_gets_exactly_one_synthetic_title() {
        let schema = build_database_schema(&database(vec![]));
        assert_eq!(schema.properties.len(), 1);
        assert!(schema.injected_title);
        assert_eq!(schema.properties.get("Name"), Some(&json!({ "title": {} })));
    }

    #[test]
    fn missing_title_is_injected_alongside_real_properties() {
        let schema = build_database_schema(&database(vec![
            property("Done", "checkbox"),
            property("Due", "date"),
        ]));
        assert!(schema.injected_title);
        assert_eq!(schema.properties.len(), 3);
        assert!(schema
            .properties
            .values()
            .any(|v| v.get("title").is_some()));
    }

    #[test]
    fn schema_with_title_keeps_input_order_and_count() {
        let schema = build_database_schema(&database(vec![
            property("Name", "title"),
            property("Done", "checkbox"),
        ]));
        assert!(!schema.injected_title);
        let names: Vec<&str> = schema.properties.keys().map(|k| k.as_str()).collect();
        assert_eq!(names, vec!["Name", "Done"]);
    }

    #[test]
    fn oversized_schema_is_truncated_to_exactly_one_hundred() {
        let properties: Vec<SpecProperty> = std::iter::once(property("Name", "title"))
            .chain((0..100).map(|i| property(&format!("P{}", i), "checkbox")))
            .collect();
        let schema = build_database_schema(&database(properties));
        assert_eq!(schema.properties.len(), 100);
        assert_eq!(schema.truncated, 1);
        assert!(schema.properties.values().any(|v| v.get("title").is_some()));
    }

    #[test]
    fn truncation_never_loses_the_title_invariant() {
        // 101 non-title properties: truncate to 100, then one slot is
        // given up for the synthetic title.
        let properties: Vec<SpecProperty> =
            (0..101).map(|i| property(&format!("P{}", i), "checkbox")).collect();
        let schema = build_database_schema(&database(properties));
        assert_eq!(schema.properties.len(), 100);
        assert!(schema.injected_title);
        assert!(schema.properties.values().any(|v| v.get("title").is_some()));
    }

    #[test]
    fn relation_schema_shapes() {
        let single = relation_schema("Company", "abc-123", false);
        assert_eq!(single["Company"]["relation"]["type"], "single_property");
        let dual = relation_schema("Contacts", "abc-123", true);
        assert_eq!(dual["Contacts"]["relation"]["type"], "dual_property");
        assert_eq!(dual["Contacts"]["relation"]["database_id"], "abc-123");
    }

    #[test]
    fn rollup_schema_shape() {
        let rollup = rollup_schema("Total", "Deals", "Amount", "sum");
        assert_eq!(
            rollup["Total"]["rollup"],
            json!({
                "relation_property_name": "Deals",
                "rollup_property_name": "Amount",
                "function": "sum",
            })
        );
    }
}

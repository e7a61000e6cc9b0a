// src/model/mod.rs
//! The workspace specification document model.
//!
//! A `WorkspaceSpec` is produced by an upstream LLM generator and is
//! deliberately loose: collections may be missing, keys drift between
//! camelCase and snake_case, and type-specific options sometimes appear
//! at the property's top level instead of under `config`. Every type
//! here deserializes defensively — missing collections become empty,
//! unknown fields are ignored — so a sloppy spec degrades instead of
//! failing to parse. The spec is consumed read-only; nothing mutates it.

pub mod content;
pub mod validator;

pub use content::{
    parse_rich_text, CalloutBlock, ColumnBlock, ContentBlock, ImageBlock, PageContent,
    RichTextRun, TextAnnotations, TextBlock,
};
pub use validator::{validate, SpecReport};

use serde::Deserialize;
use serde_json::Value;
use std::fmt;

/// Root artifact: everything the generator decided the workspace should be.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct WorkspaceSpec {
    pub title: String,
    pub description: String,
    pub theme: String,
    pub layout: String,
    pub databases: Vec<SpecDatabase>,
    pub pages: Vec<SpecPage>,
}

/// One database declaration: a typed property schema plus sample rows.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SpecDatabase {
    #[serde(alias = "title")]
    pub name: String,
    pub description: String,
    pub properties: Vec<SpecProperty>,
    /// Views are informational only — the Notion API offers no endpoint
    /// to create them, so they are parsed and otherwise ignored.
    pub views: Vec<SpecView>,
    pub relations: Vec<SpecRelation>,
    /// Opaque key→value records keyed by property name. Kept as raw
    /// values because the generator freely mixes scalars and objects.
    #[serde(alias = "sample_data")]
    pub sample_data: Vec<Value>,
}

impl SpecDatabase {
    /// The name used for creation and for relation lookups.
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            "Database"
        } else {
            &self.name
        }
    }

    /// Resolves the declared relation target for a relation-typed
    /// property: the `relations` list first, then the property's own
    /// config as a fallback.
    pub fn relation_target(&self, property: &str) -> Option<&str> {
        self.relations
            .iter()
            .find(|r| r.property == property && !r.related_database.trim().is_empty())
            .map(|r| r.related_database.as_str())
            .or_else(|| {
                self.properties
                    .iter()
                    .find(|p| p.name == property)
                    .and_then(|p| p.config.related_database.as_deref())
                    .filter(|t| !t.trim().is_empty())
            })
    }

    /// Whether the declared cardinality asks for a two-way relation.
    pub fn relation_is_dual(&self, property: &str) -> bool {
        self.relations
            .iter()
            .find(|r| r.property == property)
            .map(|r| {
                let kind = r.kind.to_ascii_lowercase();
                kind.contains("many_to_many") || kind.contains("many-to-many")
            })
            .unwrap_or(false)
    }

    /// The name of the first relation-typed property, used as the
    /// default rollup source when the rollup's config names none.
    pub fn first_relation_property(&self) -> Option<&str> {
        self.properties
            .iter()
            .find(|p| p.kind == PropertyKind::Relation)
            .map(|p| p.name.as_str())
    }
}

/// A typed column definition within a database.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct SpecProperty {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: PropertyKind,
    pub config: PropertyConfig,
    /// The generator sometimes hoists these out of `config`.
    pub options: Vec<OptionInput>,
    pub formula: Option<String>,
}

impl SpecProperty {
    /// Select/multi-select options, wherever the generator put them.
    pub fn options(&self) -> &[OptionInput] {
        if !self.config.options.is_empty() {
            &self.config.options
        } else {
            &self.options
        }
    }

    /// Formula expression, wherever the generator put it.
    pub fn formula_expression(&self) -> Option<&str> {
        self.config
            .expression
            .as_deref()
            .or(self.formula.as_deref())
    }
}

/// Type-specific property options.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PropertyConfig {
    pub options: Vec<OptionInput>,
    #[serde(alias = "formula")]
    pub expression: Option<String>,
    #[serde(alias = "related_database", alias = "database")]
    pub related_database: Option<String>,
    /// For rollups: the name of the relation property to aggregate over.
    #[serde(alias = "relation_property", alias = "relationProperty")]
    pub relation: Option<String>,
    /// For rollups: the property on the related database to aggregate.
    #[serde(alias = "rollup_property", alias = "source_property", alias = "sourceProperty")]
    pub rollup_property: Option<String>,
    /// For rollups: the aggregation function (defaults to `count`).
    #[serde(alias = "aggregation")]
    pub function: Option<String>,
}

/// A select/multi-select option: the generator emits either a bare
/// string or a `{name, color}` object. Anything else is kept but
/// renders as a blank name, which the schema builder filters out.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum OptionInput {
    Name(String),
    Detailed {
        #[serde(default)]
        name: String,
        #[serde(default)]
        color: Option<String>,
    },
    Other(Value),
}

impl OptionInput {
    pub fn name(&self) -> &str {
        match self {
            OptionInput::Name(name) => name,
            OptionInput::Detailed { name, .. } => name,
            OptionInput::Other(_) => "",
        }
    }

    pub fn color(&self) -> Option<&str> {
        match self {
            OptionInput::Detailed { color, .. } => color.as_deref(),
            _ => None,
        }
    }
}

/// The fixed property-type vocabulary the Notion API accepts, plus an
/// `Unknown` catch-all so unsupported type strings stay visible instead
/// of silently matching something by accident.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyKind {
    Title,
    RichText,
    Number,
    Select,
    MultiSelect,
    Date,
    People,
    Files,
    Checkbox,
    Url,
    Email,
    PhoneNumber,
    Formula,
    Rollup,
    Relation,
    CreatedTime,
    CreatedBy,
    LastEditedTime,
    LastEditedBy,
    Status,
    Unknown(String),
}

impl PropertyKind {
    /// Parses a type string, accepting the drift aliases the generator
    /// is known to emit (`multiselect`, `phone`, `text`).
    pub fn parse(input: &str) -> Self {
        match input.trim().to_ascii_lowercase().as_str() {
            "title" => Self::Title,
            "rich_text" | "text" => Self::RichText,
            "number" => Self::Number,
            "select" => Self::Select,
            "multi_select" | "multiselect" => Self::MultiSelect,
            "date" => Self::Date,
            "people" => Self::People,
            "files" => Self::Files,
            "checkbox" => Self::Checkbox,
            "url" => Self::Url,
            "email" => Self::Email,
            "phone_number" | "phone" => Self::PhoneNumber,
            "formula" => Self::Formula,
            "rollup" => Self::Rollup,
            "relation" => Self::Relation,
            "created_time" => Self::CreatedTime,
            "created_by" => Self::CreatedBy,
            "last_edited_time" => Self::LastEditedTime,
            "last_edited_by" => Self::LastEditedBy,
            "status" => Self::Status,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Title => "title",
            Self::RichText => "rich_text",
            Self::Number => "number",
            Self::Select => "select",
            Self::MultiSelect => "multi_select",
            Self::Date => "date",
            Self::People => "people",
            Self::Files => "files",
            Self::Checkbox => "checkbox",
            Self::Url => "url",
            Self::Email => "email",
            Self::PhoneNumber => "phone_number",
            Self::Formula => "formula",
            Self::Rollup => "rollup",
            Self::Relation => "relation",
            Self::CreatedTime => "created_time",
            Self::CreatedBy => "created_by",
            Self::LastEditedTime => "last_edited_time",
            Self::LastEditedBy => "last_edited_by",
            Self::Status => "status",
            Self::Unknown(raw) => raw,
        }
    }
}

impl Default for PropertyKind {
    fn default() -> Self {
        Self::RichText
    }
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl<'de> Deserialize<'de> for PropertyKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(PropertyKind::parse(&s))
    }
}

/// A declared cross-reference from one database's property to another
/// database, resolved by name against this same deployment.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SpecRelation {
    pub property: String,
    pub related_database: String,
    /// Cardinality label (`one_to_many`, `many_to_many`, …).
    #[serde(rename = "type")]
    pub kind: String,
}

/// A declared view. Not deployable through the public API; parsed so
/// the validator and any future renderer can see it.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct SpecView {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub layout: String,
}

/// A standalone page declaration.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct SpecPage {
    pub title: String,
    pub content: PageContent,
    #[serde(rename = "type")]
    pub kind: String,
}

impl SpecPage {
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            "Untitled"
        } else {
            &self.title
        }
    }
}

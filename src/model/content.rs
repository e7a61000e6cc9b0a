// src/model/content.rs
//! Loose page content, parsed into an explicit tagged union.
//!
//! The upstream generator is inconsistent about content: a page's
//! `content` may be a flat string, an array of typed blocks, or an
//! object wrapper around either. Blocks themselves drift between the
//! Notion wire shape (`{"type": "paragraph", "paragraph": {...}}`) and
//! a flattened shape (`{"type": "paragraph", "rich_text": [...]}`).
//! Parsing accepts all of these; the payload layer renders the strict
//! API shapes.

use crate::types::Color;
use serde::Deserialize;
use serde_json::Value;
use std::str::FromStr;

/// A span of text carrying independent style annotations.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RichTextRun {
    pub content: String,
    pub link: Option<String>,
    pub annotations: TextAnnotations,
}

impl RichTextRun {
    /// A plain run with default annotations — the most common case.
    pub fn plain(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            link: None,
            annotations: TextAnnotations::default(),
        }
    }
}

/// Style annotations on one rich text run. All fields default to
/// false/`default` when the input omits them.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextAnnotations {
    pub bold: bool,
    pub italic: bool,
    pub strikethrough: bool,
    pub underline: bool,
    pub code: bool,
    pub color: Color,
}

impl TextAnnotations {
    fn from_value(value: Option<&Value>) -> Self {
        let Some(obj) = value.and_then(Value::as_object) else {
            return Self::default();
        };
        let flag = |key: &str| obj.get(key).and_then(Value::as_bool).unwrap_or(false);
        Self {
            bold: flag("bold"),
            italic: flag("italic"),
            strikethrough: flag("strikethrough"),
            underline: flag("underline"),
            code: flag("code"),
            color: obj
                .get("color")
                .and_then(Value::as_str)
                .and_then(|s| Color::from_str(s).ok())
                .unwrap_or_default(),
        }
    }
}

/// Normalizes loose rich text input into runs.
///
/// Accepts a bare string, a single object, or an array of either.
/// Objects read `content` with a nested `text.content` fallback. Runs
/// whose content ends up empty are dropped — stray empty fragments from
/// the generator would otherwise produce invalid API payloads. Malformed
/// input degrades to an empty vec; no error is raised.
pub fn parse_rich_text(value: &Value) -> Vec<RichTextRun> {
    match value {
        Value::String(s) => {
            if s.is_empty() {
                vec![]
            } else {
                vec![RichTextRun::plain(s.clone())]
            }
        }
        Value::Array(items) => items.iter().flat_map(parse_rich_text).collect(),
        Value::Object(obj) => {
            let content = obj
                .get("content")
                .and_then(Value::as_str)
                .or_else(|| {
                    obj.get("text")
                        .and_then(|t| t.get("content"))
                        .and_then(Value::as_str)
                })
                .or_else(|| obj.get("plain_text").and_then(Value::as_str))
                .unwrap_or_default();
            if content.is_empty() {
                return vec![];
            }
            let link = obj
                .get("link")
                .and_then(link_url)
                .or_else(|| {
                    obj.get("text")
                        .and_then(|t| t.get("link"))
                        .and_then(link_url)
                })
                .or_else(|| obj.get("href").and_then(Value::as_str).map(str::to_string));
            vec![RichTextRun {
                content: content.to_string(),
                link,
                annotations: TextAnnotations::from_value(obj.get("annotations")),
            }]
        }
        _ => vec![],
    }
}

/// A link is either a bare URL string or a `{url}` object.
fn link_url(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Object(obj) => obj
            .get("url")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        _ => None,
    }
}

/// One structural unit of page content. Unknown block types are kept
/// visible as `Unrecognized` with their raw payload instead of silently
/// matching something by accident.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentBlock {
    Heading1(TextBlock),
    Heading2(TextBlock),
    Heading3(TextBlock),
    Paragraph(TextBlock),
    BulletedListItem(TextBlock),
    NumberedListItem(TextBlock),
    Toggle(TextBlock),
    Quote(TextBlock),
    Callout(CalloutBlock),
    Divider,
    ColumnList(Vec<ColumnBlock>),
    Image(ImageBlock),
    Unrecognized(Value),
}

/// Content shared by every text-bearing container block.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextBlock {
    pub rich_text: Vec<RichTextRun>,
    pub children: Vec<ContentBlock>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CalloutBlock {
    pub rich_text: Vec<RichTextRun>,
    /// Semantic color name as declared; mapped to the API's
    /// `_background` convention at payload time.
    pub color: Option<String>,
    /// Emoji icon, when the generator supplied one.
    pub icon: Option<String>,
    pub children: Vec<ContentBlock>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ColumnBlock {
    pub children: Vec<ContentBlock>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImageBlock {
    pub url: String,
    pub caption: Vec<RichTextRun>,
}

impl ContentBlock {
    /// Parses one loose block value. Returns `None` for a value with no
    /// `type` tag — the caller filters those out.
    pub fn from_value(value: &Value) -> Option<ContentBlock> {
        let obj = value.as_object()?;
        let kind = obj.get("type").and_then(Value::as_str)?;

        let block = match kind {
            "heading_1" => ContentBlock::Heading1(text_block(obj, kind)),
            "heading_2" => ContentBlock::Heading2(text_block(obj, kind)),
            "heading_3" => ContentBlock::Heading3(text_block(obj, kind)),
            "paragraph" => ContentBlock::Paragraph(text_block(obj, kind)),
            "bulleted_list_item" => ContentBlock::BulletedListItem(text_block(obj, kind)),
            "numbered_list_item" => ContentBlock::NumberedListItem(text_block(obj, kind)),
            "toggle" => ContentBlock::Toggle(text_block(obj, kind)),
            "quote" => ContentBlock::Quote(text_block(obj, kind)),
            "callout" => ContentBlock::Callout(callout_block(obj)),
            "divider" => ContentBlock::Divider,
            "column_list" => ContentBlock::ColumnList(column_list(obj)),
            "image" => ContentBlock::Image(image_block(obj)),
            _ => ContentBlock::Unrecognized(value.clone()),
        };
        Some(block)
    }

    /// The block's type tag, for logging.
    pub fn kind(&self) -> &str {
        match self {
            ContentBlock::Heading1(_) => "heading_1",
            ContentBlock::Heading2(_) => "heading_2",
            ContentBlock::Heading3(_) => "heading_3",
            ContentBlock::Paragraph(_) => "paragraph",
            ContentBlock::BulletedListItem(_) => "bulleted_list_item",
            ContentBlock::NumberedListItem(_) => "numbered_list_item",
            ContentBlock::Toggle(_) => "toggle",
            ContentBlock::Quote(_) => "quote",
            ContentBlock::Callout(_) => "callout",
            ContentBlock::Divider => "divider",
            ContentBlock::ColumnList(_) => "column_list",
            ContentBlock::Image(_) => "image",
            ContentBlock::Unrecognized(_) => "unrecognized",
        }
    }
}

/// Finds the block body: the Notion wire shape nests it under the type
/// tag, the flattened shape keeps it at the top level.
fn block_body<'a>(
    obj: &'a serde_json::Map<String, Value>,
    kind: &str,
) -> &'a serde_json::Map<String, Value> {
    obj.get(kind).and_then(Value::as_object).unwrap_or(obj)
}

fn rich_text_of(body: &serde_json::Map<String, Value>) -> Vec<RichTextRun> {
    for key in ["rich_text", "text", "content"] {
        if let Some(value) = body.get(key) {
            let runs = parse_rich_text(value);
            if !runs.is_empty() {
                return runs;
            }
        }
    }
    vec![]
}

fn children_of(body: &serde_json::Map<String, Value>) -> Vec<ContentBlock> {
    body.get("children")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(ContentBlock::from_value).collect())
        .unwrap_or_default()
}

fn text_block(obj: &serde_json::Map<String, Value>, kind: &str) -> TextBlock {
    let body = block_body(obj, kind);
    TextBlock {
        rich_text: rich_text_of(body),
        // Children may sit beside the body or beside the type tag.
        children: if body.contains_key("children") {
            children_of(body)
        } else {
            children_of(obj)
        },
    }
}

fn callout_block(obj: &serde_json::Map<String, Value>) -> CalloutBlock {
    let body = block_body(obj, "callout");
    let string_of = |key: &str| {
        body.get(key)
            .or_else(|| obj.get(key))
            .and_then(Value::as_str)
            .map(str::to_string)
    };
    CalloutBlock {
        rich_text: rich_text_of(body),
        color: string_of("color"),
        icon: body
            .get("icon")
            .or_else(|| obj.get("icon"))
            .and_then(icon_emoji),
        children: if body.contains_key("children") {
            children_of(body)
        } else {
            children_of(obj)
        },
    }
}

/// An icon is either a bare emoji string or a `{emoji}` object.
fn icon_emoji(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Object(obj) => obj
            .get("emoji")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        _ => None,
    }
}

fn column_list(obj: &serde_json::Map<String, Value>) -> Vec<ColumnBlock> {
    let body = block_body(obj, "column_list");
    let columns = body
        .get("columns")
        .or_else(|| body.get("children"))
        .or_else(|| obj.get("columns"))
        .and_then(Value::as_array);
    let Some(columns) = columns else {
        return vec![];
    };
    columns
        .iter()
        .map(|column| {
            // A column is `{children: [...]}` or a bare array of blocks.
            let children = match column {
                Value::Array(items) => {
                    items.iter().filter_map(ContentBlock::from_value).collect()
                }
                Value::Object(col) => {
                    let col_body = col
                        .get("column")
                        .and_then(Value::as_object)
                        .unwrap_or(col);
                    children_of(col_body)
                }
                _ => vec![],
            };
            ColumnBlock { children }
        })
        .collect()
}

fn image_block(obj: &serde_json::Map<String, Value>) -> ImageBlock {
    let body = block_body(obj, "image");
    let url = body
        .get("url")
        .and_then(Value::as_str)
        .or_else(|| {
            body.get("external")
                .and_then(|e| e.get("url"))
                .and_then(Value::as_str)
        })
        .or_else(|| {
            body.get("file")
                .and_then(|f| f.get("url"))
                .and_then(Value::as_str)
        })
        .unwrap_or_default();
    ImageBlock {
        url: url.to_string(),
        caption: body
            .get("caption")
            .map(parse_rich_text)
            .unwrap_or_default(),
    }
}

/// A page's content — deliberately polymorphic because the generator is
/// inconsistent: a flat string, an ordered block sequence, or an object
/// wrapper around either.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PageContent {
    #[default]
    Empty,
    Text(String),
    Blocks(Vec<ContentBlock>),
}

impl PageContent {
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::String(s) => {
                if s.trim().is_empty() {
                    PageContent::Empty
                } else {
                    PageContent::Text(s.clone())
                }
            }
            Value::Array(items) => {
                let blocks: Vec<ContentBlock> =
                    items.iter().filter_map(ContentBlock::from_value).collect();
                if blocks.is_empty() {
                    PageContent::Empty
                } else {
                    PageContent::Blocks(blocks)
                }
            }
            Value::Object(obj) => {
                // A single block (it carries a type tag) — or a wrapper
                // object around the real content.
                if obj.get("type").and_then(Value::as_str).is_some() {
                    return match ContentBlock::from_value(value) {
                        Some(block) => PageContent::Blocks(vec![block]),
                        None => PageContent::Empty,
                    };
                }
                for key in ["blocks", "content", "children"] {
                    if let Some(inner) = obj.get(key) {
                        return PageContent::from_value(inner);
                    }
                }
                PageContent::Empty
            }
            _ => PageContent::Empty,
        }
    }

    /// Structured content gets deployed block-for-block; flat text is
    /// rendered as generic paragraphs.
    pub fn is_structured(&self) -> bool {
        matches!(self, PageContent::Blocks(blocks) if !blocks.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, PageContent::Empty)
    }
}

impl<'de> Deserialize<'de> for PageContent {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(PageContent::from_value(&value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn bare_string_becomes_one_plain_run() {
        let runs = parse_rich_text(&json!("Hello"));
        assert_eq!(runs, vec![RichTextRun::plain("Hello")]);
    }

    #[test]
    fn empty_fragments_are_filtered() {
        let runs = parse_rich_text(&json!(["", {"content": ""}, "kept"]));
        assert_eq!(runs, vec![RichTextRun::plain("kept")]);
    }

    #[test]
    fn nested_text_content_fallback() {
        let runs = parse_rich_text(&json!({
            "text": {"content": "nested", "link": {"url": "https://example.com"}},
            "annotations": {"bold": true}
        }));
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].content, "nested");
        assert_eq!(runs[0].link.as_deref(), Some("https://example.com"));
        assert!(runs[0].annotations.bold);
        assert!(!runs[0].annotations.italic);
    }

    #[test]
    fn malformed_input_degrades_to_empty() {
        assert!(parse_rich_text(&json!(42)).is_empty());
        assert!(parse_rich_text(&json!({"no_content": true})).is_empty());
    }

    #[test]
    fn block_without_type_tag_is_none() {
        assert_eq!(ContentBlock::from_value(&json!({"rich_text": "x"})), None);
        assert_eq!(ContentBlock::from_value(&json!("just a string")), None);
    }

    #[test]
    fn unknown_block_type_is_kept_raw() {
        let raw = json!({"type": "embed", "url": "https://example.com"});
        let block = ContentBlock::from_value(&raw).unwrap();
        assert_eq!(block, ContentBlock::Unrecognized(raw));
    }

    #[test]
    fn wire_and_flattened_shapes_both_parse() {
        let wire = ContentBlock::from_value(&json!({
            "type": "paragraph",
            "paragraph": {"rich_text": [{"content": "hi"}]}
        }))
        .unwrap();
        let flat = ContentBlock::from_value(&json!({
            "type": "paragraph",
            "rich_text": "hi"
        }))
        .unwrap();
        assert_eq!(wire, flat);
    }

    #[test]
    fn toggle_children_are_recursive() {
        let block = ContentBlock::from_value(&json!({
            "type": "toggle",
            "rich_text": "Details",
            "children": [{"type": "paragraph", "rich_text": "inner"}]
        }))
        .unwrap();
        let ContentBlock::Toggle(toggle) = block else {
            panic!("expected toggle");
        };
        assert_eq!(toggle.children.len(), 1);
        assert_eq!(toggle.children[0].kind(), "paragraph");
    }

    #[test]
    fn page_content_polymorphism() {
        assert_eq!(
            PageContent::from_value(&json!("plain text")),
            PageContent::Text("plain text".to_string())
        );
        assert!(PageContent::from_value(&json!(null)).is_empty());
        assert!(PageContent::from_value(&json!("  ")).is_empty());

        let wrapped = PageContent::from_value(&json!({
            "blocks": [{"type": "divider"}]
        }));
        assert_eq!(wrapped, PageContent::Blocks(vec![ContentBlock::Divider]));
        assert!(wrapped.is_structured());

        // Blocks missing their type tag are filtered out.
        let partial = PageContent::from_value(&json!([
            {"type": "divider"},
            {"rich_text": "no type tag"}
        ]));
        assert_eq!(partial, PageContent::Blocks(vec![ContentBlock::Divider]));
    }
}

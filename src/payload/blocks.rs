// src/payload/blocks.rs
//! Content blocks → Notion block objects.
//!
//! The mapping is total over the block union: every variant, including
//! `Unrecognized`, produces a value. Unrecognized blocks pass their raw
//! fields through unchanged — best effort over strict rejection, so
//! generator drift loses formatting rather than whole pages. The pass-
//! through is logged at warn level because it is the one place a
//! structurally invalid payload can reach the API.

use crate::model::{CalloutBlock, ColumnBlock, ContentBlock, ImageBlock, PageContent, TextBlock};
use crate::payload::rich_text::render_rich_text;
use crate::types::{Color, ValidatedUrl};
use serde_json::{json, Value};
use std::str::FromStr;

/// Renders one block into the API block object.
pub fn block_payload(block: &ContentBlock) -> Value {
    match block {
        ContentBlock::Heading1(text) => text_block_payload("heading_1", text),
        ContentBlock::Heading2(text) => text_block_payload("heading_2", text),
        ContentBlock::Heading3(text) => text_block_payload("heading_3", text),
        ContentBlock::Paragraph(text) => text_block_payload("paragraph", text),
        ContentBlock::BulletedListItem(text) => text_block_payload("bulleted_list_item", text),
        ContentBlock::NumberedListItem(text) => text_block_payload("numbered_list_item", text),
        ContentBlock::Toggle(text) => text_block_payload("toggle", text),
        ContentBlock::Quote(text) => text_block_payload("quote", text),
        ContentBlock::Callout(callout) => callout_payload(callout),
        ContentBlock::Divider => json!({
            "object": "block",
            "type": "divider",
            "divider": {},
        }),
        ContentBlock::ColumnList(columns) => column_list_payload(columns),
        ContentBlock::Image(image) => image_payload(image),
        ContentBlock::Unrecognized(raw) => {
            log::warn!(
                "Passing unrecognized block through unchanged (type: {})",
                raw.get("type").and_then(Value::as_str).unwrap_or("?")
            );
            raw.clone()
        }
    }
}

/// Renders a page's content into the children array for page creation.
pub fn page_children(content: &PageContent) -> Vec<Value> {
    match content {
        PageContent::Empty => vec![],
        // Flat text: each non-empty line becomes a paragraph.
        PageContent::Text(text) => text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(paragraph_block)
            .collect(),
        PageContent::Blocks(blocks) => blocks.iter().map(block_payload).collect(),
    }
}

/// A generic heading_1 block, used for the parent page scaffold.
pub fn heading_block(text: &str) -> Value {
    json!({
        "object": "block",
        "type": "heading_1",
        "heading_1": {
            "rich_text": [{ "type": "text", "text": { "content": text } }],
        },
    })
}

/// A generic paragraph block.
pub fn paragraph_block(text: &str) -> Value {
    json!({
        "object": "block",
        "type": "paragraph",
        "paragraph": {
            "rich_text": [{ "type": "text", "text": { "content": text } }],
        },
    })
}

fn text_block_payload(kind: &str, text: &TextBlock) -> Value {
    let mut body = json!({ "rich_text": render_rich_text(&text.rich_text) });
    if !text.children.is_empty() {
        body["children"] = Value::Array(text.children.iter().map(block_payload).collect());
    }
    wrap_block(kind, body)
}

fn callout_payload(callout: &CalloutBlock) -> Value {
    let mut body = json!({
        "rich_text": render_rich_text(&callout.rich_text),
        "icon": { "type": "emoji", "emoji": callout.icon.as_deref().unwrap_or("💡") },
        "color": callout_color(callout.color.as_deref()).as_str(),
    });
    if !callout.children.is_empty() {
        body["children"] = Value::Array(callout.children.iter().map(block_payload).collect());
    }
    wrap_block("callout", body)
}

/// Maps a semantic callout color onto the API's `_background` suffix
/// convention. `default` has no background form; anything unparseable
/// falls back to gray.
fn callout_color(declared: Option<&str>) -> Color {
    declared
        .and_then(|s| Color::from_str(s).ok())
        .unwrap_or(Color::Gray)
        .to_background()
}

fn column_list_payload(columns: &[ColumnBlock]) -> Value {
    let children: Vec<Value> = columns
        .iter()
        .map(|column| {
            json!({
                "object": "block",
                "type": "column",
                "column": {
                    "children": column
                        .children
                        .iter()
                        .map(block_payload)
                        .collect::<Vec<_>>(),
                },
            })
        })
        .collect();
    wrap_block("column_list", json!({ "children": children }))
}

fn image_payload(image: &ImageBlock) -> Value {
    let variant = if is_notion_hosted(&image.url) {
        "file"
    } else {
        "external"
    };
    let mut body = serde_json::Map::new();
    body.insert("type".to_string(), json!(variant));
    body.insert(variant.to_string(), json!({ "url": image.url }));
    if !image.caption.is_empty() {
        body.insert(
            "caption".to_string(),
            Value::Array(render_rich_text(&image.caption)),
        );
    }
    wrap_block("image", Value::Object(body))
}

/// Notion-hosted files live on S3 behind notion-static; everything else
/// is an external image.
fn is_notion_hosted(url: &str) -> bool {
    let host = ValidatedUrl::parse(url)
        .ok()
        .and_then(|u| u.host().map(str::to_string));
    match host {
        Some(host) => host.contains("secure.notion-static.com") || host.contains("amazonaws.com"),
        None => url.contains("secure.notion-static.com") || url.contains("amazonaws.com"),
    }
}

fn wrap_block(kind: &str, body: Value) -> Value {
    let mut map = serde_json::Map::new();
    map.insert("object".to_string(), json!("block"));
    map.insert("type".to_string(), json!(kind));
    map.insert(kind.to_string(), body);
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn parse(block: Value) -> ContentBlock {
        ContentBlock::from_value(&block).expect("block should parse")
    }

    #[test]
    fn paragraph_round_trip() {
        let payload = block_payload(&parse(json!({
            "type": "paragraph",
            "rich_text": "hello"
        })));
        assert_eq!(payload["type"], "paragraph");
        assert_eq!(
            payload["paragraph"]["rich_text"][0]["text"]["content"],
            "hello"
        );
    }

    #[test]
    fn callout_semantic_color_gets_background_suffix() {
        let payload = block_payload(&parse(json!({
            "type": "callout",
            "rich_text": "note",
            "color": "blue",
            "icon": "⚠️"
        })));
        assert_eq!(payload["callout"]["color"], "blue_background");
        assert_eq!(payload["callout"]["icon"]["emoji"], "⚠️");
    }

    #[test]
    fn callout_unknown_color_falls_back_to_gray() {
        let payload = block_payload(&parse(json!({
            "type": "callout",
            "rich_text": "note",
            "color": "chartreuse"
        })));
        assert_eq!(payload["callout"]["color"], "gray_background");
    }

    #[test]
    fn image_classification_by_host() {
        let external = block_payload(&parse(json!({
            "type": "image",
            "url": "https://example.com/pic.png"
        })));
        assert_eq!(external["image"]["type"], "external");
        assert_eq!(external["image"]["external"]["url"], "https://example.com/pic.png");

        let hosted = block_payload(&parse(json!({
            "type": "image",
            "url": "https://s3.us-west-2.amazonaws.com/secure.notion-static.com/pic.png"
        })));
        assert_eq!(hosted["image"]["type"], "file");
    }

    #[test]
    fn unrecognized_block_passes_through_raw() {
        let raw = json!({"type": "bookmark", "bookmark": {"url": "https://example.com"}});
        let payload = block_payload(&parse(raw.clone()));
        assert_eq!(payload, raw);
    }

    #[test]
    fn column_list_nests_columns() {
        let payload = block_payload(&parse(json!({
            "type": "column_list",
            "columns": [
                {"children": [{"type": "paragraph", "rich_text": "left"}]},
                {"children": [{"type": "paragraph", "rich_text": "right"}]}
            ]
        })));
        let columns = payload["column_list"]["children"].as_array().unwrap();
        assert_eq!(columns.len(), 2);
        assert_eq!(columns[0]["type"], "column");
    }

    #[test]
    fn flat_text_becomes_paragraphs() {
        let children = page_children(&PageContent::Text("one\n\ntwo\n".to_string()));
        assert_eq!(children.len(), 2);
        assert_eq!(children[0]["paragraph"]["rich_text"][0]["text"]["content"], "one");
        assert_eq!(children[1]["paragraph"]["rich_text"][0]["text"]["content"], "two");
    }
}

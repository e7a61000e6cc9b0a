// src/payload/rich_text.rs
//! Rich text runs → Notion rich text objects.

use crate::model::RichTextRun;
use crate::types::ValidatedUrl;
use serde_json::{json, Value};

/// Renders runs into the API's rich text array.
///
/// Annotations are always materialized, defaults included, so parsing
/// this output back through the model yields the same runs — re-applying
/// the transform never re-derives defaults differently.
pub fn render_rich_text(runs: &[RichTextRun]) -> Vec<Value> {
    runs.iter().map(render_run).collect()
}

fn render_run(run: &RichTextRun) -> Value {
    let mut text = json!({ "content": run.content });
    if let Some(link) = &run.link {
        // The API rejects rich text whose link is not a valid URL.
        match ValidatedUrl::parse(link) {
            Ok(url) => text["link"] = json!({ "url": url.as_str() }),
            Err(_) => log::debug!("Dropping invalid rich text link: {}", link),
        }
    }
    json!({
        "type": "text",
        "text": text,
        "annotations": {
            "bold": run.annotations.bold,
            "italic": run.annotations.italic,
            "strikethrough": run.annotations.strikethrough,
            "underline": run.annotations.underline,
            "code": run.annotations.code,
            "color": run.annotations.color.as_str(),
        },
    })
}

/// The one-run array used for page and database titles.
pub fn plain_text_array(content: &str) -> Vec<Value> {
    vec![json!({ "type": "text", "text": { "content": content } })]
}

// src/api/types.rs
//! Request and response shapes for the five Notion operations the
//! deployment depends on. Only the fields the pipeline reads are
//! modeled; everything else in a response is ignored.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Parent reference for page and database creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ParentRef {
    PageId { page_id: String },
    DatabaseId { database_id: String },
}

impl ParentRef {
    pub fn page(page_id: impl Into<String>) -> Self {
        Self::PageId {
            page_id: page_id.into(),
        }
    }

    pub fn database(database_id: impl Into<String>) -> Self {
        Self::DatabaseId {
            database_id: database_id.into(),
        }
    }
}

/// Body of `POST /v1/pages`.
#[derive(Debug, Clone, Serialize)]
pub struct CreatePageRequest {
    pub parent: ParentRef,
    pub properties: Value,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Value>,
}

/// Body of `POST /v1/databases`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateDatabaseRequest {
    pub parent: ParentRef,
    pub title: Vec<Value>,
    pub properties: Value,
}

/// The slice of a created page/database response the pipeline keeps.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreatedObject {
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// The acting Notion account, resolved from `GET /v1/users/me`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotionUser {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl NotionUser {
    /// Fallback identity when the user lookup fails — deployment still
    /// proceeds, the report just can't name the account.
    pub fn unknown() -> Self {
        Self {
            id: "unknown".to_string(),
            name: "Unknown User".to_string(),
            email: "Unknown".to_string(),
        }
    }

    /// Extracts the identity from the raw `users/me` response. Person
    /// accounts carry the email directly; bot integrations nest it under
    /// the owning user.
    pub fn from_response(value: &Value) -> Self {
        let email = value
            .get("person")
            .and_then(|p| p.get("email"))
            .and_then(Value::as_str)
            .or_else(|| {
                value
                    .get("bot")
                    .and_then(|b| b.get("owner"))
                    .and_then(|o| o.get("user"))
                    .and_then(|u| u.get("person"))
                    .and_then(|p| p.get("email"))
                    .and_then(Value::as_str)
            })
            .unwrap_or("Unknown");
        Self {
            id: value
                .get("id")
                .and_then(Value::as_str)
                .unwrap_or("unknown")
                .to_string(),
            name: value
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or("Unknown User")
                .to_string(),
            email: email.to_string(),
        }
    }
}

// src/deploy/report.rs
//! The result of one deployment run.

use crate::api::types::NotionUser;
use crate::error::AppError;
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

/// What one deployment produced: the container page, every database
/// that made it, and every sub-item that didn't. A deployment with
/// failures is still "done" — the caller decides how loudly to surface
/// the partial-failure list.
#[derive(Debug, Clone, Serialize)]
pub struct DeployedWorkspace {
    pub parent_page_id: String,
    pub url: String,
    /// Spec-order mapping of database name → created Notion ID.
    pub databases: IndexMap<String, String>,
    pub failures: Vec<ItemFailure>,
    /// The Notion account the workspace was deployed into.
    pub account: NotionUser,
    pub deployed_at: chrono::DateTime<chrono::Utc>,
}

impl DeployedWorkspace {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// The granularity at which failures are tolerated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Database,
    SampleRow,
    Relation,
    Rollup,
    Page,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ItemKind::Database => "database",
            ItemKind::SampleRow => "sample row",
            ItemKind::Relation => "relation",
            ItemKind::Rollup => "rollup",
            ItemKind::Page => "page",
        };
        write!(f, "{}", label)
    }
}

/// One recovered per-item failure: logged, aggregated, never propagated.
#[derive(Debug, Clone, Serialize)]
pub struct ItemFailure {
    pub kind: ItemKind,
    pub name: String,
    pub cause: String,
}

impl ItemFailure {
    pub fn new(kind: ItemKind, name: impl Into<String>, error: &AppError) -> Self {
        Self {
            kind,
            name: name.into(),
            cause: error.to_string(),
        }
    }
}

impl fmt::Display for ItemFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} \"{}\": {}", self.kind, self.name, self.cause)
    }
}

// src/api/mod.rs
//! Notion API interaction — the ability to create content in a workspace.
//!
//! This module provides a data-oriented interface to the Notion API,
//! with clear separation between I/O operations, wire shapes, and the
//! retry policy that wraps them.

pub mod backoff;
pub mod client;
pub mod types;

use crate::error::AppError;
use serde_json::Value;
use types::{CreateDatabaseRequest, CreatePageRequest, CreatedObject, NotionUser};

/// The ability to write into a Notion workspace.
///
/// This is the fundamental algebra for deployment. The orchestrator
/// depends on this trait, never on HTTP details — tests implement it
/// in memory.
#[async_trait::async_trait]
pub trait NotionGateway: Send + Sync {
    /// Creates a page (under a page or inside a database, per the
    /// request's parent).
    async fn create_page(&self, request: &CreatePageRequest) -> Result<CreatedObject, AppError>;

    /// Creates a database as a child of a page.
    async fn create_database(
        &self,
        request: &CreateDatabaseRequest,
    ) -> Result<CreatedObject, AppError>;

    /// Updates a database's property schema (used to wire relations and
    /// rollups after their targets exist).
    async fn update_database(&self, database_id: &str, properties: &Value)
        -> Result<(), AppError>;

    /// Finds the most recently edited page the integration can access —
    /// the fallback deployment root when none is configured.
    async fn search_most_recent_page(&self) -> Result<String, AppError>;

    /// The acting Notion account's identity.
    async fn current_user(&self) -> Result<NotionUser, AppError>;
}

// Re-export the public interface
pub use backoff::{with_backoff, RetryPolicy};
pub use client::NotionHttpClient;

// src/lib.rs
//! spec2notion library — deploys LLM-generated workspace specifications
//! into a Notion workspace.
//!
//! # Public API
//!
//! The library exposes types organized by concern:
//! - **Error handling** — `AppError`, `NotionErrorCode`, `DeployFailure`
//! - **Configuration** — `DeployConfig`
//! - **Spec model** — `WorkspaceSpec`, `SpecDatabase`, `ContentBlock`, etc.
//! - **Validation** — `validate`, `SpecReport`
//! - **Payload building** — property schemas, row values, block objects
//! - **API client** — `NotionGateway`, `NotionHttpClient`, `with_backoff`
//! - **Deployment** — `Deployer`, `DeployedWorkspace`

// Internal modules — must match what's in main.rs
mod api;
mod config;
mod constants;
mod deploy;
mod error;
mod model;
mod payload;
mod pipeline;
mod types;

// --- Error Handling ---
pub use crate::error::{classify_deploy_failure, AppError, DeployFailure, NotionErrorCode};
pub use crate::types::ValidationError;

// --- Configuration ---
pub use crate::config::{CommandLineInput, DeployConfig};

// --- Spec Model ---
pub use crate::model::{
    parse_rich_text, ContentBlock, OptionInput, PageContent, PropertyConfig, PropertyKind,
    RichTextRun, SpecDatabase, SpecPage, SpecProperty, SpecRelation, SpecView, TextAnnotations,
    WorkspaceSpec,
};
pub use crate::model::content::{CalloutBlock, ColumnBlock, ImageBlock, TextBlock};

// --- Validation ---
pub use crate::model::{validate, SpecReport};

// --- Payload Building ---
pub use crate::payload::blocks::{block_payload, heading_block, page_children, paragraph_block};
pub use crate::payload::properties::{
    build_database_schema, relation_schema, rollup_schema, transform_property, DatabaseSchema,
    SchemaOutcome,
};
pub use crate::payload::rich_text::{plain_text_array, render_rich_text};
pub use crate::payload::rows::transform_sample_row;
pub use crate::payload::properties_value;

// --- Domain Types ---
pub use crate::types::{ApiKey, Color, DatabaseId, NotionId, PageId, PropertyName, ValidatedUrl};

// --- API Client ---
pub use crate::api::types::{
    CreateDatabaseRequest, CreatePageRequest, CreatedObject, NotionUser, ParentRef,
};
pub use crate::api::{with_backoff, NotionGateway, NotionHttpClient, RetryPolicy};

// --- Deployment ---
pub use crate::deploy::{DeployedWorkspace, Deployer, ItemFailure, ItemKind, PacingPolicy};

// --- Pipeline Traits ---
pub use crate::pipeline::{SpecGate, SpecSource, WorkspaceSink};

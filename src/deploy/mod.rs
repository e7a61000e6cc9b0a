// src/deploy/mod.rs
//! The deployment orchestrator — a state machine that turns one
//! validated `WorkspaceSpec` into a populated Notion workspace.
//!
//! Order matters everywhere here. The Notion API requires a database to
//! exist before it can be the target of a relation, and a relation to
//! exist before a rollup can reference it, so databases are created in
//! a first pass, relations wired in a second, rollups in a third. The
//! passes run strictly sequentially — no fan-out — because Notion's
//! steady-state rate limit (~3 req/s) punishes concurrency far more
//! than it rewards it.
//!
//! Failure policy: parent-page creation is fatal (there is no workspace
//! without a container), an unrecovered rate limit during pass 1 is
//! fatal (backoff is already exhausted; continuing compounds the
//! violation), and everything else is a per-item failure that is
//! logged, aggregated, and skipped.

pub mod report;

pub use report::{DeployedWorkspace, ItemFailure, ItemKind};

use crate::api::types::{CreateDatabaseRequest, CreatePageRequest, NotionUser, ParentRef};
use crate::api::{with_backoff, NotionGateway, RetryPolicy};
use crate::constants::{
    DATABASE_COMPLEXITY_CAP, INTER_DATABASE_BASE_DELAY_MS, INTER_DATABASE_STEP_DELAY_MS,
};
use crate::error::AppError;
use crate::model::{validate, PropertyKind, SpecDatabase, WorkspaceSpec};
use crate::payload::blocks::{heading_block, page_children, paragraph_block};
use crate::payload::properties::{build_database_schema, relation_schema, rollup_schema};
use crate::payload::rich_text::plain_text_array;
use crate::payload::rows::transform_sample_row;
use crate::payload::properties_value;
use crate::types::NotionId;
use indexmap::IndexMap;
use serde_json::{json, Value};
use std::time::Duration;

/// Load-shedding delays between database creations. Not a correctness
/// mechanism — backoff handles actual 429s — just steady-state pacing
/// under the documented rate limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacingPolicy {
    pub inter_database_base: Duration,
    pub step: Duration,
    pub complexity_cap: usize,
}

impl Default for PacingPolicy {
    fn default() -> Self {
        Self {
            inter_database_base: Duration::from_millis(INTER_DATABASE_BASE_DELAY_MS),
            step: Duration::from_millis(INTER_DATABASE_STEP_DELAY_MS),
            complexity_cap: DATABASE_COMPLEXITY_CAP,
        }
    }
}

impl PacingPolicy {
    /// No delays at all — for tests.
    pub fn none() -> Self {
        Self {
            inter_database_base: Duration::ZERO,
            step: Duration::ZERO,
            complexity_cap: DATABASE_COMPLEXITY_CAP,
        }
    }

    /// The progressive delay after the `index`-th database: a fixed base
    /// plus an increment that grows with both position and workspace
    /// complexity (capped, so huge specs don't pace themselves into hours).
    fn inter_database_delay(&self, index: usize, database_count: usize) -> Duration {
        let complexity = database_count.min(self.complexity_cap) as u32;
        self.inter_database_base + self.step * (index as u32) * complexity
    }
}

/// Mutable state for one deployment run, owned exclusively by one
/// `deploy` call and never shared across deployments.
#[derive(Default)]
struct DeployRun {
    /// Spec-order name → created-ID lookup built in pass 1, consumed by
    /// passes 2 and 3.
    created: IndexMap<String, String>,
    failures: Vec<ItemFailure>,
}

/// Deploys workspace specs through a [`NotionGateway`].
pub struct Deployer<'a, G: NotionGateway> {
    gateway: &'a G,
    retry: RetryPolicy,
    pacing: PacingPolicy,
    parent_page: Option<NotionId>,
}

impl<'a, G: NotionGateway> Deployer<'a, G> {
    pub fn new(gateway: &'a G) -> Self {
        Self {
            gateway,
            retry: RetryPolicy::default(),
            pacing: PacingPolicy::default(),
            parent_page: None,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_pacing(mut self, pacing: PacingPolicy) -> Self {
        self.pacing = pacing;
        self
    }

    /// Pins the deployment root. Without one, the most recently edited
    /// accessible page is used.
    pub fn with_parent_page(mut self, parent: NotionId) -> Self {
        self.parent_page = Some(parent);
        self
    }

    /// Runs the full deployment state machine.
    ///
    /// The validation gate runs first: an invalid spec returns
    /// [`AppError::IncompatibleSpec`] before any network call is made.
    pub async fn deploy(&self, spec: &WorkspaceSpec) -> Result<DeployedWorkspace, AppError> {
        let report = validate(spec);
        if !report.is_valid() {
            return Err(AppError::IncompatibleSpec {
                errors: report.errors,
                warnings: report.warnings,
            });
        }
        for warning in &report.warnings {
            log::warn!("Spec warning: {}", warning);
        }

        let account = match with_backoff(|| self.gateway.current_user(), &self.retry).await {
            Ok(user) => user,
            Err(error) => {
                log::warn!("Could not resolve the acting Notion account: {}", error);
                NotionUser::unknown()
            }
        };
        log::info!(
            "Deploying workspace \"{}\" to Notion account: {} ({})",
            spec.title,
            account.email,
            account.name
        );

        let mut run = DeployRun::default();

        let (parent, consumed_first) = self.create_parent_page(spec).await?;
        let parent_id = parent.id.clone();

        self.create_databases(spec, &parent_id, &mut run).await?;
        self.wire_relations(spec, &mut run).await;
        self.wire_rollups(spec, &mut run).await;
        self.create_standalone_pages(spec, &parent_id, consumed_first, &mut run)
            .await;

        log::info!(
            "Deployment finished: {} database(s), {} failure(s)",
            run.created.len(),
            run.failures.len()
        );

        Ok(DeployedWorkspace {
            url: parent
                .url
                .unwrap_or_else(|| format!("https://www.notion.so/{}", parent_id.replace('-', ""))),
            parent_page_id: parent_id,
            databases: run.created,
            failures: run.failures,
            account,
            deployed_at: chrono::Utc::now(),
        })
    }

    /// State: CreateParentPage. Fatal on failure — there is no workspace
    /// without a container page. Returns the created page and whether the
    /// spec's first page was consumed as its content.
    async fn create_parent_page(
        &self,
        spec: &WorkspaceSpec,
    ) -> Result<(crate::api::types::CreatedObject, bool), AppError> {
        let root_id = match &self.parent_page {
            Some(id) => id.to_hyphenated(),
            None => with_backoff(|| self.gateway.search_most_recent_page(), &self.retry).await?,
        };

        let title = if spec.title.trim().is_empty() {
            "Generated Workspace"
        } else {
            &spec.title
        };

        let (children, consumed_first) = self.parent_children(spec, title);

        let request = CreatePageRequest {
            parent: ParentRef::page(root_id),
            properties: json!({ "title": { "title": plain_text_array(title) } }),
            children,
        };

        let created = with_backoff(|| self.gateway.create_page(&request), &self.retry).await?;
        log::info!("Created parent page {}", created.id);
        Ok((created, consumed_first))
    }

    /// The parent page's children: the first spec page's blocks when it
    /// has structured content (that page is then consumed), otherwise a
    /// generic title/description scaffold.
    fn parent_children(&self, spec: &WorkspaceSpec, title: &str) -> (Vec<Value>, bool) {
        if let Some(first) = spec.pages.first() {
            if first.content.is_structured() {
                return (page_children(&first.content), true);
            }
        }

        let description = if spec.description.trim().is_empty() {
            "AI-generated workspace"
        } else {
            &spec.description
        };
        (
            vec![heading_block(title), paragraph_block(description)],
            false,
        )
    }

    /// State: CreateDatabases (pass 1 — schema, then rows).
    ///
    /// One database failing (non-rate-limit) is caught and the loop
    /// continues; a rate limit that survived backoff aborts everything.
    async fn create_databases(
        &self,
        spec: &WorkspaceSpec,
        parent_id: &str,
        run: &mut DeployRun,
    ) -> Result<(), AppError> {
        let total = spec.databases.len();

        for (index, db) in spec.databases.iter().enumerate() {
            let name = db.display_name();
            log::info!("Creating database {}/{}: {}", index + 1, total, name);

            let schema = build_database_schema(db);
            if schema.injected_title {
                log::warn!("Database \"{}\" had no title property; injected \"Name\"", name);
            }
            if schema.truncated > 0 {
                log::warn!(
                    "Database \"{}\" exceeded the property cap; dropped {} propertie(s)",
                    name,
                    schema.truncated
                );
            }

            let request = CreateDatabaseRequest {
                parent: ParentRef::page(parent_id),
                title: plain_text_array(name),
                properties: properties_value(&schema.properties),
            };

            match with_backoff(|| self.gateway.create_database(&request), &self.retry).await {
                Ok(created) => {
                    run.created.insert(name.to_string(), created.id.clone());
                    self.populate_sample_rows(db, &created.id, run).await?;
                }
                Err(error) if error.is_rate_limited() => {
                    log::error!(
                        "Rate limit exhausted while creating database \"{}\"; aborting",
                        name
                    );
                    return Err(error);
                }
                Err(error) => {
                    log::error!("Error creating database \"{}\": {}", name, error);
                    run.failures
                        .push(ItemFailure::new(ItemKind::Database, name, &error));
                }
            }

            let delay = self.pacing.inter_database_delay(index, total);
            if !delay.is_zero() {
                log::debug!("Waiting {}ms before next database creation", delay.as_millis());
                tokio::time::sleep(delay).await;
            }
        }

        Ok(())
    }

    /// Creates a database's sample rows, strictly after its schema call
    /// and strictly before the next database's.
    async fn populate_sample_rows(
        &self,
        db: &SpecDatabase,
        database_id: &str,
        run: &mut DeployRun,
    ) -> Result<(), AppError> {
        for (row_index, raw) in db.sample_data.iter().enumerate() {
            let Some(record) = raw.as_object() else {
                log::debug!(
                    "Skipping non-object sample row {} in \"{}\"",
                    row_index + 1,
                    db.display_name()
                );
                continue;
            };

            let values = transform_sample_row(record, &db.properties);
            if values.is_empty() {
                continue;
            }

            let request = CreatePageRequest {
                parent: ParentRef::database(database_id),
                properties: properties_value(&values),
                children: vec![],
            };

            match with_backoff(|| self.gateway.create_page(&request), &self.retry).await {
                Ok(_) => {}
                Err(error) if error.is_rate_limited() => return Err(error),
                Err(error) => {
                    let label = format!("{} row {}", db.display_name(), row_index + 1);
                    log::error!("Error creating sample row {}: {}", label, error);
                    run.failures
                        .push(ItemFailure::new(ItemKind::SampleRow, label, &error));
                }
            }
        }
        Ok(())
    }

    /// State: WireRelations (pass 2). Relations whose target database
    /// never got created are silently skipped — no relation is better
    /// than a broken one.
    async fn wire_relations(&self, spec: &WorkspaceSpec, run: &mut DeployRun) {
        for db in &spec.databases {
            let name = db.display_name();
            let Some(owner_id) = run.created.get(name).cloned() else {
                continue;
            };

            for prop in db
                .properties
                .iter()
                .filter(|p| p.kind == PropertyKind::Relation)
            {
                let Some(target_name) = db.relation_target(&prop.name) else {
                    log::debug!(
                        "Relation \"{}\" on \"{}\" declares no target; skipping",
                        prop.name,
                        name
                    );
                    continue;
                };
                let Some(target_id) = run.created.get(target_name) else {
                    log::debug!(
                        "Relation \"{}\" on \"{}\" targets \"{}\", which was not created; skipping",
                        prop.name,
                        name,
                        target_name
                    );
                    continue;
                };

                let schema =
                    relation_schema(&prop.name, target_id, db.relation_is_dual(&prop.name));
                match with_backoff(
                    || self.gateway.update_database(&owner_id, &schema),
                    &self.retry,
                )
                .await
                {
                    Ok(()) => {
                        log::info!("Wired relation {}.{} → {}", name, prop.name, target_name);
                    }
                    Err(error) => {
                        let label = format!("{}.{}", name, prop.name);
                        log::error!("Error wiring relation {}: {}", label, error);
                        run.failures
                            .push(ItemFailure::new(ItemKind::Relation, label, &error));
                    }
                }
            }
        }
    }

    /// State: WireRollups (pass 3). Runs after pass 2 because a rollup's
    /// relation must already be wired.
    async fn wire_rollups(&self, spec: &WorkspaceSpec, run: &mut DeployRun) {
        for db in &spec.databases {
            let name = db.display_name();
            let Some(owner_id) = run.created.get(name).cloned() else {
                continue;
            };

            for prop in db
                .properties
                .iter()
                .filter(|p| p.kind == PropertyKind::Rollup)
            {
                let relation_property = prop
                    .config
                    .relation
                    .as_deref()
                    .or_else(|| db.first_relation_property());
                let Some(relation_property) = relation_property else {
                    log::debug!(
                        "Rollup \"{}\" on \"{}\" has no relation to aggregate over; skipping",
                        prop.name,
                        name
                    );
                    continue;
                };
                let Some(rollup_property) = prop.config.rollup_property.as_deref() else {
                    log::debug!(
                        "Rollup \"{}\" on \"{}\" names no source property; skipping",
                        prop.name,
                        name
                    );
                    continue;
                };
                let function = prop.config.function.as_deref().unwrap_or("count");

                let schema =
                    rollup_schema(&prop.name, relation_property, rollup_property, function);
                match with_backoff(
                    || self.gateway.update_database(&owner_id, &schema),
                    &self.retry,
                )
                .await
                {
                    Ok(()) => {
                        log::info!("Wired rollup {}.{} ({})", name, prop.name, function);
                    }
                    Err(error) => {
                        let label = format!("{}.{}", name, prop.name);
                        log::error!("Error wiring rollup {}: {}", label, error);
                        run.failures
                            .push(ItemFailure::new(ItemKind::Rollup, label, &error));
                    }
                }
            }
        }
    }

    /// State: CreateStandalonePages. Page 0 is skipped when it was
    /// consumed as the parent page's content.
    async fn create_standalone_pages(
        &self,
        spec: &WorkspaceSpec,
        parent_id: &str,
        consumed_first: bool,
        run: &mut DeployRun,
    ) {
        let skip = usize::from(consumed_first);

        for page in spec.pages.iter().skip(skip) {
            let title = page.display_title();
            let request = CreatePageRequest {
                parent: ParentRef::page(parent_id),
                properties: json!({ "title": { "title": plain_text_array(title) } }),
                children: page_children(&page.content),
            };

            match with_backoff(|| self.gateway.create_page(&request), &self.retry).await {
                Ok(created) => log::info!("Created page \"{}\" ({})", title, created.id),
                Err(error) => {
                    log::error!("Error creating page \"{}\": {}", title, error);
                    run.failures
                        .push(ItemFailure::new(ItemKind::Page, title, &error));
                }
            }
        }
    }
}

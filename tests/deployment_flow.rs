// tests/deployment_flow.rs
//! Integration tests for the deployment orchestrator: pass ordering,
//! partial-failure tolerance, the validation gate, and the fatal
//! rate-limit path — all driven through an in-memory gateway.

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use spec2notion::{
    AppError, CreateDatabaseRequest, CreatePageRequest, CreatedObject, Deployer, NotionErrorCode,
    NotionGateway, NotionId, NotionUser, PacingPolicy, ParentRef, RetryPolicy, WorkspaceSpec,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// One recorded gateway call, reduced to what the assertions care about.
#[derive(Debug, Clone, PartialEq)]
enum Call {
    CurrentUser,
    Search,
    CreatePage { parent: ParentRef, title: String },
    CreateRow { database_id: String, properties: Value },
    CreateDatabase { title: String },
    UpdateDatabase { database_id: String, properties: Value },
}

/// How a scripted database creation should fail.
#[derive(Debug, Clone, Copy, PartialEq)]
enum FailKind {
    Validation,
    RateLimit,
}

#[derive(Default)]
struct MockGateway {
    calls: Mutex<Vec<Call>>,
    /// Database title → scripted failure.
    fail_database: Option<(String, FailKind)>,
    next_id: AtomicUsize,
}

impl MockGateway {
    fn failing(title: &str, kind: FailKind) -> Self {
        Self {
            fail_database: Some((title.to_string(), kind)),
            ..Default::default()
        }
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn mint_id(&self, prefix: &str) -> String {
        format!("{}-{}", prefix, self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    fn failure(kind: FailKind) -> AppError {
        match kind {
            FailKind::Validation => AppError::NotionService {
                code: NotionErrorCode::ValidationFailed,
                message: "body failed validation".to_string(),
                status: 400,
            },
            FailKind::RateLimit => AppError::NotionService {
                code: NotionErrorCode::RateLimited,
                message: "rate limited".to_string(),
                status: 429,
            },
        }
    }
}

fn page_title(properties: &Value) -> String {
    properties["title"]["title"][0]["text"]["content"]
        .as_str()
        .unwrap_or_default()
        .to_string()
}

#[async_trait]
impl NotionGateway for MockGateway {
    async fn create_page(&self, request: &CreatePageRequest) -> Result<CreatedObject, AppError> {
        match &request.parent {
            ParentRef::DatabaseId { database_id } => self.record(Call::CreateRow {
                database_id: database_id.clone(),
                properties: request.properties.clone(),
            }),
            parent => self.record(Call::CreatePage {
                parent: parent.clone(),
                title: page_title(&request.properties),
            }),
        }
        Ok(CreatedObject {
            id: self.mint_id("page"),
            url: Some("https://www.notion.so/created-page".to_string()),
        })
    }

    async fn create_database(
        &self,
        request: &CreateDatabaseRequest,
    ) -> Result<CreatedObject, AppError> {
        let title = request.title[0]["text"]["content"]
            .as_str()
            .unwrap_or_default()
            .to_string();
        if let Some((failing_title, kind)) = &self.fail_database {
            if *failing_title == title {
                return Err(Self::failure(*kind));
            }
        }
        self.record(Call::CreateDatabase {
            title: title.clone(),
        });
        Ok(CreatedObject {
            id: self.mint_id("db"),
            url: None,
        })
    }

    async fn update_database(
        &self,
        database_id: &str,
        properties: &Value,
    ) -> Result<(), AppError> {
        self.record(Call::UpdateDatabase {
            database_id: database_id.to_string(),
            properties: properties.clone(),
        });
        Ok(())
    }

    async fn search_most_recent_page(&self) -> Result<String, AppError> {
        self.record(Call::Search);
        Ok("root-page".to_string())
    }

    async fn current_user(&self) -> Result<NotionUser, AppError> {
        self.record(Call::CurrentUser);
        Ok(NotionUser {
            id: "u1".to_string(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
        })
    }
}

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_retries: 1,
        base_delay: Duration::from_millis(1),
        jitter: Duration::ZERO,
    }
}

fn deployer(gateway: &MockGateway) -> Deployer<'_, MockGateway> {
    Deployer::new(gateway)
        .with_retry(fast_retry())
        .with_pacing(PacingPolicy::none())
        .with_parent_page(NotionId::parse("550e8400e29b41d4a716446655440000").unwrap())
}

fn spec(value: Value) -> WorkspaceSpec {
    serde_json::from_value(value).expect("spec should deserialize")
}

fn three_database_spec() -> WorkspaceSpec {
    spec(json!({
        "title": "CRM",
        "description": "A small CRM",
        "databases": [
            {
                "name": "One",
                "properties": [{"name": "Name", "type": "title"}],
                "sampleData": [{"Name": "first"}, {"Name": "second"}]
            },
            {
                "name": "Two",
                "properties": [{"name": "Name", "type": "title"}]
            },
            {
                "name": "Three",
                "properties": [{"name": "Name", "type": "title"}]
            }
        ]
    }))
}

#[tokio::test]
async fn happy_path_creates_parent_then_databases_then_rows_in_order() {
    let gateway = MockGateway::default();
    let deployed = deployer(&gateway)
        .deploy(&three_database_spec())
        .await
        .unwrap();

    assert_eq!(deployed.account.email, "ada@example.com");
    assert!(deployed.is_complete());
    assert_eq!(
        deployed.databases.keys().collect::<Vec<_>>(),
        vec!["One", "Two", "Three"]
    );

    let calls = gateway.calls();
    assert_eq!(calls[0], Call::CurrentUser);
    let Call::CreatePage { parent, title } = &calls[1] else {
        panic!("expected the parent page first, got {:?}", calls[1]);
    };
    assert_eq!(
        *parent,
        ParentRef::page("550e8400-e29b-41d4-a716-446655440000")
    );
    assert_eq!(title, "CRM");

    // Rows for "One" land strictly between its schema call and "Two"'s.
    let one_id = deployed.databases.get("One").unwrap().clone();
    let tail: Vec<String> = calls[2..]
        .iter()
        .map(|call| match call {
            Call::CreateDatabase { title } => format!("db:{}", title),
            Call::CreateRow { database_id, .. } => format!("row:{}", database_id),
            other => format!("{:?}", other),
        })
        .collect();
    assert_eq!(
        tail,
        vec![
            "db:One".to_string(),
            format!("row:{}", one_id),
            format!("row:{}", one_id),
            "db:Two".to_string(),
            "db:Three".to_string(),
        ]
    );
}

#[tokio::test]
async fn partial_failure_continues_and_is_reported() {
    let gateway = MockGateway::failing("Two", FailKind::Validation);
    let deployed = deployer(&gateway)
        .deploy(&three_database_spec())
        .await
        .unwrap();

    assert_eq!(
        deployed.databases.keys().collect::<Vec<_>>(),
        vec!["One", "Three"]
    );
    assert_eq!(deployed.failures.len(), 1);
    assert_eq!(deployed.failures[0].name, "Two");
    assert!(deployed.failures[0].cause.contains("validation_error"));

    // The third database was still attempted.
    assert!(gateway
        .calls()
        .contains(&Call::CreateDatabase { title: "Three".to_string() }));
}

#[tokio::test]
async fn unrecovered_rate_limit_aborts_the_whole_deployment() {
    let gateway = MockGateway::failing("Two", FailKind::RateLimit);
    let result = deployer(&gateway).deploy(&three_database_spec()).await;

    let error = result.expect_err("rate limit exhaustion must abort");
    assert!(error.is_rate_limited());
    // The loop never reached the third database.
    assert!(!gateway
        .calls()
        .contains(&Call::CreateDatabase { title: "Three".to_string() }));
}

#[tokio::test]
async fn relations_and_rollups_wire_after_all_databases_exist() {
    // "Deals" is declared before its relation target "Companies", and
    // carries a rollup over that relation — forward references the
    // two-pass scheme must resolve.
    let gateway = MockGateway::default();
    let workspace = spec(json!({
        "title": "Pipeline",
        "databases": [
            {
                "name": "Deals",
                "properties": [
                    {"name": "Name", "type": "title"},
                    {"name": "Company", "type": "relation"},
                    {"name": "Total", "type": "rollup",
                     "config": {"relation": "Company", "rollupProperty": "Revenue", "function": "sum"}}
                ],
                "relations": [
                    {"property": "Company", "relatedDatabase": "Companies", "type": "many_to_many"}
                ]
            },
            {
                "name": "Companies",
                "properties": [
                    {"name": "Name", "type": "title"},
                    {"name": "Revenue", "type": "number"}
                ]
            }
        ]
    }));

    let deployed = deployer(&gateway).deploy(&workspace).await.unwrap();
    assert!(deployed.is_complete());

    let calls = gateway.calls();
    let deals_id = deployed.databases.get("Deals").unwrap().clone();
    let companies_id = deployed.databases.get("Companies").unwrap();

    let create_companies = calls
        .iter()
        .position(|c| *c == Call::CreateDatabase { title: "Companies".to_string() })
        .unwrap();
    let updates: Vec<usize> = calls
        .iter()
        .enumerate()
        .filter_map(|(i, c)| matches!(c, Call::UpdateDatabase { .. }).then_some(i))
        .collect();
    assert_eq!(updates.len(), 2, "one relation + one rollup update");
    // Both updates happen only after every database exists.
    assert!(updates[0] > create_companies);

    let Call::UpdateDatabase { database_id, properties } = &calls[updates[0]] else {
        unreachable!();
    };
    assert_eq!(database_id, &deals_id);
    assert_eq!(
        properties["Company"]["relation"]["database_id"],
        json!(companies_id)
    );
    assert_eq!(properties["Company"]["relation"]["type"], "dual_property");

    let Call::UpdateDatabase { database_id, properties } = &calls[updates[1]] else {
        unreachable!();
    };
    assert_eq!(database_id, &deals_id);
    assert_eq!(
        properties["Total"]["rollup"],
        json!({
            "relation_property_name": "Company",
            "rollup_property_name": "Revenue",
            "function": "sum",
        })
    );
}

#[tokio::test]
async fn relation_to_a_failed_database_is_silently_skipped() {
    let gateway = MockGateway::failing("Companies", FailKind::Validation);
    let workspace = spec(json!({
        "title": "Pipeline",
        "databases": [
            {
                "name": "Deals",
                "properties": [
                    {"name": "Name", "type": "title"},
                    {"name": "Company", "type": "relation"}
                ],
                "relations": [
                    {"property": "Company", "relatedDatabase": "Companies", "type": "one_to_many"}
                ]
            },
            {
                "name": "Companies",
                "properties": [{"name": "Name", "type": "title"}]
            }
        ]
    }));

    let deployed = deployer(&gateway).deploy(&workspace).await.unwrap();

    // The database failure is reported, but no broken relation was wired.
    assert_eq!(deployed.failures.len(), 1);
    assert!(!gateway
        .calls()
        .iter()
        .any(|c| matches!(c, Call::UpdateDatabase { .. })));
}

#[tokio::test]
async fn invalid_spec_never_reaches_the_gateway() {
    let gateway = MockGateway::default();
    let workspace = spec(json!({
        "title": "Broken",
        "databases": [{
            "name": "Tasks",
            "properties": [
                {"name": "Name", "type": "title"},
                {"name": "Magic", "type": "bogus_type"}
            ]
        }]
    }));

    let error = deployer(&gateway)
        .deploy(&workspace)
        .await
        .expect_err("invalid spec must be rejected");

    let AppError::IncompatibleSpec { errors, .. } = error else {
        panic!("expected IncompatibleSpec, got {:?}", error);
    };
    assert!(errors.iter().any(|e| e.contains("Magic")));
    assert!(gateway.calls().is_empty(), "no network calls on an invalid spec");
}

#[tokio::test]
async fn structured_first_page_becomes_parent_content_and_is_consumed() {
    let gateway = MockGateway::default();
    let workspace = spec(json!({
        "title": "Docs",
        "pages": [
            {
                "title": "Overview",
                "content": [
                    {"type": "heading_1", "rich_text": "Welcome"},
                    {"type": "divider"}
                ]
            },
            {"title": "Second", "content": "plain body"}
        ]
    }));

    deployer(&gateway).deploy(&workspace).await.unwrap();

    // Two page creations: the parent (carrying the first page's blocks)
    // and "Second". "Overview" is consumed, never created standalone.
    let titles: Vec<String> = gateway
        .calls()
        .iter()
        .filter_map(|c| match c {
            Call::CreatePage { title, .. } => Some(title.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(titles, vec!["Docs".to_string(), "Second".to_string()]);
}

#[tokio::test]
async fn flat_first_page_is_not_consumed() {
    let gateway = MockGateway::default();
    let workspace = spec(json!({
        "title": "Docs",
        "pages": [
            {"title": "Only", "content": "just text"}
        ]
    }));

    deployer(&gateway).deploy(&workspace).await.unwrap();

    let titles: Vec<String> = gateway
        .calls()
        .iter()
        .filter_map(|c| match c {
            Call::CreatePage { title, .. } => Some(title.clone()),
            _ => None,
        })
        .collect();
    // Generic parent scaffold, then the page itself.
    assert_eq!(titles, vec!["Docs".to_string(), "Only".to_string()]);
}

#[tokio::test]
async fn missing_parent_page_falls_back_to_search() {
    let gateway = MockGateway::default();
    let workspace = spec(json!({ "title": "Rooted" }));

    let deployed = Deployer::new(&gateway)
        .with_retry(fast_retry())
        .with_pacing(PacingPolicy::none())
        .deploy(&workspace)
        .await
        .unwrap();

    let calls = gateway.calls();
    assert!(calls.contains(&Call::Search));
    let Call::CreatePage { parent, .. } = calls
        .iter()
        .find(|c| matches!(c, Call::CreatePage { .. }))
        .unwrap()
    else {
        unreachable!();
    };
    assert_eq!(*parent, ParentRef::page("root-page"));
    assert_eq!(deployed.parent_page_id, "page-0");
}

#[tokio::test]
async fn full_fixture_renders_blocks_and_rows_through_the_whole_stack() {
    let gateway = MockGateway::default();
    let workspace = spec(json!({
        "title": "Studio",
        "description": "Content studio workspace",
        "theme": "professional",
        "databases": [{
            "name": "Posts",
            "properties": [
                {"name": "Name", "type": "title"},
                {"name": "Published", "type": "date"},
                {"name": "Live", "type": "checkbox"},
                {"name": "Link", "type": "url"}
            ],
            "sampleData": [
                {"Name": "Launch post", "Published": "2026-03-01", "Live": true,
                 "Link": "https://example.com/launch", "Extra": "ignored"}
            ]
        }],
        "pages": [{
            "title": "Playbook",
            "content": [
                {"type": "callout", "rich_text": "Read me first", "color": "yellow", "icon": "📌"},
                {"type": "image", "url": "https://example.com/cover.png"},
                {"type": "bulleted_list_item", "rich_text": [{"content": "step one", "annotations": {"bold": true}}]}
            ]
        }]
    }));

    let deployed = deployer(&gateway).deploy(&workspace).await.unwrap();
    assert!(deployed.is_complete());

    let calls = gateway.calls();

    // The sample row went through per-type coercion, extras dropped.
    let Some(Call::CreateRow { properties, .. }) = calls
        .iter()
        .find(|c| matches!(c, Call::CreateRow { .. }))
    else {
        panic!("expected a sample row");
    };
    assert_eq!(
        properties["Name"],
        json!({ "title": [{ "text": { "content": "Launch post" } }] })
    );
    assert_eq!(properties["Published"], json!({ "date": { "start": "2026-03-01" } }));
    assert_eq!(properties["Live"], json!({ "checkbox": true }));
    assert_eq!(properties["Link"], json!({ "url": "https://example.com/launch" }));
    assert!(properties.get("Extra").is_none());

    // The first (structured) page became the parent page's children.
    let Some(Call::CreatePage { parent, .. }) = calls
        .iter()
        .find(|c| matches!(c, Call::CreatePage { .. }))
    else {
        panic!("expected the parent page");
    };
    assert_eq!(
        *parent,
        ParentRef::page("550e8400-e29b-41d4-a716-446655440000")
    );
}

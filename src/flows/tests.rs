//! End-to-end flow tests against an in-memory gateway. The gateway is
//! shared with the screen tests.

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;
use tempfile::TempDir;

use super::activation::{ActivationFlow, Destination, ScheduleKind};
use super::ask::AskForm;
use super::audience::AudienceFlow;
use super::run::SnapshotForm;
use super::setup::{find_kind, SetupFlow};
use super::sources::SourceDirectory;
use crate::api::{
    ApiError, Gateway, NewSource, PreviewSegment, QueryAnswer, RecordId, RunResponse, SaveSegment,
    Segment, SegmentPreview, SegmentResult, Source, SourceCreated,
};
use crate::store::SessionStore;
use crate::wizard::{Advance, Blocked};

#[derive(Default)]
pub(crate) struct FakeState {
    pub(crate) sources: Vec<Source>,
    pub(crate) segments: Vec<Segment>,
    pub(crate) next_id: i64,
    pub(crate) fail_create: Option<ApiError>,
    pub(crate) previews: Vec<PreviewSegment>,
    pub(crate) saves: Vec<SaveSegment>,
    pub(crate) creates: Vec<NewSource>,
}

#[derive(Default)]
pub(crate) struct FakeGateway {
    pub(crate) state: Mutex<FakeState>,
}

impl FakeGateway {
    pub(crate) fn failing_create(error: ApiError) -> Self {
        let gateway = Self::default();
        gateway.state.lock().unwrap().fail_create = Some(error);
        gateway
    }

    pub(crate) fn with_sources(sources: Vec<Source>) -> Self {
        let gateway = Self::default();
        {
            let mut state = gateway.state.lock().unwrap();
            state.next_id = sources.len() as i64;
            state.sources = sources;
        }
        gateway
    }
}

#[async_trait]
impl Gateway for FakeGateway {
    async fn preview_segment(&self, request: &PreviewSegment) -> Result<SegmentPreview, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.previews.push(request.clone());
        Ok(SegmentPreview {
            id: None,
            name: request.name.clone().unwrap_or_else(|| "Big Spenders".to_string()),
            description: "Customers With High Sales".to_string(),
            natural_query: request.query.clone(),
            generated_sql: "SELECT * FROM customers WHERE total_sales > 500".to_string(),
            count: 1204,
        })
    }

    async fn save_segment(&self, request: &SaveSegment) -> Result<Segment, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.saves.push(request.clone());
        state.next_id += 1;
        let segment = Segment {
            id: RecordId::Int(state.next_id),
            name: request.name.clone(),
            description: request.description.clone(),
            natural_query: request.natural_query.clone(),
            sql_query: request.query.clone(),
            count: request.count,
            created_at: "2024-05-01T10:00:00".to_string(),
        };
        state.segments.insert(0, segment.clone());
        Ok(segment)
    }

    async fn list_segments(&self) -> Result<Vec<Segment>, ApiError> {
        Ok(self.state.lock().unwrap().segments.clone())
    }

    async fn create_source(&self, request: &NewSource) -> Result<SourceCreated, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.creates.push(request.clone());
        if let Some(error) = state.fail_create.clone() {
            return Err(error);
        }
        state.next_id += 1;
        let id = RecordId::Int(state.next_id);
        state.sources.insert(
            0,
            Source {
                id: id.clone(),
                name: request.name.clone(),
                source_type: request.source_type.clone(),
                created_at: "2024-05-01T10:00:00".to_string(),
            },
        );
        Ok(SourceCreated {
            status: "success".to_string(),
            message: format!("Source '{}' created.", request.name),
            id,
        })
    }

    async fn list_sources(&self) -> Result<Vec<Source>, ApiError> {
        Ok(self.state.lock().unwrap().sources.clone())
    }

    async fn delete_source(&self, id: &RecordId) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        let before = state.sources.len();
        state.sources.retain(|s| &s.id != id);
        if state.sources.len() == before {
            return Err(ApiError::server(404, r#"{"detail":"Source not found."}"#));
        }
        Ok(())
    }

    async fn ask(&self, question: &str) -> Result<QueryAnswer, ApiError> {
        Ok(QueryAnswer {
            query: format!("-- {question}\nSELECT count(*) FROM customers"),
            results: vec![json!({ "count": 42 })],
        })
    }

    async fn run_query(&self, query: &str) -> Result<RunResponse, ApiError> {
        if query == "explode" {
            return Err(ApiError::server(500, "API error: 500"));
        }
        Ok(RunResponse {
            kind: "segmented".to_string(),
            segments: vec![
                SegmentResult {
                    query: "SELECT count(*) FROM customers".to_string(),
                    results: vec![json!({ "count": 42 })],
                    error: None,
                },
                SegmentResult {
                    query: "SELECT churn FROM customers".to_string(),
                    results: Vec::new(),
                    error: Some("column churn does not exist".to_string()),
                },
            ],
        })
    }
}

fn source(id: i64, name: &str) -> Source {
    Source {
        id: RecordId::Int(id),
        name: name.to_string(),
        source_type: "snowflake".to_string(),
        created_at: String::new(),
    }
}

fn fill_connect_step(flow: &mut SetupFlow) {
    for (field, value) in [
        ("account", "acme.us-east-1"),
        ("warehouse", "COMPUTE_WH"),
        ("database", "ANALYTICS"),
        ("username", "loader"),
    ] {
        flow.wizard_mut().set_field(field, value);
    }
}

// ─── Setup ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_setup_postgres_end_to_end() {
    let gateway = FakeGateway::default();
    let mut store = SessionStore::in_memory();
    let mut directory = SourceDirectory::from_store(&store);
    let mut flow = SetupFlow::with_slug_suffix("u3fcd");

    assert_eq!(flow.select_source(find_kind("postgres").unwrap()), Advance::Moved(2));
    fill_connect_step(&mut flow);
    assert_eq!(
        flow.proceed(&gateway, &mut directory, &mut store).await,
        Advance::Moved(3)
    );
    assert_eq!(
        flow.proceed(&gateway, &mut directory, &mut store).await,
        Advance::Submit
    );

    assert!(flow.wizard().is_complete());
    assert!(flow.wizard().error().is_none());
    assert_eq!(
        flow.success_message().unwrap(),
        "PostgreSQL has been successfully configured and connected to your iNitro workspace."
    );

    let sent = gateway.state.lock().unwrap().creates[0].clone();
    assert_eq!(sent.source_type, "postgres");
    assert_eq!(sent.credentials.port, 5432);
    assert_eq!(sent.credentials.role, "DEFAULT");

    // The refetched list includes the new record exactly once, confirmed
    assert_eq!(directory.len(), 1);
    assert!(!directory.get(0).unwrap().is_pending());
    assert_eq!(directory.get(0).unwrap().record().name, "PostgreSQL");
    assert_eq!(store.cached_sources().len(), 1);
}

#[tokio::test]
async fn test_setup_failure_stays_on_finish_step() {
    let gateway = FakeGateway::failing_create(ApiError::server(
        500,
        r#"{"detail":"Failed to create source: connection refused"}"#,
    ));
    let mut store = SessionStore::in_memory();
    let mut directory = SourceDirectory::from_store(&store);
    let mut flow = SetupFlow::new();

    flow.select_source(find_kind("snowflake").unwrap());
    fill_connect_step(&mut flow);
    flow.proceed(&gateway, &mut directory, &mut store).await;
    flow.proceed(&gateway, &mut directory, &mut store).await;

    assert_eq!(flow.wizard().step(), 3);
    assert!(!flow.wizard().is_complete());
    assert!(flow
        .wizard()
        .error()
        .unwrap()
        .starts_with("Failed to save source: "));
    assert!(flow.success_message().is_none());
    // The optimistic row was rolled back
    assert!(directory.is_empty());
    assert!(store.cached_sources().is_empty());
}

#[tokio::test]
async fn test_setup_connect_step_validates_before_any_request() {
    let gateway = FakeGateway::default();
    let mut store = SessionStore::in_memory();
    let mut directory = SourceDirectory::default();
    let mut flow = SetupFlow::new();

    flow.select_source(find_kind("mysql").unwrap());
    let outcome = flow.proceed(&gateway, &mut directory, &mut store).await;

    assert_eq!(
        outcome,
        Advance::Blocked(Blocked::MissingFields(vec![
            "account",
            "warehouse",
            "database",
            "username"
        ]))
    );
    assert_eq!(flow.wizard().step(), 2);
    assert!(gateway.state.lock().unwrap().creates.is_empty());
}

// ─── Sources ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_refresh_replaces_stale_cache() {
    let mut store = SessionStore::in_memory();
    store.cache_sources(&[source(9, "stale")]).unwrap();
    let gateway = FakeGateway::with_sources(vec![source(1, "Marketing")]);

    let mut directory = SourceDirectory::from_store(&store);
    assert_eq!(directory.get(0).unwrap().record().name, "stale");

    directory.refresh(&gateway, &mut store).await.unwrap();
    let names: Vec<&str> = directory.sources().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Marketing"]);
    assert_eq!(store.cached_sources(), vec![source(1, "Marketing")]);
}

#[tokio::test]
async fn test_delete_source_refetches() {
    let gateway = FakeGateway::with_sources(vec![source(1, "a"), source(2, "b")]);
    let mut store = SessionStore::in_memory();
    let mut directory = SourceDirectory::default();
    directory.refresh(&gateway, &mut store).await.unwrap();

    directory
        .delete(&gateway, &mut store, &RecordId::Int(1))
        .await
        .unwrap();
    assert_eq!(directory.len(), 1);

    let err = directory
        .delete(&gateway, &mut store, &RecordId::Int(1))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(directory.len(), 1);
}

// ─── Audience ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_audience_builder_preview_then_save() {
    let gateway = FakeGateway::default();
    let mut flow = AudienceFlow::new();
    flow.refresh(&gateway).await.unwrap();
    flow.open_builder();

    let builder = flow.builder_mut().unwrap();
    assert!(!builder.can_save());
    builder
        .wizard_mut()
        .set_field("query", "Customers with $500+ sales last year");
    assert!(builder.run_preview(&gateway).await);

    let preview = builder.preview().unwrap();
    assert_eq!(preview.count, 1204);
    assert_eq!(
        preview.generated_sql,
        "SELECT * FROM customers WHERE total_sales > 500"
    );
    assert_eq!(builder.wizard().draft().get("name"), "Big Spenders");
    assert!(builder.can_save());

    // Empty name was omitted from the request
    assert!(gateway.state.lock().unwrap().previews[0].name.is_none());

    assert!(flow.save_segment(&gateway).await);
    assert!(flow.builder().is_none());

    let saved = gateway.state.lock().unwrap().saves[0].clone();
    assert_eq!(saved.name, "Big Spenders");
    assert_eq!(saved.query, "SELECT * FROM customers WHERE total_sales > 500");

    // Prepended, confirmed and auto-selected
    let first = flow.entries()[0].record().clone();
    assert!(!flow.entries()[0].is_pending());
    assert!(flow.is_selected(&first.id));
    assert_eq!(flow.total_count(), 1204);
    assert!(flow.can_activate());
}

#[tokio::test]
async fn test_audience_toggle_and_total() {
    let gateway = FakeGateway::default();
    {
        let mut state = gateway.state.lock().unwrap();
        for (id, count) in [(1, 100), (2, 250)] {
            state.segments.push(Segment {
                id: RecordId::Int(id),
                name: format!("s{id}"),
                description: String::new(),
                natural_query: String::new(),
                sql_query: String::new(),
                count,
                created_at: String::new(),
            });
        }
    }
    let mut flow = AudienceFlow::new();
    flow.refresh(&gateway).await.unwrap();
    assert!(!flow.can_activate());

    flow.toggle(0);
    flow.toggle(1);
    assert_eq!(flow.total_count(), 350);
    flow.toggle(0);
    assert_eq!(flow.total_count(), 250);
}

// ─── Activation ─────────────────────────────────────────────────────────────

#[test]
fn test_activation_start_campaign_writes_history() {
    let mut store = SessionStore::in_memory();
    let mut flow = ActivationFlow::new();

    flow.select_audience(0);
    assert_eq!(flow.proceed(&mut store), Advance::Moved(2));
    flow.select_destination(Destination::SendGrid);
    flow.wizard_mut().set_field("sg_domain", "mail.initro.ai");
    assert_eq!(flow.proceed(&mut store), Advance::Moved(3));
    flow.schedule_mut().kind = ScheduleKind::Every;
    flow.schedule_mut().set_every_days(2);
    assert_eq!(flow.proceed(&mut store), Advance::Moved(4));

    let summary = flow.summary().unwrap();
    assert_eq!(summary.audience, "Customer Win back");
    assert_eq!(summary.segment, "Lapsed Customers");
    assert_eq!(summary.destination, "SendGrid");
    assert_eq!(summary.schedule, "Every 2 day(s) at 03:00 AM");
    assert!(summary.exclude_previous);

    assert_eq!(flow.proceed(&mut store), Advance::Submit);
    assert!(flow.wizard().is_complete());

    let history = store.activation_history();
    assert_eq!(history.len(), 1);
    assert!(history[0].id.starts_with("act-"));
    assert_eq!(history[0].audience, "Customer Win back • Lapsed Customers");
    assert_eq!(history[0].channel, "SendGrid");
    assert_eq!(history[0].count, 24_000);
    assert_eq!(history[0].scheduled_for, "Every 2 day(s) at 03:00 AM");

    assert_eq!(
        flow.completion_message().unwrap(),
        "Your activation has been finalized.\nAudience: Lapsed Customers (24,000)\nChannel: SENDGRID • Schedule: Every 2 day(s) at 03:00 AM"
    );

    // A second Start Campaign is refused once complete
    assert_eq!(flow.proceed(&mut store), Advance::Blocked(Blocked::Complete));
    assert_eq!(store.activation_history().len(), 1);
}

#[test]
fn test_activation_failed_history_write_can_be_retried() {
    let temp_dir = TempDir::new().unwrap();
    let blocker = temp_dir.path().join("blocker");
    std::fs::write(&blocker, "").unwrap();
    let mut store = SessionStore::open(&blocker.join("state"));
    let mut flow = ActivationFlow::new();

    flow.select_audience(0);
    flow.proceed(&mut store);
    flow.select_destination(Destination::SendGrid);
    flow.wizard_mut().set_field("sg_domain", "mail.initro.ai");
    flow.proceed(&mut store);
    assert_eq!(flow.proceed(&mut store), Advance::Moved(4));

    assert_eq!(flow.proceed(&mut store), Advance::Submit);
    assert!(!flow.wizard().is_complete());
    assert_eq!(flow.wizard().step(), 4);
    assert!(flow.wizard().error().is_some());
    assert!(store.activation_history().is_empty());

    // Retrying does not pile up duplicates
    assert_eq!(flow.proceed(&mut store), Advance::Submit);
    assert!(store.activation_history().is_empty());
}

#[test]
fn test_activation_back_keeps_choices() {
    let mut store = SessionStore::in_memory();
    let mut flow = ActivationFlow::new();
    flow.select_audience(2);
    flow.proceed(&mut store);
    flow.select_destination(Destination::GoogleAds);
    flow.proceed(&mut store);

    assert!(flow.back());
    assert!(flow.back());
    assert!(!flow.back());
    assert_eq!(flow.audience().unwrap().audience, "Cart Recovery");
    assert_eq!(flow.destination(), Some(Destination::GoogleAds));
}

// ─── Ask ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_ask_requires_a_question() {
    let gateway = FakeGateway::default();
    let mut form = AskForm::new();
    form.question = "   ".to_string();

    assert!(!form.submit(&gateway).await);
    assert_eq!(form.error(), Some("Please enter a question."));
}

#[tokio::test]
async fn test_ask_shows_sql_and_rows() {
    let gateway = FakeGateway::default();
    let mut form = AskForm::new();
    form.question = "How many customers are in New York?".to_string();

    assert!(form.submit(&gateway).await);
    assert!(form.answer().unwrap().query.contains("SELECT count(*)"));
    assert!(form.results_text().unwrap().contains("\"count\": 42"));
}

// ─── Snapshot ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_snapshot_splits_good_and_failed_segments() {
    let gateway = FakeGateway::default();
    let mut form = SnapshotForm::new();
    form.query = "customers and churn".to_string();

    assert!(form.submit(&gateway).await);
    assert_eq!(form.response().unwrap().kind, "segmented");
    assert_eq!(form.succeeded().count(), 1);
    let failed: Vec<_> = form.failed().collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].error.as_deref(), Some("column churn does not exist"));
}

#[tokio::test]
async fn test_snapshot_blank_query_sends_nothing() {
    let gateway = FakeGateway::default();
    let mut form = SnapshotForm::new();
    form.query = "  ".to_string();

    assert!(!form.submit(&gateway).await);
    assert!(form.response().is_none());
    assert!(form.error().is_none());
}

#[tokio::test]
async fn test_snapshot_error_clears_previous_response() {
    let gateway = FakeGateway::default();
    let mut form = SnapshotForm::new();
    form.query = "customers".to_string();
    assert!(form.submit(&gateway).await);

    form.query = "explode".to_string();
    assert!(!form.submit(&gateway).await);
    assert!(form.response().is_none());
    assert_eq!(form.error(), Some("API error: 500"));
}

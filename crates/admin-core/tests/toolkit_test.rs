use admin_core::mock::MockTransport;
use admin_core::{
    ApiError, ApiRequest, ApiServer, EndpointSpec, Filter, FilterMatch, LinkedRecordResolver,
    Method, Page, Query, Resource, ResourceClient, ResourceQuery, Schema, SortDirection,
    Transport,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

// --- Test Resource ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Note {
    id: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    priority: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize)]
struct NoteDraft {
    title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    priority: Option<f64>,
}

#[derive(Debug, Default, Serialize)]
struct NotePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    priority: Option<f64>,
}

impl From<&NoteDraft> for NotePatch {
    fn from(draft: &NoteDraft) -> Self {
        Self {
            title: Some(draft.title.clone()),
            body: draft.body.clone(),
            priority: draft.priority,
        }
    }
}

#[derive(Debug, Default)]
struct NoteFilter {
    id: Option<String>,
    title: Option<String>,
}

impl ResourceQuery for NoteFilter {
    fn filters(&self) -> Vec<Filter> {
        let mut filters = Vec::new();
        if let Some(id) = &self.id {
            filters.push(Filter {
                field: "id",
                matching: FilterMatch::Equals(id.clone()),
            });
        }
        if let Some(title) = &self.title {
            filters.push(Filter {
                field: "title",
                matching: FilterMatch::Contains(title.clone()),
            });
        }
        filters
    }
}

impl Resource for Note {
    const ENDPOINT: &'static str = "notes";
    const DISPLAY_FIELD: &'static str = "title";
    type Id = String;
    type Draft = NoteDraft;
    type Patch = NotePatch;
    type Filter = NoteFilter;

    fn id(&self) -> &String {
        &self.id
    }

    fn display_label(&self) -> String {
        self.title.clone()
    }

    fn schema() -> Schema {
        Schema::new("notes")
            .text("title", true, Some(40))
            .text("body", false, None)
            .number("priority", false, Some(0.0), Some(5.0))
    }

    fn search_filter(text: &str) -> NoteFilter {
        NoteFilter {
            id: None,
            title: (!text.is_empty()).then(|| text.to_string()),
        }
    }

    fn to_draft(&self) -> NoteDraft {
        NoteDraft {
            title: self.title.clone(),
            body: self.body.clone(),
            priority: self.priority,
        }
    }
}

fn note_spec() -> EndpointSpec {
    EndpointSpec {
        endpoint: "notes",
        filter_fields: &["id", "title"],
        text_filter_fields: &["title"],
        counts: &[],
        includes: &[],
    }
}

struct Backend {
    client: ResourceClient<Note>,
    transport: Arc<dyn Transport>,
}

fn spawn_backend() -> Backend {
    let (server, transport) = ApiServer::new(16);
    tokio::spawn(server.serve(note_spec()).run());
    let transport: Arc<dyn Transport> = Arc::new(transport);
    Backend {
        client: ResourceClient::new(Arc::clone(&transport)),
        transport,
    }
}

fn draft(title: &str) -> NoteDraft {
    NoteDraft {
        title: title.to_string(),
        body: None,
        priority: None,
    }
}

// --- CRUD contract ---

#[tokio::test]
async fn create_then_get_round_trips_submitted_fields() {
    let backend = spawn_backend();

    let created = backend
        .client
        .create(&NoteDraft {
            title: "Standup notes".to_string(),
            body: Some("discussed rollout".to_string()),
            priority: Some(2.0),
        })
        .await
        .expect("create failed");
    assert_eq!(created.id, "notes_1");
    assert_eq!(created.created_at, created.updated_at);

    let fetched = backend.client.get(&created.id).await.expect("get failed");
    assert_eq!(fetched.title, "Standup notes");
    assert_eq!(fetched.body.as_deref(), Some("discussed rollout"));
    assert_eq!(fetched.priority, Some(2.0));
    assert_eq!(fetched.created_at, created.created_at);
}

#[tokio::test]
async fn update_is_partial_and_preserves_other_fields() {
    let backend = spawn_backend();
    let created = backend
        .client
        .create(&NoteDraft {
            title: "before".to_string(),
            body: Some("kept".to_string()),
            priority: Some(1.0),
        })
        .await
        .unwrap();

    let updated = backend
        .client
        .update(
            &created.id,
            &NotePatch {
                title: Some("after".to_string()),
                ..NotePatch::default()
            },
        )
        .await
        .expect("update failed");
    assert_eq!(updated.title, "after");
    assert_eq!(updated.body.as_deref(), Some("kept"));
    assert_eq!(updated.priority, Some(1.0));
    assert_eq!(updated.created_at, created.created_at);
}

#[tokio::test]
async fn remove_on_a_missing_id_fails_with_not_found() {
    let backend = spawn_backend();
    let created = backend.client.create(&draft("gone soon")).await.unwrap();

    backend.client.remove(&created.id).await.expect("remove failed");
    assert_eq!(
        backend.client.get(&created.id).await,
        Err(ApiError::not_found("notes", &created.id))
    );
    assert_eq!(
        backend.client.remove(&created.id).await,
        Err(ApiError::not_found("notes", &created.id))
    );
}

// --- Query descriptor ---

#[tokio::test]
async fn list_never_returns_a_record_failing_the_filter() {
    let backend = spawn_backend();
    for title in ["alpha report", "beta report", "gamma summary", "BETA draft"] {
        backend.client.create(&draft(title)).await.unwrap();
    }

    let page: Page<Note> = backend
        .client
        .list(&Query::filtered(NoteFilter {
            id: None,
            title: Some("beta".to_string()),
        }))
        .await
        .unwrap();

    assert_eq!(page.total, 2);
    assert!(
        page.items
            .iter()
            .all(|note| note.title.to_lowercase().contains("beta"))
    );
}

#[tokio::test]
async fn list_orders_by_sort_field_with_id_ascending_tie_break() {
    let backend = spawn_backend();
    for title in ["beta", "alpha", "beta"] {
        backend.client.create(&draft(title)).await.unwrap();
    }

    let page = backend
        .client
        .list(&Query::<NoteFilter>::default().sort("title", SortDirection::Asc))
        .await
        .unwrap();
    let ids: Vec<&str> = page.items.iter().map(|n| n.id.as_str()).collect();
    // alpha first, then the two betas in creation order.
    assert_eq!(ids, ["notes_2", "notes_1", "notes_3"]);

    let page = backend
        .client
        .list(&Query::<NoteFilter>::default().sort("title", SortDirection::Desc))
        .await
        .unwrap();
    let ids: Vec<&str> = page.items.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, ["notes_1", "notes_3", "notes_2"]);
}

#[tokio::test]
async fn pagination_windows_and_caps_the_page_size() {
    let backend = spawn_backend();
    for i in 0..60 {
        backend.client.create(&draft(&format!("note {i:02}"))).await.unwrap();
    }

    let page = backend
        .client
        .list(&Query::<NoteFilter>::default().page(10, 5).sort("title", SortDirection::Asc))
        .await
        .unwrap();
    assert_eq!(page.total, 60);
    assert_eq!(page.items.len(), 5);
    assert_eq!(page.items[0].title, "note 10");

    // A limit above the server cap is clamped.
    let page = backend
        .client
        .list(&Query::<NoteFilter>::default().page(0, 100))
        .await
        .unwrap();
    assert_eq!(page.total, 60);
    assert_eq!(page.items.len(), 50);
}

#[tokio::test]
async fn malformed_filters_surface_as_request_failures() {
    let backend = spawn_backend();
    backend.client.create(&draft("whatever")).await.unwrap();

    // The typed descriptor cannot express these; a hand-built request shows
    // the backend rejecting rather than silently dropping them.
    let unknown_field = backend
        .transport
        .execute(
            ApiRequest::new(Method::Get, "/notes")
                .with_params(vec![("serial".to_string(), "9".to_string())]),
        )
        .await;
    assert!(matches!(unknown_field, Err(ApiError::Network(_))));

    let contains_on_id = backend
        .transport
        .execute(
            ApiRequest::new(Method::Get, "/notes")
                .with_params(vec![("id[contains]".to_string(), "note".to_string())]),
        )
        .await;
    assert!(matches!(contains_on_id, Err(ApiError::Network(_))));
}

// --- Linked-record resolver ---

#[tokio::test]
async fn empty_query_returns_the_unfiltered_top_n() {
    let backend = spawn_backend();
    for title in ["cedar", "acacia", "birch"] {
        backend.client.create(&draft(title)).await.unwrap();
    }

    let resolver = LinkedRecordResolver::new(backend.client.clone())
        .with_debounce(Duration::from_millis(1))
        .with_limit(2);
    let options = resolver.search("").await.unwrap().expect("fresh result");
    let labels: Vec<&str> = options.iter().map(|o| o.label.as_str()).collect();
    assert_eq!(labels, ["acacia", "birch"]);
}

#[tokio::test]
async fn superseded_search_never_issues_its_request() {
    let mock = MockTransport::new();
    // Only the winning query reaches the transport.
    mock.expect(Method::Get, "/notes").return_ok(json!({
        "items": [{
            "id": "notes_1",
            "created_at": "2026-08-30T12:00:00Z",
            "updated_at": "2026-08-30T12:00:00Z",
            "title": "abacus",
        }],
        "total": 1,
    }));
    let client = ResourceClient::<Note>::new(Arc::new(mock.clone()));
    let resolver = LinkedRecordResolver::new(client).with_debounce(Duration::from_millis(20));

    let (stale, fresh) = tokio::join!(resolver.search("a"), resolver.search("ab"));
    assert_eq!(stale.unwrap(), None);
    let fresh = fresh.unwrap().expect("fresh result");
    assert_eq!(fresh[0].label, "abacus");

    assert_eq!(mock.calls(Method::Get, "/notes"), 1);
    mock.verify();
}

#[tokio::test]
async fn stale_response_is_discarded_regardless_of_arrival_order() {
    let mock = MockTransport::new();
    // First query's response arrives long after the second's.
    mock.expect(Method::Get, "/notes")
        .after(Duration::from_millis(80))
        .return_ok(json!({
            "items": [{
                "id": "notes_1",
                "created_at": "2026-08-30T12:00:00Z",
                "updated_at": "2026-08-30T12:00:00Z",
                "title": "a-match",
            }],
            "total": 1,
        }));
    mock.expect(Method::Get, "/notes")
        .after(Duration::from_millis(5))
        .return_ok(json!({
            "items": [{
                "id": "notes_2",
                "created_at": "2026-08-30T12:00:00Z",
                "updated_at": "2026-08-30T12:00:00Z",
                "title": "ab-match",
            }],
            "total": 1,
        }));
    let client = ResourceClient::<Note>::new(Arc::new(mock.clone()));
    // Zero debounce: both queries reach the transport.
    let resolver = LinkedRecordResolver::new(client).with_debounce(Duration::ZERO);

    // Put the first search's request in flight, then supersede it while its
    // slow response is still pending.
    let first = tokio::spawn({
        let resolver = resolver.clone();
        async move { resolver.search("a").await }
    });
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(mock.calls(Method::Get, "/notes"), 1, "first request must be in flight");

    let fresh = resolver.search("ab").await.unwrap().expect("fresh result");
    assert_eq!(fresh.len(), 1);
    assert_eq!(fresh[0].label, "ab-match");

    // The slow response arrives after the fresh one and is discarded.
    let stale = first.await.expect("search task panicked");
    assert_eq!(stale.unwrap(), None, "superseded result must not be applied");

    assert_eq!(mock.calls(Method::Get, "/notes"), 2);
    mock.verify();
}

use std::sync::{Arc, Mutex};

use serde_json::json;

use crate::{
    descriptor::{self, PageDescriptor},
    notice,
    schema::PageSchema,
    session::PageSession,
    store::LoadingKey,
    transport::{Method, Transport},
};

mod actions;

#[derive(Debug, thiserror::Error)]
#[error("mock transport: {0}")]
pub struct MockError(String);

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: Method,
    pub url: String,
    pub params: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

enum Response {
    Value(serde_json::Value),
    Fail(String),
    /// Response held back until the test releases it; used to exercise
    /// staleness and in-flight exclusion.
    Gated(async_channel::Receiver<serde_json::Value>),
}

struct Route {
    method: Method,
    url: String,
    once: bool,
    response: Response,
}

#[derive(Default)]
struct Inner {
    routes: Mutex<Vec<Route>>,
    log: Mutex<Vec<RecordedRequest>>,
}

/// Scripted transport: routes are matched by method and URL, first match
/// wins, `*_once` routes are consumed by their first hit.
#[derive(Clone, Default)]
pub struct MockTransport {
    inner: Arc<Inner>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, route: Route) {
        self.inner.routes.lock().unwrap().push(route);
    }

    pub fn route(&self, method: Method, url: &str, body: serde_json::Value) {
        self.push(Route {
            method,
            url: url.to_owned(),
            once: false,
            response: Response::Value(body),
        });
    }

    pub fn route_once(&self, method: Method, url: &str, body: serde_json::Value) {
        self.push(Route {
            method,
            url: url.to_owned(),
            once: true,
            response: Response::Value(body),
        });
    }

    pub fn fail(&self, method: Method, url: &str, message: &str) {
        self.push(Route {
            method,
            url: url.to_owned(),
            once: false,
            response: Response::Fail(message.to_owned()),
        });
    }

    /// Register a once-route whose response is released by sending on the
    /// returned channel.
    pub fn gate_once(&self, method: Method, url: &str) -> async_channel::Sender<serde_json::Value> {
        let (sender, receiver) = async_channel::bounded(1);
        self.push(Route {
            method,
            url: url.to_owned(),
            once: true,
            response: Response::Gated(receiver),
        });
        sender
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.inner.log.lock().unwrap().clone()
    }

    pub fn requests_for(&self, url: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|request| request.url == url)
            .collect()
    }
}

impl Transport for MockTransport {
    type Error = MockError;

    async fn request(
        &self,
        method: Method,
        url: &str,
        params: &[(String, String)],
        body: Option<&serde_json::Value>,
    ) -> Result<serde_json::Value, MockError> {
        self.inner.log.lock().unwrap().push(RecordedRequest {
            method,
            url: url.to_owned(),
            params: params.to_vec(),
            body: body.cloned(),
        });
        let response = {
            let mut routes = self.inner.routes.lock().unwrap();
            let Some(at) = routes
                .iter()
                .position(|route| route.method == method && route.url == url)
            else {
                return Err(MockError(format!("no route for {method} {url}")));
            };
            if routes[at].once {
                routes.remove(at).response
            } else {
                match &routes[at].response {
                    Response::Value(value) => Response::Value(value.clone()),
                    Response::Fail(message) => Response::Fail(message.clone()),
                    Response::Gated(receiver) => Response::Gated(receiver.clone()),
                }
            }
        };
        match response {
            Response::Value(value) => Ok(value),
            Response::Fail(message) => Err(MockError(message)),
            Response::Gated(receiver) => receiver
                .recv()
                .await
                .map_err(|_| MockError("gate closed".to_owned())),
        }
    }
}

/// Spin until the condition holds; the runtime is cooperative, so
/// yielding drives the spawned tasks forward.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..10_000 {
        if condition() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition never became true");
}

pub async fn fixture() -> PageDescriptor {
    descriptor::load("src/tests/fixtures/videos.json")
        .await
        .unwrap()
}

fn video(id: u32, title: &str) -> serde_json::Value {
    json!({
        "id": format!("v-{id}"),
        "title": title,
        "thumbnail": format!("https://cdn.example.com/{id}.jpg"),
        "status": "LIVE",
        "isActive": true,
        "publishedAt": "2024-03-05"
    })
}

fn page_body(ids: std::ops::Range<u32>, total: u64, pages: u32, page: u32) -> serde_json::Value {
    let content: Vec<_> = ids.map(|id| video(id, &format!("Video {id}"))).collect();
    json!({
        "content": content,
        "totalElements": total,
        "totalPages": pages,
        "pageNumber": page
    })
}

async fn mounted_session() -> (PageSession<MockTransport>, MockTransport) {
    let transport = MockTransport::new();
    transport.route(Method::Get, "/videos", page_body(0..10, 12, 2, 0));
    transport.route(Method::Get, "/exams", json!([{"id": "e-1", "name": "JEE"}]));
    let session = PageSession::new(transport.clone(), &fixture().await).unwrap();
    session.mount().await.unwrap();
    (session, transport)
}

#[tokio::test]
async fn test_columns_ordered_by_order_key() {
    let schema = PageSchema::compile(&fixture().await).unwrap();
    let accessors: Vec<_> = schema
        .columns
        .iter()
        .map(|column| column.accessor.as_str())
        .collect();
    assert_eq!(
        accessors,
        ["title", "thumbnail", "status", "isActive", "publishedAt", "actions"]
    );
}

#[tokio::test]
async fn test_omitted_order_defaults_to_tail_with_stable_ties() {
    let descriptor: PageDescriptor = serde_json::from_value(json!({
        "getDataUrl": "/x",
        "tableHeaders": [
            {"accessor": "b"},
            {"accessor": "a"},
            {"accessor": "first", "order": 1}
        ]
    }))
    .unwrap();
    let schema = PageSchema::compile(&descriptor).unwrap();
    let accessors: Vec<_> = schema
        .columns
        .iter()
        .map(|column| column.accessor.as_str())
        .collect();
    // Ties at the default order keep descriptor position.
    assert_eq!(accessors, ["first", "b", "a"]);
}

#[tokio::test]
async fn test_duplicate_accessor_rejected() {
    let descriptor: PageDescriptor = serde_json::from_value(json!({
        "getDataUrl": "/x",
        "tableHeaders": [{"accessor": "a"}, {"accessor": "a"}]
    }))
    .unwrap();
    assert!(PageSchema::compile(&descriptor).is_err());
}

#[tokio::test]
async fn test_second_actions_column_rejected() {
    let descriptor: PageDescriptor = serde_json::from_value(json!({
        "getDataUrl": "/x",
        "tableHeaders": [
            {"accessor": "a", "type": "actions"},
            {"accessor": "b", "type": "actions"}
        ]
    }))
    .unwrap();
    assert!(PageSchema::compile(&descriptor).is_err());
}

#[tokio::test]
async fn test_unknown_column_type_falls_back_to_text() {
    let descriptor: PageDescriptor = serde_json::from_value(json!({
        "getDataUrl": "/x",
        "tableHeaders": [{"accessor": "a", "type": "sparkline"}]
    }))
    .unwrap();
    let schema = PageSchema::compile(&descriptor).unwrap();
    assert_eq!(schema.columns[0].kind, crate::descriptor::ColumnKind::Text);
}

#[tokio::test]
async fn test_first_page_of_two() {
    let (session, transport) = mounted_session().await;
    assert_eq!(session.pager().items().get().len(), 10);
    let pagination = session.pager().pagination().get();
    assert_eq!(pagination.page_label(), "Page 1 of 2");
    assert!(pagination.has_next());
    assert!(!pagination.has_previous());
    let list_requests = transport.requests_for("/videos");
    assert_eq!(list_requests.len(), 1);
    assert!(
        list_requests[0]
            .params
            .contains(&("pageNo".to_owned(), "0".to_owned()))
    );
    assert!(
        list_requests[0]
            .params
            .contains(&("pageSize".to_owned(), "10".to_owned()))
    );
}

#[tokio::test]
async fn test_next_page_and_boundary() {
    let transport = MockTransport::new();
    transport.route_once(Method::Get, "/videos", page_body(0..10, 12, 2, 0));
    transport.route(Method::Get, "/videos", page_body(10..12, 12, 2, 1));
    transport.route(Method::Get, "/exams", json!([]));
    let session = PageSession::new(transport.clone(), &fixture().await).unwrap();
    session.mount().await.unwrap();

    session.next_page().await.unwrap();
    let pagination = session.pager().pagination().get();
    assert_eq!(pagination.current_page, 1);
    assert_eq!(session.pager().items().get().len(), 2);
    assert!(!pagination.has_next());
    let issued = transport.requests_for("/videos").len();

    // At the boundary the next-page control is disabled; no request
    // may go out.
    session.next_page().await.unwrap();
    assert_eq!(transport.requests_for("/videos").len(), issued);
}

#[tokio::test]
async fn test_search_resets_to_first_page_and_filters_criteria() {
    let (session, transport) = mounted_session().await;
    session.next_page().await.unwrap();
    session.pager().set_criterion("title", "waves");
    session.pager().set_criterion("status", "all");
    session.pager().set_criterion("examId", "");
    session.search().await.unwrap();

    let last = transport.requests_for("/videos").pop().unwrap();
    assert!(last.params.contains(&("pageNo".to_owned(), "0".to_owned())));
    assert!(last.params.contains(&("title".to_owned(), "waves".to_owned())));
    // Cleared sentinels stay out of the query.
    assert!(!last.params.iter().any(|(key, _)| key == "status"));
    assert!(!last.params.iter().any(|(key, _)| key == "examId"));
    assert_eq!(session.pager().pagination().get().current_page, 0);
}

#[tokio::test]
async fn test_clear_search_issues_single_reload() {
    let (session, transport) = mounted_session().await;
    session.pager().set_criterion("title", "waves");
    session.search().await.unwrap();
    let before = transport.requests_for("/videos").len();

    session.clear_search().await.unwrap();
    let requests = transport.requests_for("/videos");
    assert_eq!(requests.len(), before + 1);
    let last = requests.last().unwrap();
    assert!(!last.params.iter().any(|(key, _)| key == "title"));
    assert!(session.pager().criteria().get().is_empty());
}

#[tokio::test]
async fn test_page_size_change_resets_to_first_page() {
    let (session, transport) = mounted_session().await;
    session.next_page().await.unwrap();
    session.pager().set_page_size(25).await.unwrap();
    let last = transport.requests_for("/videos").pop().unwrap();
    assert!(last.params.contains(&("pageNo".to_owned(), "0".to_owned())));
    assert!(last.params.contains(&("pageSize".to_owned(), "25".to_owned())));
}

#[tokio::test]
async fn test_failed_load_degrades_to_empty_with_notice() {
    let transport = MockTransport::new();
    transport.fail(Method::Get, "/videos", "connection refused");
    transport.route(Method::Get, "/exams", json!([]));
    let session = PageSession::new(transport.clone(), &fixture().await).unwrap();
    let (mounted, notices) = notice::collect_notices(session.mount()).await;
    assert!(mounted.is_err());
    assert!(session.pager().items().get().is_empty());
    assert_eq!(session.pager().pagination().get().total_elements, 0);
    assert!(
        notices
            .iter()
            .any(|notice| notice.severity == notice::Severity::Error)
    );
    assert!(!session.loading().is_loading(&LoadingKey::PageLoad));
}

#[tokio::test]
async fn test_search_select_options_fetched_on_mount() {
    let (session, transport) = mounted_session().await;
    assert_eq!(transport.requests_for("/exams").len(), 1);
    let cache = session.field_options().get();
    let exams = cache.get("examId").unwrap();
    assert_eq!(exams[0].value, "e-1");
    assert_eq!(exams[0].label, "JEE");
}

#[tokio::test]
async fn test_search_fields_render_with_option_precedence() {
    let (session, _) = mounted_session().await;
    session.pager().set_criterion("title", "waves");
    let fields = session.render_search_fields();
    assert_eq!(fields.len(), 3);
    let crate::render::InputElement::TextInput { value, .. } = &fields[0] else {
        panic!("expected text input");
    };
    assert_eq!(value, "waves");
    // Inline options for status, fetched options for examId.
    let crate::render::InputElement::Select { options, .. } = &fields[1] else {
        panic!("expected select");
    };
    let crate::render::OptionsState::Loaded(status_options) = options else {
        panic!("expected loaded options");
    };
    assert_eq!(status_options.len(), 2);
    let crate::render::InputElement::Select { options, .. } = &fields[2] else {
        panic!("expected select");
    };
    let crate::render::OptionsState::Loaded(exam_options) = options else {
        panic!("expected loaded options");
    };
    assert_eq!(exam_options[0].label, "JEE");
}

#[tokio::test]
async fn test_rendered_rows_follow_column_order() {
    let (session, _) = mounted_session().await;
    let rows = session.render_rows();
    assert_eq!(rows.len(), 10);
    // First column after ordering is the title.
    assert_eq!(
        rows[0][0],
        crate::render::DisplayElement::Text("Video 0".into())
    );
    // Actions column renders the menu of all four row actions.
    let crate::render::DisplayElement::ActionMenu(menu) = &rows[0][5] else {
        panic!("expected action menu");
    };
    assert_eq!(menu.len(), 4);
}

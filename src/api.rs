//! HTTP API: account bring-up, the log viewer and on-demand broadcasts.
//!
//! Spawned as a background task by the gateway. CAPA endpoints return a
//! `{status, data}` envelope; when `api.api_key` is set they also require
//! `Authorization: Bearer <key>`.

use crate::gateway::{Gateway, InitOutcome, ReminderTarget};
use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Form, Router,
};
use capa_core::config::shellexpand;
use capa_core::error::CapaError;
use capa_report::{render::escape_html, Scope};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info};

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    gateway: Arc<Gateway>,
    api_key: Option<String>,
    log_file: String,
}

#[derive(Debug, Deserialize)]
struct InitializeQuery {
    #[serde(rename = "clientNumber")]
    client_number: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ReminderRequest {
    #[serde(default)]
    to: String,
    #[serde(default)]
    scope: Scope,
}

#[derive(Debug, Deserialize)]
struct FridayRequest {
    slot: String,
}

#[derive(Debug, Deserialize)]
struct SubmitForm {
    #[serde(default)]
    name: String,
}

/// Constant-time string comparison for API token validation.
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

/// Check bearer token auth. Returns `None` if authorized, `Some(response)` if rejected.
fn check_auth(headers: &HeaderMap, api_key: &Option<String>) -> Option<Response> {
    let key = api_key.as_ref()?;

    let token = headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match token {
        Some(token) if constant_time_eq(token, key) => None,
        _ => Some(envelope(StatusCode::UNAUTHORIZED, json!("invalid or missing token"))),
    }
}

fn envelope(status: StatusCode, data: Value) -> Response {
    (
        status,
        Json(json!({ "status": status.as_u16(), "data": data })),
    )
        .into_response()
}

fn error_status(e: &CapaError) -> StatusCode {
    match e {
        CapaError::Config(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// `GET /initialize?clientNumber=N`: start account N (default 1) if needed.
async fn initialize(
    headers: HeaderMap,
    State(state): State<ApiState>,
    Query(query): Query<InitializeQuery>,
) -> Response {
    if let Some(err) = check_auth(&headers, &state.api_key) {
        return err;
    }
    let id = query.client_number.unwrap_or(1);

    if state.gateway.account_state(id).await.is_none() {
        return (StatusCode::NOT_FOUND, format!("Client {id} is not configured")).into_response();
    }

    match state.gateway.initialize_account(id).await {
        Ok(InitOutcome::Initialized) => format!("Client {id} initialized").into_response(),
        Ok(InitOutcome::AlreadyInitialized) => {
            format!("Client {id} is already initialized").into_response()
        }
        Err(e) => {
            error!("initialize client {id} failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Client {id} failed to initialize"),
            )
                .into_response()
        }
    }
}

/// `GET /api/logs`: the log file with `<br>` line breaks.
async fn logs(headers: HeaderMap, State(state): State<ApiState>) -> Response {
    if let Some(err) = check_auth(&headers, &state.api_key) {
        return err;
    }
    match tokio::fs::read_to_string(shellexpand(&state.log_file)).await {
        Ok(content) => Html(content.replace('\n', "<br>")).into_response(),
        Err(e) => {
            error!("Error reading log file: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}

async fn run_broadcast(state: &ApiState, scope: Scope, target: ReminderTarget) -> Response {
    match state.gateway.broadcast(scope, &target).await {
        Ok(summary) => envelope(StatusCode::OK, json!(summary)),
        Err(e) => {
            error!("broadcast {target:?} failed: {e}");
            envelope(error_status(&e), json!(e.to_string()))
        }
    }
}

/// `POST /reminder-capa {"to": "ALL" | "<PIC>"}`.
async fn reminder_capa(
    headers: HeaderMap,
    State(state): State<ApiState>,
    Json(request): Json<ReminderRequest>,
) -> Response {
    if let Some(err) = check_auth(&headers, &state.api_key) {
        return err;
    }
    let target = ReminderTarget::from_request(&request.to);
    info!("api: reminder-capa {target:?}");
    run_broadcast(&state, request.scope, target).await
}

/// `POST /friday-capa {"slot": "<slot>"}`.
async fn friday_capa(
    headers: HeaderMap,
    State(state): State<ApiState>,
    Json(request): Json<FridayRequest>,
) -> Response {
    if let Some(err) = check_auth(&headers, &state.api_key) {
        return err;
    }
    let slot = request.slot.trim();
    if slot.is_empty() {
        return envelope(StatusCode::BAD_REQUEST, json!("slot must not be empty"));
    }
    info!("api: friday-capa slot {slot}");
    run_broadcast(&state, Scope::All, ReminderTarget::Slot(slot.to_string())).await
}

async fn index() -> Html<&'static str> {
    Html(
        "<form method=\"post\" action=\"/submit\">\
         <input type=\"text\" name=\"name\" placeholder=\"Name\">\
         <button type=\"submit\">Submit</button>\
         </form>",
    )
}

async fn submit(Form(form): Form<SubmitForm>) -> Html<String> {
    Html(format!("Hello, {}!", escape_html(form.name.trim())))
}

/// Build the axum router with shared state.
pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/submit", post(submit))
        .route("/initialize", get(initialize))
        .route("/api/logs", get(logs))
        .route("/reminder-capa", post(reminder_capa))
        .route("/friday-capa", post(friday_capa))
        .layer(axum::extract::DefaultBodyLimit::max(64 * 1024))
        .with_state(state)
}

impl ApiState {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        let api_key = Some(gateway.config.api.api_key.clone()).filter(|k| !k.is_empty());
        let log_file = gateway.config.bot.log_file.clone();
        Self {
            gateway,
            api_key,
            log_file,
        }
    }
}

/// Start the API server. Called from `Gateway::run()`.
pub async fn serve(gateway: Arc<Gateway>) {
    let addr = format!("{}:{}", gateway.config.api.host, gateway.config.api.port);
    let app = build_router(ApiState::new(gateway));

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            error!("API server failed to bind to {addr}: {e}");
            return;
        }
    };

    info!("API server listening on {addr}");

    if let Err(e) = axum::serve(listener, app).await {
        error!("API server error: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{
        capa_row, directory_header, directory_row, MockChannel, MockSheets, RecordingNotifier,
    };
    use axum::body::Body;
    use axum::http::Request;
    use capa_core::config::Config;
    use capa_core::traits::Channel;
    use http_body_util::BodyExt;
    use std::collections::BTreeMap;
    use tower::ServiceExt;

    fn state_with(api_key: Option<&str>, log_file: &str, channel: MockChannel) -> ApiState {
        let mut config = Config::default();
        config.whatsapp.reminder_group = "120363001234567890@g.us".into();
        config.bot.log_file = log_file.into();
        if let Some(key) = api_key {
            config.api.api_key = key.into();
        }

        let sheets = MockSheets {
            capa: vec![
                capa_row("1", "QRM", "fix valve", "A", "PROD", "10 Mar 2024", "OPEN"),
                capa_row("2", "QRM", "slot work", "D", "QA", "1 Jan 2000", "OPEN"),
            ],
            directory: vec![
                directory_header(),
                directory_row("A", "6281111111111", "", "1"),
                directory_row("D", "6283333333333", "", "2"),
            ],
            fail: false,
        };

        let mut accounts: BTreeMap<u32, Arc<dyn Channel>> = BTreeMap::new();
        accounts.insert(1, Arc::new(channel));
        let gateway = Gateway::new(
            config,
            Arc::new(sheets),
            Arc::new(RecordingNotifier::default()),
            None,
            accounts,
        );
        ApiState::new(Arc::new(gateway))
    }

    fn state() -> ApiState {
        state_with(None, "/nonexistent/capa.log", MockChannel::ready("whatsapp-1"))
    }

    async fn body_string(resp: Response) -> String {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn body_json(resp: Response) -> Value {
        serde_json::from_str(&body_string(resp).await).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq("secret", "secret"));
        assert!(!constant_time_eq("secret", "secreT"));
        assert!(!constant_time_eq("short", "longer"));
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let app = build_router(state_with(
            None,
            "/nonexistent/capa.log",
            MockChannel::new("whatsapp-1"),
        ));

        let resp = app.clone().oneshot(get("/initialize")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_string(resp).await, "Client 1 initialized");

        let resp = app
            .oneshot(get("/initialize?clientNumber=1"))
            .await
            .unwrap();
        assert_eq!(body_string(resp).await, "Client 1 is already initialized");
    }

    #[tokio::test]
    async fn test_initialize_unknown_client() {
        let app = build_router(state());
        let resp = app
            .oneshot(get("/initialize?clientNumber=2"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_logs_joined_with_br() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("capa.log");
        std::fs::write(
            &path,
            "[2024-03-15 08:00:00] [INFO] a\n[2024-03-15 08:00:01] [WARNING] b",
        )
        .unwrap();
        let app = build_router(state_with(
            None,
            &path.display().to_string(),
            MockChannel::ready("whatsapp-1"),
        ));

        let resp = app.oneshot(get("/api/logs")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            body_string(resp).await,
            "[2024-03-15 08:00:00] [INFO] a<br>[2024-03-15 08:00:01] [WARNING] b"
        );
    }

    #[tokio::test]
    async fn test_logs_missing_file() {
        let app = build_router(state());
        let resp = app.oneshot(get("/api/logs")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_reminder_all() {
        let app = build_router(state());
        let resp = app
            .oneshot(post_json("/reminder-capa", json!({"to": "ALL"})))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["status"], 200);
        assert_eq!(json["data"]["sent"], json!(["A", "D"]));
        assert_eq!(json["data"]["unassigned"], 0);
    }

    #[tokio::test]
    async fn test_reminder_single_pic() {
        let app = build_router(state());
        let resp = app
            .oneshot(post_json("/reminder-capa", json!({"to": "d"})))
            .await
            .unwrap();
        let json = body_json(resp).await;
        assert_eq!(json["data"]["sent"], json!(["D"]));
    }

    #[tokio::test]
    async fn test_reminder_when_client_not_ready() {
        let app = build_router(state_with(
            None,
            "/nonexistent/capa.log",
            MockChannel::new("whatsapp-1"),
        ));
        let resp = app
            .oneshot(post_json("/reminder-capa", json!({"to": "ALL"})))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(resp).await;
        assert_eq!(json["status"], 500);
        assert!(json["data"].as_str().unwrap().contains("not ready"));
    }

    #[tokio::test]
    async fn test_friday_slot() {
        let app = build_router(state());
        let resp = app
            .oneshot(post_json("/friday-capa", json!({"slot": "1"})))
            .await
            .unwrap();
        let json = body_json(resp).await;
        assert_eq!(json["status"], 200);
        assert_eq!(json["data"]["sent"], json!(["A"]));
    }

    #[tokio::test]
    async fn test_friday_requires_slot() {
        let app = build_router(state());
        let resp = app
            .oneshot(post_json("/friday-capa", json!({"slot": " "})))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_auth_required_when_key_set() {
        let app = build_router(state_with(
            Some("s3cret"),
            "/nonexistent/capa.log",
            MockChannel::ready("whatsapp-1"),
        ));

        let resp = app
            .clone()
            .oneshot(post_json("/reminder-capa", json!({"to": "ALL"})))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let mut req = post_json("/reminder-capa", json!({"to": "ALL"}));
        req.headers_mut()
            .insert("authorization", "Bearer s3cret".parse().unwrap());
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        // The demo form stays public.
        let resp = app.oneshot(get("/")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_demo_form() {
        let app = build_router(state());
        let req = Request::builder()
            .method("POST")
            .uri("/submit")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from("name=%3Cb%3EBudi"))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(body_string(resp).await, "Hello, &lt;b&gt;Budi!");
    }
}

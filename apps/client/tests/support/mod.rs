//! In-process stand-in for the Recruit backend.
//!
//! Mirrors the real API closely enough for workflow tests: bearer auth,
//! the free-use counter with its 402 reply, and in-memory letters and
//! applications. Every request is counted so tests can assert that a
//! gated or invalid action never reached the network.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use axum::extract::{Multipart, Path, Query, Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};

use recruit_client::api::ApiClient;
use recruit_client::auth::{AuthUser, TokenIdentity};

pub const TOKEN: &str = "test-token";
pub const UID: &str = "user-1";

#[derive(Default)]
struct Inner {
    premium: bool,
    free_uses: u32,
    display_name: Option<String>,
    hits: HashMap<String, usize>,
    auth_headers: HashMap<String, Vec<Option<String>>>,
    failures: HashMap<String, (u16, Value)>,
    delays: HashMap<String, Duration>,
    forms: HashMap<String, HashMap<String, String>>,
    bodies: HashMap<String, Value>,
    queries: HashMap<String, HashMap<String, String>>,
    letters: Vec<Value>,
    applications: Vec<Value>,
}

#[derive(Clone, Default)]
pub struct FakeBackend {
    inner: Arc<Mutex<Inner>>,
}

impl FakeBackend {
    pub fn with_free_uses(free_uses: u32) -> Self {
        let backend = Self::default();
        backend.lock().free_uses = free_uses;
        backend
    }

    pub fn premium() -> Self {
        let backend = Self::default();
        backend.lock().premium = true;
        backend
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }

    /// Number of requests seen for `"METHOD /path"`, path without `/api/v1`.
    pub fn hits(&self, key: &str) -> usize {
        self.lock().hits.get(key).copied().unwrap_or(0)
    }

    pub fn total_hits(&self) -> usize {
        self.lock().hits.values().sum()
    }

    /// Authorization headers seen for `"METHOD /path"`, in order.
    pub fn auth_headers(&self, key: &str) -> Vec<Option<String>> {
        self.lock().auth_headers.get(key).cloned().unwrap_or_default()
    }

    /// Every later request to `"METHOD /path"` answers `status` with `body`.
    pub fn fail(&self, key: &str, status: u16, body: Value) {
        self.lock().failures.insert(key.to_string(), (status, body));
    }

    pub fn clear_failure(&self, key: &str) {
        self.lock().failures.remove(key);
    }

    /// Holds every later request to `"METHOD /path"` for `delay` before answering.
    pub fn delay(&self, key: &str, delay: Duration) {
        self.lock().delays.insert(key.to_string(), delay);
    }

    pub fn form(&self, key: &str) -> HashMap<String, String> {
        self.lock().forms.get(key).cloned().unwrap_or_default()
    }

    pub fn body(&self, key: &str) -> Option<Value> {
        self.lock().bodies.get(key).cloned()
    }

    pub fn query(&self, key: &str) -> HashMap<String, String> {
        self.lock().queries.get(key).cloned().unwrap_or_default()
    }

    pub fn free_uses(&self) -> u32 {
        self.lock().free_uses
    }

    pub fn set_premium(&self, premium: bool) {
        self.lock().premium = premium;
    }

    pub fn set_free_uses(&self, free_uses: u32) {
        self.lock().free_uses = free_uses;
    }

    pub fn applications(&self) -> Vec<Value> {
        self.lock().applications.clone()
    }

    pub fn letter(&self, id: &str) -> Option<Value> {
        self.lock().letters.iter().find(|l| l["id"] == id).cloned()
    }

    pub fn seed_application(&self, company: &str, position: &str, status: &str) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        self.lock().applications.push(json!({
            "id": id,
            "user_id": UID,
            "company_name": company,
            "position": position,
            "status": status,
        }));
        id
    }

    pub fn seed_letter(&self, title: &str, company: &str, tone: &str, content: &str) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        self.lock().letters.insert(0, letter_json(&id, title, company, tone, content));
        id
    }

    /// Usage gate: premium is unlimited, free users spend one use, then 402.
    fn consume_use(&self) -> Result<(), Response> {
        let mut inner = self.lock();
        if inner.premium {
            return Ok(());
        }
        if inner.free_uses > 0 {
            inner.free_uses -= 1;
            return Ok(());
        }
        Err((
            StatusCode::PAYMENT_REQUIRED,
            Json(json!({
                "detail": {
                    "message": "You've used all your free AI uses. Upgrade to Premium for unlimited access.",
                    "free_uses_remaining": 0,
                    "upgrade_url": "/pricing"
                }
            })),
        )
            .into_response())
    }

    fn profile_json(&self) -> Value {
        let inner = self.lock();
        json!({
            "uid": UID,
            "email": "candidate@example.com",
            "display_name": inner.display_name,
            "plan": if inner.premium { "premium" } else { "free" },
            "free_uses_remaining": inner.free_uses,
        })
    }
}

fn letter_json(id: &str, title: &str, company: &str, tone: &str, content: &str) -> Value {
    json!({
        "id": id,
        "user_id": UID,
        "job_title": title,
        "company_name": company,
        "tone": tone,
        "content": content,
        "word_count": content.split_whitespace().count(),
    })
}

fn list_item(letter: &Value) -> Value {
    let mut item = letter.clone();
    if let Some(obj) = item.as_object_mut() {
        obj.remove("content");
        obj.remove("user_id");
    }
    item
}

fn not_found(what: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "detail": format!("{what} not found") })),
    )
        .into_response()
}

/// A running backend plus a client pointed at it.
pub struct TestServer {
    pub backend: FakeBackend,
    pub base_url: String,
    pub identity: Arc<TokenIdentity>,
    pub api: ApiClient,
}

impl TestServer {
    pub async fn start(backend: FakeBackend) -> Self {
        let app = router(backend.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let base_url = format!("http://{addr}/api/v1");
        let identity = Arc::new(TokenIdentity::signed_in(AuthUser::new(UID), TOKEN));
        let api = ApiClient::with_timeout(&base_url, Duration::from_secs(5), identity.clone()).unwrap();

        Self {
            backend,
            base_url,
            identity,
            api,
        }
    }
}

fn router(backend: FakeBackend) -> Router {
    let api = Router::new()
        .route(
            "/users/me",
            get(get_profile).patch(update_profile).delete(delete_account),
        )
        .route("/users/me/stats", get(get_stats))
        .route("/cv/analyze", post(analyze))
        .route("/cv/optimize", post(optimize))
        .route("/cv/export", post(export))
        .route("/cover-letters/generate", post(generate_letter))
        .route("/cover-letters", get(list_letters))
        .route(
            "/cover-letters/:id",
            get(get_letter).put(update_letter).delete(delete_letter),
        )
        .route("/photos/enhance", post(enhance_photo))
        .route("/applications/", get(list_applications).post(create_application))
        .route(
            "/applications/:id",
            put(update_application).delete(delete_application),
        )
        .route("/subscriptions/checkout", post(checkout))
        .route("/subscriptions/portal", post(portal))
        .route("/subscriptions/plan-status", get(plan_status));

    Router::new()
        .nest("/api/v1", api)
        .layer(middleware::from_fn_with_state(backend.clone(), record_and_authorize))
        .with_state(backend)
}

/// Counts the request, applies injected failures and enforces the bearer
/// token everywhere except the anonymous-capable analyze endpoint.
async fn record_and_authorize(State(backend): State<FakeBackend>, req: Request, next: Next) -> Response {
    let path = req.uri().path().trim_start_matches("/api/v1").to_string();
    let key = format!("{} {}", req.method(), path);
    let auth = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let (failure, delay) = {
        let mut inner = backend.lock();
        *inner.hits.entry(key.clone()).or_default() += 1;
        inner.auth_headers.entry(key.clone()).or_default().push(auth.clone());
        (inner.failures.get(&key).cloned(), inner.delays.get(&key).copied())
    };

    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    if let Some((status, body)) = failure {
        let status = StatusCode::from_u16(status).unwrap();
        return (status, Json(body)).into_response();
    }

    let expected = format!("Bearer {TOKEN}");
    let authorized = auth.as_deref() == Some(expected.as_str());
    if !authorized && key != "POST /cv/analyze" {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "detail": "Not authenticated" })),
        )
            .into_response();
    }

    next.run(req).await
}

async fn read_form(mut multipart: Multipart) -> HashMap<String, String> {
    let mut fields = HashMap::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await.unwrap();
        match file_name {
            Some(file_name) => {
                fields.insert(format!("{name}.content_type"), content_type.unwrap_or_default());
                fields.insert(name, file_name);
            }
            None => {
                fields.insert(name, String::from_utf8_lossy(&data).into_owned());
            }
        }
    }
    fields
}

async fn get_profile(State(b): State<FakeBackend>) -> Json<Value> {
    Json(b.profile_json())
}

async fn update_profile(State(b): State<FakeBackend>, Json(body): Json<Value>) -> Json<Value> {
    {
        let mut inner = b.lock();
        if let Some(name) = body["display_name"].as_str() {
            inner.display_name = Some(name.to_string());
        }
        inner.bodies.insert("PATCH /users/me".into(), body);
    }
    Json(b.profile_json())
}

async fn delete_account() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn get_stats(State(b): State<FakeBackend>) -> Json<Value> {
    let inner = b.lock();
    Json(json!({
        "cv_count": 2,
        "letter_count": inner.letters.len(),
        "photo_count": 0,
        "application_count": inner.applications.len(),
        "latest_cv_score": 78,
        "completeness": {
            "has_cv": true,
            "has_photo": false,
            "has_letter": !inner.letters.is_empty(),
            "has_application": !inner.applications.is_empty()
        }
    }))
}

async fn analyze(State(b): State<FakeBackend>, headers: HeaderMap, multipart: Multipart) -> Json<Value> {
    let form = read_form(multipart).await;
    b.lock().forms.insert("POST /cv/analyze".into(), form);

    if headers.contains_key(header::AUTHORIZATION) {
        Json(json!({
            "id": "analysis-1",
            "user_id": UID,
            "overall_score": 72,
            "ats_compatibility": 65,
            "keyword_matches": [
                {"keyword": "rust", "found": true, "importance": "high"},
                {"keyword": "kubernetes", "found": false, "importance": "medium", "suggestion": "Mention your cluster work"}
            ],
            "missing_keywords": ["kubernetes"],
            "sections": [{"name": "Experience", "score": 70, "feedback": "Quantify impact", "suggestions": []}],
            "summary": "Strong backend profile with gaps in infrastructure keywords.",
            "improvement_tips": ["Add metrics to recent roles"]
        }))
    } else {
        Json(json!({
            "overall_score": 72,
            "preview_keywords": [{"keyword": "rust", "found": true, "importance": "high"}],
            "summary_preview": "Strong backend profile...",
            "upgrade_message": "Sign up to see the full analysis"
        }))
    }
}

async fn optimize(State(b): State<FakeBackend>, multipart: Multipart) -> Response {
    let form = read_form(multipart).await;
    b.lock().forms.insert("POST /cv/optimize".into(), form);
    if let Err(resp) = b.consume_use() {
        return resp;
    }
    Json(json!({
        "contact_name": "Ada Lovelace",
        "contact_email": "ada@example.com",
        "summary": "Backend engineer focused on reliable distributed systems.",
        "experience": [{
            "title": "Senior Engineer",
            "organization": "Analytical Engines Ltd",
            "period": "2020 - present",
            "bullets": ["Cut p99 latency by 40%"]
        }],
        "education": [],
        "skills": ["Rust", "Kubernetes"],
        "certifications": [],
        "estimated_score": 88
    }))
    .into_response()
}

async fn export(State(b): State<FakeBackend>, Json(body): Json<Value>) -> Response {
    b.lock().bodies.insert("POST /cv/export".into(), body);
    ([(header::CONTENT_TYPE, "application/pdf")], b"%PDF-1.4 fake".to_vec()).into_response()
}

async fn generate_letter(State(b): State<FakeBackend>, Json(body): Json<Value>) -> Response {
    b.lock().bodies.insert("POST /cover-letters/generate".into(), body.clone());
    if let Err(resp) = b.consume_use() {
        return resp;
    }
    let id = uuid::Uuid::new_v4().to_string();
    let content = format!(
        "Dear {} hiring team, I am excited to apply for the {} role.",
        body["company_name"].as_str().unwrap_or_default(),
        body["job_title"].as_str().unwrap_or_default()
    );
    let letter = letter_json(
        &id,
        body["job_title"].as_str().unwrap_or_default(),
        body["company_name"].as_str().unwrap_or_default(),
        body["tone"].as_str().unwrap_or("classic"),
        &content,
    );
    b.lock().letters.insert(0, letter.clone());
    Json(letter).into_response()
}

async fn list_letters(
    State(b): State<FakeBackend>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    let mut inner = b.lock();
    inner.queries.insert("GET /cover-letters".into(), query);
    Json(Value::Array(inner.letters.iter().map(list_item).collect()))
}

async fn get_letter(State(b): State<FakeBackend>, Path(id): Path<String>) -> Response {
    match b.letter(&id) {
        Some(letter) => Json(letter).into_response(),
        None => not_found("Cover letter"),
    }
}

async fn update_letter(
    State(b): State<FakeBackend>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let mut inner = b.lock();
    let Some(letter) = inner.letters.iter_mut().find(|l| l["id"] == id.as_str()) else {
        return not_found("Cover letter");
    };
    let content = body["content"].as_str().unwrap_or_default().to_string();
    letter["word_count"] = json!(content.split_whitespace().count());
    letter["content"] = json!(content);
    Json(letter.clone()).into_response()
}

async fn delete_letter(State(b): State<FakeBackend>, Path(id): Path<String>) -> Response {
    let mut inner = b.lock();
    let before = inner.letters.len();
    inner.letters.retain(|l| l["id"] != id.as_str());
    if inner.letters.len() == before {
        return not_found("Cover letter");
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn enhance_photo(State(b): State<FakeBackend>, multipart: Multipart) -> Response {
    let form = read_form(multipart).await;
    b.lock().forms.insert("POST /photos/enhance".into(), form);
    if let Err(resp) = b.consume_use() {
        return resp;
    }
    ([(header::CONTENT_TYPE, "image/png")], b"\x89PNG enhanced".to_vec()).into_response()
}

async fn list_applications(
    State(b): State<FakeBackend>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    let mut inner = b.lock();
    inner.queries.insert("GET /applications/".into(), query);
    Json(Value::Array(inner.applications.clone()))
}

async fn create_application(State(b): State<FakeBackend>, Json(body): Json<Value>) -> Json<Value> {
    let mut app = body.clone();
    app["id"] = json!(uuid::Uuid::new_v4().to_string());
    app["user_id"] = json!(UID);
    let mut inner = b.lock();
    inner.bodies.insert("POST /applications/".into(), body);
    inner.applications.push(app.clone());
    Json(app)
}

async fn update_application(
    State(b): State<FakeBackend>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let mut inner = b.lock();
    inner
        .bodies
        .insert(format!("PUT /applications/{id}"), body.clone());
    let Some(app) = inner.applications.iter_mut().find(|a| a["id"] == id.as_str()) else {
        return not_found("Application");
    };
    if let (Some(target), Some(fields)) = (app.as_object_mut(), body.as_object()) {
        for (k, v) in fields {
            target.insert(k.clone(), v.clone());
        }
    }
    Json(app.clone()).into_response()
}

async fn delete_application(State(b): State<FakeBackend>, Path(id): Path<String>) -> Response {
    let mut inner = b.lock();
    let before = inner.applications.len();
    inner.applications.retain(|a| a["id"] != id.as_str());
    if inner.applications.len() == before {
        return not_found("Application");
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn checkout(State(b): State<FakeBackend>, Json(body): Json<Value>) -> Json<Value> {
    b.lock().bodies.insert("POST /subscriptions/checkout".into(), body);
    Json(json!({
        "checkout_url": "https://checkout.example.com/c/session-1",
        "session_id": "session-1"
    }))
}

async fn portal(
    State(b): State<FakeBackend>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    let return_url = query.get("return_url").cloned().unwrap_or_default();
    b.lock().queries.insert("POST /subscriptions/portal".into(), query);
    Json(json!({ "portal_url": format!("https://billing.example.com/p/session-1?return={return_url}") }))
}

async fn plan_status(State(b): State<FakeBackend>) -> Json<Value> {
    let inner = b.lock();
    Json(json!({
        "plan": if inner.premium { "premium" } else { "free" },
        "subscription_status": if inner.premium { "active" } else { "none" },
        "free_uses_remaining": inner.free_uses,
        "cancel_at_period_end": false
    }))
}

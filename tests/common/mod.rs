// SPDX-License-Identifier: MIT

//! Shared test fixtures: an in-process stub of the view-counter service.

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Mutable stub backend shared between the server and the test body.
pub struct StubCounter {
    pub password: String,
    /// The bearer token /login hands out and /views expects. Tests swap it
    /// to simulate server-side revocation.
    pub token: Mutex<String>,
    /// Expiry reported by /login. Kept in epoch *seconds* so the client's
    /// unit normalization is exercised.
    pub expires_at: Mutex<i64>,
    pub counts: Mutex<HashMap<String, u64>>,
    pub views: Mutex<Vec<Value>>,
    /// Whether /hit reports the visit as unique.
    pub hit_unique: AtomicBool,
    /// Force every counter endpoint to return HTTP 500.
    pub fail_all: AtomicBool,
    pub hit_requests: AtomicUsize,
    pub count_requests: AtomicUsize,
    pub views_requests: AtomicUsize,
    /// name -> (content type, body) served under /img/{name}
    pub images: Mutex<HashMap<String, (String, Vec<u8>)>>,
    pub image_requests: AtomicUsize,
}

impl StubCounter {
    fn new() -> Self {
        Self {
            password: "open-sesame".to_string(),
            token: Mutex::new("stub-token".to_string()),
            expires_at: Mutex::new(chrono::Utc::now().timestamp() + 3600),
            counts: Mutex::new(HashMap::new()),
            views: Mutex::new(Vec::new()),
            hit_unique: AtomicBool::new(true),
            fail_all: AtomicBool::new(false),
            hit_requests: AtomicUsize::new(0),
            count_requests: AtomicUsize::new(0),
            views_requests: AtomicUsize::new(0),
            images: Mutex::new(HashMap::new()),
            image_requests: AtomicUsize::new(0),
        }
    }

    #[allow(dead_code)]
    pub fn set_count(&self, namespace: &str, page: &str, count: u64) {
        self.counts
            .lock()
            .unwrap()
            .insert(format!("{}:{}", namespace, page), count);
    }

    #[allow(dead_code)]
    pub fn set_views(&self, views: Vec<Value>) {
        *self.views.lock().unwrap() = views;
    }

    #[allow(dead_code)]
    pub fn revoke_token(&self) {
        *self.token.lock().unwrap() = format!("revoked-{}", chrono::Utc::now().timestamp_millis());
    }

    #[allow(dead_code)]
    pub fn add_image(&self, name: &str, content_type: &str, body: Vec<u8>) {
        self.images
            .lock()
            .unwrap()
            .insert(name.to_string(), (content_type.to_string(), body));
    }
}

#[derive(Deserialize)]
struct PageQuery {
    namespace: String,
    page: String,
}

fn page_key(q: &PageQuery) -> String {
    format!("{}:{}", q.namespace, q.page)
}

async fn count_handler(
    State(s): State<Arc<StubCounter>>,
    Query(q): Query<PageQuery>,
) -> Result<Json<Value>, StatusCode> {
    s.count_requests.fetch_add(1, Ordering::SeqCst);
    if s.fail_all.load(Ordering::SeqCst) {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }
    let count = s
        .counts
        .lock()
        .unwrap()
        .get(&page_key(&q))
        .copied()
        .unwrap_or(0);
    Ok(Json(json!({ "count": count })))
}

async fn hit_handler(
    State(s): State<Arc<StubCounter>>,
    Query(q): Query<PageQuery>,
) -> Result<Json<Value>, StatusCode> {
    s.hit_requests.fetch_add(1, Ordering::SeqCst);
    if s.fail_all.load(Ordering::SeqCst) {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }
    let mut counts = s.counts.lock().unwrap();
    let count = counts.entry(page_key(&q)).or_insert(0);
    *count += 1;
    Ok(Json(json!({
        "count": *count,
        "unique": s.hit_unique.load(Ordering::SeqCst),
    })))
}

async fn login_handler(
    State(s): State<Arc<StubCounter>>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    if s.fail_all.load(Ordering::SeqCst) {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }
    let password = body.get("password").and_then(|v| v.as_str()).unwrap_or("");
    if password != s.password {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(Json(json!({
        "token": s.token.lock().unwrap().clone(),
        "expiresAt": *s.expires_at.lock().unwrap(),
    })))
}

async fn views_handler(
    State(s): State<Arc<StubCounter>>,
    Query(q): Query<PageQuery>,
    headers: HeaderMap,
) -> Result<Json<Value>, StatusCode> {
    s.views_requests.fetch_add(1, Ordering::SeqCst);
    if s.fail_all.load(Ordering::SeqCst) {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }
    let expected = format!("Bearer {}", s.token.lock().unwrap());
    let presented = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if presented != expected {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(Json(json!({
        "namespace": q.namespace,
        "page": q.page,
        "views": s.views.lock().unwrap().clone(),
    })))
}

async fn image_handler(
    State(s): State<Arc<StubCounter>>,
    Path(name): Path<String>,
) -> Result<([(header::HeaderName, String); 1], Vec<u8>), StatusCode> {
    s.image_requests.fetch_add(1, Ordering::SeqCst);
    let images = s.images.lock().unwrap();
    let (content_type, body) = images.get(&name).ok_or(StatusCode::NOT_FOUND)?;
    Ok(([(header::CONTENT_TYPE, content_type.clone())], body.clone()))
}

/// Start the stub on an ephemeral port. Returns its base URL and state.
#[allow(dead_code)]
pub async fn spawn_stub() -> (String, Arc<StubCounter>) {
    let state = Arc::new(StubCounter::new());
    let app = Router::new()
        .route("/count", get(count_handler))
        .route("/hit", get(hit_handler))
        .route("/login", post(login_handler))
        .route("/views", get(views_handler))
        .route("/img/{name}", get(image_handler))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub listener");
    let addr = listener.local_addr().expect("stub local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("stub serve");
    });

    (format!("http://{}", addr), state)
}

//! In-process stand-in for the backend service, for tests.

use crate::glyph::GlyphRenderer;
use axum::Router;
use axum::extract::{Multipart, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// DejaVu Sans (Bitstream Vera license, see `tests/fixtures/DejaVuSans.LICENSE`).
pub(crate) const FONT: &[u8] =
    include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/DejaVuSans.ttf"));

pub(crate) fn glyph_renderer() -> GlyphRenderer {
    GlyphRenderer::from_bytes(FONT.to_vec()).unwrap()
}

#[derive(Clone, Default)]
pub(crate) struct FakeBackend {
    uploads: Arc<Mutex<Vec<(String, Vec<u8>)>>>,
    texts: Arc<Mutex<Vec<Value>>>,
    fetched: Arc<Mutex<Vec<String>>>,
    reject_uploads: Arc<AtomicBool>,
}

impl FakeBackend {
    /// Serve on an ephemeral port and return its base URL.
    pub(crate) async fn spawn(&self) -> String {
        let app = Router::new()
            .route("/scan", get(scan))
            .route("/connect", post(connect))
            .route("/disconnect", post(ack))
            .route("/upload", post(upload))
            .route("/fetch-url", post(fetch_url))
            .route("/status", get(status))
            .route("/text", post(text))
            .route("/sync-time", post(ack))
            .route("/clock-mode", post(ack))
            .route("/search", get(search))
            .with_state(self.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    pub(crate) fn uploads(&self) -> Vec<(String, Vec<u8>)> {
        self.uploads.lock().unwrap().clone()
    }

    pub(crate) fn texts(&self) -> Vec<Value> {
        self.texts.lock().unwrap().clone()
    }

    pub(crate) fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }

    pub(crate) fn reject_uploads(&self) {
        self.reject_uploads.store(true, Ordering::SeqCst);
    }
}

async fn scan() -> Json<Value> {
    Json(json!({
        "devices": [{ "name": "IDM-4C1F", "address": "AA:BB", "rssi": -62 }]
    }))
}

async fn connect(Json(body): Json<Value>) -> Response {
    match body["address"].as_str() {
        Some("AA:BB") => Json(json!({ "status": "connected", "success": true })).into_response(),
        Some("refuse") => Json(json!({ "status": "connected", "success": false })).into_response(),
        Some(other) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "detail": format!("Device {other} not found during connect scan.") })),
        )
            .into_response(),
        None => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "detail": "Address is required" })),
        )
            .into_response(),
    }
}

async fn ack() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn upload(State(backend): State<FakeBackend>, mut multipart: Multipart) -> Response {
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() != Some("file") {
            continue;
        }
        let name = field.file_name().unwrap_or("").to_string();
        let data = field.bytes().await.unwrap().to_vec();
        let size = data.len();
        backend.uploads.lock().unwrap().push((name, data));

        let status = if backend.reject_uploads.load(Ordering::SeqCst) {
            "queued"
        } else {
            "uploaded"
        };
        return Json(json!({ "status": status, "size": size })).into_response();
    }
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({ "detail": "file field missing" })),
    )
        .into_response()
}

async fn fetch_url(State(backend): State<FakeBackend>, Json(body): Json<Value>) -> Response {
    let url = body["url"].as_str().unwrap_or_default().to_string();
    if url.contains("broken") {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "detail": "Failed to fetch or process URL: 404" })),
        )
            .into_response();
    }
    backend.fetched.lock().unwrap().push(url);
    Json(json!({ "status": "uploaded_from_url" })).into_response()
}

async fn status() -> Json<Value> {
    Json(json!({ "connected": true }))
}

async fn text(State(backend): State<FakeBackend>, Json(body): Json<Value>) -> Json<Value> {
    backend.texts.lock().unwrap().push(body);
    Json(json!({ "status": "ok" }))
}

async fn search(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let q = params.get("q").cloned().unwrap_or_default();
    Json(json!([{ "url": format!("https://gifs.example/{}.gif", q.replace(' ', "-")), "title": q }]))
}

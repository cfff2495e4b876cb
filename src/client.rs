//! Backend REST client.
//!
//! The backend owns the Bluetooth link, device protocol, and any
//! server-side image work (URL fetch, GIF handling, text/clock encoding).
//! This client is a typed wrapper over its endpoints; it never retries.

use crate::Color;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

/// `status` value the backend returns after a successful `/upload`.
const STATUS_UPLOADED: &str = "uploaded";

/// `status` value the backend returns after a successful `/fetch-url`.
const STATUS_UPLOADED_FROM_URL: &str = "uploaded_from_url";

// ── Errors ──────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Backend unreachable, timed out, or sent an unreadable body.
    #[error("backend request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-2xx status.
    #[error("backend error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Backend answered 2xx but reported that the action did not happen.
    #[error("backend rejected the request: {0}")]
    Rejected(String),
}

// ── Wire types ──────────────────────────────────────────────────────

/// A display found by `/scan`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Device {
    #[schema(example = "IDM-4C1F")]
    pub name: String,
    #[schema(example = "AA:BB:CC:DD:EE:FF")]
    pub address: String,
    /// Signal strength in dBm.
    #[schema(example = -62)]
    pub rssi: i32,
}

#[derive(Debug, Deserialize)]
struct ScanResponse {
    #[serde(default)]
    devices: Vec<Device>,
}

#[derive(Debug, Deserialize)]
struct ConnectResponse {
    #[serde(default)]
    success: bool,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    #[serde(default)]
    status: Option<String>,
}

/// A GIF search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SearchResult {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// `/search` has been seen returning both a bare list and a wrapped one.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SearchResponse {
    List(Vec<SearchResult>),
    Wrapped { results: Vec<SearchResult> },
}

#[derive(Serialize)]
struct AddressBody<'a> {
    address: &'a str,
}

#[derive(Serialize)]
struct UrlBody<'a> {
    url: &'a str,
}

#[derive(Serialize)]
struct TextBody<'a> {
    text: &'a str,
    color: Color,
}

/// FastAPI puts error text in `detail`.
#[derive(Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

// ── Client ──────────────────────────────────────────────────────────

/// Cheap to clone: `reqwest::Client` is an `Arc` internally.
#[derive(Clone, Debug)]
pub struct BackendClient {
    base_url: String,
    http: reqwest::Client,
}

impl BackendClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET /scan
    pub async fn scan(&self) -> Result<Vec<Device>, ClientError> {
        let resp = self.http.get(self.url("/scan")).send().await?;
        let body: ScanResponse = parse(resp).await?;
        tracing::debug!("Scan found {} device(s)", body.devices.len());
        Ok(body.devices)
    }

    /// POST /connect
    pub async fn connect(&self, address: &str) -> Result<(), ClientError> {
        let resp = self
            .http
            .post(self.url("/connect"))
            .json(&AddressBody { address })
            .send()
            .await?;
        let body: ConnectResponse = parse(resp).await?;
        if !body.success {
            return Err(ClientError::Rejected(format!(
                "could not connect to {address}"
            )));
        }
        Ok(())
    }

    /// POST /disconnect
    pub async fn disconnect(&self) -> Result<(), ClientError> {
        let resp = self.http.post(self.url("/disconnect")).send().await?;
        parse::<serde_json::Value>(resp).await?;
        Ok(())
    }

    /// POST /upload — multipart with the image in field `file`.
    pub async fn upload(&self, png: Vec<u8>, file_name: &str) -> Result<(), ClientError> {
        let part = Part::bytes(png)
            .file_name(file_name.to_string())
            .mime_str("image/png")?;
        let form = Form::new().part("file", part);

        let resp = self
            .http
            .post(self.url("/upload"))
            .multipart(form)
            .send()
            .await?;
        let body: StatusResponse = parse(resp).await?;
        expect_status(body, STATUS_UPLOADED)
    }

    /// POST /fetch-url — the backend downloads, converts and sends the image.
    pub async fn fetch_url(&self, url: &str) -> Result<(), ClientError> {
        let resp = self
            .http
            .post(self.url("/fetch-url"))
            .json(&UrlBody { url })
            .send()
            .await?;
        let body: StatusResponse = parse(resp).await?;
        expect_status(body, STATUS_UPLOADED_FROM_URL)
    }

    /// GET /status — passed through untouched; its shape belongs to the backend.
    pub async fn status(&self) -> Result<serde_json::Value, ClientError> {
        let resp = self.http.get(self.url("/status")).send().await?;
        parse(resp).await
    }

    /// POST /text
    pub async fn send_text(&self, text: &str, color: Color) -> Result<(), ClientError> {
        let resp = self
            .http
            .post(self.url("/text"))
            .json(&TextBody { text, color })
            .send()
            .await?;
        parse::<serde_json::Value>(resp).await?;
        Ok(())
    }

    /// POST /sync-time
    pub async fn sync_time(&self) -> Result<(), ClientError> {
        let resp = self.http.post(self.url("/sync-time")).send().await?;
        parse::<serde_json::Value>(resp).await?;
        Ok(())
    }

    /// POST /clock-mode
    pub async fn clock_mode(&self) -> Result<(), ClientError> {
        let resp = self.http.post(self.url("/clock-mode")).send().await?;
        parse::<serde_json::Value>(resp).await?;
        Ok(())
    }

    /// GET /search?q=
    pub async fn search(&self, query: &str) -> Result<Vec<SearchResult>, ClientError> {
        let resp = self
            .http
            .get(self.url("/search"))
            .query(&[("q", query)])
            .send()
            .await?;
        let results = match parse::<SearchResponse>(resp).await? {
            SearchResponse::List(results) => results,
            SearchResponse::Wrapped { results } => results,
        };
        Ok(results)
    }
}

/// Map non-2xx to [`ClientError::Api`], otherwise decode JSON.
async fn parse<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ClientError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ClientError::Api {
            status: status.as_u16(),
            message: error_message(&body),
        });
    }
    Ok(resp.json().await?)
}

fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            detail: serde_json::Value::String(s),
        }) => s,
        Ok(ErrorBody { detail }) => detail.to_string(),
        Err(_) if body.trim().is_empty() => "no details".to_string(),
        Err(_) => body.trim().to_string(),
    }
}

fn expect_status(body: StatusResponse, expected: &str) -> Result<(), ClientError> {
    match body.status.as_deref() {
        Some(s) if s == expected => Ok(()),
        Some(other) => Err(ClientError::Rejected(format!(
            "expected status {expected:?}, got {other:?}"
        ))),
        None => Err(ClientError::Rejected(format!(
            "expected status {expected:?}, got none"
        ))),
    }
}

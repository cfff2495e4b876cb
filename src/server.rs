//! HTTP API server: axum router and request handlers.
//!
//! Every user action of the panel is one endpoint. Grid editing is local;
//! anything that reaches the device goes through [`BackendClient`] and is
//! gated by the [`DeviceSession`].
//!
//! ## Rust concepts
//! - axum extractors: `State`, `Json`, `Query`, raw `Request`
//! - `Arc<Mutex<T>>` for the editor, locked only around synchronous work and
//!   never held across an `.await`
//! - `spawn_blocking` to keep image decoding off the async runtime
//! - `tower-http` middleware for CORS and request tracing

use crate::client::{BackendClient, Device, SearchResult};
use crate::editor::{Editor, Tool};
use crate::error::PanelError;
use crate::export::{self, DRAWING_FILE_NAME, EMOJI_FILE_NAME, IMAGE_FILE_NAME};
use crate::glyph::{DEFAULT_GLYPH_COLOR, GlyphRenderer};
use crate::grid::PixelGrid;
use crate::presets::{self, PRESETS, Preset};
use crate::raster::Rasterizer;
use crate::session::{Action, DeviceSession};
use crate::{Color, PALETTE};
use axum::Router;
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, FromRequest, Multipart, Query, Request, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Largest image body accepted for rasterization.
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Longest scrolling text the panel will forward.
pub const MAX_TEXT_CHARS: usize = 50;

type ApiResult<T> = Result<Json<T>, PanelError>;

// ── App State ────────────────────────────────────────────────────────

/// Shared application state, passed to every handler via axum's `State`
/// extractor. Cloned per request, so everything inside is an `Arc` or
/// cheap to copy.
#[derive(Clone)]
pub struct AppState {
    /// The pixel editor (grid + tool + drag state)
    pub editor: Arc<Mutex<Editor>>,
    /// Connection flag, busy flags, cancellation scope
    pub session: Arc<DeviceSession>,
    /// Backend that owns the device
    pub client: BackendClient,
    /// Image → grid conversion settings
    pub rasterizer: Rasterizer,
    /// Emoji renderer, if a font was configured
    pub glyphs: Option<Arc<GlyphRenderer>>,
}

impl AppState {
    pub fn new(client: BackendClient, rasterizer: Rasterizer, glyphs: Option<GlyphRenderer>) -> Self {
        Self {
            editor: Arc::new(Mutex::new(Editor::new())),
            session: Arc::new(DeviceSession::new()),
            client,
            rasterizer,
            glyphs: glyphs.map(Arc::new),
        }
    }

    fn editor(&self) -> MutexGuard<'_, Editor> {
        self.editor.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn glyphs(&self) -> Result<&GlyphRenderer, PanelError> {
        self.glyphs.as_deref().ok_or(PanelError::NoFont)
    }
}

// ── OpenAPI Documentation ────────────────────────────────────────────

#[derive(OpenApi)]
#[openapi(
    paths(
        get_status,
        get_palette,
        get_presets,
        get_devices,
        post_connect,
        post_disconnect,
        get_grid,
        post_grid_clear,
        post_grid_pointer,
        post_grid_tool,
        post_grid_image,
        post_grid_emoji,
        get_grid_png,
        post_grid_send,
        post_display_image,
        post_display_emoji,
        post_display_url,
        post_display_text,
        post_clock_sync,
        post_clock_mode,
        get_search,
    ),
    components(schemas(
        PanelStatus,
        ActionResult,
        PointerChange,
        ToolState,
        ConnectRequest,
        PointerRequest,
        PointerEvent,
        ToolRequest,
        EmojiRequest,
        UrlRequest,
        TextRequest,
        Tool,
        Action,
        Device,
        SearchResult,
        Preset,
    )),
    tags(
        (name = "device", description = "Scanning and connection"),
        (name = "grid", description = "Pixel editor"),
        (name = "display", description = "Send content to the display"),
        (name = "clock", description = "Device clock"),
        (name = "system", description = "Panel status and static data"),
    ),
    info(
        title = "Pixel Panel API",
        version = env!("CARGO_PKG_VERSION"),
        description = "Control panel for a 32x32 LED matrix"
    )
)]
pub struct ApiDoc;

// ── Request/Response types ───────────────────────────────────────────

#[derive(Serialize, utoipa::ToSchema)]
pub struct PanelStatus {
    /// Whether a device is connected
    pub connected: bool,
    /// Actions currently in flight
    pub busy: Vec<Action>,
    pub tool: Tool,
    /// Pencil color
    #[schema(value_type = String, example = "#FF0000")]
    pub color: Color,
    /// Whether a drag-paint stroke is in progress
    pub drawing: bool,
    /// Cells that are not background
    pub lit_cells: usize,
    /// Emoji rendering available (a font is loaded)
    pub emoji: bool,
    pub backend_url: String,
    pub version: String,
}

/// User-facing outcome of an action.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ActionResult {
    #[schema(example = "Sent to display!")]
    pub message: String,
}

impl ActionResult {
    fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: message.into(),
        })
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct PointerChange {
    /// Whether a cell changed color
    pub changed: bool,
    /// Whether a stroke is in progress after this event
    pub drawing: bool,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ToolState {
    pub tool: Tool,
    #[schema(value_type = String, example = "#FF0000")]
    pub color: Color,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct ConnectRequest {
    /// Device address as reported by the scan
    #[schema(example = "AA:BB:CC:DD:EE:FF")]
    address: String,
}

#[derive(Clone, Copy, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PointerEvent {
    Down,
    Enter,
    Up,
    Leave,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct PointerRequest {
    event: PointerEvent,
    /// Row of the cell under the pointer (required for down/enter)
    #[schema(example = 0, minimum = 0, maximum = 31)]
    row: Option<usize>,
    /// Column of the cell under the pointer (required for down/enter)
    #[schema(example = 0, minimum = 0, maximum = 31)]
    col: Option<usize>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct ToolRequest {
    /// Switch tool. Picking a color switches to the pencil.
    tool: Option<Tool>,
    #[schema(value_type = Option<String>, example = "#00FF00")]
    color: Option<Color>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct EmojiRequest {
    #[schema(example = "😀")]
    emoji: String,
    /// Fill color, defaults to white
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "#FFFFFF")]
    color: Option<Color>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct UrlRequest {
    /// Image or GIF URL for the backend to fetch
    #[schema(example = "https://media.giphy.com/media/d9QiBcfem5Mh8o/giphy.gif")]
    url: Option<String>,
    /// Name of a built-in preset, used when `url` is absent
    #[schema(example = "Pacman")]
    preset: Option<String>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct TextRequest {
    #[schema(example = "Hello World!")]
    text: String,
    #[serde(default = "default_text_color")]
    #[schema(value_type = String, example = "#FFFFFF", default = "#FFFFFF")]
    color: Color,
}

fn default_text_color() -> Color {
    Color::new(0xFF, 0xFF, 0xFF)
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// Search terms
    q: String,
}

// ── Router ───────────────────────────────────────────────────────────

/// Build the axum router with all API endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(
            SwaggerUi::new("/docs")
                .url("/api-docs/openapi.json", ApiDoc::openapi())
                .config(utoipa_swagger_ui::Config::new(["/api-docs/openapi.json"]).validator_url("none")),
        )
        .route("/api/v1/status", get(get_status))
        .route("/api/v1/palette", get(get_palette))
        .route("/api/v1/presets", get(get_presets))
        .route("/api/v1/devices", get(get_devices))
        .route("/api/v1/devices/connect", post(post_connect))
        .route("/api/v1/devices/disconnect", post(post_disconnect))
        .route("/api/v1/grid", get(get_grid))
        .route("/api/v1/grid/clear", post(post_grid_clear))
        .route("/api/v1/grid/pointer", post(post_grid_pointer))
        .route("/api/v1/grid/tool", post(post_grid_tool))
        .route("/api/v1/grid/image", post(post_grid_image))
        .route("/api/v1/grid/emoji", post(post_grid_emoji))
        .route("/api/v1/grid/png", get(get_grid_png))
        .route("/api/v1/grid/send", post(post_grid_send))
        .route("/api/v1/display/image", post(post_display_image))
        .route("/api/v1/display/emoji", post(post_display_emoji))
        .route("/api/v1/display/url", post(post_display_url))
        .route("/api/v1/display/text", post(post_display_text))
        .route("/api/v1/clock/sync", post(post_clock_sync))
        .route("/api/v1/clock/mode", post(post_clock_mode))
        .route("/api/v1/search", get(get_search))
        .layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ── System ───────────────────────────────────────────────────────────

/// GET /api/v1/status — connection, busy actions and editor state
#[utoipa::path(
    get,
    path = "/api/v1/status",
    tag = "system",
    responses(
        (status = 200, description = "Current panel status", body = PanelStatus)
    )
)]
async fn get_status(State(state): State<AppState>) -> Json<PanelStatus> {
    let editor = state.editor();
    Json(PanelStatus {
        connected: state.session.is_connected(),
        busy: state.session.busy_actions(),
        tool: editor.tool(),
        color: editor.selected_color(),
        drawing: editor.is_drawing(),
        lit_cells: editor.grid().lit_count(),
        emoji: state.glyphs.is_some(),
        backend_url: state.client.base_url().to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /api/v1/palette — the fixed drawing palette
#[utoipa::path(
    get,
    path = "/api/v1/palette",
    tag = "system",
    responses(
        (status = 200, description = "Palette colors as #RRGGBB", body = Vec<String>)
    )
)]
async fn get_palette() -> Json<Vec<Color>> {
    Json(PALETTE.to_vec())
}

/// GET /api/v1/presets — built-in gallery
#[utoipa::path(
    get,
    path = "/api/v1/presets",
    tag = "system",
    responses(
        (status = 200, description = "Preset gallery", body = Vec<Preset>)
    )
)]
async fn get_presets() -> Json<&'static [Preset]> {
    Json(PRESETS)
}

// ── Device ───────────────────────────────────────────────────────────

/// GET /api/v1/devices — scan for displays
#[utoipa::path(
    get,
    path = "/api/v1/devices",
    tag = "device",
    responses(
        (status = 200, description = "Devices found", body = Vec<Device>),
        (status = 409, description = "A scan is already running"),
        (status = 502, description = "Backend failed")
    )
)]
async fn get_devices(State(state): State<AppState>) -> ApiResult<Vec<Device>> {
    let guard = state.session.begin(Action::Scan)?;
    let devices = guard.run(state.client.scan()).await??;
    tracing::info!("Scan found {} device(s)", devices.len());
    Ok(Json(devices))
}

/// POST /api/v1/devices/connect — connect to a scanned device
#[utoipa::path(
    post,
    path = "/api/v1/devices/connect",
    tag = "device",
    request_body = ConnectRequest,
    responses(
        (status = 200, description = "Connected", body = ActionResult),
        (status = 409, description = "Already connecting, or cancelled by a disconnect"),
        (status = 502, description = "Backend could not connect")
    )
)]
async fn post_connect(
    State(state): State<AppState>,
    Json(req): Json<ConnectRequest>,
) -> ApiResult<ActionResult> {
    let address = req.address.trim();
    if address.is_empty() {
        return Err(PanelError::BadRequest("Address is required".to_string()));
    }

    let guard = state.session.begin(Action::Connect)?;
    guard.run(state.client.connect(address)).await??;

    state.session.set_connected(true);
    tracing::info!("Connected to {}", address);
    Ok(ActionResult::new(format!("Connected to {address}")))
}

/// POST /api/v1/devices/disconnect — drop the device and cancel in-flight work
#[utoipa::path(
    post,
    path = "/api/v1/devices/disconnect",
    tag = "device",
    responses(
        (status = 200, description = "Disconnected", body = ActionResult),
        (status = 502, description = "Backend failed")
    )
)]
async fn post_disconnect(State(state): State<AppState>) -> ApiResult<ActionResult> {
    state.session.cancel_in_flight();

    let guard = state.session.begin(Action::Disconnect)?;
    guard.run(state.client.disconnect()).await??;

    state.session.set_connected(false);
    tracing::info!("Disconnected");
    Ok(ActionResult::new("Disconnected"))
}

// ── Grid editing ─────────────────────────────────────────────────────

/// GET /api/v1/grid — current grid as 32 rows of 32 `#RRGGBB` strings
#[utoipa::path(
    get,
    path = "/api/v1/grid",
    tag = "grid",
    responses(
        (status = 200, description = "Current grid", body = Vec<Vec<String>>)
    )
)]
async fn get_grid(State(state): State<AppState>) -> Json<PixelGrid> {
    Json(state.editor().grid().clone())
}

/// POST /api/v1/grid/clear — reset every cell to background
#[utoipa::path(
    post,
    path = "/api/v1/grid/clear",
    tag = "grid",
    responses(
        (status = 200, description = "Grid cleared", body = ActionResult)
    )
)]
async fn post_grid_clear(State(state): State<AppState>) -> Json<ActionResult> {
    state.editor().clear();
    ActionResult::new("Cleared")
}

/// POST /api/v1/grid/pointer — pointer down/enter/up/leave over a cell
#[utoipa::path(
    post,
    path = "/api/v1/grid/pointer",
    tag = "grid",
    request_body = PointerRequest,
    responses(
        (status = 200, description = "Event applied", body = PointerChange),
        (status = 400, description = "Missing or out-of-range cell")
    )
)]
async fn post_grid_pointer(
    State(state): State<AppState>,
    Json(req): Json<PointerRequest>,
) -> ApiResult<PointerChange> {
    let cell = match (req.row, req.col) {
        (Some(row), Some(col)) => Some((row, col)),
        _ => None,
    };
    let missing_cell = || PanelError::BadRequest("row and col are required".to_string());

    let mut editor = state.editor();
    let changed = match req.event {
        PointerEvent::Down => {
            let (row, col) = cell.ok_or_else(missing_cell)?;
            editor.pointer_down(row, col)?
        }
        PointerEvent::Enter => {
            let (row, col) = cell.ok_or_else(missing_cell)?;
            editor.pointer_enter(row, col)?
        }
        PointerEvent::Up => {
            editor.pointer_up();
            false
        }
        PointerEvent::Leave => {
            editor.pointer_leave();
            false
        }
    };

    Ok(Json(PointerChange {
        changed,
        drawing: editor.is_drawing(),
    }))
}

/// POST /api/v1/grid/tool — choose pencil/eraser and pencil color
#[utoipa::path(
    post,
    path = "/api/v1/grid/tool",
    tag = "grid",
    request_body = ToolRequest,
    responses(
        (status = 200, description = "Tool updated", body = ToolState)
    )
)]
async fn post_grid_tool(
    State(state): State<AppState>,
    Json(req): Json<ToolRequest>,
) -> Json<ToolState> {
    let mut editor = state.editor();
    if let Some(tool) = req.tool {
        editor.set_tool(tool);
    }
    if let Some(color) = req.color {
        editor.select_color(color);
    }
    Json(ToolState {
        tool: editor.tool(),
        color: editor.selected_color(),
    })
}

/// POST /api/v1/grid/image — rasterize an image into the editor
///
/// Accepts the image as the raw body or as multipart field `file`.
#[utoipa::path(
    post,
    path = "/api/v1/grid/image",
    tag = "grid",
    request_body(content = Vec<u8>, content_type = "application/octet-stream", description = "PNG, JPEG, GIF, BMP or WebP"),
    responses(
        (status = 200, description = "Grid replaced by the rasterized image", body = Vec<Vec<String>>),
        (status = 413, description = "Image larger than 10 MiB"),
        (status = 422, description = "Image could not be decoded")
    )
)]
async fn post_grid_image(State(state): State<AppState>, req: Request) -> ApiResult<PixelGrid> {
    let bytes = read_image_body(req).await?;
    let grid = rasterize(state.rasterizer, bytes).await?;

    state.editor().load(grid.clone());
    tracing::info!("Loaded image into editor ({} lit cells)", grid.lit_count());
    Ok(Json(grid))
}

/// POST /api/v1/grid/emoji — render an emoji into the editor
#[utoipa::path(
    post,
    path = "/api/v1/grid/emoji",
    tag = "grid",
    request_body = EmojiRequest,
    responses(
        (status = 200, description = "Grid replaced by the rendered emoji", body = Vec<Vec<String>>),
        (status = 503, description = "No font configured")
    )
)]
async fn post_grid_emoji(
    State(state): State<AppState>,
    Json(req): Json<EmojiRequest>,
) -> ApiResult<PixelGrid> {
    let color = req.color.unwrap_or(DEFAULT_GLYPH_COLOR);
    let grid = state.glyphs()?.render(&req.emoji, color)?;

    state.editor().load(grid.clone());
    Ok(Json(grid))
}

/// GET /api/v1/grid/png — the grid exported as a 32×32 PNG
#[utoipa::path(
    get,
    path = "/api/v1/grid/png",
    tag = "grid",
    responses(
        (status = 200, description = "PNG image", content_type = "image/png", body = Vec<u8>)
    )
)]
async fn get_grid_png(State(state): State<AppState>) -> Result<Response, PanelError> {
    let grid = state.editor().grid().clone();
    let png = export::encode_png(&grid)?;
    Ok(([(header::CONTENT_TYPE, "image/png")], png).into_response())
}

/// POST /api/v1/grid/send — export the editor grid and upload it
#[utoipa::path(
    post,
    path = "/api/v1/grid/send",
    tag = "display",
    responses(
        (status = 200, description = "Uploaded", body = ActionResult),
        (status = 409, description = "Not connected or an upload is in progress"),
        (status = 502, description = "Backend failed")
    )
)]
async fn post_grid_send(State(state): State<AppState>) -> ApiResult<ActionResult> {
    let guard = state.session.begin(Action::Upload)?;

    // Snapshot under the lock; edits made during the upload go out next time.
    let grid = state.editor().grid().clone();
    let png = export::encode_png(&grid)?;

    guard.run(state.client.upload(png, DRAWING_FILE_NAME)).await??;
    tracing::info!("Uploaded drawing ({} lit cells)", grid.lit_count());
    Ok(ActionResult::new("Sent to display!"))
}

// ── Display ──────────────────────────────────────────────────────────

/// POST /api/v1/display/image — rasterize an image and upload it directly
///
/// The editor grid is left untouched.
#[utoipa::path(
    post,
    path = "/api/v1/display/image",
    tag = "display",
    request_body(content = Vec<u8>, content_type = "application/octet-stream", description = "PNG, JPEG, GIF, BMP or WebP"),
    responses(
        (status = 200, description = "Uploaded", body = ActionResult),
        (status = 409, description = "Not connected or an upload is in progress"),
        (status = 413, description = "Image larger than 10 MiB"),
        (status = 422, description = "Image could not be decoded"),
        (status = 502, description = "Backend failed")
    )
)]
async fn post_display_image(
    State(state): State<AppState>,
    req: Request,
) -> ApiResult<ActionResult> {
    let guard = state.session.begin(Action::Upload)?;

    let bytes = read_image_body(req).await?;
    let grid = rasterize(state.rasterizer, bytes).await?;
    let png = export::encode_png(&grid)?;

    guard.run(state.client.upload(png, IMAGE_FILE_NAME)).await??;
    tracing::info!("Uploaded image ({} lit cells)", grid.lit_count());
    Ok(ActionResult::new("Sent to display!"))
}

/// POST /api/v1/display/emoji — render an emoji and upload it directly
#[utoipa::path(
    post,
    path = "/api/v1/display/emoji",
    tag = "display",
    request_body = EmojiRequest,
    responses(
        (status = 200, description = "Uploaded", body = ActionResult),
        (status = 409, description = "Not connected or an upload is in progress"),
        (status = 503, description = "No font configured")
    )
)]
async fn post_display_emoji(
    State(state): State<AppState>,
    Json(req): Json<EmojiRequest>,
) -> ApiResult<ActionResult> {
    let guard = state.session.begin(Action::Upload)?;

    let color = req.color.unwrap_or(DEFAULT_GLYPH_COLOR);
    let grid = state.glyphs()?.render(&req.emoji, color)?;
    let png = export::encode_png(&grid)?;

    guard.run(state.client.upload(png, EMOJI_FILE_NAME)).await??;
    tracing::info!("Uploaded emoji {}", req.emoji);
    Ok(ActionResult::new("Sent to display!"))
}

/// POST /api/v1/display/url — have the backend fetch and show an image URL
#[utoipa::path(
    post,
    path = "/api/v1/display/url",
    tag = "display",
    request_body = UrlRequest,
    responses(
        (status = 200, description = "Backend fetched and uploaded the image", body = ActionResult),
        (status = 400, description = "Neither a URL nor a known preset given"),
        (status = 409, description = "Not connected or a fetch is in progress"),
        (status = 502, description = "Backend failed")
    )
)]
async fn post_display_url(
    State(state): State<AppState>,
    Json(req): Json<UrlRequest>,
) -> ApiResult<ActionResult> {
    let url = match (req.url.as_deref().map(str::trim), req.preset.as_deref()) {
        (Some(url), _) if !url.is_empty() => url.to_string(),
        (_, Some(name)) => presets::find(name)
            .map(|p| p.url.to_string())
            .ok_or_else(|| PanelError::BadRequest(format!("Unknown preset: {name}")))?,
        _ => return Err(PanelError::BadRequest("URL is required".to_string())),
    };

    let guard = state.session.begin(Action::FetchUrl)?;
    guard.run(state.client.fetch_url(&url)).await??;

    tracing::info!("Backend displayed {}", url);
    Ok(ActionResult::new("Sent to display!"))
}

/// POST /api/v1/display/text — scrolling text
#[utoipa::path(
    post,
    path = "/api/v1/display/text",
    tag = "display",
    request_body = TextRequest,
    responses(
        (status = 200, description = "Text sent", body = ActionResult),
        (status = 400, description = "Empty or too long"),
        (status = 409, description = "Not connected or text is being sent"),
        (status = 502, description = "Backend failed")
    )
)]
async fn post_display_text(
    State(state): State<AppState>,
    Json(req): Json<TextRequest>,
) -> ApiResult<ActionResult> {
    if req.text.trim().is_empty() {
        return Err(PanelError::BadRequest("Text is empty".to_string()));
    }
    if req.text.chars().count() > MAX_TEXT_CHARS {
        return Err(PanelError::BadRequest(format!(
            "Text is limited to {MAX_TEXT_CHARS} characters"
        )));
    }

    let guard = state.session.begin(Action::Text)?;
    guard.run(state.client.send_text(&req.text, req.color)).await??;

    tracing::info!("Sent text {:?} in {}", req.text, req.color);
    Ok(ActionResult::new("Text sent!"))
}

// ── Clock ────────────────────────────────────────────────────────────

/// POST /api/v1/clock/sync — set the device clock from the backend host
#[utoipa::path(
    post,
    path = "/api/v1/clock/sync",
    tag = "clock",
    responses(
        (status = 200, description = "Clock synced", body = ActionResult),
        (status = 409, description = "Not connected or already syncing"),
        (status = 502, description = "Backend failed")
    )
)]
async fn post_clock_sync(State(state): State<AppState>) -> ApiResult<ActionResult> {
    let guard = state.session.begin(Action::SyncTime)?;
    guard.run(state.client.sync_time()).await??;
    Ok(ActionResult::new("Clock synced"))
}

/// POST /api/v1/clock/mode — return the display to its clock face
#[utoipa::path(
    post,
    path = "/api/v1/clock/mode",
    tag = "clock",
    responses(
        (status = 200, description = "Clock mode enabled", body = ActionResult),
        (status = 409, description = "Not connected"),
        (status = 502, description = "Backend failed")
    )
)]
async fn post_clock_mode(State(state): State<AppState>) -> ApiResult<ActionResult> {
    let guard = state.session.begin(Action::ClockMode)?;
    guard.run(state.client.clock_mode()).await??;
    Ok(ActionResult::new("Clock mode on"))
}

// ── Search ───────────────────────────────────────────────────────────

/// GET /api/v1/search?q= — GIF search through the backend
#[utoipa::path(
    get,
    path = "/api/v1/search",
    tag = "display",
    params(SearchQuery),
    responses(
        (status = 200, description = "Search hits", body = Vec<SearchResult>),
        (status = 400, description = "Empty query"),
        (status = 502, description = "Backend failed")
    )
)]
async fn get_search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Vec<SearchResult>> {
    let q = query.q.trim();
    if q.is_empty() {
        return Err(PanelError::BadRequest("Search query is empty".to_string()));
    }

    let guard = state.session.begin(Action::Search)?;
    let results = guard.run(state.client.search(q)).await??;
    Ok(Json(results))
}

// ── Helpers ──────────────────────────────────────────────────────────

/// Pull image bytes out of a raw or `multipart/form-data` body.
///
/// Anything over [`MAX_IMAGE_BYTES`] is a [`PanelError::TooLarge`], whether
/// the declared `Content-Length` says so up front or the body limit trips
/// while reading.
async fn read_image_body(req: Request) -> Result<Bytes, PanelError> {
    let declared = req
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if declared.is_some_and(|len| len > MAX_IMAGE_BYTES) {
        return Err(PanelError::TooLarge {
            limit: MAX_IMAGE_BYTES,
        });
    }

    let is_multipart = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"));

    if !is_multipart {
        return Bytes::from_request(req, &())
            .await
            .map_err(|e| body_error(e.status(), e.body_text()));
    }

    let mut multipart = Multipart::from_request(req, &())
        .await
        .map_err(|e| body_error(e.status(), e.body_text()))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| body_error(e.status(), e.body_text()))?
    {
        if field.name() == Some("file") {
            return field
                .bytes()
                .await
                .map_err(|e| body_error(e.status(), e.body_text()));
        }
    }

    Err(PanelError::BadRequest(
        "Multipart body has no `file` field".to_string(),
    ))
}

fn body_error(status: StatusCode, text: String) -> PanelError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        PanelError::TooLarge {
            limit: MAX_IMAGE_BYTES,
        }
    } else {
        PanelError::BadRequest(text)
    }
}

/// Decode and rasterize on the blocking pool.
async fn rasterize(rasterizer: Rasterizer, bytes: Bytes) -> Result<PixelGrid, PanelError> {
    let grid = tokio::task::spawn_blocking(move || rasterizer.rasterize(&bytes))
        .await
        .map_err(|e| PanelError::Internal(format!("rasterizer task failed: {e}")))??;
    Ok(grid)
}

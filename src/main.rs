//! Pixel Panel HTTP server
//!
//! Serves the control panel API for a 32×32 LED matrix. Drawing, image
//! rasterization and emoji rendering happen here; everything that reaches
//! the device is forwarded to the backend service.
//!
//! ## Rust concepts
//! - `#[tokio::main]` async entry point
//! - `clap` derive with environment variable fallbacks
//! - graceful shutdown with `tokio::signal::ctrl_c`
//!
//! ## Usage
//! ```sh
//! ./target/release/pixel-panel --backend-url http://localhost:8000 --font fonts/NotoEmoji.ttf
//! ```

use clap::Parser;
use pixel_panel::client::{BackendClient, DEFAULT_BACKEND_URL};
use pixel_panel::glyph::GlyphRenderer;
use pixel_panel::raster::{Rasterizer, Resample};
use pixel_panel::server::{self, AppState};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Pixel Panel HTTP API Server
#[derive(Parser)]
#[command(name = "pixel-panel")]
#[command(about = "Control panel for a 32x32 LED matrix display")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(long, env = "PIXEL_PANEL_PORT", default_value = "8080")]
    port: u16,

    /// Base URL of the backend that owns the device
    #[arg(long, env = "PIXEL_PANEL_BACKEND_URL", default_value = DEFAULT_BACKEND_URL)]
    backend_url: String,

    /// TTF/OTF font used for emoji rendering. Emoji endpoints are disabled without it.
    #[arg(long, env = "PIXEL_PANEL_FONT")]
    font: Option<PathBuf>,

    /// Resampling filter used when shrinking images to 32×32
    #[arg(long, env = "PIXEL_PANEL_RESAMPLE", value_enum, default_value_t = Resample::Bilinear)]
    resample: Resample,

    /// Timeout for each backend request, in seconds
    #[arg(long, env = "PIXEL_PANEL_TIMEOUT_SECS", default_value = "30")]
    timeout_secs: u64,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_ansi(false) // journald doesn't want escape codes
        .compact()
        .init();

    let args = Args::parse();

    tracing::info!("Pixel Panel v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Backend: {}", args.backend_url);
    tracing::info!("Backend timeout: {}s", args.timeout_secs);

    let glyphs = match &args.font {
        Some(path) => match GlyphRenderer::from_file(path) {
            Ok(renderer) => {
                tracing::info!("Emoji font: {}", path.display());
                Some(renderer)
            }
            Err(e) => {
                tracing::warn!("Emoji rendering disabled: {}", e);
                None
            }
        },
        None => {
            tracing::info!("No --font given, emoji rendering disabled");
            None
        }
    };

    let client = BackendClient::new(&args.backend_url, Duration::from_secs(args.timeout_secs))?;
    let rasterizer = Rasterizer::new(args.resample);
    tracing::info!("Resample: {}", rasterizer.resample());

    let state = AppState::new(client, rasterizer, glyphs);
    let session = state.session.clone();

    let app = server::create_router(state);

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);
    tracing::info!("API Documentation: http://localhost:{}/docs", args.port);
    tracing::info!("Try: curl http://localhost:{}/api/v1/status", args.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Could not listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
            tracing::info!("Shutting down");
            session.shutdown();
        })
        .await?;

    Ok(())
}

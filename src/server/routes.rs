//! Router configuration.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health     - Health check with feature flags
//! GET  /features   - Capability discovery
//! POST /upload     - Inspect an upload
//! POST /process    - Transform, respond inline (base64 JSON)
//! POST /download   - Transform, respond as attachment
//! /                - JSON status, or the static frontend if configured
//! ```

use std::path::PathBuf;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Json, Router,
};
use http::header::CONTENT_TYPE;
use http::Method;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use super::handlers::{
    download_handler, features_handler, health_handler, process_handler, upload_handler, AppState,
};
use crate::pipeline::Processor;

/// Default maximum upload size: 50 MiB.
pub const DEFAULT_MAX_UPLOAD_SIZE: usize = 50 * 1024 * 1024;

// Multipart boundaries and headers take space beyond the file itself.
const BODY_LIMIT_HEADROOM: usize = 1024 * 1024;

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Clone)]
pub struct RouterConfig {
    /// Allowed CORS origins (None = allow any origin)
    pub cors_origins: Option<Vec<String>>,

    /// Maximum accepted upload size in bytes
    pub max_upload_size: usize,

    /// Directory with a static frontend to serve, if any
    pub static_dir: Option<PathBuf>,

    /// Whether to enable request tracing
    pub enable_tracing: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            cors_origins: None, // Allow any origin by default
            max_upload_size: DEFAULT_MAX_UPLOAD_SIZE,
            static_dir: None,
            enable_tracing: true,
        }
    }
}

impl RouterConfig {
    /// Configuration with defaults: any origin, 50 MiB uploads, tracing on.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set specific allowed CORS origins.
    ///
    /// Pass None (or don't call this method) to allow any origin.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    /// Set the maximum accepted upload size in bytes.
    pub fn with_max_upload_size(mut self, bytes: usize) -> Self {
        self.max_upload_size = bytes;
        self
    }

    /// Serve a static frontend from this directory, with SPA index fallback.
    pub fn with_static_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.static_dir = Some(dir.into());
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the application router.
///
/// Builds the complete Axum router with the API routes, CORS, a request
/// body limit sized to the upload limit, optional static file serving and
/// optional request tracing.
pub fn create_router(processor: Processor, config: RouterConfig) -> Router {
    let state = AppState::new(processor, config.max_upload_size);
    let cors = build_cors_layer(&config);

    let mut router = Router::new()
        .route("/health", get(health_handler))
        .route("/features", get(features_handler))
        .route("/upload", post(upload_handler))
        .route("/process", post(process_handler))
        .route("/download", post(download_handler));

    router = match &config.static_dir {
        Some(dir) => {
            // Unmatched paths fall through to the frontend, with index.html
            // as the SPA fallback.
            let serve = ServeDir::new(dir)
                .append_index_html_on_directories(true)
                .not_found_service(ServeFile::new(dir.join("index.html")));
            router.fallback_service(serve)
        }
        None => router.route("/", get(root_handler)),
    };

    let router = router
        .with_state(state)
        .layer(DefaultBodyLimit::max(
            config.max_upload_size + BODY_LIMIT_HEADROOM,
        ))
        .layer(cors);

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Root status response when no frontend is configured.
async fn root_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "message": "imgsquish is running (no frontend configured)",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Build the CORS layer based on configuration.
fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(86400)); // 24 hours

    match &config.cors_origins {
        None => cors.allow_origin(Any),
        Some(origins) => {
            let parsed: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            cors.allow_origin(parsed)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

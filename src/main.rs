//! imgsquish server binary.
//!
//! Parses configuration, wires up the processing pipeline and optional
//! background removal backend, and serves the HTTP API.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use imgsquish::{
    config::Config,
    pipeline::Processor,
    segment::{CommandSegmenter, ForegroundSegmenter},
    server::{create_router, RouterConfig},
};

/// Initialize the tracing subscriber.
///
/// Respects `RUST_LOG` when set, otherwise defaults to info level for the
/// crate and tower-http (debug when verbose).
fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "imgsquish=debug,tower_http=debug"
    } else {
        "imgsquish=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    init_logging(config.verbose);

    if let Err(message) = config.validate() {
        error!("Invalid configuration: {message}");
        return ExitCode::FAILURE;
    }

    info!("Starting imgsquish v{}", env!("CARGO_PKG_VERSION"));

    // Wire up the optional background removal backend.
    let processor = match config
        .segmenter_cmd
        .as_deref()
        .and_then(CommandSegmenter::from_command_line)
    {
        Some(segmenter) => {
            info!("Background removal enabled via '{}'", segmenter.program());
            Processor::with_segmenter(Arc::new(segmenter) as Arc<dyn ForegroundSegmenter>)
        }
        None => {
            warn!("No segmenter command configured, background removal is disabled");
            Processor::new()
        }
    };

    let mut router_config = RouterConfig::default()
        .with_max_upload_size(config.max_upload_size())
        .with_tracing(!config.no_tracing);
    if let Some(origins) = config.cors_origins.clone() {
        router_config = router_config.with_cors_origins(origins);
    }
    if let Some(dir) = config.static_dir.clone() {
        info!("Serving static frontend from {}", dir.display());
        router_config = router_config.with_static_dir(dir);
    }

    let app = create_router(processor, router_config);

    let bind_address = config.bind_address();
    let listener = match tokio::net::TcpListener::bind(&bind_address).await {
        Ok(listener) => listener,
        Err(err) => {
            error!("Failed to bind to {bind_address}: {err}");
            return ExitCode::FAILURE;
        }
    };

    info!("Listening on http://{bind_address}");
    info!("  Health check:  GET  /health");
    info!("  Features:      GET  /features");
    info!("  Upload:        POST /upload");
    info!("  Process:       POST /process");
    info!("  Download:      POST /download");

    if let Err(err) = axum::serve(listener, app).await {
        error!("Server error: {err}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

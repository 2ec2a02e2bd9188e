//! Configuration management.
//!
//! Supports command-line arguments via clap, environment variables with an
//! `IMGSQUISH_` prefix, and sensible defaults for all optional settings.
//!
//! # Environment Variables
//!
//! - `IMGSQUISH_HOST` - Server bind address (default: 0.0.0.0)
//! - `IMGSQUISH_PORT` - Server port (default: 8000)
//! - `IMGSQUISH_MAX_UPLOAD_MB` - Maximum upload size in MiB (default: 50)
//! - `IMGSQUISH_SEGMENTER_CMD` - External background removal command
//! - `IMGSQUISH_STATIC_DIR` - Directory with a static frontend
//! - `IMGSQUISH_CORS_ORIGINS` - Allowed CORS origins (comma-separated)

use std::path::PathBuf;

use clap::Parser;

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 8000;

/// Default maximum upload size in MiB.
pub const DEFAULT_MAX_UPLOAD_MB: usize = 50;

// =============================================================================
// CLI Arguments
// =============================================================================

/// imgsquish - an image compression and optimization service.
///
/// Accepts uploaded images over HTTP and returns them resized, converted
/// between JPEG/PNG/WebP, recompressed, and optionally with their
/// background removed by an external segmentation command.
#[derive(Parser, Debug, Clone)]
#[command(name = "imgsquish")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "IMGSQUISH_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "IMGSQUISH_PORT")]
    pub port: u16,

    // =========================================================================
    // Upload Configuration
    // =========================================================================
    /// Maximum accepted upload size in MiB.
    #[arg(long, default_value_t = DEFAULT_MAX_UPLOAD_MB, env = "IMGSQUISH_MAX_UPLOAD_MB")]
    pub max_upload_mb: usize,

    // =========================================================================
    // Background Removal Configuration
    // =========================================================================
    /// External command for foreground segmentation (PNG on stdin, PNG with
    /// alpha on stdout), e.g. "rembg i - -".
    ///
    /// When not set, background removal requests are rejected.
    #[arg(long, env = "IMGSQUISH_SEGMENTER_CMD")]
    pub segmenter_cmd: Option<String>,

    // =========================================================================
    // Frontend Configuration
    // =========================================================================
    /// Directory with a static frontend to serve at the root path.
    #[arg(long, env = "IMGSQUISH_STATIC_DIR")]
    pub static_dir: Option<PathBuf>,

    // =========================================================================
    // CORS Configuration
    // =========================================================================
    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, allows any origin.
    #[arg(long, env = "IMGSQUISH_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl Config {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_upload_mb == 0 {
            return Err("max_upload_mb must be greater than 0".to_string());
        }

        if let Some(ref cmd) = self.segmenter_cmd {
            if cmd.split_whitespace().next().is_none() {
                return Err(
                    "segmenter_cmd must not be empty. Unset it to disable background removal"
                        .to_string(),
                );
            }
        }

        if let Some(ref dir) = self.static_dir {
            if !dir.is_dir() {
                return Err(format!(
                    "static_dir '{}' does not exist or is not a directory",
                    dir.display()
                ));
            }
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Maximum upload size in bytes.
    pub fn max_upload_size(&self) -> usize {
        self.max_upload_mb * 1024 * 1024
    }
}

// =============================================================================
// Tests
// =============================================================================

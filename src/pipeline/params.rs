//! Processing parameters and validation.

use serde::Deserialize;

use crate::codec::TargetFormat;
use crate::error::ProcessError;

/// Default quality when the request doesn't specify one.
pub const DEFAULT_QUALITY: u8 = 80;

/// Minimum accepted quality.
pub const MIN_QUALITY: u8 = 1;

/// Maximum accepted quality.
pub const MAX_QUALITY: u8 = 100;

/// Maximum accepted width or height in pixels.
pub const MAX_DIMENSION: u32 = 10_000;

/// Immutable parameters for one processing request.
///
/// Deserializes directly from the query string of the process/download
/// endpoints. `format` is normalized to a canonical value (`jpg` collapses
/// into `jpeg`) before any decision logic can observe it.
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessingParams {
    /// Target width in pixels; absent means "keep original"
    #[serde(default)]
    pub width: Option<u32>,

    /// Target height in pixels; absent means "keep original"
    #[serde(default)]
    pub height: Option<u32>,

    /// Output format (jpeg, jpg, png, webp)
    #[serde(default = "default_format")]
    pub format: TargetFormat,

    /// Encoding quality (1-100)
    #[serde(default = "default_quality")]
    pub quality: u8,

    /// Derive missing/conflicting dimensions from the source aspect ratio
    #[serde(default = "default_true")]
    pub keep_aspect_ratio: bool,

    /// Run foreground segmentation before encoding
    #[serde(default)]
    pub remove_background: bool,
}

fn default_format() -> TargetFormat {
    TargetFormat::Webp
}

fn default_quality() -> u8 {
    DEFAULT_QUALITY
}

fn default_true() -> bool {
    true
}

impl Default for ProcessingParams {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            format: TargetFormat::Webp,
            quality: DEFAULT_QUALITY,
            keep_aspect_ratio: true,
            remove_background: false,
        }
    }
}

impl ProcessingParams {
    /// Parameters with all defaults (webp, quality 80, keep aspect ratio).
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_format(mut self, format: TargetFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    pub fn with_height(mut self, height: u32) -> Self {
        self.height = Some(height);
        self
    }

    pub fn with_keep_aspect_ratio(mut self, keep: bool) -> Self {
        self.keep_aspect_ratio = keep;
        self
    }

    pub fn with_remove_background(mut self, remove: bool) -> Self {
        self.remove_background = remove;
        self
    }

    /// Check all ranges: width/height 1-10000 (or absent), quality 1-100.
    pub fn validate(&self) -> Result<(), ProcessError> {
        for (name, value) in [("width", self.width), ("height", self.height)] {
            if let Some(v) = value {
                if v < 1 || v > MAX_DIMENSION {
                    return Err(ProcessError::InvalidParams {
                        message: format!("{} must be between 1 and {}, got {}", name, MAX_DIMENSION, v),
                    });
                }
            }
        }

        if self.quality < MIN_QUALITY || self.quality > MAX_QUALITY {
            return Err(ProcessError::InvalidParams {
                message: format!(
                    "quality must be between {} and {}, got {}",
                    MIN_QUALITY, MAX_QUALITY, self.quality
                ),
            });
        }

        Ok(())
    }
}

//! Codec adapter: decoding, encoding and pixel-mode conversion.
//!
//! This module wraps the `image` crate behind the small surface the
//! transformation pipeline needs:
//!
//! - [`decode`]: open arbitrary image bytes into a [`DecodedImage`]
//! - [`encode`]: encode a decoded image for a target format with
//!   format-specific parameters (quality, compression level, lossless)
//! - [`resize`]: high-quality Lanczos3 resampling
//! - [`inspect`]: metadata-only view of an upload for the inspection API
//!
//! # Components
//!
//! - [`DecodedImage`]: pixel buffer + dimensions + color mode + source format
//! - [`ColorMode`]: simplified pixel layout (rgb/rgba/grayscale/grayscale_alpha)
//! - [`TargetFormat`]: the three supported output formats with the `jpg` alias
//! - [`ImageInfo`]: the inspection record returned by the upload endpoint

mod convert;
mod encode;

pub use convert::{ensure_alpha, flatten_onto_white, resize};
pub use encode::{encode, encode_lossless_png, png_compression_level};

use std::io::Cursor;

use image::{ColorType, DynamicImage, ImageFormat, ImageReader};
use serde::{Deserialize, Serialize};

use crate::error::CodecError;

// =============================================================================
// Color Mode
// =============================================================================

/// Simplified pixel layout of a decoded image.
///
/// The decoder expands palette-indexed containers to RGB/RGBA before we ever
/// see the pixels, so no palette variant exists here; indexed sources take
/// the rgb/rgba paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    /// Three channels, no transparency
    Rgb,
    /// Four channels with per-pixel transparency
    Rgba,
    /// Single luminance channel
    Grayscale,
    /// Luminance plus per-pixel transparency
    GrayscaleAlpha,
}

impl ColorMode {
    /// Derive the mode from the decoded pixel type.
    pub fn from_color_type(color: ColorType) -> Self {
        match color {
            ColorType::L8 | ColorType::L16 => ColorMode::Grayscale,
            ColorType::La8 | ColorType::La16 => ColorMode::GrayscaleAlpha,
            ColorType::Rgb8 | ColorType::Rgb16 | ColorType::Rgb32F => ColorMode::Rgb,
            _ => ColorMode::Rgba,
        }
    }

    /// Lowercase name used in metadata responses.
    pub fn as_str(&self) -> &'static str {
        match self {
            ColorMode::Rgb => "rgb",
            ColorMode::Rgba => "rgba",
            ColorMode::Grayscale => "grayscale",
            ColorMode::GrayscaleAlpha => "grayscale_alpha",
        }
    }

    /// Whether the mode carries a transparency channel.
    pub fn has_alpha(&self) -> bool {
        matches!(self, ColorMode::Rgba | ColorMode::GrayscaleAlpha)
    }
}

impl std::fmt::Display for ColorMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Target Format
// =============================================================================

/// Output formats the service can encode.
///
/// `jpg` is accepted as an alias for `jpeg` in request parameters and is
/// normalized away before any decision logic runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetFormat {
    #[serde(alias = "jpg")]
    Jpeg,
    Png,
    Webp,
}

impl TargetFormat {
    /// Canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetFormat::Jpeg => "jpeg",
            TargetFormat::Png => "png",
            TargetFormat::Webp => "webp",
        }
    }

    /// MIME type for HTTP responses.
    pub fn content_type(&self) -> &'static str {
        match self {
            TargetFormat::Jpeg => "image/jpeg",
            TargetFormat::Png => "image/png",
            TargetFormat::Webp => "image/webp",
        }
    }
}

impl std::str::FromStr for TargetFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(TargetFormat::Jpeg),
            "png" => Ok(TargetFormat::Png),
            "webp" => Ok(TargetFormat::Webp),
            other => Err(format!(
                "unsupported format '{}' (expected jpeg, jpg, png or webp)",
                other
            )),
        }
    }
}

impl std::fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical lowercase name for a detected container format.
///
/// Normalizes the `jpg`/`jpeg` split the same way target formats are
/// normalized, so source/target comparisons are stable.
pub fn format_name(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Jpeg => "jpeg",
        ImageFormat::Png => "png",
        ImageFormat::WebP => "webp",
        ImageFormat::Gif => "gif",
        ImageFormat::Bmp => "bmp",
        ImageFormat::Tiff => "tiff",
        other => other.extensions_str().first().copied().unwrap_or("unknown"),
    }
}

// =============================================================================
// Decoded Image
// =============================================================================

/// An image decoded into memory, together with its provenance.
///
/// Instances are created by [`decode`] or by pipeline transformations
/// (resize, mode conversion, compositing) and never outlive the request
/// that produced them.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    /// Decoded pixel buffer
    pub image: DynamicImage,

    /// Container format the bytes were decoded from, if any.
    ///
    /// `None` for images synthesized in memory (e.g. segmenter output that
    /// was already re-decoded, or test fixtures built from raw buffers).
    pub source_format: Option<ImageFormat>,
}

impl DecodedImage {
    /// Wrap an in-memory image with no source container.
    pub fn from_image(image: DynamicImage) -> Self {
        Self {
            image,
            source_format: None,
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// `(width, height)` in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.image.width(), self.image.height())
    }

    /// Simplified pixel layout of the decoded buffer.
    pub fn color_mode(&self) -> ColorMode {
        ColorMode::from_color_type(self.image.color())
    }

    /// Canonical lowercase source format name, or `None` if synthesized.
    pub fn source_format_name(&self) -> Option<&'static str> {
        self.source_format.map(format_name)
    }
}

// =============================================================================
// Decoding
// =============================================================================

/// Decode image bytes into a [`DecodedImage`].
///
/// The container format is sniffed from the bytes rather than trusted from
/// any client-supplied content type.
///
/// # Errors
///
/// Returns [`CodecError::Decode`] if the bytes are not a recognized or
/// valid image.
pub fn decode(bytes: &[u8]) -> Result<DecodedImage, CodecError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(CodecError::decode)?;

    let source_format = reader.format();
    let image = reader.decode().map_err(CodecError::decode)?;

    Ok(DecodedImage {
        image,
        source_format,
    })
}

// =============================================================================
// Inspection
// =============================================================================

/// Basic information about an uploaded image.
#[derive(Debug, Clone, Serialize)]
pub struct ImageInfo {
    /// Width in pixels
    pub width: u32,

    /// Height in pixels
    pub height: u32,

    /// Canonical lowercase container format, or "unknown"
    pub format: String,

    /// Pixel layout (rgb, rgba, grayscale, grayscale_alpha)
    pub mode: String,

    /// Size of the uploaded bytes
    pub size_bytes: usize,
}

/// Inspect image bytes without transforming them.
///
/// Used by the upload endpoint; independent of the transform pipeline.
pub fn inspect(bytes: &[u8]) -> Result<ImageInfo, CodecError> {
    let decoded = decode(bytes)?;

    Ok(ImageInfo {
        width: decoded.width(),
        height: decoded.height(),
        format: decoded
            .source_format_name()
            .unwrap_or("unknown")
            .to_string(),
        mode: decoded.color_mode().as_str().to_string(),
        size_bytes: bytes.len(),
    })
}

// =============================================================================
// Tests
// =============================================================================

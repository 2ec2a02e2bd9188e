//! Transformation pipeline: the decision engine.
//!
//! [`Processor::process`] is a pure function of `(bytes, params)` with no
//! state across calls. Within one call it is a linear sequence:
//!
//! ```text
//! decode ─► fast path? ─► background removal ─► resize ─► encode
//!               │                                            │
//!               ▼                                            ▼
//!       Outcome::Skipped                         shrink guard? ─► Outcome::KeptOriginal
//!                                                            │
//!                                                            ▼
//!                                                  Outcome::Transformed
//! ```
//!
//! Two early exits return the original bytes as deliberate successful
//! outcomes (not errors): the fast path, when the request is effectively a
//! no-op at high quality, and the shrink guard, when re-encoding was the
//! only variable and it grew the file.

mod params;

pub use params::{ProcessingParams, DEFAULT_QUALITY, MAX_DIMENSION, MAX_QUALITY, MIN_QUALITY};

use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use tracing::debug;

use crate::codec::{self, TargetFormat};
use crate::error::{ProcessError, SegmentError};
use crate::segment::ForegroundSegmenter;

// =============================================================================
// Outcome and Metadata
// =============================================================================

/// How a processing call concluded.
///
/// The three variants are mutually exclusive by construction, which is what
/// keeps the `skipped_processing`/`used_original` metadata markers from ever
/// appearing together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The image was transformed and the encoded result returned
    Transformed,
    /// No transformation was attempted; original bytes returned unchanged
    Skipped,
    /// A transformation was attempted but discarded because it grew the file
    KeptOriginal,
}

/// Descriptive metadata accompanying the output bytes.
#[derive(Debug, Clone, Serialize)]
pub struct Metadata {
    /// Input size in bytes
    pub original_size: usize,

    /// Output size in bytes
    pub processed_size: usize,

    /// Input `(width, height)`
    pub original_dimensions: (u32, u32),

    /// Output `(width, height)`
    pub processed_dimensions: (u32, u32),

    /// Canonical lowercase format of the output
    pub format: String,

    /// Quality the request asked for
    pub quality: u8,

    /// Percentage reduction in byte size, one decimal; negative if the
    /// output grew
    pub compression_ratio: f64,

    /// Whether foreground segmentation ran
    pub background_removed: bool,

    /// Set only when no transformation was attempted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped_processing: Option<bool>,

    /// Set only when the transformed result was discarded for the original
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used_original: Option<bool>,
}

/// The output of one processing call: bytes plus metadata.
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    /// Output image bytes (possibly the unmodified input)
    pub bytes: Bytes,

    /// Descriptive metadata
    pub metadata: Metadata,

    /// How the call concluded
    pub outcome: Outcome,
}

/// Percentage reduction in byte size, rounded to one decimal.
fn compression_ratio(original: usize, processed: usize) -> f64 {
    ((1.0 - processed as f64 / original as f64) * 1000.0).round() / 10.0
}

// =============================================================================
// Dimension Arithmetic
// =============================================================================

/// Resolve the dimensions a resize should produce.
///
/// With `keep_aspect_ratio`, a missing axis is derived from the given one
/// by uniform scale. When both are given, width takes priority: the scale
/// comes from width and the height request is recomputed from it, so a
/// conflicting height is overridden. Without the flag, given values are
/// used directly and missing axes stay at the current size.
pub fn resolve_resize_dimensions(
    current: (u32, u32),
    width: Option<u32>,
    height: Option<u32>,
    keep_aspect_ratio: bool,
) -> (u32, u32) {
    let (current_w, current_h) = current;

    if !keep_aspect_ratio {
        return (width.unwrap_or(current_w), height.unwrap_or(current_h));
    }

    match (width, height) {
        (Some(w), _) => {
            let scale = w as f64 / current_w as f64;
            let new_h = (current_h as f64 * scale).round().max(1.0) as u32;
            (w, new_h)
        }
        (None, Some(h)) => {
            let scale = h as f64 / current_h as f64;
            let new_w = (current_w as f64 * scale).round().max(1.0) as u32;
            (new_w, h)
        }
        (None, None) => current,
    }
}

// =============================================================================
// Processor
// =============================================================================

/// The transformation pipeline.
///
/// Holds only the optional background removal capability; every `process`
/// call is otherwise independent, so one `Processor` can serve concurrent
/// requests without locking.
#[derive(Clone, Default)]
pub struct Processor {
    segmenter: Option<Arc<dyn ForegroundSegmenter>>,
}

impl Processor {
    /// Processor without background removal.
    pub fn new() -> Self {
        Self { segmenter: None }
    }

    /// Processor with an injected segmentation capability.
    pub fn with_segmenter(segmenter: Arc<dyn ForegroundSegmenter>) -> Self {
        Self {
            segmenter: Some(segmenter),
        }
    }

    /// Whether foreground segmentation can be requested.
    pub fn background_removal_available(&self) -> bool {
        self.segmenter.is_some()
    }

    /// Transform image bytes according to the parameters.
    ///
    /// # Errors
    ///
    /// - [`crate::error::CodecError::Decode`] if the input is not a valid image
    /// - [`crate::error::SegmentError`] if background removal is requested
    ///   but unavailable, or the backend fails
    /// - [`crate::error::CodecError::Encode`] if the target encode fails
    pub fn process(
        &self,
        bytes: Bytes,
        params: &ProcessingParams,
    ) -> Result<ProcessingResult, ProcessError> {
        params.validate()?;

        let decoded = codec::decode(&bytes)?;
        let original_size = bytes.len();
        let original_dimensions = decoded.dimensions();
        let original_format = decoded.source_format_name();

        let mut target_format = params.format;

        // Effective target dimensions: absent axes keep the original size.
        let target_w = params.width.unwrap_or(original_dimensions.0);
        let target_h = params.height.unwrap_or(original_dimensions.1);
        let size_changed = (target_w, target_h) != original_dimensions;
        let format_changed = original_format != Some(target_format.as_str());

        // Fast path: the request is effectively a no-op at high quality, so
        // returning the original avoids a lossy re-encode.
        if !size_changed && !format_changed && params.quality >= 95 && !params.remove_background {
            debug!(
                format = target_format.as_str(),
                quality = params.quality,
                "Skipping processing: no-op request"
            );
            return Ok(ProcessingResult {
                metadata: Metadata {
                    original_size,
                    processed_size: original_size,
                    original_dimensions,
                    processed_dimensions: original_dimensions,
                    format: target_format.as_str().to_string(),
                    quality: params.quality,
                    compression_ratio: 0.0,
                    background_removed: false,
                    skipped_processing: Some(true),
                    used_original: None,
                },
                bytes,
                outcome: Outcome::Skipped,
            });
        }

        let mut image = decoded.image;
        let mut background_removed = false;

        if params.remove_background {
            let segmenter = self
                .segmenter
                .as_deref()
                .ok_or(SegmentError::Unavailable)?;

            // Hand the segmenter exact pixels: lossless PNG in an
            // alpha-capable mode.
            let handoff = codec::encode_lossless_png(&image)?;
            let segmented = segmenter.segment_foreground(&handoff)?;
            image = codec::decode(&segmented)
                .map_err(|e| SegmentError::backend(format!("output was not decodable: {}", e)))?
                .image;
            background_removed = true;

            // Removing a background without keeping alpha is meaningless;
            // of the supported targets only PNG carries it losslessly.
            target_format = TargetFormat::Png;
            debug!("Background removed; output format forced to png");
        }

        if size_changed {
            let current = (image.width(), image.height());
            let (new_w, new_h) = resolve_resize_dimensions(
                current,
                params.width,
                params.height,
                params.keep_aspect_ratio,
            );
            debug!(
                from = ?current,
                to = ?(new_w, new_h),
                "Resizing"
            );
            image = codec::resize(&image, new_w, new_h);
        }

        let encoded = codec::encode(&image, target_format, params.quality, background_removed)?;

        // Shrink guard: when quality was the only variable, a result larger
        // than the input is discarded for the original. Any actually
        // requested transformation is honored even if it grows the file.
        if encoded.len() > original_size && !format_changed && !size_changed && !background_removed
        {
            debug!(
                encoded_size = encoded.len(),
                original_size, "Re-encode grew the file; keeping original"
            );
            return Ok(ProcessingResult {
                metadata: Metadata {
                    original_size,
                    processed_size: original_size,
                    original_dimensions,
                    processed_dimensions: original_dimensions,
                    format: target_format.as_str().to_string(),
                    quality: params.quality,
                    compression_ratio: 0.0,
                    background_removed: false,
                    skipped_processing: None,
                    used_original: Some(true),
                },
                bytes,
                outcome: Outcome::KeptOriginal,
            });
        }

        let processed_dimensions = (image.width(), image.height());
        let processed_size = encoded.len();

        Ok(ProcessingResult {
            metadata: Metadata {
                original_size,
                processed_size,
                original_dimensions,
                processed_dimensions,
                format: target_format.as_str().to_string(),
                quality: params.quality,
                compression_ratio: compression_ratio(original_size, processed_size),
                background_removed,
                skipped_processing: None,
                used_original: None,
            },
            bytes: encoded,
            outcome: Outcome::Transformed,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

//! # imgsquish
//!
//! An image compression and optimization service.
//!
//! This library provides the core functionality for a stateless HTTP service
//! that accepts uploaded images and returns them resized, converted between
//! formats (JPEG, PNG, WebP), recompressed at a target quality, and optionally
//! with their background removed by a pluggable segmentation backend.
//!
//! ## Features
//!
//! - **Format conversion**: Decode any common raster format, encode to JPEG, PNG, or WebP
//! - **Resizing**: Aspect-ratio-preserving (or exact) resizing with Lanczos3 filtering
//! - **Quality control**: Per-format quality mapping, including lossless WebP at quality 100
//! - **Background removal**: Optional foreground segmentation via an external command
//! - **Smart fallbacks**: Skips no-op conversions and keeps the original when recompression grows a file
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`codec`] - Image decoding, pixel conversions, and per-format encoding
//! - [`pipeline`] - The processing pipeline tying decode, resize, segment, and encode together
//! - [`segment`] - The foreground segmentation capability and its command backend
//! - [`server`] - Axum-based HTTP server, handlers, and routes
//! - [`config`] - CLI and configuration types
//! - [`error`] - Error types for each layer
//!
//! ## Example
//!
//! ```rust
//! use imgsquish::{Processor, ProcessingParams, TargetFormat};
//!
//! # fn run(image_bytes: bytes::Bytes) -> Result<(), imgsquish::ProcessError> {
//! let processor = Processor::new();
//! let params = ProcessingParams::default()
//!     .with_format(TargetFormat::Webp)
//!     .with_quality(80)
//!     .with_width(800);
//!
//! let result = processor.process(image_bytes, &params)?;
//! println!(
//!     "{} -> {} bytes ({}% smaller)",
//!     result.metadata.original_size,
//!     result.metadata.processed_size,
//!     result.metadata.compression_ratio,
//! );
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod segment;
pub mod server;

// Re-export commonly used types
pub use codec::{
    decode, encode, inspect, ColorMode, DecodedImage, ImageInfo, TargetFormat,
};
pub use config::Config;
pub use error::{CodecError, ProcessError, SegmentError};
pub use pipeline::{
    resolve_resize_dimensions, Metadata, Outcome, ProcessingParams, ProcessingResult, Processor,
    DEFAULT_QUALITY, MAX_DIMENSION, MAX_QUALITY, MIN_QUALITY,
};
pub use segment::{CommandSegmenter, ForegroundSegmenter};
pub use server::{
    create_router, AppState, ErrorResponse, FeaturesResponse, HealthResponse, ProcessResponse,
    RouterConfig, UploadResponse, DEFAULT_MAX_UPLOAD_SIZE,
};

//! Test utilities for integration tests.
//!
//! This module provides synthetic image builders, a multipart body builder
//! for exercising the router, a mock segmenter, and format validity checks.

use std::io::Cursor;

use axum::body::Body;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};

use imgsquish::segment::ForegroundSegmenter;
use imgsquish::SegmentError;

// =============================================================================
// Synthetic Images
// =============================================================================

/// Create a test RGB JPEG with a gradient pattern.
pub fn create_test_jpeg(width: u32, height: u32, quality: u8) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        let r = (x % 256) as u8;
        let g = (y % 256) as u8;
        let b = ((x + y) % 256) as u8;
        Rgb([r, g, b])
    });

    let mut buf = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buf, quality);
    encoder.encode_image(&img).unwrap();
    buf
}

/// Create a test RGB PNG with a gradient pattern.
pub fn create_test_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });

    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

/// Create an RGBA PNG where the left half is fully transparent.
pub fn create_half_transparent_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, _y| {
        if x < width / 2 {
            Rgba([0, 0, 0, 0])
        } else {
            Rgba([200, 30, 30, 255])
        }
    });

    let mut buf = Vec::new();
    DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

// =============================================================================
// Multipart Body Builder
// =============================================================================

/// Boundary used by [`multipart_body`].
pub const BOUNDARY: &str = "imgsquish-test-boundary";

/// Content-Type header value matching [`multipart_body`].
pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={}", BOUNDARY)
}

/// Build a multipart/form-data body with a single field.
pub fn multipart_body(
    field_name: &str,
    filename: &str,
    content_type: &str,
    bytes: &[u8],
) -> Body {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field_name, filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    Body::from(body)
}

/// Build a standard image upload body with the field name the API expects.
pub fn image_upload_body(filename: &str, content_type: &str, bytes: &[u8]) -> Body {
    multipart_body("file", filename, content_type, bytes)
}

// =============================================================================
// Mock Segmenter
// =============================================================================

/// A segmenter that makes every border pixel fully transparent.
///
/// Cheap to run and easy to assert against: the output must be a PNG with
/// alpha, and corner pixels must have alpha 0.
pub struct BorderSegmenter;

impl ForegroundSegmenter for BorderSegmenter {
    fn segment_foreground(&self, png: &[u8]) -> Result<Vec<u8>, SegmentError> {
        let decoded = image::load_from_memory(png).map_err(SegmentError::backend)?;
        let mut rgba = decoded.to_rgba8();
        let (w, h) = rgba.dimensions();
        for x in 0..w {
            rgba.get_pixel_mut(x, 0).0[3] = 0;
            rgba.get_pixel_mut(x, h - 1).0[3] = 0;
        }
        for y in 0..h {
            rgba.get_pixel_mut(0, y).0[3] = 0;
            rgba.get_pixel_mut(w - 1, y).0[3] = 0;
        }

        let mut out = Vec::new();
        DynamicImage::ImageRgba8(rgba)
            .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
            .map_err(SegmentError::backend)?;
        Ok(out)
    }
}

/// A segmenter that always fails, for exercising the 500 path.
pub struct FailingSegmenter;

impl ForegroundSegmenter for FailingSegmenter {
    fn segment_foreground(&self, _png: &[u8]) -> Result<Vec<u8>, SegmentError> {
        Err(SegmentError::backend("model exploded"))
    }
}

// =============================================================================
// Validation Helpers
// =============================================================================

/// Check if data is a valid JPEG (SOI marker plus decodable).
pub fn is_valid_jpeg(data: &[u8]) -> bool {
    data.len() >= 4
        && data[0] == 0xFF
        && data[1] == 0xD8
        && image::load_from_memory_with_format(data, ImageFormat::Jpeg).is_ok()
}

/// Check if data is a valid PNG.
pub fn is_valid_png(data: &[u8]) -> bool {
    data.starts_with(&[0x89, b'P', b'N', b'G'])
        && image::load_from_memory_with_format(data, ImageFormat::Png).is_ok()
}

/// Check if data is a valid WebP (RIFF container plus decodable).
pub fn is_valid_webp(data: &[u8]) -> bool {
    data.len() >= 12
        && &data[0..4] == b"RIFF"
        && &data[8..12] == b"WEBP"
        && image::load_from_memory_with_format(data, ImageFormat::WebP).is_ok()
}

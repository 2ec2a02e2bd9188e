//! Format-specific encoding.
//!
//! Each target format has its own parameter mapping:
//!
//! - **JPEG**: quality 1-100, opaque RGB only (alpha is flattened onto
//!   white before encoding). The `image` crate's encoder exposes no chroma
//!   subsampling or Huffman optimization knobs, so high-quality requests
//!   get the quality value passed through unchanged
//! - **PNG**: always lossless; the quality knob selects compression effort,
//!   with the fastest level forced after background removal or at
//!   quality >= 95
//! - **WebP**: lossless at quality >= 100, lossy otherwise (libwebp default
//!   effort, method 4)

use std::io::Cursor;

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilterType, PngEncoder};
use image::codecs::webp::WebPEncoder;
use image::DynamicImage;

use super::convert::{ensure_alpha, flatten_onto_white};
use super::{ColorMode, TargetFormat};
use crate::error::CodecError;

/// Map quality to a PNG compression level in `[0, 9]`.
///
/// Lower quality requests deeper compression: `level = (100 - quality) / 11`
/// with integer division, clamped to the valid range. Level 0 is fastest
/// and largest; PNG stays lossless at every level.
pub fn png_compression_level(quality: u8) -> u8 {
    ((100i32 - quality as i32) / 11).clamp(0, 9) as u8
}

/// Bucket a 0-9 compression level into the encoder's effort settings.
fn png_compression(level: u8) -> CompressionType {
    match level {
        0 => CompressionType::Fast,
        1..=6 => CompressionType::Default,
        _ => CompressionType::Best,
    }
}

/// Encode a decoded image for the target format.
///
/// Mode normalization is applied here, per format: JPEG sources are
/// flattened to opaque RGB (white under transparency), PNG sources are
/// converted up to an alpha-carrying mode so transparency round-trips
/// even when the source had none.
///
/// `fastest_png` forces PNG compression level 0; the pipeline sets it
/// right after background removal to hand alpha through untouched and
/// cheap.
///
/// # Errors
///
/// Returns [`CodecError::Encode`] if the encoder rejects the buffer. This
/// indicates an internal defect rather than bad input.
pub fn encode(
    image: &DynamicImage,
    format: TargetFormat,
    quality: u8,
    fastest_png: bool,
) -> Result<Bytes, CodecError> {
    let mut buffer = Vec::new();

    match format {
        TargetFormat::Jpeg => {
            let rgb = flatten_onto_white(image);
            let mut encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
            encoder
                .encode_image(&rgb)
                .map_err(|e| CodecError::encode("jpeg", e))?;
        }

        TargetFormat::Png => {
            let alpha_capable = ensure_alpha(image.clone());
            let level = if fastest_png || quality >= 95 {
                0
            } else {
                png_compression_level(quality)
            };
            let encoder = PngEncoder::new_with_quality(
                Cursor::new(&mut buffer),
                png_compression(level),
                PngFilterType::Adaptive,
            );
            alpha_capable
                .write_with_encoder(encoder)
                .map_err(|e| CodecError::encode("png", e))?;
        }

        TargetFormat::Webp => {
            if quality >= 100 {
                // Lossless request; the encoder only accepts 8-bit RGB/RGBA
                let normalized = normalize_for_webp(image);
                let encoder = WebPEncoder::new_lossless(Cursor::new(&mut buffer));
                normalized
                    .write_with_encoder(encoder)
                    .map_err(|e| CodecError::encode("webp", e))?;
            } else {
                buffer = encode_webp_lossy(image, quality);
            }
        }
    }

    Ok(Bytes::from(buffer))
}

/// Lossy WebP at the given quality, libwebp default effort.
fn encode_webp_lossy(image: &DynamicImage, quality: u8) -> Vec<u8> {
    let mode = ColorMode::from_color_type(image.color());
    let memory = if mode.has_alpha() {
        let rgba = image.to_rgba8();
        webp::Encoder::from_rgba(rgba.as_raw(), rgba.width(), rgba.height())
            .encode(quality as f32)
    } else {
        let rgb = image.to_rgb8();
        webp::Encoder::from_rgb(rgb.as_raw(), rgb.width(), rgb.height()).encode(quality as f32)
    };
    memory.to_vec()
}

/// 8-bit RGB/RGBA view for the WebP encoders.
fn normalize_for_webp(image: &DynamicImage) -> DynamicImage {
    let mode = ColorMode::from_color_type(image.color());
    if mode.has_alpha() {
        DynamicImage::ImageRgba8(image.to_rgba8())
    } else {
        DynamicImage::ImageRgb8(image.to_rgb8())
    }
}

/// Encode as lossless, fastest-level PNG in an alpha-capable mode.
///
/// This is the handoff format for the background removal capability: the
/// segmenter receives exact pixel values and returns a PNG of its own.
/// Modes other than RGB/RGBA are converted to RGBA first.
pub fn encode_lossless_png(image: &DynamicImage) -> Result<Bytes, CodecError> {
    let mode = ColorMode::from_color_type(image.color());
    let normalized = match mode {
        ColorMode::Rgb | ColorMode::Rgba => image.clone(),
        _ => DynamicImage::ImageRgba8(image.to_rgba8()),
    };

    let mut buffer = Vec::new();
    let encoder = PngEncoder::new_with_quality(
        Cursor::new(&mut buffer),
        CompressionType::Fast,
        PngFilterType::Adaptive,
    );
    normalized
        .write_with_encoder(encoder)
        .map_err(|e| CodecError::encode("png", e))?;

    Ok(Bytes::from(buffer))
}

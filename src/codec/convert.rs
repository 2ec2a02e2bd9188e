//! Pixel-mode conversion and resampling primitives.
//!
//! JPEG output needs an opaque RGB buffer; PNG output downstream of the
//! pipeline is always alpha-capable. The conversions here implement those
//! two rules plus the shared resize filter.

use image::imageops::FilterType;
use image::{DynamicImage, RgbImage};

use super::ColorMode;

/// Resize to exact dimensions with Lanczos3 resampling.
///
/// Never modifies the input in place; aspect ratio decisions are made by
/// the caller before this point.
pub fn resize(image: &DynamicImage, width: u32, height: u32) -> DynamicImage {
    image.resize_exact(width, height, FilterType::Lanczos3)
}

/// Composite an image onto an opaque white canvas, dropping transparency.
///
/// Pixels outside the alpha mask become opaque white. Sources without an
/// alpha channel are converted straight to RGB without compositing.
pub fn flatten_onto_white(image: &DynamicImage) -> RgbImage {
    let mode = ColorMode::from_color_type(image.color());
    if !mode.has_alpha() {
        return image.to_rgb8();
    }

    let rgba = image.to_rgba8();
    let mut out = RgbImage::new(rgba.width(), rgba.height());
    for (src, dst) in rgba.pixels().zip(out.pixels_mut()) {
        let alpha = src.0[3] as u16;
        let inverse = 255 - alpha;
        for channel in 0..3 {
            let blended = (src.0[channel] as u16 * alpha + 255 * inverse) / 255;
            dst.0[channel] = blended as u8;
        }
    }
    out
}

/// Convert an image up to an alpha-carrying mode if it has none.
///
/// Sources that already carry alpha (RGBA, grayscale+alpha) pass through
/// unchanged, so an existing transparency channel round-trips exactly.
/// Grayscale gains a grayscale alpha channel rather than expanding to
/// RGBA, so a grayscale PNG stays grayscale.
pub fn ensure_alpha(image: DynamicImage) -> DynamicImage {
    match ColorMode::from_color_type(image.color()) {
        ColorMode::Rgba | ColorMode::GrayscaleAlpha => image,
        ColorMode::Grayscale => DynamicImage::ImageLumaA8(image.to_luma_alpha8()),
        ColorMode::Rgb => DynamicImage::ImageRgba8(image.to_rgba8()),
    }
}

//! Photo preprocessing: decode → grayscale → sepia overlay.
//!
//! The transform is a pure per-pixel map over an owned buffer. Each pixel is
//! computed from that pixel alone, so the output depends only on the input
//! bytes and running it twice yields identical bytes.
//!
//! ## Sepia overlay
//!
//! The tint `(100, 80, 40)` is composited at 30 % with the overlay blend
//! mode, per channel:
//!
//! ```text
//! overlay(b, o) = 2·b·o/255                   if b < 128
//!               = 255 − 2·(255−b)·(255−o)/255  otherwise
//! out           = round(0.7·b + 0.3·overlay(b, o))
//! ```
//!
//! Alpha passes through every step untouched.

use crate::error::PreprocessError;
use crate::pipeline::input::Upload;
use crate::raster::{ImageOrigin, RasterImage};
use image::RgbaImage;
use tracing::{debug, warn};

/// Colour composited over the grayscale photo.
pub const SEPIA_TINT: [u8; 3] = [100, 80, 40];

/// Weight of the blended tint against the untinted grayscale value.
pub const SEPIA_MIX: f64 = 0.30;

/// Decode image bytes into a [`RasterImage`].
pub fn decode(bytes: &[u8], origin: ImageOrigin) -> Result<RasterImage, PreprocessError> {
    if bytes.is_empty() {
        return Err(PreprocessError::EmptyInput);
    }
    let decoded = image::load_from_memory(bytes).map_err(|e| PreprocessError::Decode {
        detail: e.to_string(),
    })?;
    let rgba = decoded.to_rgba8();
    debug!("Decoded photo → {}x{} px", rgba.width(), rgba.height());
    RasterImage::new(rgba, origin).ok_or_else(|| PreprocessError::Decode {
        detail: "image has zero area".into(),
    })
}

/// Standard luma of an sRGB triple, rounded to the nearest integer.
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    let y = 0.299 * f64::from(r) + 0.587 * f64::from(g) + 0.114 * f64::from(b);
    y.round().clamp(0.0, 255.0) as u8
}

/// Overlay blend of one channel, unrounded.
pub fn overlay_channel(base: u8, overlay: u8) -> f64 {
    let b = f64::from(base);
    let o = f64::from(overlay);
    if base < 128 {
        2.0 * b * o / 255.0
    } else {
        255.0 - 2.0 * (255.0 - b) * (255.0 - o) / 255.0
    }
}

fn map_pixels(input: &RasterImage, f: impl Fn([u8; 4]) -> [u8; 4]) -> RasterImage {
    let mut out: RgbaImage = input.pixels().clone();
    for px in out.pixels_mut() {
        px.0 = f(px.0);
    }
    input.with_pixels(out)
}

/// Set R=G=B to the pixel's luma.
pub fn grayscale(input: &RasterImage) -> RasterImage {
    map_pixels(input, |[r, g, b, a]| {
        let y = luma(r, g, b);
        [y, y, y, a]
    })
}

/// Mix the sepia tint over every pixel with the overlay blend.
pub fn sepia_overlay(input: &RasterImage) -> RasterImage {
    map_pixels(input, |[r, g, b, a]| {
        let mix = |base: u8, tint: u8| {
            let v = (1.0 - SEPIA_MIX) * f64::from(base) + SEPIA_MIX * overlay_channel(base, tint);
            v.round().clamp(0.0, 255.0) as u8
        };
        [
            mix(r, SEPIA_TINT[0]),
            mix(g, SEPIA_TINT[1]),
            mix(b, SEPIA_TINT[2]),
            a,
        ]
    })
}

/// Grayscale followed by the sepia overlay.
pub fn vintage(input: &RasterImage) -> RasterImage {
    sepia_overlay(&grayscale(input))
}

/// Decode local bytes and apply the vintage look.
pub fn transform(bytes: &[u8]) -> Result<RasterImage, PreprocessError> {
    decode(bytes, ImageOrigin::Local).map(|img| vintage(&img))
}

/// Decode an upload, keeping its origin, and apply the vintage look.
pub fn transform_upload(upload: &Upload) -> Result<RasterImage, PreprocessError> {
    decode(&upload.bytes, upload.origin.clone()).map(|img| vintage(&img))
}

/// Turn an optional upload into an optional photo.
///
/// A missing upload is simply no photo. A photo that fails to decode is
/// logged and also becomes no photo, so the page shows its placeholder.
pub fn prepare_photo(upload: Option<&Upload>) -> Option<RasterImage> {
    let upload = upload?;
    match transform_upload(upload) {
        Ok(img) => Some(img),
        Err(e) => {
            warn!("Photo '{}' skipped: {}", upload.label, e);
            None
        }
    }
}

//! The pixel handle passed between pipeline stages.
//!
//! A [`RasterImage`] is never mutated once built. Transforms read one and
//! produce a new one, so the pixel buffer sits behind an `Arc` and cloning a
//! handle (for example into a display list) does not copy pixels.

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Where the pixels of an image came from.
///
/// The rasteriser uses this to decide whether drawing the image would taint
/// the captured bitmap.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ImageOrigin {
    /// Read from the local file system or produced in-process.
    #[default]
    Local,
    /// Downloaded from another origin.
    Remote {
        url: String,
        /// The server answered with `Access-Control-Allow-Origin`.
        cors_granted: bool,
    },
}

impl ImageOrigin {
    pub fn is_remote(&self) -> bool {
        matches!(self, ImageOrigin::Remote { .. })
    }
}

/// An immutable RGBA8 image with positive dimensions.
#[derive(Debug, Clone)]
pub struct RasterImage {
    pixels: Arc<RgbaImage>,
    origin: ImageOrigin,
}

impl RasterImage {
    /// Wrap a pixel buffer. Returns `None` when either side is zero.
    pub fn new(pixels: RgbaImage, origin: ImageOrigin) -> Option<Self> {
        if pixels.width() == 0 || pixels.height() == 0 {
            return None;
        }
        Some(Self {
            pixels: Arc::new(pixels),
            origin,
        })
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    pub fn origin(&self) -> &ImageOrigin {
        &self.origin
    }

    /// Borrow the underlying pixel buffer.
    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Build a new image of the same size and origin from a transformed buffer.
    pub(crate) fn with_pixels(&self, pixels: RgbaImage) -> Self {
        debug_assert_eq!(pixels.dimensions(), self.dimensions());
        Self {
            pixels: Arc::new(pixels),
            origin: self.origin.clone(),
        }
    }
}

impl PartialEq for RasterImage {
    fn eq(&self, other: &Self) -> bool {
        self.origin == other.origin
            && self.pixels.dimensions() == other.pixels.dimensions()
            && self.pixels.as_raw() == other.pixels.as_raw()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn zero_sized_buffer_is_rejected() {
        assert!(RasterImage::new(RgbaImage::new(0, 4), ImageOrigin::Local).is_none());
        assert!(RasterImage::new(RgbaImage::new(4, 0), ImageOrigin::Local).is_none());
    }

    #[test]
    fn clone_shares_pixels() {
        let img = RasterImage::new(
            RgbaImage::from_pixel(3, 2, Rgba([1, 2, 3, 255])),
            ImageOrigin::Local,
        )
        .unwrap();
        let copy = img.clone();
        assert!(std::ptr::eq(img.pixels(), copy.pixels()));
        assert_eq!(copy.dimensions(), (3, 2));
    }

    #[test]
    fn remote_origin_is_remote() {
        let o = ImageOrigin::Remote {
            url: "https://a.test/x.png".into(),
            cors_granted: false,
        };
        assert!(o.is_remote());
        assert!(!ImageOrigin::Local.is_remote());
    }
}

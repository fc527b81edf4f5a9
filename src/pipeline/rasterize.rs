//! Rasterisation: paint a [`DisplayList`] into an RGBA bitmap.
//!
//! ## Why spawn_blocking?
//!
//! Scaling a photo and filling a 1650 × 2400 px canvas is CPU-bound work.
//! [`rasterize`] moves it onto tokio's blocking pool, which makes it the one
//! point where a capture yields to the scheduler.
//!
//! ## Pixel mapping
//!
//! A CSS px coordinate `v` lands at `(margin + v) · transform · scale` in the
//! bitmap. Rect edges are rounded independently so adjacent rects never
//! leave seams. Glyphs are positioned at sub-pixel precision and their
//! coverage is blended over what is already painted.

use crate::config::{CaptureOptions, CrossOriginMode};
use crate::error::CaptureError;
use crate::raster::{ImageOrigin, RasterImage};
use crate::surface::display::{Color, DisplayList, DrawOp, Rect};
use crate::surface::font::GlyphRun;
use crate::surface::Geometry;
use image::imageops::{self, FilterType};
use image::{Pixel, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, Blend};
use imageproc::rect::Rect as PixelRect;
use rusttype::{point, Font, GlyphId, Scale};
use tracing::{debug, info};

/// Largest bitmap side accepted, in pixels.
pub const MAX_CANVAS_SIDE: u32 = 16_384;

/// Output size in pixels for a display list at a geometry and scale.
pub fn output_size(list: &DisplayList, geometry: &Geometry, scale: f32) -> (u32, u32) {
    let factor = f64::from(geometry.scale_factor()) * f64::from(scale);
    let margin = f64::from(geometry.margin_px());
    let side = |len: f32| {
        let px = ((f64::from(len) + 2.0 * margin) * factor).ceil();
        if px.is_finite() && px > 0.0 {
            px.min(f64::from(u32::MAX)) as u32
        } else {
            0
        }
    };
    (side(list.width), side(list.height))
}

/// Rasterise `list` on the blocking pool.
pub async fn rasterize(
    list: DisplayList,
    geometry: Geometry,
    options: &CaptureOptions,
) -> Result<RgbaImage, CaptureError> {
    let scale = options.scale;
    let background = options.background;
    let mode = options.cross_origin;

    tokio::task::spawn_blocking(move || {
        rasterize_blocking(&list, &geometry, scale, background, mode)
    })
    .await
    .map_err(|e| CaptureError::Internal(format!("Rasterise task panicked: {}", e)))?
}

/// Blocking implementation of rasterisation.
pub fn rasterize_blocking(
    list: &DisplayList,
    geometry: &Geometry,
    scale: f32,
    background: Color,
    mode: CrossOriginMode,
) -> Result<RgbaImage, CaptureError> {
    let (width, height) = output_size(list, geometry, scale);
    if width == 0 || height == 0 {
        return Err(CaptureError::EmptySurface { width, height });
    }
    if width > MAX_CANVAS_SIDE || height > MAX_CANVAS_SIDE {
        return Err(CaptureError::CanvasTooLarge {
            width,
            height,
            max: MAX_CANVAS_SIDE,
        });
    }

    // Refuse tainting images before any pixel is touched.
    for image in list.images() {
        if !mode.permits(image.origin()) {
            let url = match image.origin() {
                ImageOrigin::Remote { url, .. } => url.clone(),
                ImageOrigin::Local => String::new(),
            };
            return Err(CaptureError::TaintedImage { url });
        }
    }

    let mapper = PixelMapper {
        factor: geometry.scale_factor() * scale,
        margin: geometry.margin_px(),
    };
    let mut canvas = Blend(RgbaImage::from_pixel(width, height, background.to_rgba()));

    for op in &list.ops {
        match op {
            DrawOp::Fill { rect, color } => {
                if let Some(r) = mapper.map(rect) {
                    draw_filled_rect_mut(&mut canvas, r, color.to_rgba());
                }
            }
            DrawOp::Stroke { rect, color, width } => {
                for side in border_sides(rect, *width) {
                    if let Some(r) = mapper.map(&side) {
                        draw_filled_rect_mut(&mut canvas, r, color.to_rgba());
                    }
                }
            }
            DrawOp::Image { rect, image } => {
                if let Some(r) = mapper.map(rect) {
                    draw_cover(&mut canvas.0, r, image);
                }
            }
            DrawOp::Glyphs {
                x,
                baseline,
                run,
                color,
            } => draw_glyphs(&mut canvas.0, &mapper, *x, *baseline, run, *color)?,
        }
    }

    info!("Rasterised surface → {}x{} px", width, height);
    Ok(canvas.0)
}

struct PixelMapper {
    factor: f32,
    margin: f32,
}

impl PixelMapper {
    /// Map a CSS rect to a pixel rect; `None` when it covers no pixel.
    fn map(&self, rect: &Rect) -> Option<PixelRect> {
        let edge = |v: f32| ((self.margin + v) * self.factor).round() as i32;
        let (x0, y0) = (edge(rect.x), edge(rect.y));
        let (x1, y1) = (edge(rect.right()), edge(rect.bottom()));
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(PixelRect::at(x0, y0).of_size((x1 - x0) as u32, (y1 - y0) as u32))
    }

    /// Map a CSS point to unrounded pixel coordinates.
    fn point(&self, x: f32, y: f32) -> (f32, f32) {
        ((self.margin + x) * self.factor, (self.margin + y) * self.factor)
    }
}

fn border_sides(rect: &Rect, width: f32) -> [Rect; 4] {
    let w = width.min(rect.width / 2.0).min(rect.height / 2.0).max(0.0);
    [
        Rect::new(rect.x, rect.y, rect.width, w),
        Rect::new(rect.x, rect.bottom() - w, rect.width, w),
        Rect::new(rect.x, rect.y + w, w, rect.height - 2.0 * w),
        Rect::new(rect.right() - w, rect.y + w, w, rect.height - 2.0 * w),
    ]
}

/// Draw a shaped run whose text starts at `x` with its baseline at
/// `baseline`, both in CSS px.
fn draw_glyphs(
    canvas: &mut RgbaImage,
    mapper: &PixelMapper,
    x: f32,
    baseline: f32,
    run: &GlyphRun,
    color: Color,
) -> Result<(), CaptureError> {
    let face = &run.face;
    let font = Font::try_from_bytes_and_index(face.bytes(), face.index()).ok_or_else(|| {
        CaptureError::Rasterisation {
            detail: format!("font '{}' cannot be parsed", face.name()),
        }
    })?;
    let glyph_count = font.glyph_count();

    // rusttype sizes a glyph by ascent - descent, not by the em.
    let v = font.v_metrics_unscaled();
    let upem = f32::from(font.units_per_em().max(1));
    let em_px = run.size * mapper.factor;
    let scale = Scale::uniform(em_px * (v.ascent - v.descent) / upem);

    let ink = color.to_rgba();
    let (width, height) = canvas.dimensions();
    for placed in &run.glyphs {
        if usize::from(placed.id) >= glyph_count {
            return Err(CaptureError::Rasterisation {
                detail: format!(
                    "glyph {} is outside font '{}' ({} glyphs)",
                    placed.id,
                    face.name(),
                    glyph_count
                ),
            });
        }
        let (px, py) = mapper.point(x + placed.x, baseline - placed.y);
        let glyph = font
            .glyph(GlyphId(placed.id))
            .scaled(scale)
            .positioned(point(px, py));
        let Some(bb) = glyph.pixel_bounding_box() else {
            continue;
        };
        glyph.draw(|gx, gy, coverage| {
            let cx = bb.min.x + gx as i32;
            let cy = bb.min.y + gy as i32;
            if cx < 0 || cy < 0 || cx as u32 >= width || cy as u32 >= height {
                return;
            }
            let alpha = (coverage * f32::from(ink.0[3])).round() as u8;
            if alpha == 0 {
                return;
            }
            canvas
                .get_pixel_mut(cx as u32, cy as u32)
                .blend(&Rgba([ink.0[0], ink.0[1], ink.0[2], alpha]));
        });
    }
    Ok(())
}

/// Scale `image` to cover `target`, crop to its centre, and composite it.
fn draw_cover(canvas: &mut RgbaImage, target: PixelRect, image: &RasterImage) {
    let (tw, th) = (target.width(), target.height());
    let (iw, ih) = image.dimensions();
    let ratio = f64::max(f64::from(tw) / f64::from(iw), f64::from(th) / f64::from(ih));
    let sw = ((f64::from(iw) * ratio).ceil() as u32).max(tw);
    let sh = ((f64::from(ih) * ratio).ceil() as u32).max(th);

    let scaled = imageops::resize(image.pixels(), sw, sh, FilterType::Triangle);
    let cropped = imageops::crop_imm(&scaled, (sw - tw) / 2, (sh - th) / 2, tw, th).to_image();
    debug!(
        "Photo {}x{} → cover {}x{} at ({}, {})",
        iw,
        ih,
        tw,
        th,
        target.left(),
        target.top()
    );
    imageops::overlay(
        canvas,
        &cropped,
        i64::from(target.left()),
        i64::from(target.top()),
    );
}

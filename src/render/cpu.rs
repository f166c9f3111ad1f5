//! CPU rasterizer for [`LayerStack`]s, built on `image`.
//!
//! Pixels are straight (non-premultiplied) RGBA8. Text is drawn greeked: one bar per line at the
//! line's estimated width, which is enough for layout previews and thumbnails.

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use kurbo::Affine;

use crate::effects::merge::FilterOp;
use crate::foundation::core::{Point, Rect, Rgba8};
use crate::foundation::error::{CutframeError, CutframeResult};
use crate::interact::pointer::HandleGeometry;
use crate::render::dispatcher::FrameRasterizer;
use crate::render::layers::{Background, ElementContent, ElementLayer, LayerStack, Overlay};
use crate::timeline::model::TextAlign;

/// Upper bound on either side of the output surface.
pub const MAX_SURFACE_SIDE: u32 = 8192;

#[derive(Clone, Copy, Debug)]
/// Options for [`CpuRasterizer`].
pub struct CpuRasterizerOpts {
    /// Resampling filter used when scaling media into its layer rect.
    pub filter: FilterType,
    /// Draw the caption strip when caption text is present.
    pub draw_captions: bool,
    /// Fill color of the selection handles.
    pub handle_color: Rgba8,
}

impl Default for CpuRasterizerOpts {
    fn default() -> Self {
        Self {
            filter: FilterType::Triangle,
            draw_captions: true,
            handle_color: Rgba8::WHITE,
        }
    }
}

/// Straight-alpha CPU rasterizer.
#[derive(Clone, Debug, Default)]
pub struct CpuRasterizer {
    opts: CpuRasterizerOpts,
}

impl CpuRasterizer {
    /// Create a rasterizer.
    pub fn new(opts: CpuRasterizerOpts) -> Self {
        Self { opts }
    }

    fn draw_background(&self, background: &Background, width: u32, height: u32) -> RgbaImage {
        match background {
            Background::Color(c) => RgbaImage::from_pixel(width, height, px(*c)),
            Background::Blur {
                source,
                sigma,
                fallback,
            } => {
                let mut canvas = RgbaImage::from_pixel(width, height, px(*fallback));
                if source.width() == 0 || source.height() == 0 {
                    return canvas;
                }
                let filled = cover(source, width, height, self.opts.filter);
                let blurred = if *sigma > 0.0 {
                    imageops::blur(&filled, *sigma)
                } else {
                    filled
                };
                imageops::overlay(&mut canvas, &blurred, 0, 0);
                canvas
            }
        }
    }

    fn draw_element(&self, canvas: &mut RgbaImage, layer: &ElementLayer) -> CutframeResult<()> {
        let w = side(layer.rect.width())?;
        let h = side(layer.rect.height())?;
        if w == 0 || h == 0 || layer.opacity <= 0.0 {
            return Ok(());
        }

        let mut tile = match &layer.content {
            ElementContent::Pixels { image, filters } => {
                let mut scaled = imageops::resize(image.as_ref(), w, h, self.opts.filter);
                apply_filters(&mut scaled, filters);
                scaled
            }
            ElementContent::Placeholder(kind) => RgbaImage::from_pixel(w, h, px(kind.color())),
            ElementContent::Text {
                content,
                font_size,
                color,
                background,
                align,
            } => {
                let fill = background.unwrap_or(Rgba8::TRANSPARENT);
                let mut tile = RgbaImage::from_pixel(w, h, px(fill));
                greek_text(&mut tile, content, *font_size, *color, *align);
                tile
            }
            ElementContent::Component { .. } => RgbaImage::from_pixel(
                w,
                h,
                px(Rgba8 {
                    r: 128,
                    g: 128,
                    b: 160,
                    a: 96,
                }),
            ),
        };

        scale_alpha(&mut tile, layer.opacity);
        let (tile, origin) = if layer.rotation.rem_euclid(360.0) == 0.0 {
            (tile, Point::new(layer.rect.x0, layer.rect.y0))
        } else {
            rotate_tile(&tile, layer.rect, layer.rotation)
        };
        imageops::overlay(canvas, &tile, origin.x.round() as i64, origin.y.round() as i64);
        Ok(())
    }

    fn draw_overlay(&self, canvas: &mut RgbaImage, overlay: &Overlay) {
        match overlay {
            Overlay::Annotation => {}
            Overlay::Captions { text } => {
                if let Some(text) = text
                    && self.opts.draw_captions
                    && !text.trim().is_empty()
                {
                    draw_caption_strip(canvas, text);
                }
            }
            Overlay::Handles(geometry) => self.draw_handles(canvas, geometry),
        }
    }

    fn draw_handles(&self, canvas: &mut RgbaImage, geometry: &HandleGeometry) {
        let rotate =
            Affine::rotate_about(geometry.rotation_deg.to_radians(), geometry.bounds.center());
        let color = px(self.opts.handle_color);
        let rects = geometry
            .resize
            .iter()
            .map(|(_, r)| *r)
            .chain(std::iter::once(geometry.rotate));
        for r in rects {
            let center = rotate * r.center();
            fill_rect(
                canvas,
                Rect::from_center_size(center, r.size()),
                color,
            );
        }
    }
}

impl FrameRasterizer for CpuRasterizer {
    fn rasterize(&self, stack: &LayerStack) -> CutframeResult<RgbaImage> {
        let width = side(stack.preview.width)?.max(1);
        let height = side(stack.preview.height)?.max(1);
        let mut canvas = self.draw_background(&stack.background, width, height);

        for layer in &stack.elements {
            if let Err(err) = self.draw_element(&mut canvas, layer) {
                tracing::warn!(element = %layer.element_id, %err, "layer failed to rasterize");
            }
        }
        for overlay in &stack.overlays {
            self.draw_overlay(&mut canvas, overlay);
        }
        Ok(canvas)
    }
}

fn px(c: Rgba8) -> Rgba<u8> {
    Rgba(c.to_array())
}

fn side(v: f64) -> CutframeResult<u32> {
    if !v.is_finite() || v < 0.0 {
        return Err(CutframeError::render_failure(format!(
            "invalid surface side {v}"
        )));
    }
    let rounded = v.round();
    if rounded > f64::from(MAX_SURFACE_SIDE) {
        return Err(CutframeError::render_failure(format!(
            "surface side {rounded} exceeds {MAX_SURFACE_SIDE}"
        )));
    }
    Ok(rounded as u32)
}

/// Scale `src` to cover `width` x `height`, cropping the overflow around the center.
fn cover(src: &RgbaImage, width: u32, height: u32, filter: FilterType) -> RgbaImage {
    let scale = (f64::from(width) / f64::from(src.width()))
        .max(f64::from(height) / f64::from(src.height()));
    let sw = ((f64::from(src.width()) * scale).ceil() as u32).max(width);
    let sh = ((f64::from(src.height()) * scale).ceil() as u32).max(height);
    let scaled = imageops::resize(src, sw, sh, filter);
    let x = (sw - width) / 2;
    let y = (sh - height) / 2;
    imageops::crop_imm(&scaled, x, y, width, height).to_image()
}

fn scale_alpha(img: &mut RgbaImage, opacity: f64) {
    if opacity >= 1.0 {
        return;
    }
    let k = opacity.clamp(0.0, 1.0);
    for p in img.pixels_mut() {
        p.0[3] = (f64::from(p.0[3]) * k).round() as u8;
    }
}

fn fill_rect(canvas: &mut RgbaImage, rect: Rect, color: Rgba<u8>) {
    let x0 = rect.x0.max(0.0).floor() as u32;
    let y0 = rect.y0.max(0.0).floor() as u32;
    let x1 = (rect.x1.max(0.0).ceil() as u32).min(canvas.width());
    let y1 = (rect.y1.max(0.0).ceil() as u32).min(canvas.height());
    for y in y0..y1 {
        for x in x0..x1 {
            blend_px(canvas.get_pixel_mut(x, y), color);
        }
    }
}

fn blend_px(dst: &mut Rgba<u8>, src: Rgba<u8>) {
    let sa = f32::from(src.0[3]) / 255.0;
    if sa <= 0.0 {
        return;
    }
    let da = f32::from(dst.0[3]) / 255.0;
    let out_a = sa + da * (1.0 - sa);
    for c in 0..3 {
        let s = f32::from(src.0[c]) * sa;
        let d = f32::from(dst.0[c]) * da * (1.0 - sa);
        dst.0[c] = ((s + d) / out_a).round().clamp(0.0, 255.0) as u8;
    }
    dst.0[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
}

fn greek_text(tile: &mut RgbaImage, content: &str, font_size: f64, color: Rgba8, align: TextAlign) {
    if font_size <= 0.0 || !font_size.is_finite() {
        return;
    }
    let w = f64::from(tile.width());
    let color = px(color);
    for (i, line) in content.lines().enumerate() {
        let chars = line.chars().count() as f64;
        if chars == 0.0 {
            continue;
        }
        let bar_w = (chars * font_size * 0.6).min(w);
        let x0 = match align {
            TextAlign::Left => 0.0,
            TextAlign::Center => (w - bar_w) / 2.0,
            TextAlign::Right => w - bar_w,
        };
        let y0 = i as f64 * font_size * 1.2 + font_size * 0.3;
        fill_rect(
            tile,
            Rect::new(x0, y0, x0 + bar_w, y0 + font_size * 0.6),
            color,
        );
    }
}

fn draw_caption_strip(canvas: &mut RgbaImage, text: &str) {
    let w = f64::from(canvas.width());
    let h = f64::from(canvas.height());
    let strip_h = (h * 0.08).max(4.0);
    let strip = Rect::new(0.0, h - strip_h * 1.5, w, h - strip_h * 0.5);
    fill_rect(canvas, strip, Rgba([0, 0, 0, 160]));

    let font_size = strip_h * 0.6;
    let chars = text.chars().count() as f64;
    let bar_w = (chars * font_size * 0.6).min(w * 0.9);
    let x0 = (w - bar_w) / 2.0;
    let y0 = strip.y0 + (strip_h - font_size * 0.6) / 2.0;
    fill_rect(
        canvas,
        Rect::new(x0, y0, x0 + bar_w, y0 + font_size * 0.6),
        Rgba([255, 255, 255, 255]),
    );
}

/// Rotate `tile` (drawn into `rect`) about the rect center by `degrees` clockwise.
///
/// Returns the rotated tile and its top-left corner in canvas space. Nearest-neighbour sampling.
fn rotate_tile(tile: &RgbaImage, rect: Rect, degrees: f64) -> (RgbaImage, Point) {
    let center = rect.center();
    let forward = Affine::rotate_about(degrees.to_radians(), center);
    let bounds = forward.transform_rect_bbox(rect);
    // Trig round-off can push an exact extent a hair past an integer.
    let out_w = (bounds.width() - 1e-6).ceil().max(1.0) as u32;
    let out_h = (bounds.height() - 1e-6).ceil().max(1.0) as u32;
    let inverse = forward.inverse();

    let mut out = RgbaImage::new(out_w, out_h);
    for (x, y, p) in out.enumerate_pixels_mut() {
        let canvas_pt = Point::new(
            bounds.x0 + f64::from(x) + 0.5,
            bounds.y0 + f64::from(y) + 0.5,
        );
        let local = inverse * canvas_pt;
        let sx = (local.x - rect.x0).floor();
        let sy = (local.y - rect.y0).floor();
        if sx >= 0.0 && sy >= 0.0 && sx < f64::from(tile.width()) && sy < f64::from(tile.height())
        {
            *p = *tile.get_pixel(sx as u32, sy as u32);
        }
    }
    (out, Point::new(bounds.x0, bounds.y0))
}

fn apply_filters(img: &mut RgbaImage, filters: &[FilterOp]) {
    for op in filters {
        match *op {
            FilterOp::Blur(radius) => {
                if radius > 0.0 {
                    *img = imageops::blur(&*img, radius as f32);
                }
            }
            other => color_matrix_in_place(img, filter_matrix(other)),
        }
    }
}

/// 4x5 row-major color matrix for a non-blur op, in straight `[0, 1]` space.
fn filter_matrix(op: FilterOp) -> [f32; 20] {
    const ID: [f32; 20] = [
        1.0, 0.0, 0.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 0.0, 1.0, 0.0,
    ];
    match op {
        FilterOp::Brightness(v) => {
            let v = v as f32;
            let mut m = ID;
            m[0] = v;
            m[6] = v;
            m[12] = v;
            m
        }
        FilterOp::Contrast(v) => {
            let v = v as f32;
            let off = 0.5 - 0.5 * v;
            let mut m = ID;
            m[0] = v;
            m[6] = v;
            m[12] = v;
            m[4] = off;
            m[9] = off;
            m[14] = off;
            m
        }
        FilterOp::Saturate(s) => rgb_matrix(saturate_3x3(s as f32)),
        FilterOp::Grayscale(a) => rgb_matrix(saturate_3x3(1.0 - a as f32)),
        FilterOp::HueRotate(deg) => {
            let (sin, cos) = (deg as f32).to_radians().sin_cos();
            rgb_matrix([
                0.213 + cos * 0.787 - sin * 0.213,
                0.715 - cos * 0.715 - sin * 0.715,
                0.072 - cos * 0.072 + sin * 0.928,
                0.213 - cos * 0.213 + sin * 0.143,
                0.715 + cos * 0.285 + sin * 0.140,
                0.072 - cos * 0.072 - sin * 0.283,
                0.213 - cos * 0.213 - sin * 0.787,
                0.715 - cos * 0.715 + sin * 0.715,
                0.072 + cos * 0.928 + sin * 0.072,
            ])
        }
        FilterOp::Sepia(a) => {
            let k = 1.0 - a as f32;
            rgb_matrix([
                0.393 + 0.607 * k,
                0.769 - 0.769 * k,
                0.189 - 0.189 * k,
                0.349 - 0.349 * k,
                0.686 + 0.314 * k,
                0.168 - 0.168 * k,
                0.272 - 0.272 * k,
                0.534 - 0.534 * k,
                0.131 + 0.869 * k,
            ])
        }
        FilterOp::Invert(a) => {
            let a = a as f32;
            let d = 1.0 - 2.0 * a;
            let mut m = ID;
            m[0] = d;
            m[6] = d;
            m[12] = d;
            m[4] = a;
            m[9] = a;
            m[14] = a;
            m
        }
        FilterOp::Opacity(a) => {
            let mut m = ID;
            m[18] = a as f32;
            m
        }
        FilterOp::Blur(_) => ID,
    }
}

fn saturate_3x3(s: f32) -> [f32; 9] {
    [
        0.213 + 0.787 * s,
        0.715 - 0.715 * s,
        0.072 - 0.072 * s,
        0.213 - 0.213 * s,
        0.715 + 0.285 * s,
        0.072 - 0.072 * s,
        0.213 - 0.213 * s,
        0.715 - 0.715 * s,
        0.072 + 0.928 * s,
    ]
}

fn rgb_matrix(c: [f32; 9]) -> [f32; 20] {
    [
        c[0], c[1], c[2], 0.0, 0.0, //
        c[3], c[4], c[5], 0.0, 0.0, //
        c[6], c[7], c[8], 0.0, 0.0, //
        0.0, 0.0, 0.0, 1.0, 0.0,
    ]
}

fn color_matrix_in_place(img: &mut RgbaImage, m: [f32; 20]) {
    for p in img.pixels_mut() {
        let [r, g, b, a] = p.0.map(|v| f32::from(v) / 255.0);
        let row = |i: usize| {
            (m[i] * r + m[i + 1] * g + m[i + 2] * b + m[i + 3] * a + m[i + 4]).clamp(0.0, 1.0)
        };
        let out = [row(0), row(5), row(10), row(15)];
        p.0 = out.map(|v| (v * 255.0).round() as u8);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;

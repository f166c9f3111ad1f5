//! Mapping between canvas space and preview space.
//!
//! Canvas space is the project's logical resolution with the origin at the canvas center; element
//! positions are offsets from that center. Preview space is the displayed surface in pixels with
//! the origin at its top-left corner, uniformly scaled by [`CoordinateTransform::scale_ratio`].

use crate::foundation::core::{Canvas, Point, PreviewSize, Rect, Size, Vec2};

/// Stateless canvas/preview mapping for one canvas and preview size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoordinateTransform {
    /// Logical canvas.
    pub canvas: Canvas,
    /// Displayed preview surface.
    pub preview: PreviewSize,
}

impl CoordinateTransform {
    /// Create a transform.
    pub fn new(canvas: Canvas, preview: PreviewSize) -> Self {
        Self { canvas, preview }
    }

    /// Identity transform: preview equals canvas.
    pub fn identity(canvas: Canvas) -> Self {
        Self::new(
            canvas,
            PreviewSize::new(f64::from(canvas.width), f64::from(canvas.height)),
        )
    }

    /// `preview.width / canvas.width`, or `1.0` when either side is degenerate.
    pub fn scale_ratio(&self) -> f64 {
        let ratio = self.preview.width / f64::from(self.canvas.width);
        if self.canvas.width == 0 || !ratio.is_finite() || ratio <= 0.0 {
            return 1.0;
        }
        ratio
    }

    /// Center-relative canvas position to `(left%, top%)` of the preview.
    ///
    /// `left = 50 + x / width * 100`, `top = 50 + y / height * 100`. A zero-sized axis maps to 50.
    pub fn to_preview_percent(&self, p: Point) -> Point {
        Point::new(
            percent_of(p.x, self.canvas.width),
            percent_of(p.y, self.canvas.height),
        )
    }

    /// Inverse of [`Self::to_preview_percent`].
    pub fn from_preview_percent(&self, pct: Point) -> Point {
        Point::new(
            offset_of(pct.x, self.canvas.width),
            offset_of(pct.y, self.canvas.height),
        )
    }

    /// Center-relative canvas position to preview pixels from the top-left.
    pub fn canvas_to_preview(&self, p: Point) -> Point {
        let pct = self.to_preview_percent(p);
        Point::new(
            pct.x / 100.0 * self.preview.width,
            pct.y / 100.0 * self.preview.height,
        )
    }

    /// Preview pixels to a center-relative canvas position.
    pub fn preview_to_canvas(&self, px: Point) -> Point {
        let pct_x = if self.preview.width > 0.0 {
            px.x / self.preview.width * 100.0
        } else {
            50.0
        };
        let pct_y = if self.preview.height > 0.0 {
            px.y / self.preview.height * 100.0
        } else {
            50.0
        };
        self.from_preview_percent(Point::new(pct_x, pct_y))
    }

    /// Canvas size to preview pixels.
    pub fn size_to_preview(&self, s: Size) -> Size {
        let r = self.scale_ratio();
        Size::new(s.width * r, s.height * r)
    }

    /// Preview pixel size to canvas units.
    pub fn size_to_canvas(&self, s: Size) -> Size {
        let r = self.scale_ratio();
        Size::new(s.width / r, s.height / r)
    }

    /// Pointer delta in preview pixels to a logical canvas delta.
    pub fn delta_to_canvas(&self, d: Vec2) -> Vec2 {
        d / self.scale_ratio()
    }

    /// Axis-aligned (unrotated) preview rectangle of an element.
    pub fn element_rect(&self, center: Point, size: Size) -> Rect {
        Rect::from_center_size(self.canvas_to_preview(center), self.size_to_preview(size))
    }
}

fn percent_of(offset: f64, dimension: u32) -> f64 {
    if dimension == 0 {
        return 50.0;
    }
    50.0 + offset / f64::from(dimension) * 100.0
}

fn offset_of(pct: f64, dimension: u32) -> f64 {
    (pct - 50.0) / 100.0 * f64::from(dimension)
}

#[cfg(test)]
#[path = "../../tests/unit/transform/coords.rs"]
mod tests;

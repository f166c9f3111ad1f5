//! Toolkit-independent pointer input and selection-handle geometry.

use crate::foundation::core::{Point, Rect, Size, Vec2};

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
/// Pointer event phase.
pub enum PointerKind {
    /// Button pressed.
    Down,
    /// Pointer moved.
    Move,
    /// Button released.
    Up,
    /// Pointer capture lost; abandon any gesture without committing.
    Cancel,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
/// Compass direction of a resize handle.
pub enum ResizeHandle {
    /// Top edge.
    N,
    /// Top-right corner.
    Ne,
    /// Right edge.
    E,
    /// Bottom-right corner.
    Se,
    /// Bottom edge.
    S,
    /// Bottom-left corner.
    Sw,
    /// Left edge.
    W,
    /// Top-left corner.
    Nw,
}

impl ResizeHandle {
    /// All eight handles, clockwise from north.
    pub const ALL: [Self; 8] = [
        Self::N,
        Self::Ne,
        Self::E,
        Self::Se,
        Self::S,
        Self::Sw,
        Self::W,
        Self::Nw,
    ];

    /// Moves the top edge.
    pub fn north(self) -> bool {
        matches!(self, Self::N | Self::Ne | Self::Nw)
    }

    /// Moves the bottom edge.
    pub fn south(self) -> bool {
        matches!(self, Self::S | Self::Se | Self::Sw)
    }

    /// Moves the right edge.
    pub fn east(self) -> bool {
        matches!(self, Self::E | Self::Ne | Self::Se)
    }

    /// Moves the left edge.
    pub fn west(self) -> bool {
        matches!(self, Self::W | Self::Nw | Self::Sw)
    }

    /// Unit anchor of the handle on the element box, `(-1..1, -1..1)`.
    fn unit(self) -> Vec2 {
        let x = if self.east() {
            1.0
        } else if self.west() {
            -1.0
        } else {
            0.0
        };
        let y = if self.south() {
            1.0
        } else if self.north() {
            -1.0
        } else {
            0.0
        };
        Vec2::new(x, y)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
/// Which part of an element a pointer-down landed on.
pub enum HitPart {
    /// Element body: move.
    Body,
    /// Resize handle.
    Resize(ResizeHandle),
    /// Rotate handle.
    Rotate,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// The element and part under the pointer.
pub struct PointerTarget {
    /// Target element.
    pub element_id: String,
    /// Hit part.
    pub part: HitPart,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Abstract pointer event in preview-space pixels (origin at the preview's top-left).
pub struct PointerEvent {
    /// Phase.
    pub kind: PointerKind,
    /// Horizontal position.
    pub x: f64,
    /// Vertical position.
    pub y: f64,
    /// Hit target, meaningful for [`PointerKind::Down`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<PointerTarget>,
}

impl PointerEvent {
    /// Pointer-down on a target.
    pub fn down(x: f64, y: f64, element_id: impl Into<String>, part: HitPart) -> Self {
        Self {
            kind: PointerKind::Down,
            x,
            y,
            target: Some(PointerTarget {
                element_id: element_id.into(),
                part,
            }),
        }
    }

    /// Pointer-move.
    pub fn moved(x: f64, y: f64) -> Self {
        Self {
            kind: PointerKind::Move,
            x,
            y,
            target: None,
        }
    }

    /// Pointer-up.
    pub fn up(x: f64, y: f64) -> Self {
        Self {
            kind: PointerKind::Up,
            x,
            y,
            target: None,
        }
    }

    /// Capture lost.
    pub fn cancel() -> Self {
        Self {
            kind: PointerKind::Cancel,
            x: 0.0,
            y: 0.0,
            target: None,
        }
    }

    /// Position as a point.
    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Side length of a square resize handle, in preview pixels.
pub const HANDLE_SIZE: f64 = 10.0;
/// Distance of the rotate handle above the top edge, in preview pixels.
pub const ROTATE_HANDLE_OFFSET: f64 = 24.0;

/// Hit rectangles of the selection handles around an (unrotated) element box.
#[derive(Clone, Debug, PartialEq)]
pub struct HandleGeometry {
    /// Element box in preview space.
    pub bounds: Rect,
    /// Rotation about the box center, degrees clockwise.
    pub rotation_deg: f64,
    /// Resize handle rectangles in the element's local (unrotated) frame.
    pub resize: [(ResizeHandle, Rect); 8],
    /// Rotate handle rectangle in the element's local frame.
    pub rotate: Rect,
}

impl HandleGeometry {
    /// Handles for an element box.
    pub fn new(bounds: Rect, rotation_deg: f64) -> Self {
        let center = bounds.center();
        let half = Vec2::new(bounds.width() / 2.0, bounds.height() / 2.0);
        let handle = Size::new(HANDLE_SIZE, HANDLE_SIZE);
        let resize = ResizeHandle::ALL.map(|h| {
            let u = h.unit();
            let at = center + Vec2::new(u.x * half.x, u.y * half.y);
            (h, Rect::from_center_size(at, handle))
        });
        let rotate = Rect::from_center_size(
            Point::new(center.x, bounds.y0 - ROTATE_HANDLE_OFFSET),
            handle,
        );
        Self {
            bounds,
            rotation_deg,
            resize,
            rotate,
        }
    }

    /// Map a preview point into the element's unrotated frame.
    fn to_local(&self, p: Point) -> Point {
        let inv = kurbo::Affine::rotate_about(-self.rotation_deg.to_radians(), self.bounds.center());
        inv * p
    }

    /// Part under `p`: rotate handle first, then resize handles, then body.
    pub fn hit_test(&self, p: Point) -> Option<HitPart> {
        let local = self.to_local(p);
        if self.rotate.contains(local) {
            return Some(HitPart::Rotate);
        }
        if let Some((h, _)) = self.resize.iter().find(|(_, r)| r.contains(local)) {
            return Some(HitPart::Resize(*h));
        }
        if self.bounds.contains(local) {
            return Some(HitPart::Body);
        }
        None
    }
}

/// Hit-test `pointer` against the selection handles of an element box rotated by `rotation_deg`.
pub fn hit_test_handles(pointer: Point, bounds: Rect, rotation_deg: f64) -> Option<HitPart> {
    HandleGeometry::new(bounds, rotation_deg).hit_test(pointer)
}

#[cfg(test)]
#[path = "../../tests/unit/interact/pointer.rs"]
mod tests;

//! Interactive Transform Controller: the move/resize/rotate drag state machine.
//!
//! `Idle -> Dragging -> Idle`. Pointer-down on an element starts a drag, pointer-move updates a
//! live transform, pointer-up commits only the fields that changed through the
//! [`TimelineStore`]. A drag whose element disappears from the store is cancelled silently.

use crate::foundation::core::{Canvas, Point, Rect, Size};
use crate::foundation::error::CutframeError;
use crate::host::collab::TimelineStore;
use crate::interact::pointer::{HitPart, PointerEvent, PointerKind, ResizeHandle};
use crate::timeline::model::find_element;
use crate::transform::coords::CoordinateTransform;

/// Default minimum element width/height in canvas units.
pub const DEFAULT_MIN_SIZE: f64 = 50.0;

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Controller options.
pub struct ControllerOpts {
    /// Per-axis size floor applied while resizing.
    pub min_size: f64,
}

impl Default for ControllerOpts {
    fn default() -> Self {
        Self {
            min_size: DEFAULT_MIN_SIZE,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Kind of gesture in progress.
pub enum DragMode {
    /// Translate the element.
    Move,
    /// Resize from one handle.
    Resize(ResizeHandle),
    /// Rotate about the element center.
    Rotate,
}

impl From<HitPart> for DragMode {
    fn from(part: HitPart) -> Self {
        match part {
            HitPart::Body => Self::Move,
            HitPart::Resize(h) => Self::Resize(h),
            HitPart::Rotate => Self::Rotate,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
/// Ephemeral record of the single drag in progress.
pub struct DragState {
    /// Gesture kind.
    pub mode: DragMode,
    /// Dragged element.
    pub element_id: String,
    /// Track holding the element at drag start.
    pub track_id: String,
    /// Pointer-down position in preview pixels.
    pub origin: Point,
    /// Element position at drag start (canvas units, center-relative).
    pub initial_position: Point,
    /// Element size at drag start.
    pub initial_size: Size,
    /// Element rotation at drag start.
    pub initial_rotation: f64,
    /// Live transform.
    pub live: LiveTransform,
    /// On-screen extent at drag start, preview pixels.
    pub extent: Rect,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
/// Position, size and rotation of an element while it is being dragged.
pub struct LiveTransform {
    /// Center-relative position.
    pub position: Point,
    /// Size.
    pub size: Size,
    /// Rotation, degrees.
    pub rotation: f64,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
/// Fields sent to the store on pointer-up. `None` means unchanged and not sent.
pub struct CommitSummary {
    /// Committed element.
    pub element_id: String,
    /// New position.
    pub position: Option<Point>,
    /// New size.
    pub size: Option<Size>,
    /// New rotation.
    pub rotation: Option<f64>,
}

impl CommitSummary {
    /// Return `true` when nothing changed.
    pub fn is_empty(&self) -> bool {
        self.position.is_none() && self.size.is_none() && self.rotation.is_none()
    }
}

#[derive(Clone, Debug, PartialEq)]
/// Result of feeding one pointer event to the controller.
pub enum ControllerOutcome {
    /// Event had no effect.
    Ignored,
    /// A drag started.
    Started,
    /// The live transform changed.
    Updated,
    /// The drag ended and changes were committed.
    Committed(CommitSummary),
    /// The drag ended without committing.
    Cancelled,
}

/// Drag state machine. Holds at most one [`DragState`].
#[derive(Clone, Debug, Default)]
pub struct TransformController {
    opts: ControllerOpts,
    drag: Option<DragState>,
}

impl TransformController {
    /// Create an idle controller.
    pub fn new(opts: ControllerOpts) -> Self {
        Self { opts, drag: None }
    }

    /// Options.
    pub fn opts(&self) -> ControllerOpts {
        self.opts
    }

    /// Return `true` while a drag is in progress; move/up events only matter then.
    pub fn is_listening(&self) -> bool {
        self.drag.is_some()
    }

    /// Current drag, if any.
    pub fn drag(&self) -> Option<&DragState> {
        self.drag.as_ref()
    }

    /// Live transform for `element_id` when it is the element being dragged.
    pub fn live_override(&self, element_id: &str) -> Option<LiveTransform> {
        self.drag
            .as_ref()
            .filter(|d| d.element_id == element_id)
            .map(|d| d.live)
    }

    /// Drop any drag without committing.
    pub fn reset(&mut self) {
        self.drag = None;
    }

    /// Feed one pointer event.
    pub fn handle_pointer(
        &mut self,
        event: &PointerEvent,
        store: &mut dyn TimelineStore,
        xf: &CoordinateTransform,
    ) -> ControllerOutcome {
        match event.kind {
            PointerKind::Down => self.on_down(event, store, xf),
            PointerKind::Move => self.on_move(event, store, xf),
            PointerKind::Up => self.on_up(event, store, xf),
            PointerKind::Cancel => {
                if self.drag.take().is_some() {
                    tracing::debug!("drag cancelled by pointer capture loss");
                    ControllerOutcome::Cancelled
                } else {
                    ControllerOutcome::Ignored
                }
            }
        }
    }

    fn on_down(
        &mut self,
        event: &PointerEvent,
        store: &dyn TimelineStore,
        xf: &CoordinateTransform,
    ) -> ControllerOutcome {
        if let Some(d) = &self.drag {
            tracing::debug!(active = %d.element_id, "pointer-down ignored while dragging");
            return ControllerOutcome::Ignored;
        }
        let Some(target) = &event.target else {
            return ControllerOutcome::Ignored;
        };
        let Some((track, el)) = find_element(store.tracks(), &target.element_id) else {
            tracing::debug!(element = %target.element_id, "pointer-down on unknown element");
            return ControllerOutcome::Ignored;
        };

        let position = el.position_or_center();
        let size = el.resolved_size(xf.canvas);
        self.drag = Some(DragState {
            mode: target.part.into(),
            element_id: el.id.clone(),
            track_id: track.id.clone(),
            origin: event.point(),
            initial_position: position,
            initial_size: size,
            initial_rotation: el.rotation,
            live: LiveTransform {
                position,
                size,
                rotation: el.rotation,
            },
            extent: xf.element_rect(position, size),
        });
        ControllerOutcome::Started
    }

    fn on_move(
        &mut self,
        event: &PointerEvent,
        store: &dyn TimelineStore,
        xf: &CoordinateTransform,
    ) -> ControllerOutcome {
        if self.drag.is_none() {
            return ControllerOutcome::Ignored;
        }
        if !self.target_alive(store) {
            return self.cancel_detached();
        }
        let min_size = self.opts.min_size;
        let Some(drag) = self.drag.as_mut() else {
            return ControllerOutcome::Ignored;
        };
        let next = drag_transform(drag, event.point(), xf, min_size);
        if next == drag.live {
            return ControllerOutcome::Ignored;
        }
        drag.live = next;
        ControllerOutcome::Updated
    }

    fn on_up(
        &mut self,
        event: &PointerEvent,
        store: &mut dyn TimelineStore,
        xf: &CoordinateTransform,
    ) -> ControllerOutcome {
        if self.drag.is_none() {
            return ControllerOutcome::Ignored;
        }
        if !self.target_alive(store) {
            return self.cancel_detached();
        }
        let Some(drag) = self.drag.take() else {
            return ControllerOutcome::Ignored;
        };
        let live = drag_transform(&drag, event.point(), xf, self.opts.min_size);

        let summary = CommitSummary {
            element_id: drag.element_id.clone(),
            position: (live.position != drag.initial_position).then_some(live.position),
            size: (live.size != drag.initial_size).then_some(live.size),
            rotation: (live.rotation != drag.initial_rotation).then_some(live.rotation),
        };
        if let Some(p) = summary.position {
            store.update_position(&drag.element_id, p);
        }
        if let Some(s) = summary.size {
            store.update_size(&drag.element_id, s);
        }
        if let Some(r) = summary.rotation {
            store.update_rotation(&drag.element_id, r);
        }
        tracing::debug!(element = %drag.element_id, ?summary, "drag committed");
        ControllerOutcome::Committed(summary)
    }

    fn target_alive(&self, store: &dyn TimelineStore) -> bool {
        self.drag
            .as_ref()
            .is_some_and(|d| find_element(store.tracks(), &d.element_id).is_some())
    }

    fn cancel_detached(&mut self) -> ControllerOutcome {
        if let Some(d) = self.drag.take() {
            let err = CutframeError::transform_cancelled(format!(
                "element '{}' left the timeline mid-drag",
                d.element_id
            ));
            tracing::debug!(%err, "resetting to idle");
        }
        ControllerOutcome::Cancelled
    }
}

fn drag_transform(
    drag: &DragState,
    pointer: Point,
    xf: &CoordinateTransform,
    min_size: f64,
) -> LiveTransform {
    let delta = xf.delta_to_canvas(pointer - drag.origin);
    let mut live = LiveTransform {
        position: drag.initial_position,
        size: drag.initial_size,
        rotation: drag.initial_rotation,
    };
    match drag.mode {
        DragMode::Move => {
            live.position =
                clamp_to_canvas(drag.initial_position + delta, drag.initial_size, xf.canvas);
        }
        DragMode::Resize(handle) => {
            let (position, size) = resize_from_handle(
                drag.initial_position,
                drag.initial_size,
                handle,
                delta.x,
                delta.y,
                min_size,
            );
            live.position = position;
            live.size = size;
        }
        DragMode::Rotate => {
            live.rotation = rotation_from_pointer(drag.extent.center(), pointer);
        }
    }
    live
}

/// Clamp a center-relative position so an element of `size` stays inside the canvas.
///
/// An element larger than the canvas on an axis is centered on that axis.
pub fn clamp_to_canvas(position: Point, size: Size, canvas: Canvas) -> Point {
    Point::new(
        clamp_axis(position.x, size.width, f64::from(canvas.width)),
        clamp_axis(position.y, size.height, f64::from(canvas.height)),
    )
}

fn clamp_axis(v: f64, extent: f64, dimension: f64) -> f64 {
    let max = dimension / 2.0 - extent / 2.0;
    let min = -max;
    if min > max {
        return 0.0;
    }
    v.clamp(min, max)
}

/// New `(position, size)` after dragging `handle` by a canvas-space delta `(dx, dy)`.
///
/// Each axis is floored at `min_size`. Positions are centers, so the center moves by half the
/// applied size change toward the dragged edge and the opposite edge stays fixed.
pub fn resize_from_handle(
    position: Point,
    size: Size,
    handle: ResizeHandle,
    dx: f64,
    dy: f64,
    min_size: f64,
) -> (Point, Size) {
    let dw = if handle.east() {
        dx
    } else if handle.west() {
        -dx
    } else {
        0.0
    };
    let dh = if handle.south() {
        dy
    } else if handle.north() {
        -dy
    } else {
        0.0
    };

    let width = if dw == 0.0 {
        size.width
    } else {
        (size.width + dw).max(min_size)
    };
    let height = if dh == 0.0 {
        size.height
    } else {
        (size.height + dh).max(min_size)
    };
    let applied_w = width - size.width;
    let applied_h = height - size.height;

    let shift_x = (if handle.west() { -applied_w } else { applied_w }) / 2.0;
    let shift_y = (if handle.north() { -applied_h } else { applied_h }) / 2.0;
    (
        Point::new(position.x + shift_x, position.y + shift_y),
        Size::new(width, height),
    )
}

/// Angle from `center` to `pointer` in whole degrees, clockwise from +x (y grows downward).
pub fn rotation_from_pointer(center: Point, pointer: Point) -> f64 {
    (pointer.y - center.y)
        .atan2(pointer.x - center.x)
        .to_degrees()
        .round()
}

#[cfg(test)]
#[path = "../../tests/unit/interact/controller.rs"]
mod tests;

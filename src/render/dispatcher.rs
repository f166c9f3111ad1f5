//! Render Dispatcher: one compositing pass from active elements to a [`LayerStack`].
//!
//! Composition is stateless. The dispatcher owns the [`FrameCache`] and only consults it for
//! explicit cached draws; live draws always compose from scratch so drag feedback is current.

use std::sync::Arc;

use crate::cache::frame_cache::{FrameCache, FrameSurface};
use crate::effects::merge::merge_effects;
use crate::eval::resolver::{ActiveElement, MediaState};
use crate::foundation::core::{Point, Size};
use crate::foundation::error::{CutframeError, CutframeResult};
use crate::host::collab::{EffectsRegistry, MediaType};
use crate::interact::controller::TransformController;
use crate::interact::pointer::HandleGeometry;
use crate::render::layers::{
    Background, ElementContent, ElementLayer, FilterOps, LayerStack, Overlay, PlaceholderKind,
    element_z,
};
use crate::timeline::model::{BackgroundType, ElementKind, ElementVariant, ProjectSettings};
use crate::transform::coords::CoordinateTransform;

/// Turns a [`LayerStack`] into pixels.
pub trait FrameRasterizer {
    /// Rasterize a finished stack at its preview size.
    fn rasterize(&self, stack: &LayerStack) -> CutframeResult<image::RgbaImage>;
}

#[derive(Clone, Copy)]
/// Inputs of one compositing pass.
pub struct FrameRequest<'a> {
    /// Timeline time in seconds.
    pub time: f64,
    /// Resolver output at `time`.
    pub active: &'a [ActiveElement<'a>],
    /// Canvas and background settings.
    pub settings: &'a ProjectSettings,
    /// Canvas/preview mapping.
    pub transform: CoordinateTransform,
    /// Effects per element.
    pub effects: &'a dyn EffectsRegistry,
    /// Selected element, drawn with handles.
    pub selection: Option<&'a str>,
    /// Drag in progress, whose live transform overrides the stored one.
    pub drag: Option<&'a TransformController>,
    /// Caption text shown in the caption overlay.
    pub caption: Option<&'a str>,
}

impl std::fmt::Debug for FrameRequest<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameRequest")
            .field("time", &self.time)
            .field("active", &self.active.len())
            .field("transform", &self.transform)
            .field("selection", &self.selection)
            .field("dragging", &self.drag.is_some_and(|d| d.is_listening()))
            .finish()
    }
}

impl<'a> FrameRequest<'a> {
    /// Request with no selection, drag or caption.
    pub fn new(
        time: f64,
        active: &'a [ActiveElement<'a>],
        settings: &'a ProjectSettings,
        transform: CoordinateTransform,
        effects: &'a dyn EffectsRegistry,
    ) -> Self {
        Self {
            time,
            active,
            settings,
            transform,
            effects,
            selection: None,
            drag: None,
            caption: None,
        }
    }

    /// Same request without selection handles or live drag state.
    ///
    /// Cached frames are keyed by time only and must not capture interaction state.
    pub fn without_interaction(self) -> Self {
        Self {
            selection: None,
            drag: None,
            ..self
        }
    }
}

/// Index into `active` of the current media element: the last active media element that
/// draws pixels.
pub fn current_media_index(active: &[ActiveElement<'_>]) -> Option<usize> {
    active.iter().rposition(|a| {
        a.element.variant() == ElementVariant::Media
            && a
                .media
                .as_ref()
                .is_none_or(|m| m.media_type != MediaType::Audio)
    })
}

/// Compose the layer stack for one request.
#[tracing::instrument(level = "debug", skip(req), fields(time = req.time, active = req.active.len()))]
pub fn compose_layers(req: &FrameRequest<'_>) -> LayerStack {
    let xf = req.transform;
    let current = current_media_index(req.active);

    let background = background_layer(req, current);
    let mut stack = LayerStack::new(xf.preview, background);

    for (idx, active) in req.active.iter().enumerate() {
        match element_layer(req, idx, active, current == Some(idx)) {
            Ok(Some(layer)) => stack.push_element(layer),
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(element = %active.element.id, %err, "skipping layer");
            }
        }
    }

    stack.push_overlay(Overlay::Annotation);
    stack.push_overlay(Overlay::Captions {
        text: req.caption.map(str::to_owned),
    });
    if let Some(selected) = req.selection
        && let Some(layer) = stack.element(selected)
    {
        let handles = HandleGeometry::new(layer.rect, layer.rotation);
        stack.push_overlay(Overlay::Handles(handles));
    }

    stack.finish();
    stack
}

fn background_layer(req: &FrameRequest<'_>, current: Option<usize>) -> Background {
    let settings = req.settings;
    if settings.background_type == BackgroundType::Blur
        && let Some(idx) = current
        && let Some(active) = req.active.get(idx)
        && let Some(handle) = &active.media
        && let Some(source) = handle.pixels_at(active.source_time(req.time))
    {
        let sigma = (settings.blur_intensity.max(0.0) * req.transform.scale_ratio()) as f32;
        return Background::Blur {
            source,
            sigma,
            fallback: settings.background_color,
        };
    }
    Background::Color(settings.background_color)
}

fn element_layer(
    req: &FrameRequest<'_>,
    idx: usize,
    active: &ActiveElement<'_>,
    is_current_media: bool,
) -> CutframeResult<Option<ElementLayer>> {
    let el = active.element;
    let xf = req.transform;

    let (position, size, rotation) = match req.drag.and_then(|d| d.live_override(&el.id)) {
        Some(live) => (live.position, live.size, live.rotation),
        None => (
            el.position_or_center(),
            el.resolved_size(xf.canvas),
            el.rotation,
        ),
    };
    check_geometry(&el.id, position, size, rotation)?;

    let content = match &el.kind {
        ElementKind::Media(_) | ElementKind::Sticker(_) => {
            match media_content(req, active, is_current_media)? {
                Some(content) => content,
                None => return Ok(None),
            }
        }
        ElementKind::Text(t) => ElementContent::Text {
            content: t.content.clone(),
            font_size: t.font_size * xf.scale_ratio(),
            color: t.color,
            background: t.background_color,
            align: t.align,
        },
        ElementKind::Markdown(m) => ElementContent::Text {
            content: m.source.clone(),
            font_size: m.font_size * xf.scale_ratio(),
            color: m.color,
            background: None,
            align: Default::default(),
        },
        ElementKind::Component(c) => ElementContent::Component {
            component_id: c.component_id.clone(),
            props: c.props.clone(),
        },
    };

    let variant = el.variant();
    Ok(Some(ElementLayer {
        element_id: el.id.clone(),
        variant,
        z: element_z(variant, idx),
        rect: xf.element_rect(position, size),
        rotation,
        opacity: el.opacity.clamp(0.0, 1.0),
        content,
    }))
}

fn media_content(
    req: &FrameRequest<'_>,
    active: &ActiveElement<'_>,
    is_current_media: bool,
) -> CutframeResult<Option<ElementContent>> {
    let el = active.element;
    let placeholder = match &active.media_state {
        MediaState::Loading => Some(PlaceholderKind::Loading),
        MediaState::Errored(_) => Some(PlaceholderKind::Errored),
        MediaState::Missing => Some(PlaceholderKind::Missing),
        MediaState::Ready | MediaState::NotMedia => None,
    };
    if let Some(kind) = placeholder {
        return Ok(Some(ElementContent::Placeholder(kind)));
    }
    let Some(handle) = &active.media else {
        return Ok(Some(ElementContent::Placeholder(PlaceholderKind::Missing)));
    };
    if handle.media_type == MediaType::Audio {
        return Ok(None);
    }

    let source_time = active.source_time(req.time);
    let image = handle.pixels_at(source_time).ok_or_else(|| {
        CutframeError::render_failure(format!(
            "no pixels for '{}' at source time {source_time:.3}s",
            el.id
        ))
    })?;

    let filters: FilterOps = if is_current_media {
        let spec = merge_effects(&req.effects.effects(&el.id));
        if !spec.is_none() {
            tracing::trace!(element = %el.id, filter = %spec.to_css(), "current media filter");
        }
        spec.filter_ops().into_iter().collect()
    } else {
        FilterOps::new()
    };
    Ok(Some(ElementContent::Pixels { image, filters }))
}

fn check_geometry(id: &str, position: Point, size: Size, rotation: f64) -> CutframeResult<()> {
    let finite = position.x.is_finite()
        && position.y.is_finite()
        && size.width.is_finite()
        && size.height.is_finite()
        && rotation.is_finite();
    if !finite || size.width < 0.0 || size.height < 0.0 {
        return Err(CutframeError::render_failure(format!(
            "element '{id}' has invalid geometry"
        )));
    }
    Ok(())
}

/// Compose and rasterize without touching any cache.
pub fn render_uncached<R: FrameRasterizer + ?Sized>(
    rasterizer: &R,
    req: &FrameRequest<'_>,
) -> CutframeResult<FrameSurface> {
    let stack = compose_layers(req);
    Ok(Arc::new(rasterizer.rasterize(&stack)?))
}

/// Owns the frame cache and a rasterizer.
#[derive(Debug)]
pub struct RenderDispatcher<R> {
    rasterizer: R,
    cache: FrameCache,
}

impl<R: FrameRasterizer> RenderDispatcher<R> {
    /// Create a dispatcher.
    pub fn new(rasterizer: R, cache: FrameCache) -> Self {
        Self { rasterizer, cache }
    }

    /// Compose the layer stack for `req`.
    pub fn compose(&self, req: &FrameRequest<'_>) -> LayerStack {
        compose_layers(req)
    }

    /// Live draw: always composes and rasterizes, never reads or writes the cache.
    pub fn draw_live(&self, req: &FrameRequest<'_>) -> CutframeResult<FrameSurface> {
        render_uncached(&self.rasterizer, req)
    }

    /// Cached draw at the quantized tick of `req.time`.
    ///
    /// Interaction state is stripped from the request. Returns `None` when the render fails.
    pub fn draw_cached(&mut self, req: &FrameRequest<'_>) -> Option<FrameSurface> {
        let req = req.without_interaction();
        let tick = self.cache.quantize(req.time);
        let rasterizer = &self.rasterizer;
        self.cache
            .get_or_render(tick, |_| render_uncached(rasterizer, &req))
    }

    /// Frame cache.
    pub fn cache(&self) -> &FrameCache {
        &self.cache
    }

    /// Mutable frame cache.
    pub fn cache_mut(&mut self) -> &mut FrameCache {
        &mut self.cache
    }

    /// Rasterizer.
    pub fn rasterizer(&self) -> &R {
        &self.rasterizer
    }

    /// Rasterizer and cache borrowed together, for pre-fetch passes.
    pub fn split_mut(&mut self) -> (&R, &mut FrameCache) {
        (&self.rasterizer, &mut self.cache)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/dispatcher.rs"]
mod tests;

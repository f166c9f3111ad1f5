//! Composited layer stack: the output of one dispatch pass.
//!
//! Layers are in preview space. A stack is drawn bottom to top after sorting by `z`; ties keep
//! insertion order.

use std::sync::Arc;

use smallvec::SmallVec;

use crate::effects::merge::FilterOp;
use crate::foundation::core::{PreviewSize, Rect, Rgba8};
use crate::interact::pointer::HandleGeometry;
use crate::timeline::model::{ElementVariant, TextAlign};

/// Z-index stride between variant tiers; the resolver index fills the slots inside a tier.
pub const TIER_STRIDE: i32 = 10_000;
/// Base z of the fixed overlays, above every element tier.
pub const OVERLAY_Z: i32 = 100 * TIER_STRIDE;

/// Tier of an element variant. Higher tiers draw on top.
pub fn variant_tier(variant: ElementVariant) -> i32 {
    match variant {
        ElementVariant::Component => 1,
        ElementVariant::Media => 2,
        ElementVariant::Sticker => 3,
        ElementVariant::Markdown | ElementVariant::Text => 4,
    }
}

/// z-index of an element: variant tier, then resolver position.
pub fn element_z(variant: ElementVariant, resolver_index: usize) -> i32 {
    let slot = i32::try_from(resolver_index)
        .unwrap_or(TIER_STRIDE - 1)
        .min(TIER_STRIDE - 1);
    variant_tier(variant) * TIER_STRIDE + slot
}

/// Small inline list of filter ops; most elements carry none or a handful.
pub type FilterOps = SmallVec<[FilterOp; 4]>;

#[derive(Clone, Debug)]
/// Base layer beneath all elements.
pub enum Background {
    /// Solid project color.
    Color(Rgba8),
    /// Blurred, canvas-filling copy of an active media frame.
    Blur {
        /// Source pixels.
        source: Arc<image::RgbaImage>,
        /// Blur sigma in preview pixels.
        sigma: f32,
        /// Fill behind the blurred frame.
        fallback: Rgba8,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
/// Why an element is drawn as a placeholder.
pub enum PlaceholderKind {
    /// Source still loading.
    Loading,
    /// Source failed to load.
    Errored,
    /// Media reference does not resolve.
    Missing,
}

impl PlaceholderKind {
    /// Fill color used by the CPU rasterizer.
    pub fn color(self) -> Rgba8 {
        match self {
            Self::Loading => Rgba8 {
                r: 64,
                g: 64,
                b: 72,
                a: 200,
            },
            Self::Errored => Rgba8 {
                r: 160,
                g: 32,
                b: 32,
                a: 200,
            },
            Self::Missing => Rgba8 {
                r: 96,
                g: 32,
                b: 96,
                a: 200,
            },
        }
    }
}

#[derive(Clone, Debug)]
/// What an element layer draws.
pub enum ElementContent {
    /// Pixels of a resolved media or sticker source.
    Pixels {
        /// Frame to draw, stretched to the layer rect.
        image: Arc<image::RgbaImage>,
        /// Filter chain, empty unless this is the current media element.
        filters: FilterOps,
    },
    /// Text or markdown block.
    Text {
        /// Plain text; markdown source is drawn as-is.
        content: String,
        /// Font size in preview pixels.
        font_size: f64,
        /// Glyph color.
        color: Rgba8,
        /// Optional box fill.
        background: Option<Rgba8>,
        /// Horizontal alignment.
        align: TextAlign,
    },
    /// Generated component, drawn by the host.
    Component {
        /// Component identifier.
        component_id: String,
        /// Props passed to the component.
        props: serde_json::Value,
    },
    /// Placeholder for an unresolved media source.
    Placeholder(PlaceholderKind),
}

#[derive(Clone, Debug)]
/// One element drawn into the preview.
pub struct ElementLayer {
    /// Source element.
    pub element_id: String,
    /// Element variant.
    pub variant: ElementVariant,
    /// Stacking order.
    pub z: i32,
    /// Unrotated preview rect.
    pub rect: Rect,
    /// Rotation about the rect center, degrees clockwise.
    pub rotation: f64,
    /// Opacity in `[0, 1]`.
    pub opacity: f64,
    /// Drawn content.
    pub content: ElementContent,
}

#[derive(Clone, Debug)]
/// Fixed overlays drawn above every element.
pub enum Overlay {
    /// Free-form annotation layer, drawn by the host.
    Annotation,
    /// Caption strip with the caption active at the current time.
    Captions {
        /// Caption text, if any.
        text: Option<String>,
    },
    /// Selection handles of the selected element.
    Handles(HandleGeometry),
}

impl Overlay {
    /// z-index of the overlay.
    pub fn z(&self) -> i32 {
        match self {
            Self::Annotation => OVERLAY_Z,
            Self::Captions { .. } => OVERLAY_Z + 1,
            Self::Handles(_) => OVERLAY_Z + 2,
        }
    }
}

#[derive(Clone, Debug)]
/// Output of one dispatch pass.
pub struct LayerStack {
    /// Preview surface size.
    pub preview: PreviewSize,
    /// Base layer.
    pub background: Background,
    /// Element layers sorted by z.
    pub elements: Vec<ElementLayer>,
    /// Overlays, bottom to top.
    pub overlays: Vec<Overlay>,
}

impl LayerStack {
    /// Empty stack with a solid background.
    pub fn new(preview: PreviewSize, background: Background) -> Self {
        Self {
            preview,
            background,
            elements: Vec::new(),
            overlays: Vec::new(),
        }
    }

    /// Add an element layer. Call [`Self::finish`] once all layers are pushed.
    pub fn push_element(&mut self, layer: ElementLayer) {
        self.elements.push(layer);
    }

    /// Add an overlay.
    pub fn push_overlay(&mut self, overlay: Overlay) {
        self.overlays.push(overlay);
    }

    /// Stable-sort elements and overlays by z.
    pub fn finish(&mut self) {
        self.elements.sort_by_key(|l| l.z);
        self.overlays.sort_by_key(Overlay::z);
    }

    /// Element ids bottom to top.
    pub fn element_order(&self) -> Vec<&str> {
        self.elements.iter().map(|l| l.element_id.as_str()).collect()
    }

    /// Layer of an element.
    pub fn element(&self, element_id: &str) -> Option<&ElementLayer> {
        self.elements.iter().find(|l| l.element_id == element_id)
    }

    /// Highest z used by any element, or `None` for an empty stack.
    pub fn top_element_z(&self) -> Option<i32> {
        self.elements.iter().map(|l| l.z).max()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/layers.rs"]
mod tests;

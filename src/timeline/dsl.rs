use crate::{
    foundation::core::{Canvas, Point, Rgba8, Size},
    foundation::error::{CutframeError, CutframeResult},
    timeline::model::{
        BackgroundType, ComponentPayload, ElementKind, MarkdownPayload, MediaPayload,
        ProjectSettings, StickerPayload, TextAlign, TextPayload, Timeline, TimelineElement, Track,
        TrackKind,
    },
};

/// Builder for [`Timeline`](crate::Timeline).
pub struct TimelineBuilder {
    settings: ProjectSettings,
    tracks: Vec<Track>,
}

impl TimelineBuilder {
    /// Create a builder for a timeline on `canvas`.
    pub fn new(canvas: Canvas) -> Self {
        Self {
            settings: ProjectSettings::new(canvas),
            tracks: Vec::new(),
        }
    }

    /// Use a solid background color.
    pub fn background_color(mut self, color: Rgba8) -> Self {
        self.settings.background_type = BackgroundType::Color;
        self.settings.background_color = color;
        self
    }

    /// Use a blurred media background.
    pub fn background_blur(mut self, intensity: f64) -> Self {
        self.settings.background_type = BackgroundType::Blur;
        self.settings.blur_intensity = intensity;
        self
    }

    /// Append a track (composited above all previously added tracks).
    pub fn track(mut self, track: Track) -> Self {
        self.tracks.push(track);
        self
    }

    /// Build and validate the final [`Timeline`](crate::Timeline).
    pub fn build(self) -> CutframeResult<Timeline> {
        let timeline = Timeline {
            settings: self.settings,
            tracks: self.tracks,
        };
        timeline.validate()?;
        Ok(timeline)
    }
}

/// Builder for a [`Track`](crate::Track).
pub struct TrackBuilder {
    id: String,
    kind: TrackKind,
    elements: Vec<TimelineElement>,
}

impl TrackBuilder {
    /// Create a builder for a track.
    pub fn new(id: impl Into<String>, kind: TrackKind) -> Self {
        Self {
            id: id.into(),
            kind,
            elements: Vec::new(),
        }
    }

    /// Append an element.
    pub fn element(mut self, element: TimelineElement) -> Self {
        self.elements.push(element);
        self
    }

    /// Build the track, rejecting an empty id.
    pub fn build(self) -> CutframeResult<Track> {
        if self.id.trim().is_empty() {
            return Err(CutframeError::validation("track id must be non-empty"));
        }
        Ok(Track {
            id: self.id,
            kind: self.kind,
            elements: self.elements,
        })
    }
}

/// Builder for a [`TimelineElement`](crate::TimelineElement).
pub struct ElementBuilder {
    element: TimelineElement,
}

impl ElementBuilder {
    fn with_kind(id: impl Into<String>, start_time: f64, duration: f64, kind: ElementKind) -> Self {
        Self {
            element: TimelineElement {
                id: id.into(),
                start_time,
                duration,
                trim_start: 0.0,
                trim_end: 0.0,
                hidden: false,
                opacity: 1.0,
                rotation: 0.0,
                position: None,
                size: None,
                kind,
            },
        }
    }

    /// Media element referencing `media_id`.
    pub fn media(
        id: impl Into<String>,
        media_id: impl Into<String>,
        start_time: f64,
        duration: f64,
    ) -> Self {
        Self::with_kind(
            id,
            start_time,
            duration,
            ElementKind::Media(MediaPayload {
                media_id: media_id.into(),
                volume: 1.0,
                muted: false,
            }),
        )
    }

    /// Text element with default styling.
    pub fn text(
        id: impl Into<String>,
        content: impl Into<String>,
        start_time: f64,
        duration: f64,
    ) -> Self {
        Self::with_kind(
            id,
            start_time,
            duration,
            ElementKind::Text(TextPayload {
                content: content.into(),
                font_family: "Inter".to_string(),
                font_size: 48.0,
                color: Rgba8::WHITE,
                background_color: None,
                align: TextAlign::Center,
            }),
        )
    }

    /// Markdown element.
    pub fn markdown(
        id: impl Into<String>,
        source: impl Into<String>,
        start_time: f64,
        duration: f64,
    ) -> Self {
        Self::with_kind(
            id,
            start_time,
            duration,
            ElementKind::Markdown(MarkdownPayload {
                source: source.into(),
                font_size: 48.0,
                color: Rgba8::WHITE,
            }),
        )
    }

    /// Sticker element referencing `media_id`.
    pub fn sticker(
        id: impl Into<String>,
        media_id: impl Into<String>,
        start_time: f64,
        duration: f64,
    ) -> Self {
        Self::with_kind(
            id,
            start_time,
            duration,
            ElementKind::Sticker(StickerPayload {
                media_id: media_id.into(),
            }),
        )
    }

    /// Generated component element.
    pub fn component(
        id: impl Into<String>,
        component_id: impl Into<String>,
        start_time: f64,
        duration: f64,
    ) -> Self {
        Self::with_kind(
            id,
            start_time,
            duration,
            ElementKind::Component(ComponentPayload {
                component_id: component_id.into(),
                props: serde_json::Value::Null,
            }),
        )
    }

    /// Set head and tail trims.
    pub fn trim(mut self, trim_start: f64, trim_end: f64) -> Self {
        self.element.trim_start = trim_start;
        self.element.trim_end = trim_end;
        self
    }

    /// Set the center-relative position.
    pub fn position(mut self, x: f64, y: f64) -> Self {
        self.element.position = Some(Point::new(x, y));
        self
    }

    /// Set the logical size.
    pub fn size(mut self, width: f64, height: f64) -> Self {
        self.element.size = Some(Size::new(width, height));
        self
    }

    /// Set rotation in degrees.
    pub fn rotation(mut self, degrees: f64) -> Self {
        self.element.rotation = degrees;
        self
    }

    /// Set opacity.
    pub fn opacity(mut self, opacity: f64) -> Self {
        self.element.opacity = opacity;
        self
    }

    /// Mark hidden.
    pub fn hidden(mut self) -> Self {
        self.element.hidden = true;
        self
    }

    /// Finish the element.
    pub fn build(self) -> TimelineElement {
        self.element
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/dsl.rs"]
mod tests;

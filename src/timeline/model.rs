use std::collections::HashSet;
use std::path::Path;

use anyhow::Context;

use crate::foundation::core::{Canvas, Point, Rgba8, Size};
use crate::foundation::error::{CutframeError, CutframeResult};

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// A complete editable timeline: project settings plus ordered tracks.
///
/// This is the document the CLI loads from JSON. Inside an editor the same data is read through
/// [`crate::TimelineStore`] and [`crate::ProjectSettingsSource`].
pub struct Timeline {
    /// Canvas and background configuration.
    pub settings: ProjectSettings,
    /// Tracks in base z-order (later tracks composite above earlier ones).
    pub tracks: Vec<Track>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Project-level settings that affect every rendered frame.
pub struct ProjectSettings {
    /// Logical canvas resolution.
    pub canvas: Canvas,
    /// Background fill mode.
    #[serde(default)]
    pub background_type: BackgroundType,
    /// Fill color used in [`BackgroundType::Color`] mode.
    #[serde(default = "default_background_color")]
    pub background_color: Rgba8,
    /// Blur strength used in [`BackgroundType::Blur`] mode.
    #[serde(default = "default_blur_intensity")]
    pub blur_intensity: f64,
}

impl ProjectSettings {
    /// Settings with a black color background.
    pub fn new(canvas: Canvas) -> Self {
        Self {
            canvas,
            background_type: BackgroundType::Color,
            background_color: default_background_color(),
            blur_intensity: default_blur_intensity(),
        }
    }
}

fn default_background_color() -> Rgba8 {
    Rgba8::BLACK
}

fn default_blur_intensity() -> f64 {
    8.0
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
/// How the area behind all elements is filled.
pub enum BackgroundType {
    /// Solid color.
    #[default]
    Color,
    /// Blurred, scaled-up copy of the current media element.
    Blur,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// An ordered lane of timeline elements.
pub struct Track {
    /// Stable track identifier.
    pub id: String,
    /// Track type tag.
    #[serde(rename = "type")]
    pub kind: TrackKind,
    /// Elements in authoring order.
    #[serde(default)]
    pub elements: Vec<TimelineElement>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
/// Track type tag.
pub enum TrackKind {
    /// Video and image clips.
    Media,
    /// Text overlays.
    Text,
    /// Audio-only clips.
    Audio,
    /// Sticker images.
    Sticker,
    /// Markdown blocks.
    Markdown,
    /// Generated components.
    Component,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// A time-bounded item on a track.
///
/// The engine never mutates elements; edits go through [`crate::TimelineStore`].
pub struct TimelineElement {
    /// Stable element identifier.
    pub id: String,
    /// Timeline start in seconds.
    pub start_time: f64,
    /// Untrimmed duration in seconds.
    pub duration: f64,
    /// Seconds trimmed from the head.
    #[serde(default)]
    pub trim_start: f64,
    /// Seconds trimmed from the tail.
    #[serde(default)]
    pub trim_end: f64,
    /// Hidden elements never resolve as active.
    #[serde(default)]
    pub hidden: bool,
    /// Opacity in `[0, 1]`.
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    /// Rotation in degrees, clockwise.
    #[serde(default)]
    pub rotation: f64,
    /// Center-relative position in canvas units; `None` means centered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Point>,
    /// Size in canvas units; `None` means the renderer's intrinsic size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
    /// Variant payload.
    #[serde(flatten)]
    pub kind: ElementKind,
}

fn default_opacity() -> f64 {
    1.0
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
/// Closed set of element kinds and their rendering payloads.
pub enum ElementKind {
    /// Video, image or audio media.
    Media(MediaPayload),
    /// Styled plain text.
    Text(TextPayload),
    /// Markdown source rendered as rich text.
    Markdown(MarkdownPayload),
    /// Sticker image from the media registry.
    Sticker(StickerPayload),
    /// Generated component rendered from props.
    Component(ComponentPayload),
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Payload for [`ElementKind::Media`].
pub struct MediaPayload {
    /// Opaque reference into the media registry.
    pub media_id: String,
    /// Playback volume in `[0, 1]`.
    #[serde(default = "default_volume")]
    pub volume: f64,
    /// Muted media still renders video.
    #[serde(default)]
    pub muted: bool,
}

fn default_volume() -> f64 {
    1.0
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Payload for [`ElementKind::Text`].
pub struct TextPayload {
    /// UTF-8 text content.
    pub content: String,
    /// Font family name.
    #[serde(default = "default_font_family")]
    pub font_family: String,
    /// Font size in canvas units.
    #[serde(default = "default_font_size")]
    pub font_size: f64,
    /// Text color.
    #[serde(default = "default_text_color")]
    pub color: Rgba8,
    /// Optional box fill behind the text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<Rgba8>,
    /// Horizontal alignment.
    #[serde(default)]
    pub align: TextAlign,
}

fn default_font_family() -> String {
    "Inter".to_string()
}

fn default_font_size() -> f64 {
    48.0
}

fn default_text_color() -> Rgba8 {
    Rgba8::WHITE
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
/// Horizontal text alignment.
pub enum TextAlign {
    /// Left aligned.
    Left,
    /// Centered.
    #[default]
    Center,
    /// Right aligned.
    Right,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Payload for [`ElementKind::Markdown`].
pub struct MarkdownPayload {
    /// Markdown source.
    pub source: String,
    /// Base font size in canvas units.
    #[serde(default = "default_font_size")]
    pub font_size: f64,
    /// Text color.
    #[serde(default = "default_text_color")]
    pub color: Rgba8,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Payload for [`ElementKind::Sticker`].
pub struct StickerPayload {
    /// Sticker image reference into the media registry.
    pub media_id: String,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Payload for [`ElementKind::Component`].
pub struct ComponentPayload {
    /// Identifier of the generated component.
    pub component_id: String,
    /// Component props.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub props: serde_json::Value,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
/// Payload-free discriminant of [`ElementKind`].
pub enum ElementVariant {
    /// See [`ElementKind::Media`].
    Media,
    /// See [`ElementKind::Text`].
    Text,
    /// See [`ElementKind::Markdown`].
    Markdown,
    /// See [`ElementKind::Sticker`].
    Sticker,
    /// See [`ElementKind::Component`].
    Component,
}

impl ElementKind {
    /// Payload-free discriminant.
    pub fn variant(&self) -> ElementVariant {
        match self {
            Self::Media(_) => ElementVariant::Media,
            Self::Text(_) => ElementVariant::Text,
            Self::Markdown(_) => ElementVariant::Markdown,
            Self::Sticker(_) => ElementVariant::Sticker,
            Self::Component(_) => ElementVariant::Component,
        }
    }

    /// Media registry reference, for kinds that render a registry source.
    pub fn media_id(&self) -> Option<&str> {
        match self {
            Self::Media(m) => Some(&m.media_id),
            Self::Sticker(s) => Some(&s.media_id),
            Self::Text(_) | Self::Markdown(_) | Self::Component(_) => None,
        }
    }
}

impl TimelineElement {
    /// Payload-free discriminant.
    pub fn variant(&self) -> ElementVariant {
        self.kind.variant()
    }

    /// Visible span after trims: `duration - trim_start - trim_end`.
    pub fn effective_duration(&self) -> f64 {
        self.duration - self.trim_start - self.trim_end
    }

    /// Visible end: `start_time + effective_duration()`.
    pub fn effective_end(&self) -> f64 {
        self.start_time + self.effective_duration()
    }

    /// Return `true` when `t` is inside `[start_time, effective_end)`.
    pub fn covers(&self, t: f64) -> bool {
        self.start_time <= t && t < self.effective_end()
    }

    /// Return `true` when the element is active at `t`.
    pub fn is_visible_at(&self, t: f64) -> bool {
        !self.hidden && self.covers(t)
    }

    /// Position, defaulting to canvas center.
    pub fn position_or_center(&self) -> Point {
        self.position.unwrap_or(Point::ZERO)
    }

    /// Authored size, or an intrinsic estimate when none is set.
    ///
    /// Media and components fill the canvas, stickers are 200 units square, text is estimated
    /// from font size and the longest line.
    pub fn resolved_size(&self, canvas: Canvas) -> Size {
        if let Some(size) = self.size {
            return size;
        }
        match &self.kind {
            ElementKind::Media(_) | ElementKind::Component(_) => canvas.size(),
            ElementKind::Sticker(_) => Size::new(200.0, 200.0),
            ElementKind::Text(t) => estimate_text_size(&t.content, t.font_size),
            ElementKind::Markdown(m) => estimate_text_size(&m.source, m.font_size),
        }
    }

    fn validate(&self) -> CutframeResult<()> {
        if self.id.trim().is_empty() {
            return Err(CutframeError::validation("element id must be non-empty"));
        }
        for (name, value) in [
            ("start_time", self.start_time),
            ("duration", self.duration),
            ("trim_start", self.trim_start),
            ("trim_end", self.trim_end),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(CutframeError::validation(format!(
                    "element '{}' {name} must be finite and >= 0",
                    self.id
                )));
            }
        }
        if self.trim_start + self.trim_end > self.duration {
            return Err(CutframeError::validation(format!(
                "element '{}' trims exceed duration",
                self.id
            )));
        }
        if !self.opacity.is_finite() || !(0.0..=1.0).contains(&self.opacity) {
            return Err(CutframeError::validation(format!(
                "element '{}' opacity must be in [0, 1]",
                self.id
            )));
        }
        if !self.rotation.is_finite() {
            return Err(CutframeError::validation(format!(
                "element '{}' rotation must be finite",
                self.id
            )));
        }
        if let Some(p) = self.position
            && (!p.x.is_finite() || !p.y.is_finite())
        {
            return Err(CutframeError::validation(format!(
                "element '{}' position must be finite",
                self.id
            )));
        }
        if let Some(s) = self.size
            && (!s.width.is_finite() || !s.height.is_finite() || s.width < 0.0 || s.height < 0.0)
        {
            return Err(CutframeError::validation(format!(
                "element '{}' size must be finite and >= 0",
                self.id
            )));
        }
        match &self.kind {
            ElementKind::Media(m) if m.media_id.trim().is_empty() => Err(
                CutframeError::validation(format!("element '{}' media_id must be non-empty", self.id)),
            ),
            ElementKind::Sticker(s) if s.media_id.trim().is_empty() => Err(
                CutframeError::validation(format!("element '{}' media_id must be non-empty", self.id)),
            ),
            ElementKind::Text(t) if !t.font_size.is_finite() || t.font_size <= 0.0 => {
                Err(CutframeError::validation(format!(
                    "element '{}' font_size must be finite and > 0",
                    self.id
                )))
            }
            _ => Ok(()),
        }
    }
}

fn estimate_text_size(text: &str, font_size: f64) -> Size {
    let lines = text.lines().count().max(1);
    let longest = text.lines().map(|l| l.chars().count()).max().unwrap_or(0);
    Size::new(
        (longest as f64 * font_size * 0.6).max(font_size),
        lines as f64 * font_size * 1.2,
    )
}

impl Timeline {
    /// Validate ids, timing and geometry of every element.
    pub fn validate(&self) -> CutframeResult<()> {
        let mut track_ids = HashSet::new();
        let mut element_ids = HashSet::new();
        for track in &self.tracks {
            if track.id.trim().is_empty() {
                return Err(CutframeError::validation("track id must be non-empty"));
            }
            if !track_ids.insert(track.id.as_str()) {
                return Err(CutframeError::validation(format!(
                    "duplicate track id '{}'",
                    track.id
                )));
            }
            for element in &track.elements {
                element.validate()?;
                if !element_ids.insert(element.id.as_str()) {
                    return Err(CutframeError::validation(format!(
                        "duplicate element id '{}'",
                        element.id
                    )));
                }
            }
        }
        if !self.settings.blur_intensity.is_finite() || self.settings.blur_intensity < 0.0 {
            return Err(CutframeError::validation(
                "blur_intensity must be finite and >= 0",
            ));
        }
        Ok(())
    }

    /// Find an element and its owning track.
    pub fn find_element(&self, element_id: &str) -> Option<(&Track, &TimelineElement)> {
        find_element(&self.tracks, element_id)
    }

    /// Latest effective end across all elements, in seconds.
    pub fn duration(&self) -> f64 {
        self.tracks
            .iter()
            .flat_map(|t| t.elements.iter())
            .map(TimelineElement::effective_end)
            .fold(0.0, f64::max)
    }

    /// Parse and validate a timeline from JSON text.
    pub fn from_json_str(s: &str) -> CutframeResult<Self> {
        let timeline: Self = serde_json::from_str(s)?;
        timeline.validate()?;
        Ok(timeline)
    }

    /// Read, parse and validate a timeline JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> CutframeResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read timeline '{}'", path.display()))?;
        Self::from_json_str(&text)
    }
}

/// Find an element and its owning track in a track list.
pub fn find_element<'a>(
    tracks: &'a [Track],
    element_id: &str,
) -> Option<(&'a Track, &'a TimelineElement)> {
    tracks.iter().find_map(|track| {
        track
            .elements
            .iter()
            .find(|e| e.id == element_id)
            .map(|e| (track, e))
    })
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/model.rs"]
mod tests;

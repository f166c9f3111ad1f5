//! Collaborator interfaces the engine reads from and writes to.
//!
//! The engine owns none of this state. Editors plug their stores in through these traits; the
//! in-memory implementations back the CLI and the test suite.

use std::collections::HashMap;
use std::sync::Arc;

use crate::{
    effects::merge::EffectSet,
    foundation::core::{Point, Size},
    timeline::model::{ElementKind, ProjectSettings, Timeline, TimelineElement, Track},
};

/// Read access to tracks plus the per-type update calls.
///
/// Updates are fire-and-forget: failures are the store's concern.
pub trait TimelineStore {
    /// Current tracks in base z-order.
    fn tracks(&self) -> &[Track];

    /// Move an element to a center-relative canvas position.
    fn update_position(&mut self, element_id: &str, position: Point);

    /// Resize an element in canvas units.
    fn update_size(&mut self, element_id: &str, size: Size);

    /// Set an element's rotation in degrees.
    fn update_rotation(&mut self, element_id: &str, degrees: f64);

    /// Replace a text element's content.
    fn update_text_content(&mut self, element_id: &str, content: &str);
}

/// Playback clock, read-only from the engine.
pub trait PlaybackClock {
    /// Current playback time in seconds.
    fn current_time(&self) -> f64;

    /// Whether playback is running.
    fn is_playing(&self) -> bool;
}

/// Source of pre-decoded frames for a media item.
pub trait DecodedFrames: Send + Sync {
    /// Decoded frame nearest to `source_time` seconds, if one is ready.
    fn frame_at(&self, source_time: f64) -> Option<Arc<image::RgbaImage>>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
/// Media item type as reported by the registry.
pub enum MediaType {
    /// Moving picture.
    Video,
    /// Still image.
    Image,
    /// Audio only; renders no pixels.
    Audio,
}

#[derive(Clone)]
/// A resolved, renderable media source.
pub struct MediaHandle {
    /// Registry key.
    pub media_id: String,
    /// Media item type.
    pub media_type: MediaType,
    /// Poster or still image.
    pub poster: Option<Arc<image::RgbaImage>>,
    /// Decoded frame source for video items.
    pub frames: Option<Arc<dyn DecodedFrames>>,
}

impl std::fmt::Debug for MediaHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaHandle")
            .field("media_id", &self.media_id)
            .field("media_type", &self.media_type)
            .field(
                "poster",
                &self.poster.as_ref().map(|p| (p.width(), p.height())),
            )
            .field("has_frames", &self.frames.is_some())
            .finish()
    }
}

impl MediaHandle {
    /// Still-image handle.
    pub fn image(media_id: impl Into<String>, image: image::RgbaImage) -> Self {
        Self {
            media_id: media_id.into(),
            media_type: MediaType::Image,
            poster: Some(Arc::new(image)),
            frames: None,
        }
    }

    /// Best available pixels for `source_time`: a decoded frame, else the poster.
    pub fn pixels_at(&self, source_time: f64) -> Option<Arc<image::RgbaImage>> {
        if self.media_type == MediaType::Audio {
            return None;
        }
        self.frames
            .as_ref()
            .and_then(|f| f.frame_at(source_time))
            .or_else(|| self.poster.clone())
    }
}

#[derive(Clone, Debug)]
/// Registry answer for a media reference.
pub enum MediaLookup {
    /// Source is ready to render.
    Ready(MediaHandle),
    /// Source is still loading; render a spinner placeholder.
    Loading,
    /// Source failed to load; render an error placeholder.
    Errored(String),
    /// Unknown reference.
    Missing,
}

/// Resolves opaque media references. Never fails: problems are expressed as [`MediaLookup`].
pub trait MediaRegistry {
    /// Look up a media reference.
    fn resolve(&self, media_id: &str) -> MediaLookup;
}

/// Per-element effect lists.
pub trait EffectsRegistry {
    /// Effects for an element; empty when none are attached.
    fn effects(&self, element_id: &str) -> EffectSet;
}

/// Project canvas and background settings.
pub trait ProjectSettingsSource {
    /// Current settings.
    fn settings(&self) -> ProjectSettings;
}

#[derive(Clone, Debug, PartialEq)]
/// An update recorded by [`InMemoryStore`].
pub enum StoreUpdate {
    /// See [`TimelineStore::update_position`].
    Position {
        /// Target element.
        element_id: String,
        /// New position.
        position: Point,
    },
    /// See [`TimelineStore::update_size`].
    Size {
        /// Target element.
        element_id: String,
        /// New size.
        size: Size,
    },
    /// See [`TimelineStore::update_rotation`].
    Rotation {
        /// Target element.
        element_id: String,
        /// New rotation in degrees.
        degrees: f64,
    },
    /// See [`TimelineStore::update_text_content`].
    TextContent {
        /// Target element.
        element_id: String,
        /// New content.
        content: String,
    },
}

/// Timeline store backed by an owned [`Timeline`], applying updates immediately.
#[derive(Clone, Debug)]
pub struct InMemoryStore {
    timeline: Timeline,
    updates: Vec<StoreUpdate>,
}

impl InMemoryStore {
    /// Wrap a timeline.
    pub fn new(timeline: Timeline) -> Self {
        Self {
            timeline,
            updates: Vec::new(),
        }
    }

    /// Current timeline.
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Mutable timeline, for simulating edits made elsewhere in the editor.
    pub fn timeline_mut(&mut self) -> &mut Timeline {
        &mut self.timeline
    }

    /// Updates received so far, oldest first.
    pub fn updates(&self) -> &[StoreUpdate] {
        &self.updates
    }

    /// Remove an element from whichever track owns it.
    pub fn remove_element(&mut self, element_id: &str) -> bool {
        for track in &mut self.timeline.tracks {
            if let Some(idx) = track.elements.iter().position(|e| e.id == element_id) {
                track.elements.remove(idx);
                return true;
            }
        }
        false
    }

    fn element_mut(&mut self, element_id: &str) -> Option<&mut TimelineElement> {
        self.timeline
            .tracks
            .iter_mut()
            .flat_map(|t| t.elements.iter_mut())
            .find(|e| e.id == element_id)
    }
}

impl TimelineStore for InMemoryStore {
    fn tracks(&self) -> &[Track] {
        &self.timeline.tracks
    }

    fn update_position(&mut self, element_id: &str, position: Point) {
        if let Some(e) = self.element_mut(element_id) {
            e.position = Some(position);
        }
        self.updates.push(StoreUpdate::Position {
            element_id: element_id.to_string(),
            position,
        });
    }

    fn update_size(&mut self, element_id: &str, size: Size) {
        if let Some(e) = self.element_mut(element_id) {
            e.size = Some(size);
        }
        self.updates.push(StoreUpdate::Size {
            element_id: element_id.to_string(),
            size,
        });
    }

    fn update_rotation(&mut self, element_id: &str, degrees: f64) {
        if let Some(e) = self.element_mut(element_id) {
            e.rotation = degrees;
        }
        self.updates.push(StoreUpdate::Rotation {
            element_id: element_id.to_string(),
            degrees,
        });
    }

    fn update_text_content(&mut self, element_id: &str, content: &str) {
        if let Some(e) = self.element_mut(element_id)
            && let ElementKind::Text(text) = &mut e.kind
        {
            text.content = content.to_string();
        }
        self.updates.push(StoreUpdate::TextContent {
            element_id: element_id.to_string(),
            content: content.to_string(),
        });
    }
}

impl ProjectSettingsSource for InMemoryStore {
    fn settings(&self) -> ProjectSettings {
        self.timeline.settings.clone()
    }
}

/// Fixed clock for tests and one-shot renders.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ManualClock {
    /// Current time in seconds.
    pub time: f64,
    /// Whether playback is running.
    pub playing: bool,
}

impl ManualClock {
    /// Paused clock at `time`.
    pub fn paused_at(time: f64) -> Self {
        Self {
            time,
            playing: false,
        }
    }
}

impl PlaybackClock for ManualClock {
    fn current_time(&self) -> f64 {
        self.time
    }

    fn is_playing(&self) -> bool {
        self.playing
    }
}

/// Map-backed media registry; unknown ids resolve to [`MediaLookup::Missing`].
#[derive(Clone, Debug, Default)]
pub struct InMemoryMediaRegistry {
    items: HashMap<String, MediaLookup>,
}

impl InMemoryMediaRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a lookup answer for `media_id`.
    pub fn insert(&mut self, media_id: impl Into<String>, lookup: MediaLookup) {
        self.items.insert(media_id.into(), lookup);
    }

    /// Register a ready handle under its own id.
    pub fn insert_ready(&mut self, handle: MediaHandle) {
        self.items
            .insert(handle.media_id.clone(), MediaLookup::Ready(handle));
    }
}

impl MediaRegistry for InMemoryMediaRegistry {
    fn resolve(&self, media_id: &str) -> MediaLookup {
        self.items
            .get(media_id)
            .cloned()
            .unwrap_or(MediaLookup::Missing)
    }
}

/// Map-backed effects registry.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct InMemoryEffects {
    sets: HashMap<String, EffectSet>,
}

impl InMemoryEffects {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the effect list of an element.
    pub fn set(&mut self, element_id: impl Into<String>, effects: EffectSet) {
        self.sets.insert(element_id.into(), effects);
    }
}

impl EffectsRegistry for InMemoryEffects {
    fn effects(&self, element_id: &str) -> EffectSet {
        self.sets.get(element_id).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/host/collab.rs"]
mod tests;

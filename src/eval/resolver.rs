use crate::{
    foundation::error::CutframeError,
    host::collab::{MediaHandle, MediaLookup, MediaRegistry},
    timeline::model::{TimelineElement, Track},
};

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
/// Outcome of media resolution for one active element.
pub enum MediaState {
    /// The element kind renders no registry source.
    NotMedia,
    /// A handle was resolved.
    Ready,
    /// The registry is still loading the source.
    Loading,
    /// The registry failed to load the source.
    Errored(String),
    /// The registry does not know the reference.
    Missing,
}

#[derive(Clone, Debug)]
/// An element visible at the resolved time, borrowed from the track list.
///
/// Lives for one resolve cycle; never cache it across passes.
pub struct ActiveElement<'a> {
    /// The visible element.
    pub element: &'a TimelineElement,
    /// Owning track.
    pub track: &'a Track,
    /// Index of the owning track in base z-order.
    pub track_index: usize,
    /// Resolved media handle; `None` for non-media kinds and for resolution misses.
    pub media: Option<MediaHandle>,
    /// Why `media` is what it is.
    pub media_state: MediaState,
}

impl ActiveElement<'_> {
    /// Time inside the media source corresponding to timeline time `t`.
    pub fn source_time(&self, t: f64) -> f64 {
        (t - self.element.start_time + self.element.trim_start).max(0.0)
    }
}

/// Resolve the elements visible at `current_time`.
///
/// Output is ordered by track order, then element order within a track. Visibility is the
/// half-open interval `[start_time, effective_end)`; hidden elements are skipped. A media miss
/// keeps the element with `media = None` so callers can draw a placeholder.
#[tracing::instrument(level = "trace", skip(tracks, media))]
pub fn resolve_active<'a>(
    tracks: &'a [Track],
    current_time: f64,
    media: &dyn MediaRegistry,
) -> Vec<ActiveElement<'a>> {
    let mut out = Vec::new();
    for (track_index, track) in tracks.iter().enumerate() {
        for element in &track.elements {
            if !element.is_visible_at(current_time) {
                continue;
            }

            let (handle, media_state) = match element.kind.media_id() {
                None => (None, MediaState::NotMedia),
                Some(id) => match media.resolve(id) {
                    MediaLookup::Ready(h) => (Some(h), MediaState::Ready),
                    MediaLookup::Loading => (None, MediaState::Loading),
                    MediaLookup::Errored(reason) => (None, MediaState::Errored(reason)),
                    MediaLookup::Missing => {
                        let err = CutframeError::resolution_miss(format!(
                            "element '{}' references unknown media '{id}'",
                            element.id
                        ));
                        tracing::debug!(%err, "drawing missing-media placeholder");
                        (None, MediaState::Missing)
                    }
                },
            };

            out.push(ActiveElement {
                element,
                track,
                track_index,
                media: handle,
                media_state,
            });
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/eval/resolver.rs"]
mod tests;

use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::cache::frame_cache::{CacheStats, FrameCache, FrameCacheOpts, FrameSurface};
use crate::cache::persist::DiskFrameStore;
use crate::cache::prefetch::{PrefetchOpts, PrefetchReport, PrefetchScheduler};
use crate::eval::resolver::resolve_active;
use crate::foundation::core::{Fps, PreviewSize};
use crate::foundation::error::CutframeResult;
use crate::foundation::hash::{Fingerprint, StableHasher};
use crate::host::collab::{
    EffectsRegistry, MediaLookup, MediaRegistry, PlaybackClock, ProjectSettingsSource,
    TimelineStore,
};
use crate::interact::controller::{ControllerOpts, ControllerOutcome, TransformController};
use crate::interact::pointer::{PointerEvent, PointerKind};
use crate::render::cpu::CpuRasterizer;
use crate::render::dispatcher::{FrameRequest, RenderDispatcher, render_uncached};
use crate::render::layers::LayerStack;
use crate::timeline::model::{ProjectSettings, Track};
use crate::transform::coords::CoordinateTransform;

/// Options for a [`PreviewSession`].
///
/// Deserializable from JSON; missing fields take their defaults.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PreviewOpts {
    /// Frame-cache quantization rate.
    pub fps: Fps,
    /// Maximum resident cached frames.
    pub cache_capacity: usize,
    /// Ticks pre-fetched on each side of the current time.
    pub prefetch_radius: u32,
    /// Frames pre-fetched per idle slice.
    pub prefetch_budget: usize,
    /// Allowed drift, in frames, before a pre-fetch result is discarded.
    pub prefetch_tolerance_frames: f64,
    /// Minimum element width/height while resizing, canvas units.
    pub min_element_size: f64,
    /// Directory for persisted frames; `None` keeps frames in memory only.
    pub persist_dir: Option<PathBuf>,
    /// Key prefix for persisted frames.
    pub project_id: String,
}

impl Default for PreviewOpts {
    fn default() -> Self {
        let prefetch = PrefetchOpts::default();
        Self {
            fps: Fps::default(),
            cache_capacity: FrameCacheOpts::default().capacity,
            prefetch_radius: prefetch.radius,
            prefetch_budget: prefetch.budget,
            prefetch_tolerance_frames: prefetch.tolerance_frames,
            min_element_size: ControllerOpts::default().min_size,
            persist_dir: None,
            project_id: "default".to_string(),
        }
    }
}

impl PreviewOpts {
    /// Load options from a JSON file.
    pub fn from_json_path(path: impl AsRef<Path>) -> CutframeResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read preview options '{}'", path.display()))?;
        let opts: Self = serde_json::from_str(&text)?;
        Fps::new(opts.fps.num, opts.fps.den)?;
        Ok(opts)
    }

    /// Frame cache options.
    pub fn cache_opts(&self) -> FrameCacheOpts {
        FrameCacheOpts {
            capacity: self.cache_capacity,
            fps: self.fps,
        }
    }

    /// Pre-fetch options.
    pub fn prefetch_opts(&self) -> PrefetchOpts {
        PrefetchOpts {
            radius: self.prefetch_radius,
            budget: self.prefetch_budget,
            tolerance_frames: self.prefetch_tolerance_frames,
        }
    }

    /// Drag controller options.
    pub fn controller_opts(&self) -> ControllerOpts {
        ControllerOpts {
            min_size: self.min_element_size,
        }
    }
}

/// Read-only collaborators consulted on every pass.
#[derive(Clone, Copy)]
pub struct Host<'a> {
    /// Media resolution.
    pub media: &'a dyn MediaRegistry,
    /// Effects per element.
    pub effects: &'a dyn EffectsRegistry,
    /// Playback clock.
    pub clock: &'a dyn PlaybackClock,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct FrameKey {
    time_bits: u64,
    generation: Fingerprint,
    interaction: Fingerprint,
}

/// Event-loop facing preview engine.
///
/// Owns the dispatcher (and with it the frame cache), the pre-fetch scheduler and the drag
/// controller. Every entry point runs to completion; nothing is shared across threads.
///
/// Re-rendering is driven by explicit dirty tracking: a live frame is recomposed only when the
/// time, the render generation or the interaction state changed since the previous one. The
/// generation covers timeline/canvas content, effect sets and media resolution states; any
/// change to it also invalidates the frame cache wholesale.
#[derive(Debug)]
pub struct PreviewSession {
    opts: PreviewOpts,
    dispatcher: RenderDispatcher<CpuRasterizer>,
    prefetch: PrefetchScheduler,
    controller: TransformController,
    preview: PreviewSize,
    selection: Option<String>,
    caption: Option<String>,
    generation: Option<Fingerprint>,
    last_frame: Option<(FrameKey, FrameSurface)>,
    last_time: Option<f64>,
}

impl PreviewSession {
    /// Create a session rendering at `preview` size.
    pub fn new(opts: PreviewOpts, preview: PreviewSize) -> Self {
        let cache = match &opts.persist_dir {
            Some(dir) => FrameCache::with_persistence(
                opts.cache_opts(),
                Box::new(DiskFrameStore::new(dir.clone())),
                opts.project_id.clone(),
            ),
            None => FrameCache::new(opts.cache_opts()),
        };
        Self {
            dispatcher: RenderDispatcher::new(CpuRasterizer::default(), cache),
            prefetch: PrefetchScheduler::new(opts.prefetch_opts()),
            controller: TransformController::new(opts.controller_opts()),
            opts,
            preview,
            selection: None,
            caption: None,
            generation: None,
            last_frame: None,
            last_time: None,
        }
    }

    /// Options.
    pub fn opts(&self) -> &PreviewOpts {
        &self.opts
    }

    /// Frame cache statistics.
    pub fn cache_stats(&self) -> CacheStats {
        self.dispatcher.cache().stats()
    }

    /// Frame cache.
    pub fn cache(&self) -> &FrameCache {
        self.dispatcher.cache()
    }

    /// Drag controller.
    pub fn controller(&self) -> &TransformController {
        &self.controller
    }

    /// Queued pre-fetch ticks.
    pub fn prefetch_pending(&self) -> usize {
        self.prefetch.pending()
    }

    /// Selected element.
    pub fn selection(&self) -> Option<&str> {
        self.selection.as_deref()
    }

    /// Select an element, or clear the selection.
    pub fn select(&mut self, element_id: Option<&str>) {
        self.selection = element_id.map(str::to_owned);
    }

    /// Caption shown in the caption overlay.
    pub fn set_caption(&mut self, caption: Option<&str>) {
        self.caption = caption.map(str::to_owned);
    }

    /// Resize the preview surface. Cached frames are tied to the old size and are dropped.
    pub fn set_preview_size(&mut self, preview: PreviewSize) {
        if preview != self.preview {
            self.preview = preview;
            self.dispatcher.cache_mut().invalidate_all();
            self.prefetch.cancel();
        }
    }

    /// Canvas/preview mapping for the store's current canvas.
    pub fn transform<S: ProjectSettingsSource + ?Sized>(&self, store: &S) -> CoordinateTransform {
        CoordinateTransform::new(store.settings().canvas, self.preview)
    }

    /// Return `true` when [`Self::render_frame`] would recompose.
    pub fn is_dirty<S>(&self, store: &S, host: &Host<'_>) -> bool
    where
        S: TimelineStore + ProjectSettingsSource + ?Sized,
    {
        let settings = store.settings();
        let generation = render_generation(store.tracks(), &settings, host);
        let key = self.frame_key(generation, host);
        self.last_frame.as_ref().is_none_or(|(k, _)| *k != key)
    }

    /// Layer stack of the live frame at the clock's current time.
    pub fn compose<S>(&self, store: &S, host: &Host<'_>) -> LayerStack
    where
        S: TimelineStore + ProjectSettingsSource + ?Sized,
    {
        let settings = store.settings();
        let time = host.clock.current_time();
        let active = resolve_active(store.tracks(), time, host.media);
        let req = self.live_request(time, &active, &settings, host);
        self.dispatcher.compose(&req)
    }

    /// Live draw at the clock's current time. Never served from the frame cache.
    ///
    /// Returns the previous surface unchanged when nothing it depends on changed.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn render_frame<S>(&mut self, store: &S, host: &Host<'_>) -> CutframeResult<FrameSurface>
    where
        S: TimelineStore + ProjectSettingsSource + ?Sized,
    {
        let settings = store.settings();
        let generation = self.sync_generation(store.tracks(), &settings, host);

        let time = host.clock.current_time();
        self.on_time(time, host.clock.is_playing());

        let key = self.frame_key(generation, host);
        if let Some((last_key, surface)) = &self.last_frame
            && *last_key == key
        {
            tracing::trace!(time, "live frame clean");
            return Ok(surface.clone());
        }

        let active = resolve_active(store.tracks(), time, host.media);
        let req = self.live_request(time, &active, &settings, host);
        let surface = self.dispatcher.draw_live(&req)?;
        self.last_frame = Some((key, surface.clone()));
        Ok(surface)
    }

    /// Cached draw at `time`, e.g. for thumbnails. Selection and drag state are not drawn.
    pub fn render_cached<S>(&mut self, store: &S, host: &Host<'_>, time: f64) -> Option<FrameSurface>
    where
        S: TimelineStore + ProjectSettingsSource + ?Sized,
    {
        let settings = store.settings();
        self.sync_generation(store.tracks(), &settings, host);

        let active = resolve_active(store.tracks(), time, host.media);
        let xf = CoordinateTransform::new(settings.canvas, self.preview);
        let req = FrameRequest::new(time, &active, &settings, xf, host.effects);
        self.dispatcher.draw_cached(&req)
    }

    /// Feed a pointer event to the drag controller.
    ///
    /// Move and up events are only routed while a drag is in progress. A started drag selects
    /// its element.
    pub fn handle_pointer<S>(&mut self, event: &PointerEvent, store: &mut S) -> ControllerOutcome
    where
        S: TimelineStore + ProjectSettingsSource,
    {
        if matches!(event.kind, PointerKind::Move | PointerKind::Up)
            && !self.controller.is_listening()
        {
            return ControllerOutcome::Ignored;
        }
        let xf = self.transform(&*store);
        let outcome = self.controller.handle_pointer(event, store, &xf);
        if outcome == ControllerOutcome::Started
            && let Some(drag) = self.controller.drag()
        {
            self.selection = Some(drag.element_id.clone());
        }
        outcome
    }

    /// Run one idle slice of pre-fetch work.
    pub fn on_idle<S>(&mut self, store: &S, host: &Host<'_>) -> PrefetchReport
    where
        S: TimelineStore + ProjectSettingsSource + ?Sized,
    {
        let settings = store.settings();
        self.sync_generation(store.tracks(), &settings, host);
        if self.prefetch.pending() == 0 {
            return PrefetchReport::default();
        }

        let fps = self.opts.fps;
        let xf = CoordinateTransform::new(settings.canvas, self.preview);
        let tracks = store.tracks();
        let (rasterizer, cache) = self.dispatcher.split_mut();
        self.prefetch.run_idle(host.clock, cache, |tick| {
            let time = tick.to_secs(fps);
            let active = resolve_active(tracks, time, host.media);
            let req = FrameRequest::new(time, &active, &settings, xf, host.effects);
            render_uncached(rasterizer, &req)
        })
    }

    fn live_request<'a>(
        &'a self,
        time: f64,
        active: &'a [crate::eval::resolver::ActiveElement<'a>],
        settings: &'a ProjectSettings,
        host: &Host<'a>,
    ) -> FrameRequest<'a> {
        let xf = CoordinateTransform::new(settings.canvas, self.preview);
        let mut req = FrameRequest::new(time, active, settings, xf, host.effects);
        req.selection = self.selection.as_deref();
        req.drag = self.controller.is_listening().then_some(&self.controller);
        req.caption = self.caption.as_deref();
        req
    }

    /// Invalidate the cache when anything drawn into cached frames changed.
    fn sync_generation(
        &mut self,
        tracks: &[Track],
        settings: &ProjectSettings,
        host: &Host<'_>,
    ) -> Fingerprint {
        let fp = render_generation(tracks, settings, host);
        if self.generation == Some(fp) {
            return fp;
        }
        if self.generation.is_some() {
            tracing::debug!("render inputs changed; invalidating frame cache");
        }
        self.generation = Some(fp);
        let cache = self.dispatcher.cache_mut();
        cache.invalidate_all();
        cache.set_namespace(format!(
            "{}-{:016x}{:016x}",
            self.opts.project_id, fp.hi, fp.lo
        ));
        self.prefetch.cancel();
        fp
    }

    /// Re-anchor pre-fetch when the time moves while paused.
    fn on_time(&mut self, time: f64, playing: bool) {
        let moved = self.last_time.is_none_or(|t| t != time);
        self.last_time = Some(time);
        if playing {
            self.prefetch.cancel();
        } else if moved || self.prefetch.pending() == 0 {
            self.prefetch.schedule(time, self.dispatcher.cache());
        }
    }

    fn frame_key(&self, generation: Fingerprint, host: &Host<'_>) -> FrameKey {
        FrameKey {
            time_bits: host.clock.current_time().to_bits(),
            generation,
            interaction: self.interaction_fingerprint(),
        }
    }

    fn interaction_fingerprint(&self) -> Fingerprint {
        let mut h = StableHasher::new();
        h.write_f64(self.preview.width);
        h.write_f64(self.preview.height);
        h.write_serialize(&self.selection);
        h.write_serialize(&self.caption);
        match self.controller.drag() {
            Some(drag) => {
                h.write_u8(1);
                h.write_str(&drag.element_id);
                h.write_serialize(&drag.live);
            }
            None => h.write_u8(0),
        }
        h.finish()
    }
}

/// Fingerprint of everything that changes cached frame content.
pub fn content_fingerprint(tracks: &[Track], settings: &ProjectSettings) -> Fingerprint {
    let mut h = StableHasher::new();
    h.write_serialize(settings);
    h.write_u64(tracks.len() as u64);
    for track in tracks {
        h.write_serialize(track);
    }
    h.finish()
}

/// Fingerprint of the media resolution state of every media reference in `tracks`.
///
/// A reference moving from loading to ready (or to a different source) changes it, so frames
/// drawn with a placeholder are not served once the real pixels are available.
pub fn media_fingerprint(tracks: &[Track], media: &dyn MediaRegistry) -> Fingerprint {
    let mut h = StableHasher::new();
    for el in tracks.iter().flat_map(|t| &t.elements) {
        let Some(media_id) = el.kind.media_id() else {
            continue;
        };
        h.write_str(&el.id);
        h.write_str(media_id);
        match media.resolve(media_id) {
            MediaLookup::Ready(handle) => {
                h.write_u8(1);
                h.write_serialize(&handle.media_type);
                let poster = handle.poster.as_ref().map(|p| (p.width(), p.height()));
                h.write_serialize(&poster);
                h.write_u8(u8::from(handle.frames.is_some()));
            }
            MediaLookup::Loading => h.write_u8(2),
            MediaLookup::Errored(reason) => {
                h.write_u8(3);
                h.write_str(&reason);
            }
            MediaLookup::Missing => h.write_u8(4),
        }
    }
    h.finish()
}

/// Combined fingerprint of everything a cached frame depends on besides its time.
fn render_generation(
    tracks: &[Track],
    settings: &ProjectSettings,
    host: &Host<'_>,
) -> Fingerprint {
    let mut h = StableHasher::new();
    for fp in [
        content_fingerprint(tracks, settings),
        effects_fingerprint(tracks, host.effects),
        media_fingerprint(tracks, host.media),
    ] {
        h.write_u64(fp.hi);
        h.write_u64(fp.lo);
    }
    h.finish()
}

/// Fingerprint of the effect sets of every element in `tracks`.
pub fn effects_fingerprint(tracks: &[Track], effects: &dyn EffectsRegistry) -> Fingerprint {
    let mut h = StableHasher::new();
    for el in tracks.iter().flat_map(|t| &t.elements) {
        let set = effects.effects(&el.id);
        if set.is_empty() {
            continue;
        }
        h.write_str(&el.id);
        h.write_serialize(&set);
    }
    h.finish()
}

#[cfg(test)]
#[path = "../../tests/unit/session/preview_session.rs"]
mod tests;

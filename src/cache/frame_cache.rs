use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use crate::{
    cache::persist::FramePersistence,
    foundation::core::{Fps, TimeTick},
    foundation::error::CutframeResult,
};

/// A rendered, composited preview frame.
pub type FrameSurface = Arc<image::RgbaImage>;

/// Frame cache configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameCacheOpts {
    /// Maximum resident entries. `0` disables storage (every request renders).
    pub capacity: usize,
    /// Quantization grid for cache keys.
    pub fps: Fps,
}

impl Default for FrameCacheOpts {
    fn default() -> Self {
        Self {
            capacity: 120,
            fps: Fps::default(),
        }
    }
}

/// Cache counters, cumulative since construction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Requests served from memory.
    pub hits: u64,
    /// Requests that fell through to a render.
    pub misses: u64,
    /// Misses served from the persistence layer instead of rendering.
    pub persisted_hits: u64,
    /// Entries dropped under capacity pressure.
    pub evictions: u64,
    /// Wholesale invalidations.
    pub invalidations: u64,
    /// Render attempts that failed and were not stored.
    pub render_failures: u64,
    /// Frames stored by idle pre-fetch.
    pub prefetched: u64,
    /// Pre-fetch results discarded because the live time moved.
    pub stale_discards: u64,
}

/// One resident cache entry.
#[derive(Clone, Debug)]
pub struct CacheEntry {
    /// Quantized time key.
    pub tick: TimeTick,
    /// Rendered frame.
    pub surface: FrameSurface,
    /// Monotonic insertion counter.
    pub insertion_order: u64,
}

/// Bounded frame cache keyed by quantized time.
///
/// Eviction drops the least-recently-inserted entry, skipping the entry for the tick currently
/// being requested. Entries are never partially invalidated: any content change clears
/// everything.
pub struct FrameCache {
    opts: FrameCacheOpts,
    entries: HashMap<TimeTick, CacheEntry>,
    order: VecDeque<TimeTick>,
    next_insertion: u64,
    stats: CacheStats,
    persistence: Option<Box<dyn FramePersistence>>,
    namespace: String,
}

impl std::fmt::Debug for FrameCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameCache")
            .field("opts", &self.opts)
            .field("len", &self.entries.len())
            .field("stats", &self.stats)
            .field("persistent", &self.persistence.is_some())
            .field("namespace", &self.namespace)
            .finish()
    }
}

impl FrameCache {
    /// Memory-only cache.
    pub fn new(opts: FrameCacheOpts) -> Self {
        Self {
            opts,
            entries: HashMap::new(),
            order: VecDeque::new(),
            next_insertion: 0,
            stats: CacheStats::default(),
            persistence: None,
            namespace: String::new(),
        }
    }

    /// Cache that also reads and writes persisted frames under `namespace`.
    pub fn with_persistence(
        opts: FrameCacheOpts,
        persistence: Box<dyn FramePersistence>,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            persistence: Some(persistence),
            namespace: namespace.into(),
            ..Self::new(opts)
        }
    }

    /// Configuration.
    pub fn opts(&self) -> FrameCacheOpts {
        self.opts
    }

    /// Counters.
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Quantize a playback time onto this cache's grid.
    pub fn quantize(&self, secs: f64) -> TimeTick {
        self.opts.fps.quantize(secs)
    }

    /// Number of resident entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return `true` when nothing is resident.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Return `true` when `tick` is resident.
    pub fn contains(&self, tick: TimeTick) -> bool {
        self.entries.contains_key(&tick)
    }

    /// Resident entry for `tick`, without touching counters.
    pub fn peek(&self, tick: TimeTick) -> Option<&CacheEntry> {
        self.entries.get(&tick)
    }

    /// Resident ticks from oldest to newest insertion.
    pub fn ticks_by_insertion(&self) -> impl Iterator<Item = TimeTick> + '_ {
        self.order.iter().copied()
    }

    /// Persistence namespace (project key plus content generation).
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Switch the persistence namespace, e.g. after the timeline content changed.
    pub fn set_namespace(&mut self, namespace: impl Into<String>) {
        self.namespace = namespace.into();
    }

    /// Return the frame for `tick`, rendering and storing it on a miss.
    ///
    /// A failed render is logged, counted and not stored; the caller gets `None` and may retry on
    /// the next request.
    pub fn get_or_render<F>(&mut self, tick: TimeTick, render: F) -> Option<FrameSurface>
    where
        F: FnOnce(TimeTick) -> CutframeResult<FrameSurface>,
    {
        if let Some(entry) = self.entries.get(&tick) {
            self.stats.hits += 1;
            tracing::trace!(tick = tick.0, "frame cache hit");
            return Some(Arc::clone(&entry.surface));
        }
        self.stats.misses += 1;

        if let Some(surface) = self.load_persisted(tick) {
            self.stats.persisted_hits += 1;
            self.insert_inner(tick, Arc::clone(&surface), false, None);
            return Some(surface);
        }

        match render(tick) {
            Ok(surface) => {
                tracing::debug!(tick = tick.0, "frame cache miss rendered");
                self.insert_inner(tick, Arc::clone(&surface), true, None);
                Some(surface)
            }
            Err(err) => {
                self.stats.render_failures += 1;
                tracing::warn!(tick = tick.0, %err, "frame render failed; not cached");
                None
            }
        }
    }

    /// Store a frame rendered elsewhere.
    pub fn insert(&mut self, tick: TimeTick, surface: FrameSurface) {
        self.insert_inner(tick, surface, true, None);
    }

    /// Store a frame for `tick` without evicting the entry for `live`.
    ///
    /// Used by pre-fetch, whose frames must never displace the frame for the time the user is
    /// looking at. With a capacity below 2 the frame is not stored and `false` is returned.
    pub fn insert_near(&mut self, tick: TimeTick, surface: FrameSurface, live: TimeTick) -> bool {
        if tick != live && self.opts.capacity < 2 && self.contains(live) {
            return false;
        }
        self.insert_inner(tick, surface, true, Some(live));
        true
    }

    pub(crate) fn note_prefetched(&mut self) {
        self.stats.prefetched += 1;
    }

    pub(crate) fn note_stale_discard(&mut self) {
        self.stats.stale_discards += 1;
    }

    /// Drop every resident entry.
    pub fn invalidate_all(&mut self) {
        if !self.entries.is_empty() {
            tracing::debug!(dropped = self.entries.len(), "frame cache invalidated");
        }
        self.entries.clear();
        self.order.clear();
        self.stats.invalidations += 1;
    }

    fn insert_inner(
        &mut self,
        tick: TimeTick,
        surface: FrameSurface,
        persist: bool,
        also_keep: Option<TimeTick>,
    ) {
        if self.opts.capacity == 0 {
            return;
        }

        if persist {
            self.store_persisted(tick, &surface);
        }

        if self.entries.remove(&tick).is_some() {
            self.order.retain(|t| *t != tick);
        }
        let insertion_order = self.next_insertion;
        self.next_insertion += 1;
        self.entries.insert(
            tick,
            CacheEntry {
                tick,
                surface,
                insertion_order,
            },
        );
        self.order.push_back(tick);
        self.evict_for(tick, also_keep);
    }

    fn evict_for(&mut self, keep: TimeTick, also_keep: Option<TimeTick>) {
        let mut skipped = 0;
        while self.entries.len() > self.opts.capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            if oldest == keep || Some(oldest) == also_keep {
                self.order.push_back(oldest);
                skipped += 1;
                if skipped > self.order.len() {
                    // Only protected entries are left.
                    break;
                }
                continue;
            }
            if self.entries.remove(&oldest).is_some() {
                self.stats.evictions += 1;
                tracing::trace!(tick = oldest.0, "frame cache evicted");
            }
        }
    }

    fn load_persisted(&self, tick: TimeTick) -> Option<FrameSurface> {
        let persistence = self.persistence.as_ref()?;
        match persistence.load(&self.namespace, tick) {
            Ok(found) => found.map(Arc::new),
            Err(err) => {
                tracing::warn!(tick = tick.0, err = %format!("{err:#}"), "persisted frame load failed");
                None
            }
        }
    }

    fn store_persisted(&self, tick: TimeTick, surface: &image::RgbaImage) {
        let Some(persistence) = self.persistence.as_ref() else {
            return;
        };
        if let Err(err) = persistence.store(&self.namespace, tick, surface) {
            tracing::warn!(tick = tick.0, err = %format!("{err:#}"), "persisted frame store failed");
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/cache/frame_cache.rs"]
mod tests;

use std::collections::VecDeque;

use crate::{
    cache::frame_cache::{FrameCache, FrameSurface},
    foundation::core::TimeTick,
    foundation::error::CutframeResult,
    host::collab::PlaybackClock,
};

/// Idle pre-fetch configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PrefetchOpts {
    /// Ticks to warm on each side of the anchor.
    pub radius: u32,
    /// Maximum frames rendered per idle slice.
    pub budget: usize,
    /// Allowed drift between the scheduling time and the live time, in frames.
    pub tolerance_frames: f64,
}

impl Default for PrefetchOpts {
    fn default() -> Self {
        Self {
            radius: 4,
            budget: 2,
            tolerance_frames: 1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct PrefetchJob {
    tick: TimeTick,
    anchor_time: f64,
}

/// What one idle slice did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PrefetchReport {
    /// Frames rendered and stored.
    pub rendered: usize,
    /// Jobs skipped because the tick was already resident.
    pub already_cached: usize,
    /// Jobs dropped because the live time had moved.
    pub discarded: usize,
    /// Jobs whose render failed.
    pub failed: usize,
}

/// Schedules cache warm-up around the current time during idle periods.
///
/// Every job remembers the live time it was scheduled for. Before rendering, and again before
/// storing, the job is checked against the clock; if the live time drifted by more than the
/// tolerance the job and everything still queued are discarded.
#[derive(Debug, Default)]
pub struct PrefetchScheduler {
    opts: PrefetchOpts,
    pending: VecDeque<PrefetchJob>,
}

impl PrefetchScheduler {
    /// Create an empty scheduler.
    pub fn new(opts: PrefetchOpts) -> Self {
        Self {
            opts,
            pending: VecDeque::new(),
        }
    }

    /// Configuration.
    pub fn opts(&self) -> PrefetchOpts {
        self.opts
    }

    /// Number of queued jobs.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Queued ticks in execution order.
    pub fn pending_ticks(&self) -> Vec<TimeTick> {
        self.pending.iter().map(|j| j.tick).collect()
    }

    /// Drop all queued jobs.
    pub fn cancel(&mut self) {
        if !self.pending.is_empty() {
            tracing::debug!(dropped = self.pending.len(), "prefetch cancelled");
        }
        self.pending.clear();
    }

    /// Replace the queue with ticks around `anchor_time`, nearest first, forward before backward.
    ///
    /// Ticks already resident in `cache` are not queued.
    pub fn schedule(&mut self, anchor_time: f64, cache: &FrameCache) {
        self.pending.clear();
        let anchor = cache.quantize(anchor_time);
        for step in 1..=i64::from(self.opts.radius) {
            for delta in [step, -step] {
                let tick = anchor.offset(delta);
                if tick == anchor && delta < 0 {
                    // Saturated at zero.
                    continue;
                }
                if cache.contains(tick) || self.pending.iter().any(|j| j.tick == tick) {
                    continue;
                }
                self.pending.push_back(PrefetchJob { tick, anchor_time });
            }
        }
    }

    fn within_tolerance(&self, cache: &FrameCache, anchor_time: f64, live_time: f64) -> bool {
        let window = self.opts.tolerance_frames * cache.opts().fps.frame_duration_secs();
        (live_time - anchor_time).abs() <= window
    }

    /// Run one idle slice: render up to `budget` queued ticks into `cache`.
    ///
    /// Does nothing while the clock is playing.
    pub fn run_idle<F>(
        &mut self,
        clock: &dyn PlaybackClock,
        cache: &mut FrameCache,
        mut render: F,
    ) -> PrefetchReport
    where
        F: FnMut(TimeTick) -> CutframeResult<FrameSurface>,
    {
        let mut report = PrefetchReport::default();
        if clock.is_playing() {
            return report;
        }
        if cache.opts().capacity < 2 {
            tracing::trace!("prefetch skipped; cache too small to hold neighbours");
            self.pending.clear();
            return report;
        }

        while report.rendered < self.opts.budget {
            let Some(job) = self.pending.pop_front() else {
                break;
            };

            if !self.within_tolerance(cache, job.anchor_time, clock.current_time()) {
                let dropped = 1 + self.pending.len();
                report.discarded += dropped;
                self.discard_stale(cache, job, dropped);
                break;
            }
            if cache.contains(job.tick) {
                report.already_cached += 1;
                continue;
            }

            let surface = match render(job.tick) {
                Ok(s) => s,
                Err(err) => {
                    report.failed += 1;
                    tracing::warn!(tick = job.tick.0, %err, "prefetch render failed");
                    continue;
                }
            };

            if !self.within_tolerance(cache, job.anchor_time, clock.current_time()) {
                let dropped = 1 + self.pending.len();
                report.discarded += dropped;
                self.discard_stale(cache, job, dropped);
                break;
            }

            let live = cache.quantize(clock.current_time());
            if !cache.insert_near(job.tick, surface, live) {
                continue;
            }
            cache.note_prefetched();
            report.rendered += 1;
        }
        report
    }

    fn discard_stale(&mut self, cache: &mut FrameCache, job: PrefetchJob, count: usize) {
        tracing::debug!(
            tick = job.tick.0,
            anchor = job.anchor_time,
            count,
            "discarding stale prefetch"
        );
        for _ in 0..count {
            cache.note_stale_discard();
        }
        self.pending.clear();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/cache/prefetch.rs"]
mod tests;

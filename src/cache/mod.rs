//! Frame cache, persistence and idle pre-fetch.
//!
//! Frames are keyed by a [`crate::TimeTick`] quantized from playback time, evicted in insertion
//! order, and invalidated wholesale when timeline content changes.

pub mod frame_cache;
pub mod persist;
pub mod prefetch;

//! Time-indexed queries over the timeline.

pub mod resolver;

//! Effect parameter merging and filter translation.

pub mod merge;

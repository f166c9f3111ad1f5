//! Shared value types, errors and hashing.

pub mod core;
pub mod error;
pub mod hash;

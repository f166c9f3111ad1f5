//! Layer composition and rasterization.

/// CPU rasterizer.
pub mod cpu;
/// Render Dispatcher.
pub mod dispatcher;
/// Layer stack types.
pub mod layers;

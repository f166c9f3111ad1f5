//! Direct manipulation of elements through the preview.

pub mod controller;
pub mod pointer;

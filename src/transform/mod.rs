//! Canvas and preview coordinate spaces.

pub mod coords;

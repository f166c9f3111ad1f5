//! Timeline data model and builder DSL.

pub mod dsl;
pub mod model;

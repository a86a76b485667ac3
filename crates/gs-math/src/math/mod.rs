//! Core math modules.

pub mod diagnostics;
pub mod geometry;
pub mod lstsq;
pub mod summary;

//! Gift score math utilities.

pub mod math;

pub use math::diagnostics::*;
pub use math::geometry::*;
pub use math::lstsq::*;
pub use math::summary::*;

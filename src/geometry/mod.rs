//! Geometry support: points, rotations about the X axis, and the contract
//! with the external geometric modeling kernel.

pub mod analytic;
pub mod kernel;
pub mod point;
pub mod rotation;

pub use kernel::{GeomFailure, GeomKind, GeomModel, GeomRef, NullModel};
pub use point::{Point, Vector};
pub use rotation::Portion;

//! Core data structures for plyscene
//!
//! This crate provides the geometry model a loaded scan is described with,
//! per-vertex colour handling, surface/point-cloud classification and the
//! object transform that orientation and scale are applied to.

pub mod geometry;
pub mod color;
pub mod classify;
pub mod traits;
pub mod transform;
pub mod error;

pub use geometry::*;
pub use color::*;
pub use classify::*;
pub use traits::*;
pub use transform::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Point3, Vector3, Matrix4, UnitQuaternion};

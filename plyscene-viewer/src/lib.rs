//! Scene composition and viewer lifecycle for scanned PLY models
//!
//! This crate decides how loaded scans are drawn and places them in a scene:
//! - Material resolution from colour, index and texture availability
//! - Orientation strings and scale inputs applied per object
//! - Scene composition with independently orbitable control groups
//! - An orbit camera and a backend-agnostic viewer lifecycle
//!
//! Rasterisation is left to a [`RenderBackend`]; geometry and textures come
//! from the sources in `plyscene-io`.

pub mod backend;
pub mod camera;
pub mod config;
pub mod diagnostic;
pub mod material;
pub mod orientation;
pub mod role;
pub mod scale;
pub mod scene;
pub mod viewer;

pub use backend::*;
pub use camera::*;
pub use config::*;
pub use diagnostic::Diagnostic;
pub use material::*;
pub use orientation::*;
pub use role::Role;
pub use scale::*;
pub use scene::*;
pub use viewer::{Viewer, ViewerState};

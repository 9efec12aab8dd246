//! Geometry and texture sources
//!
//! This crate turns files on disk into [`RawGeometry`] and [`TextureImage`]
//! values, delivered through callback-driven sources so that a viewer can
//! compose objects as they individually arrive.

pub mod ply;
pub mod texture;
pub mod source;
pub mod error;

pub use error::*;
pub use ply::PlyReader;
pub use source::*;
pub use texture::TextureImage;

use plyscene_core::RawGeometry;
use std::path::{Path, PathBuf};

/// Image extension a surface's texture is expected to use
pub const TEXTURE_EXTENSION: &str = "jpg";

/// Auto-detect format and read geometry
pub fn read_geometry<P: AsRef<Path>>(path: P) -> plyscene_core::Result<RawGeometry> {
    let path = path.as_ref();
    match path.extension().and_then(|s| s.to_str()).map(str::to_lowercase).as_deref() {
        Some("ply") => Ok(PlyReader::read_geometry(path)?),
        _ => Err(plyscene_core::Error::UnsupportedFormat(format!(
            "Unsupported geometry format: {:?}",
            path.extension()
        ))),
    }
}

/// Sibling texture path for a geometry file: same stem, image extension.
///
/// Returns `None` for paths without a file name.
pub fn sibling_texture_path(model_path: &Path) -> Option<PathBuf> {
    model_path.file_name()?;
    Some(model_path.with_extension(TEXTURE_EXTENSION))
}

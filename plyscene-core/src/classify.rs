//! Surface vs point-cloud classification

use crate::geometry::RawGeometry;
use serde::{Deserialize, Serialize};

/// How a loaded geometry is to be drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RenderClassification {
    /// Continuous triangle surface
    Surface,
    /// Discrete points
    PointCloud,
}

impl RenderClassification {
    pub fn is_surface(self) -> bool {
        matches!(self, Self::Surface)
    }
}

impl std::fmt::Display for RenderClassification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Surface => write!(f, "surface"),
            Self::PointCloud => write!(f, "point cloud"),
        }
    }
}

/// `Surface` iff the geometry has a non-empty index buffer.
///
/// Pure; always derived from the geometry as it is now.
pub fn classify(geometry: &RawGeometry) -> RenderClassification {
    if geometry.index_count() > 0 {
        RenderClassification::Surface
    } else {
        RenderClassification::PointCloud
    }
}

/// Whether vertex normals must be derived before a lit material is attached
pub fn needs_normals(geometry: &RawGeometry) -> bool {
    classify(geometry).is_surface() && !geometry.has_normals()
}

/// Classify and, for surfaces without normals, derive them in place
pub fn classify_and_prepare(geometry: &mut RawGeometry) -> RenderClassification {
    let classification = classify(geometry);
    if classification.is_surface() && !geometry.has_normals() {
        log::debug!("Computing vertex normals for {} vertices", geometry.vertex_count());
        geometry.compute_vertex_normals();
    }
    classification
}

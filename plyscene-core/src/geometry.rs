//! Raw geometry as handed over by a geometry source

use crate::color::ColorAttribute;
use crate::error::{Error, Result};
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// A 3D point with floating point coordinates
pub type Point3f = Point3<f32>;

/// A 3D vector with floating point components
pub type Vector3f = Vector3<f32>;

/// Texture coordinates (UV mapping)
pub type UV = [f32; 2];

/// Vertex data of a loaded scan before any interpretation.
///
/// `indices` is a flat triangle list (three entries per face). A geometry
/// without indices, or with an empty index list, is a point cloud.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawGeometry {
    pub positions: Vec<Point3f>,
    pub colors: Option<ColorAttribute>,
    pub normals: Option<Vec<Vector3f>>,
    pub uvs: Option<Vec<UV>>,
    pub indices: Option<Vec<u32>>,
}

impl RawGeometry {
    /// Create a geometry from vertex positions only
    pub fn from_positions(positions: Vec<Point3f>) -> Self {
        Self {
            positions,
            ..Self::default()
        }
    }

    /// Attach a triangle index list
    pub fn with_indices(mut self, indices: Vec<u32>) -> Self {
        self.indices = Some(indices);
        self
    }

    /// Attach a per-vertex colour attribute
    pub fn with_colors(mut self, colors: ColorAttribute) -> Self {
        self.colors = Some(colors);
        self
    }

    /// Attach per-vertex normals
    pub fn with_normals(mut self, normals: Vec<Vector3f>) -> Self {
        self.normals = Some(normals);
        self
    }

    /// Attach per-vertex texture coordinates
    pub fn with_uvs(mut self, uvs: Vec<UV>) -> Self {
        self.uvs = Some(uvs);
        self
    }

    /// Get the number of vertices
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of entries in the index buffer, zero when there is none
    pub fn index_count(&self) -> usize {
        self.indices.as_ref().map_or(0, Vec::len)
    }

    /// Get the number of complete triangles
    pub fn face_count(&self) -> usize {
        self.index_count() / 3
    }

    pub fn has_color(&self) -> bool {
        self.colors.is_some()
    }

    pub fn has_normals(&self) -> bool {
        self.normals.is_some()
    }

    pub fn has_uvs(&self) -> bool {
        self.uvs.is_some()
    }

    /// Check that every optional attribute matches the vertex count and
    /// that indices stay in range.
    pub fn validate(&self) -> Result<()> {
        let vertex_count = self.vertex_count();

        if let Some(colors) = &self.colors {
            if colors.count() != vertex_count {
                return Err(Error::InvalidData(format!(
                    "Color count mismatch: {} colors for {} vertices",
                    colors.count(),
                    vertex_count
                )));
            }
        }

        if let Some(normals) = &self.normals {
            if normals.len() != vertex_count {
                return Err(Error::InvalidData(format!(
                    "Normal count mismatch: {} normals for {} vertices",
                    normals.len(),
                    vertex_count
                )));
            }
        }

        if let Some(uvs) = &self.uvs {
            if uvs.len() != vertex_count {
                return Err(Error::InvalidData(format!(
                    "UV count mismatch: {} UVs for {} vertices",
                    uvs.len(),
                    vertex_count
                )));
            }
        }

        if let Some(indices) = &self.indices {
            if indices.len() % 3 != 0 {
                return Err(Error::InvalidData(format!(
                    "Index count {} is not a multiple of 3",
                    indices.len()
                )));
            }
            if let Some(&bad) = indices.iter().find(|&&i| i as usize >= vertex_count) {
                return Err(Error::InvalidData(format!(
                    "Index {} out of range for {} vertices",
                    bad, vertex_count
                )));
            }
        }

        Ok(())
    }

    /// Derive smooth vertex normals from the triangle list.
    ///
    /// Each face contributes its unnormalised normal (so larger faces weigh
    /// more) to its three vertices; the sums are then normalised. Vertices
    /// not referenced by any face get +Z. Out-of-range faces are skipped.
    pub fn compute_vertex_normals(&mut self) {
        let vertex_count = self.vertex_count();
        let mut normals = vec![Vector3f::zeros(); vertex_count];

        if let Some(indices) = &self.indices {
            for face in indices.chunks_exact(3) {
                let (a, b, c) = (face[0] as usize, face[1] as usize, face[2] as usize);
                if a >= vertex_count || b >= vertex_count || c >= vertex_count {
                    continue;
                }

                let v0 = self.positions[a];
                let edge1 = self.positions[b] - v0;
                let edge2 = self.positions[c] - v0;
                let face_normal = edge1.cross(&edge2);

                normals[a] += face_normal;
                normals[b] += face_normal;
                normals[c] += face_normal;
            }
        }

        for normal in &mut normals {
            let length = normal.norm();
            *normal = if length > 1e-12 {
                *normal / length
            } else {
                Vector3f::new(0.0, 0.0, 1.0)
            };
        }

        self.normals = Some(normals);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn quad() -> RawGeometry {
        RawGeometry::from_positions(vec![
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(1.0, 0.0, 0.0),
            Point3f::new(1.0, 1.0, 0.0),
            Point3f::new(0.0, 1.0, 0.0),
        ])
        .with_indices(vec![0, 1, 2, 0, 2, 3])
    }

    #[test]
    fn test_counts() {
        let geometry = quad();
        assert_eq!(geometry.vertex_count(), 4);
        assert_eq!(geometry.index_count(), 6);
        assert_eq!(geometry.face_count(), 2);
        assert!(!geometry.has_color());

        let cloud = RawGeometry::from_positions(vec![Point3f::origin()]);
        assert_eq!(cloud.index_count(), 0);
        assert_eq!(cloud.face_count(), 0);
    }

    #[test]
    fn test_compute_vertex_normals_flat_quad() {
        let mut geometry = quad();
        geometry.compute_vertex_normals();

        let normals = geometry.normals.as_ref().unwrap();
        assert_eq!(normals.len(), 4);
        for normal in normals {
            assert_relative_eq!(normal.z, 1.0, epsilon = 1e-6);
            assert_relative_eq!(normal.norm(), 1.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_compute_vertex_normals_averages_faces() {
        // Two faces sharing the edge 0-1, folded 90 degrees
        let mut geometry = RawGeometry::from_positions(vec![
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(1.0, 0.0, 0.0),
            Point3f::new(0.0, 1.0, 0.0),
            Point3f::new(0.0, 0.0, -1.0),
        ])
        .with_indices(vec![0, 1, 2, 0, 1, 3]);
        geometry.compute_vertex_normals();

        let normals = geometry.normals.unwrap();
        let shared = normals[0];
        let expected = Vector3f::new(0.0, 1.0, 1.0).normalize();
        assert_relative_eq!(shared, expected, epsilon = 1e-6);
        assert_relative_eq!(normals[2], Vector3f::new(0.0, 0.0, 1.0), epsilon = 1e-6);
        assert_relative_eq!(normals[3], Vector3f::new(0.0, 1.0, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn test_unreferenced_vertex_gets_default_normal() {
        let mut geometry = quad();
        geometry.positions.push(Point3f::new(5.0, 5.0, 5.0));
        geometry.compute_vertex_normals();

        let normals = geometry.normals.unwrap();
        assert_eq!(normals[4], Vector3f::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_validate() {
        assert!(quad().validate().is_ok());

        let bad_index = quad().with_indices(vec![0, 1, 9]);
        assert!(bad_index.validate().is_err());

        let ragged = quad().with_indices(vec![0, 1]);
        assert!(ragged.validate().is_err());

        let bad_normals = quad().with_normals(vec![Vector3f::z()]);
        assert!(bad_normals.validate().is_err());

        let bad_colors = quad().with_colors(ColorAttribute::rgb(vec![1.0, 1.0, 1.0]));
        assert!(bad_colors.validate().is_err());
    }
}

//! PLY support
//!
//! Parsing of the ASCII and binary encodings is left to `ply-rs`; this module
//! only maps the parsed elements onto a [`RawGeometry`].

use crate::error::IoError;
use plyscene_core::{ColorAttribute, Point3f, RawGeometry, Vector3f, UV};
use ply_rs::{
    parser::Parser,
    ply::{DefaultElement, Property},
};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

const COLOR_NAMES: [[&str; 4]; 3] = [
    ["red", "green", "blue", "alpha"],
    ["r", "g", "b", "a"],
    ["diffuse_red", "diffuse_green", "diffuse_blue", "diffuse_alpha"],
];

const UV_NAMES: [[&str; 2]; 3] = [["s", "t"], ["u", "v"], ["texture_u", "texture_v"]];

pub struct PlyReader;

impl PlyReader {
    /// Read a PLY file into raw geometry
    pub fn read_geometry<P: AsRef<Path>>(path: P) -> Result<RawGeometry, IoError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => IoError::FileNotFound {
                path: path.display().to_string(),
            },
            _ => IoError::Io(e),
        })?;
        let mut reader = BufReader::new(file);
        Self::read_geometry_from(&mut reader)
    }

    /// Read PLY data from any byte source
    pub fn read_geometry_from<R: Read>(reader: &mut R) -> Result<RawGeometry, IoError> {
        let parser = Parser::<DefaultElement>::new();
        let ply = parser.read_ply(reader).map_err(|e| IoError::ParseError {
            message: e.to_string(),
        })?;

        let vertices = ply.payload.get("vertex").ok_or_else(|| IoError::InvalidFormat {
            format: "PLY file has no vertex element".to_string(),
        })?;

        let mut positions = Vec::with_capacity(vertices.len());
        for vertex in vertices {
            let x = extract_property_value(vertex, "x")?;
            let y = extract_property_value(vertex, "y")?;
            let z = extract_property_value(vertex, "z")?;
            positions.push(Point3f::new(x, y, z));
        }

        let mut geometry = RawGeometry::from_positions(positions);
        geometry.normals = extract_normals(vertices);
        geometry.colors = extract_colors(vertices);
        geometry.uvs = extract_uvs(vertices);

        if let Some(faces) = ply.payload.get("face") {
            let mut indices = Vec::with_capacity(faces.len() * 3);
            for face in faces {
                let polygon = extract_face_indices(face)?;
                // Fan triangulation; quads and larger polygons become triangles
                for i in 1..polygon.len().saturating_sub(1) {
                    indices.extend_from_slice(&[polygon[0], polygon[i], polygon[i + 1]]);
                }
            }
            geometry.indices = Some(indices);
        }

        geometry
            .validate()
            .map_err(|e| IoError::ParseError { message: e.to_string() })?;

        Ok(geometry)
    }
}

/// Extract a property value as f32 from a PLY element
fn extract_property_value(element: &DefaultElement, name: &str) -> Result<f32, IoError> {
    scalar_value(element, name).ok_or_else(|| IoError::ParseError {
        message: format!("Property '{}' not found or invalid type", name),
    })
}

fn scalar_value(element: &DefaultElement, name: &str) -> Option<f32> {
    match element.get(name)? {
        Property::Char(v) => Some(*v as f32),
        Property::UChar(v) => Some(*v as f32),
        Property::Short(v) => Some(*v as f32),
        Property::UShort(v) => Some(*v as f32),
        Property::Int(v) => Some(*v as f32),
        Property::UInt(v) => Some(*v as f32),
        Property::Float(v) => Some(*v),
        Property::Double(v) => Some(*v as f32),
        _ => None,
    }
}

/// Normals are kept only if every vertex carries them
fn extract_normals(vertices: &[DefaultElement]) -> Option<Vec<Vector3f>> {
    let normals: Option<Vec<Vector3f>> = vertices
        .iter()
        .map(|v| {
            Some(Vector3f::new(
                scalar_value(v, "nx")?,
                scalar_value(v, "ny")?,
                scalar_value(v, "nz")?,
            ))
        })
        .collect();
    normals.filter(|n| !n.is_empty())
}

/// Colours are returned in whatever range the file used; `normalized` stays false
fn extract_colors(vertices: &[DefaultElement]) -> Option<ColorAttribute> {
    let first = vertices.first()?;
    let names = COLOR_NAMES
        .iter()
        .find(|names| names[..3].iter().all(|n| first.get(*n).is_some()))?;
    let has_alpha = first.get(names[3]).is_some();
    let item_size = if has_alpha { 4 } else { 3 };

    let mut values = Vec::with_capacity(vertices.len() * item_size);
    for vertex in vertices {
        for name in &names[..item_size] {
            values.push(scalar_value(vertex, name)?);
        }
    }

    Some(ColorAttribute::new(values, item_size))
}

fn extract_uvs(vertices: &[DefaultElement]) -> Option<Vec<UV>> {
    let first = vertices.first()?;
    let [u, v] = UV_NAMES
        .iter()
        .find(|[u, v]| first.get(*u).is_some() && first.get(*v).is_some())?;

    vertices
        .iter()
        .map(|vertex| Some([scalar_value(vertex, u)?, scalar_value(vertex, v)?]))
        .collect()
}

/// Extract face indices from a PLY face element
fn extract_face_indices(element: &DefaultElement) -> Result<Vec<u32>, IoError> {
    let indices = match element.get("vertex_indices").or_else(|| element.get("vertex_index")) {
        Some(Property::ListInt(indices)) => indices.iter().map(|&i| i as u32).collect(),
        Some(Property::ListUInt(indices)) => indices.clone(),
        Some(Property::ListShort(indices)) => indices.iter().map(|&i| i as u32).collect(),
        Some(Property::ListUShort(indices)) => indices.iter().map(|&i| i as u32).collect(),
        Some(Property::ListUChar(indices)) => indices.iter().map(|&i| i as u32).collect(),
        _ => {
            return Err(IoError::ParseError {
                message: "Face indices not found".to_string(),
            })
        }
    };
    Ok(indices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::io::Cursor;

    fn read(content: &str) -> Result<RawGeometry, IoError> {
        PlyReader::read_geometry_from(&mut Cursor::new(content.as_bytes()))
    }

    #[test]
    fn test_colored_mesh() {
        let geometry = read(
            "ply
format ascii 1.0
element vertex 4
property float x
property float y
property float z
property uchar red
property uchar green
property uchar blue
element face 1
property list uchar int vertex_indices
end_header
0 0 0 255 0 0
1 0 0 0 255 0
1 1 0 0 0 255
0 1 0 200 200 200
4 0 1 2 3
",
        )
        .unwrap();

        assert_eq!(geometry.vertex_count(), 4);
        // Quad is fanned into two triangles
        assert_eq!(geometry.indices, Some(vec![0, 1, 2, 0, 2, 3]));

        let colors = geometry.colors.unwrap();
        assert_eq!(colors.item_size, 3);
        assert!(!colors.normalized);
        assert_eq!(&colors.values[..3], &[255.0, 0.0, 0.0]);
        assert!(geometry.normals.is_none());
        assert!(geometry.uvs.is_none());
    }

    #[test]
    fn test_point_cloud_with_normals_and_uvs() {
        let geometry = read(
            "ply
format ascii 1.0
element vertex 2
property float x
property float y
property float z
property float nx
property float ny
property float nz
property float s
property float t
end_header
0.5 1.5 2.5 0 0 1 0.25 0.75
1 2 3 0 1 0 1 0
",
        )
        .unwrap();

        assert!(geometry.indices.is_none());
        assert_relative_eq!(geometry.positions[0], Point3f::new(0.5, 1.5, 2.5));
        assert_eq!(geometry.normals.as_ref().unwrap()[1], Vector3f::new(0.0, 1.0, 0.0));
        assert_eq!(geometry.uvs.as_ref().unwrap()[0], [0.25, 0.75]);
        assert!(geometry.colors.is_none());
    }

    #[test]
    fn test_rgba_colors() {
        let geometry = read(
            "ply
format ascii 1.0
element vertex 1
property float x
property float y
property float z
property uchar red
property uchar green
property uchar blue
property uchar alpha
end_header
0 0 0 10 20 30 40
",
        )
        .unwrap();

        let colors = geometry.colors.unwrap();
        assert_eq!(colors.item_size, 4);
        assert_eq!(colors.values, vec![10.0, 20.0, 30.0, 40.0]);
    }

    #[test]
    fn test_out_of_range_face_is_rejected() {
        let result = read(
            "ply
format ascii 1.0
element vertex 1
property float x
property float y
property float z
element face 1
property list uchar int vertex_indices
end_header
0 0 0
3 0 1 2
",
        );
        assert!(matches!(result, Err(IoError::ParseError { .. })));
    }

    #[test]
    fn test_garbage_is_a_parse_error() {
        assert!(matches!(read("not a ply file"), Err(IoError::ParseError { .. })));
    }

    #[test]
    fn test_missing_file() {
        let result = PlyReader::read_geometry("does/not/exist.ply");
        assert!(matches!(result, Err(IoError::FileNotFound { .. })));
    }
}

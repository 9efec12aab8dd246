//! Material resolution from geometry attributes

use plyscene_core::{classify, Color, RawGeometry, RenderClassification};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Point size used by every point-cloud material
pub const POINT_SIZE: f32 = 2.0;

/// Tint of point clouds without vertex colours
pub const POINT_FLAT_TINT: Color = Color(0x808080);

/// Tint a surface shows while its texture is missing or failed to load
pub const SURFACE_FALLBACK_TINT: Color = Color(0xcccccc);

/// Physically based shading parameters for surfaces
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceShading {
    pub metalness: f32,
    pub roughness: f32,
}

impl SurfaceShading {
    /// No specular highlight, so vertex colours read unmodified
    pub const VERTEX_COLORED: Self = Self { metalness: 0.0, roughness: 1.0 };
    pub const BACKDROP_VERTEX_COLORED: Self = Self { metalness: 0.2, roughness: 0.8 };
    pub const TEXTURED: Self = Self { metalness: 0.1, roughness: 0.8 };
}

/// How an object's surface or points are shaded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MaterialSpec {
    SurfaceVertexColored {
        base_color: Color,
        shading: SurfaceShading,
    },
    SurfaceTextured {
        texture_path: PathBuf,
        fallback_color: Color,
        shading: SurfaceShading,
    },
    SurfaceFlatColored {
        color: Color,
        shading: SurfaceShading,
    },
    PointCloudColored {
        size: f32,
        base_color: Color,
    },
    PointCloudFlat {
        size: f32,
        color: Color,
    },
}

impl MaterialSpec {
    pub fn classification(&self) -> RenderClassification {
        match self {
            Self::SurfaceVertexColored { .. }
            | Self::SurfaceTextured { .. }
            | Self::SurfaceFlatColored { .. } => RenderClassification::Surface,
            Self::PointCloudColored { .. } | Self::PointCloudFlat { .. } => {
                RenderClassification::PointCloud
            }
        }
    }

    pub fn uses_vertex_colors(&self) -> bool {
        matches!(
            self,
            Self::SurfaceVertexColored { .. } | Self::PointCloudColored { .. }
        )
    }

    pub fn texture_path(&self) -> Option<&Path> {
        match self {
            Self::SurfaceTextured { texture_path, .. } => Some(texture_path.as_path()),
            _ => None,
        }
    }

    pub fn variant_name(&self) -> &'static str {
        match self {
            Self::SurfaceVertexColored { .. } => "SurfaceVertexColored",
            Self::SurfaceTextured { .. } => "SurfaceTextured",
            Self::SurfaceFlatColored { .. } => "SurfaceFlatColored",
            Self::PointCloudColored { .. } => "PointCloudColored",
            Self::PointCloudFlat { .. } => "PointCloudFlat",
        }
    }

    /// The material a textured surface degrades to when its texture fails.
    /// Other variants are returned unchanged.
    pub fn into_flat_fallback(self) -> Self {
        match self {
            Self::SurfaceTextured {
                fallback_color,
                shading,
                ..
            } => Self::SurfaceFlatColored {
                color: fallback_color,
                shading,
            },
            other => other,
        }
    }
}

/// Pick a material from classification and attribute availability.
///
/// Priority: coloured surface, textured surface (flat when no texture can be
/// located), coloured points, flat points.
pub fn resolve_material(
    classification: RenderClassification,
    has_color: bool,
    texture: Option<&Path>,
    backdrop: bool,
) -> MaterialSpec {
    match (classification, has_color) {
        (RenderClassification::Surface, true) => MaterialSpec::SurfaceVertexColored {
            base_color: Color::WHITE,
            shading: if backdrop {
                SurfaceShading::BACKDROP_VERTEX_COLORED
            } else {
                SurfaceShading::VERTEX_COLORED
            },
        },
        (RenderClassification::Surface, false) => match texture {
            Some(path) => MaterialSpec::SurfaceTextured {
                texture_path: path.to_path_buf(),
                fallback_color: SURFACE_FALLBACK_TINT,
                shading: SurfaceShading::TEXTURED,
            },
            None => MaterialSpec::SurfaceFlatColored {
                color: SURFACE_FALLBACK_TINT,
                shading: SurfaceShading::TEXTURED,
            },
        },
        (RenderClassification::PointCloud, true) => MaterialSpec::PointCloudColored {
            size: POINT_SIZE,
            base_color: Color::WHITE,
        },
        (RenderClassification::PointCloud, false) => MaterialSpec::PointCloudFlat {
            size: POINT_SIZE,
            color: POINT_FLAT_TINT,
        },
    }
}

/// Resolve the material for `geometry`, normalising its colour buffer first
/// when a vertex-coloured variant will be built.
pub fn prepare_material(
    geometry: &mut RawGeometry,
    texture: Option<&Path>,
    backdrop: bool,
) -> MaterialSpec {
    let classification = classify(geometry);
    let has_color = geometry.colors.as_ref().is_some_and(|c| !c.is_empty());

    if has_color {
        if let Some(colors) = geometry.colors.as_mut() {
            colors.normalize_in_place();
        }
    }

    resolve_material(classification, has_color, texture, backdrop)
}

#[cfg(test)]
mod tests {
    use super::*;
    use plyscene_core::{ColorAttribute, Point3f};

    fn positions() -> Vec<Point3f> {
        vec![
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(1.0, 0.0, 0.0),
            Point3f::new(0.0, 1.0, 0.0),
        ]
    }

    #[test]
    fn test_colored_surface() {
        let material = resolve_material(RenderClassification::Surface, true, None, false);
        assert_eq!(
            material,
            MaterialSpec::SurfaceVertexColored {
                base_color: Color::WHITE,
                shading: SurfaceShading::VERTEX_COLORED,
            }
        );

        let backdrop = resolve_material(RenderClassification::Surface, true, None, true);
        assert_eq!(
            backdrop,
            MaterialSpec::SurfaceVertexColored {
                base_color: Color::WHITE,
                shading: SurfaceShading::BACKDROP_VERTEX_COLORED,
            }
        );
    }

    #[test]
    fn test_colour_wins_over_texture() {
        let material = resolve_material(
            RenderClassification::Surface,
            true,
            Some(Path::new("room.jpg")),
            false,
        );
        assert_eq!(material.variant_name(), "SurfaceVertexColored");
        assert!(material.texture_path().is_none());
    }

    #[test]
    fn test_uncolored_surface_is_textured_or_flat() {
        let textured = resolve_material(
            RenderClassification::Surface,
            false,
            Some(Path::new("models/chair.jpg")),
            false,
        );
        assert_eq!(textured.texture_path(), Some(Path::new("models/chair.jpg")));

        let flat = textured.clone().into_flat_fallback();
        assert_eq!(
            flat,
            MaterialSpec::SurfaceFlatColored {
                color: SURFACE_FALLBACK_TINT,
                shading: SurfaceShading::TEXTURED,
            }
        );

        let untextured = resolve_material(RenderClassification::Surface, false, None, false);
        assert_eq!(untextured, flat);
    }

    #[test]
    fn test_point_cloud_variants() {
        let colored = resolve_material(RenderClassification::PointCloud, true, None, true);
        assert_eq!(
            colored,
            MaterialSpec::PointCloudColored {
                size: POINT_SIZE,
                base_color: Color::WHITE,
            }
        );
        assert!(colored.uses_vertex_colors());

        let flat = resolve_material(
            RenderClassification::PointCloud,
            false,
            Some(Path::new("ignored.jpg")),
            false,
        );
        assert_eq!(
            flat,
            MaterialSpec::PointCloudFlat {
                size: POINT_SIZE,
                color: POINT_FLAT_TINT,
            }
        );
        assert_eq!(flat.classification(), RenderClassification::PointCloud);
    }

    #[test]
    fn test_prepare_normalizes_before_building_colored_variant() {
        let mut geometry = RawGeometry::from_positions(positions())
            .with_colors(ColorAttribute::rgb(vec![200.0, 0.0, 0.0, 0.0, 255.0, 0.0, 0.0, 0.0, 51.0]));

        let material = prepare_material(&mut geometry, None, false);
        assert_eq!(material.variant_name(), "PointCloudColored");

        let colors = geometry.colors.unwrap();
        assert!(colors.normalized);
        assert_eq!(colors.values[0], 200.0 / 255.0);
        assert_eq!(colors.values[4], 1.0);
    }

    #[test]
    fn test_empty_colour_buffer_counts_as_uncolored() {
        let mut geometry = RawGeometry::from_positions(positions())
            .with_indices(vec![0, 1, 2])
            .with_colors(ColorAttribute::rgb(Vec::new()));

        let material = prepare_material(&mut geometry, None, false);
        assert_eq!(material.variant_name(), "SurfaceFlatColored");
    }

    #[test]
    fn test_flat_fallback_leaves_other_variants() {
        let points = resolve_material(RenderClassification::PointCloud, false, None, false);
        assert_eq!(points.clone().into_flat_fallback(), points);
    }
}

//! Scene composition
//!
//! [`SceneComposer`] turns loaded geometry into [`RenderableObject`]s and
//! keeps them, together with the [`ControlGroup`]s they may belong to, for
//! as long as the scene lives. Every object runs its own pipeline:
//!
//! 1. classification (deriving normals for surfaces that lack them)
//! 2. material resolution (normalising vertex colours first)
//! 3. construction of the renderable
//! 4. orientation
//! 5. scale
//!
//! No step touches any object other than the one being built.

use crate::backend::{GroupId, ObjectId};
use crate::config::ModelEntry;
use crate::diagnostic::Diagnostic;
use crate::material::{prepare_material, MaterialSpec};
use crate::orientation::{apply_orientation, OrientationSpec};
use crate::role::Role;
use crate::scale::{apply_scale, ScaleOutcome, ScaleSpec};
use plyscene_core::{
    classify_and_prepare, Disposable, Drawable, ObjectTransform, Point3, Point3f, RawGeometry,
    RenderClassification,
};
use plyscene_io::sibling_texture_path;
use std::path::{Path, PathBuf};

/// Everything needed to build one object besides its geometry
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectSpec {
    pub role: Role,
    pub source: PathBuf,
    pub orientation: String,
    pub scale: ScaleSpec,
    /// Explicit texture; otherwise the sibling `.jpg` of `source` is tried
    pub texture: Option<PathBuf>,
    pub control_group: Option<String>,
}

impl ObjectSpec {
    pub fn new(role: Role, source: impl Into<PathBuf>) -> Self {
        Self {
            role,
            source: source.into(),
            orientation: String::new(),
            scale: ScaleSpec::default(),
            texture: None,
            control_group: None,
        }
    }

    pub fn with_orientation(mut self, orientation: impl Into<String>) -> Self {
        self.orientation = orientation.into();
        self
    }

    pub fn with_scale(mut self, scale: impl Into<ScaleSpec>) -> Self {
        self.scale = scale.into();
        self
    }

    pub fn in_group(mut self, name: impl Into<String>) -> Self {
        self.control_group = Some(name.into());
        self
    }

    /// Texture the material resolver should try for an uncoloured surface
    pub fn texture_hint(&self) -> Option<PathBuf> {
        self.texture
            .clone()
            .or_else(|| sibling_texture_path(&self.source))
    }
}

impl From<&ModelEntry> for ObjectSpec {
    fn from(entry: &ModelEntry) -> Self {
        Self {
            role: entry.role,
            source: entry.model_path.clone(),
            orientation: entry.orientation.clone(),
            scale: entry.scale,
            texture: entry.texture.clone(),
            control_group: entry.control_group.clone(),
        }
    }
}

/// A composed object: geometry, material and transform, owned exclusively
#[derive(Debug, Clone)]
pub struct RenderableObject {
    pub id: ObjectId,
    pub role: Role,
    pub source: PathBuf,
    pub geometry: RawGeometry,
    pub material: MaterialSpec,
    pub classification: RenderClassification,
    pub transform: ObjectTransform,
    pub orientation: OrientationSpec,
    pub group: Option<GroupId>,
    disposed: bool,
}

impl RenderableObject {
    pub fn vertex_count(&self) -> usize {
        self.geometry.vertex_count()
    }
}

impl Disposable for RenderableObject {
    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.geometry = RawGeometry::default();
        self.disposed = true;
        log::debug!("Released {} object {:?}", self.role, self.id);
    }

    fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl Drawable for RenderableObject {
    /// Bounds in the object's parent frame, after orientation and scale
    fn bounding_box(&self) -> (Point3f, Point3f) {
        let (min, max) = self.geometry.bounding_box();
        let corners = [
            Point3f::new(min.x, min.y, min.z),
            Point3f::new(max.x, min.y, min.z),
            Point3f::new(min.x, max.y, min.z),
            Point3f::new(max.x, max.y, min.z),
            Point3f::new(min.x, min.y, max.z),
            Point3f::new(max.x, min.y, max.z),
            Point3f::new(min.x, max.y, max.z),
            Point3f::new(max.x, max.y, max.z),
        ];

        let first = self.transform.transform_point(&corners[0]);
        corners[1..].iter().fold((first, first), |(lo, hi), corner| {
            let p = self.transform.transform_point(corner);
            (
                Point3f::new(lo.x.min(p.x), lo.y.min(p.y), lo.z.min(p.z)),
                Point3f::new(hi.x.max(p.x), hi.y.max(p.y), hi.z.max(p.z)),
            )
        })
    }
}

/// A named subset of the scene with its own orbit target
#[derive(Debug, Clone, PartialEq)]
pub struct ControlGroup {
    pub id: GroupId,
    pub name: String,
    pub anchor: ObjectTransform,
    pub members: Vec<ObjectId>,
}

impl ControlGroup {
    /// Point the orbit controls circle when this group has focus
    pub fn orbit_target(&self) -> Point3<f32> {
        self.anchor.position
    }
}

/// Owns the objects and control groups of one scene
#[derive(Debug, Default)]
pub struct SceneComposer {
    objects: Vec<RenderableObject>,
    groups: Vec<ControlGroup>,
    diagnostics: Vec<Diagnostic>,
    next_object: u32,
    next_group: u32,
}

impl SceneComposer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a control group anchored at `anchor`. A group that already
    /// exists under `name` is returned unchanged.
    pub fn create_control_group(&mut self, name: &str, anchor: Point3<f32>) -> &ControlGroup {
        let index = match self.groups.iter().position(|g| g.name == name) {
            Some(index) => index,
            None => {
                let id = GroupId(self.next_group);
                self.next_group += 1;
                log::debug!("Created control group {:?} at {:?}", name, anchor);
                self.groups.push(ControlGroup {
                    id,
                    name: name.to_string(),
                    anchor: ObjectTransform::at(anchor),
                    members: Vec::new(),
                });
                self.groups.len() - 1
            }
        };
        &self.groups[index]
    }

    /// Build a renderable from `geometry` and add it to the scene
    pub fn add_object(&mut self, spec: &ObjectSpec, mut geometry: RawGeometry) -> &RenderableObject {
        let classification = classify_and_prepare(&mut geometry);
        let texture = spec.texture_hint();
        let material = prepare_material(&mut geometry, texture.as_deref(), spec.role.is_backdrop());

        let id = ObjectId(self.next_object);
        self.next_object += 1;

        let group = spec.control_group.as_deref().and_then(|name| {
            let group = self.groups.iter_mut().find(|g| g.name == name);
            if group.is_none() {
                log::warn!("Unknown control group {:?}, adding {} at scene root", name, spec.role);
                self.diagnostics.push(Diagnostic::UnknownControlGroup {
                    name: name.to_string(),
                });
            }
            group.map(|g| {
                g.members.push(id);
                g.id
            })
        });

        let mut object = RenderableObject {
            id,
            role: spec.role,
            source: spec.source.clone(),
            geometry,
            material,
            classification,
            transform: ObjectTransform::identity(),
            orientation: OrientationSpec::default(),
            group,
            disposed: false,
        };

        object.orientation = apply_orientation(&mut object.transform, &spec.orientation);
        for token in object.orientation.skipped() {
            self.diagnostics.push(Diagnostic::MalformedOrientationToken {
                role: spec.role,
                token: token.clone(),
            });
        }

        if let ScaleOutcome::Fallback = apply_scale(&mut object.transform, &spec.scale) {
            self.diagnostics.push(Diagnostic::MalformedScaleSpec {
                role: spec.role,
                path: spec.source.clone(),
            });
        }

        log::debug!(
            "Bounding box of {}: {:?}",
            spec.source.display(),
            object.bounding_box()
        );
        log::info!(
            "Composed {} from {}: {}, {}, {} vertices",
            spec.role,
            spec.source.display(),
            object.classification,
            object.material.variant_name(),
            object.vertex_count()
        );

        self.objects.push(object);
        &self.objects[self.objects.len() - 1]
    }

    pub fn object(&self, id: ObjectId) -> Option<&RenderableObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    pub fn objects(&self) -> &[RenderableObject] {
        &self.objects
    }

    /// First object loaded from `source`
    pub fn object_by_source(&self, source: &Path) -> Option<&RenderableObject> {
        self.objects.iter().find(|o| o.source == source)
    }

    pub fn objects_with_role(&self, role: Role) -> impl Iterator<Item = &RenderableObject> {
        self.objects.iter().filter(move |o| o.role == role)
    }

    pub fn group(&self, id: GroupId) -> Option<&ControlGroup> {
        self.groups.iter().find(|g| g.id == id)
    }

    pub fn group_by_name(&self, name: &str) -> Option<&ControlGroup> {
        self.groups.iter().find(|g| g.name == name)
    }

    pub fn groups(&self) -> &[ControlGroup] {
        &self.groups
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Replace an object's material. Returns false if the object is gone.
    pub fn set_material(&mut self, id: ObjectId, material: MaterialSpec) -> bool {
        match self.objects.iter_mut().find(|o| o.id == id) {
            Some(object) => {
                object.material = material;
                true
            }
            None => false,
        }
    }

    /// Degrade a textured surface to its flat tint, returning the new material
    pub fn fall_back_to_flat(&mut self, id: ObjectId) -> Option<&MaterialSpec> {
        let object = self.objects.iter_mut().find(|o| o.id == id)?;
        object.material = object.material.clone().into_flat_fallback();
        Some(&object.material)
    }

    /// Re-run the orientation step on one object. Rotation is reset first.
    pub fn reorient(&mut self, id: ObjectId, orientation: &str) -> Option<&RenderableObject> {
        let object = self.objects.iter_mut().find(|o| o.id == id)?;
        object.orientation = apply_orientation(&mut object.transform, orientation);
        for token in object.orientation.skipped() {
            self.diagnostics.push(Diagnostic::MalformedOrientationToken {
                role: object.role,
                token: token.clone(),
            });
        }
        Some(&*object)
    }

    /// Re-run the scale step on one object
    pub fn rescale(&mut self, id: ObjectId, scale: &ScaleSpec) -> Option<&RenderableObject> {
        let object = self.objects.iter_mut().find(|o| o.id == id)?;
        if apply_scale(&mut object.transform, scale).is_fallback() {
            self.diagnostics.push(Diagnostic::MalformedScaleSpec {
                role: object.role,
                path: object.source.clone(),
            });
        }
        Some(&*object)
    }

    /// Diagnostics recorded since the last drain
    pub fn drain_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Dispose every object and drop every group, returning the handles the
    /// backend must release
    pub fn clear(&mut self) -> (Vec<ObjectId>, Vec<GroupId>) {
        let objects = self
            .objects
            .drain(..)
            .map(|mut object| {
                object.dispose();
                object.id
            })
            .collect();
        let groups = self.groups.drain(..).map(|g| g.id).collect();
        (objects, groups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::SurfaceShading;
    use approx::assert_relative_eq;
    use plyscene_core::{Axis, ColorAttribute, UnitQuaternion, Vector3};
    use std::f32::consts::FRAC_PI_2;

    fn triangle() -> RawGeometry {
        RawGeometry::from_positions(vec![
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(1.0, 0.0, 0.0),
            Point3f::new(0.0, 1.0, 0.0),
        ])
    }

    #[test]
    fn test_uncolored_surface_pipeline() {
        let mut composer = SceneComposer::new();
        let spec = ObjectSpec::new(Role::Model, "models/chair.ply");
        let object = composer.add_object(&spec, triangle().with_indices(vec![0, 1, 2]));

        assert_eq!(object.classification, RenderClassification::Surface);
        assert!(object.geometry.has_normals());
        assert_relative_eq!(object.geometry.normals.as_ref().unwrap()[0], Vector3::z());
        assert_eq!(
            object.material.texture_path(),
            Some(Path::new("models/chair.jpg"))
        );
    }

    #[test]
    fn test_colored_point_cloud_pipeline() {
        let mut composer = SceneComposer::new();
        let geometry = triangle().with_colors(ColorAttribute::rgb(vec![
            200.0, 100.0, 0.0, 0.0, 0.0, 0.0, 50.0, 50.0, 50.0,
        ]));
        let object = composer.add_object(&ObjectSpec::new(Role::Model, "scan.ply"), geometry);

        assert_eq!(object.classification, RenderClassification::PointCloud);
        assert_eq!(object.material.variant_name(), "PointCloudColored");
        let colors = object.geometry.colors.as_ref().unwrap();
        assert!(colors.normalized);
        assert_relative_eq!(colors.values[0], 200.0 / 255.0);
        assert!(!object.geometry.has_normals());
    }

    #[test]
    fn test_room_and_subject_are_isolated() {
        let mut composer = SceneComposer::new();
        composer.create_control_group("subject", Point3::origin());

        let room = ObjectSpec::new(Role::Room, "room.ply")
            .with_orientation("x,y,z")
            .with_scale(5.0);
        let subject = ObjectSpec::new(Role::Subject, "chair.ply").in_group("subject");

        let colored = triangle()
            .with_indices(vec![0, 1, 2])
            .with_colors(ColorAttribute::rgb(vec![255.0; 9]));
        let room_id = composer.add_object(&room, colored).id;
        let subject_id = composer.add_object(&subject, triangle()).id;

        let room = composer.object(room_id).unwrap();
        let subject = composer.object(subject_id).unwrap();

        let expected = UnitQuaternion::from_axis_angle(&Axis::Z.unit(), -FRAC_PI_2)
            * UnitQuaternion::from_axis_angle(&Axis::X.unit(), -FRAC_PI_2)
            * UnitQuaternion::from_axis_angle(&Axis::Y.unit(), -FRAC_PI_2);
        assert_relative_eq!(
            room.transform.rotation.to_rotation_matrix(),
            expected.to_rotation_matrix(),
            epsilon = 1e-6
        );
        assert_eq!(room.transform.scale, Vector3::new(5.0, 5.0, 5.0));
        assert_eq!(
            room.material,
            MaterialSpec::SurfaceVertexColored {
                base_color: plyscene_core::Color::WHITE,
                shading: SurfaceShading::BACKDROP_VERTEX_COLORED,
            }
        );
        assert_eq!(room.group, None);

        assert_eq!(subject.transform, ObjectTransform::identity());
        let group = composer.group_by_name("subject").unwrap();
        assert_eq!(subject.group, Some(group.id));
        assert_eq!(group.members, vec![subject_id]);
    }

    #[test]
    fn test_malformed_inputs_are_recorded() {
        let mut composer = SceneComposer::new();
        let spec = ObjectSpec::new(Role::Subject, "chair.ply")
            .with_orientation("bogus,y")
            .with_scale(ScaleSpec::Invalid)
            .in_group("missing");
        let object = composer.add_object(&spec, triangle());
        assert_eq!(object.group, None);
        assert_eq!(object.transform.scale, Vector3::new(1.0, 1.0, 1.0));

        let kinds: Vec<_> = composer
            .drain_diagnostics()
            .iter()
            .map(Diagnostic::kind)
            .collect();
        assert_eq!(
            kinds,
            vec!["UnknownControlGroup", "MalformedOrientationToken", "MalformedScaleSpec"]
        );
        assert!(composer.drain_diagnostics().is_empty());
    }

    #[test]
    fn test_control_group_is_created_once() {
        let mut composer = SceneComposer::new();
        let first = composer.create_control_group("subject", Point3::new(1.0, 2.0, 3.0)).id;
        let again = composer.create_control_group("subject", Point3::origin()).clone();
        assert_eq!(again.id, first);
        assert_eq!(again.orbit_target(), Point3::new(1.0, 2.0, 3.0));
        assert_eq!(composer.groups().len(), 1);
    }

    #[test]
    fn test_reorient_and_rescale_one_object() {
        let mut composer = SceneComposer::new();
        let a = composer
            .add_object(&ObjectSpec::new(Role::Room, "a.ply").with_orientation("x"), triangle())
            .id;
        let b = composer
            .add_object(&ObjectSpec::new(Role::Subject, "b.ply").with_orientation("y"), triangle())
            .id;
        let before = composer.object(b).unwrap().transform;

        composer.reorient(a, "").unwrap();
        composer.rescale(a, &ScaleSpec::per_axis(Some(2.0), None, None)).unwrap();

        let a = composer.object(a).unwrap();
        assert_eq!(a.transform.rotation, UnitQuaternion::identity());
        assert_eq!(a.transform.scale, Vector3::new(2.0, 1.0, 1.0));
        assert_eq!(composer.object(b).unwrap().transform, before);
    }

    #[test]
    fn test_world_bounds_follow_transform() {
        let mut composer = SceneComposer::new();
        let spec = ObjectSpec::new(Role::Model, "a.ply").with_scale(2.0);
        let object = composer.add_object(&spec, triangle());
        let (min, max) = object.bounding_box();
        assert_relative_eq!(min, Point3f::new(0.0, 0.0, 0.0));
        assert_relative_eq!(max, Point3f::new(2.0, 2.0, 0.0));
    }

    #[test]
    fn test_texture_fallback_and_clear() {
        let mut composer = SceneComposer::new();
        let id = composer
            .add_object(&ObjectSpec::new(Role::Model, "a.ply"), triangle().with_indices(vec![0, 1, 2]))
            .id;
        composer.create_control_group("subject", Point3::origin());

        let material = composer.fall_back_to_flat(id).unwrap();
        assert_eq!(material.variant_name(), "SurfaceFlatColored");
        assert!(composer.fall_back_to_flat(ObjectId(99)).is_none());

        let (objects, groups) = composer.clear();
        assert_eq!(objects, vec![id]);
        assert_eq!(groups.len(), 1);
        assert!(composer.is_empty());
        assert!(composer.groups().is_empty());
    }

    #[test]
    fn test_dispose_releases_geometry_once() {
        let mut composer = SceneComposer::new();
        let mut object = composer
            .add_object(&ObjectSpec::new(Role::Model, "a.ply"), triangle())
            .clone();
        object.dispose();
        assert!(object.is_disposed());
        assert_eq!(object.vertex_count(), 0);
        object.dispose();
        assert!(object.is_disposed());
    }
}

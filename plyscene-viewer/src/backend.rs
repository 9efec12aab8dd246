//! Rendering backend interface
//!
//! The viewer never rasterises anything itself. It drives a [`RenderBackend`]
//! with declarative scene-graph commands and asks it to draw once per frame.

use crate::camera::Camera;
use crate::material::MaterialSpec;
use crate::scene::RenderableObject;
use plyscene_core::{Color, ObjectTransform, Vector3};
use plyscene_io::TextureImage;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Handle of a renderable object inside a scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub u32);

/// Handle of a control group inside a scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupId(pub u32);

/// Handle of a registered per-frame callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Light {
    Ambient {
        color: Color,
        intensity: f32,
    },
    Directional {
        color: Color,
        intensity: f32,
        position: [f32; 3],
    },
}

/// Scene-graph mutations a backend must honour
pub trait RenderBackend {
    /// Bind the output surface of the given size
    fn attach_surface(&mut self, width: u32, height: u32);

    fn detach_surface(&mut self);

    fn create_scene(&mut self, background: Color);

    fn add_axes_helper(&mut self, size: f32);

    fn add_light(&mut self, light: Light);

    fn set_camera(&mut self, camera: &Camera);

    fn add_group(&mut self, id: GroupId, name: &str, anchor: &ObjectTransform);

    fn remove_group(&mut self, id: GroupId);

    /// Insert an object, under `parent` when it belongs to a control group
    fn add_object(&mut self, object: &RenderableObject, parent: Option<GroupId>);

    fn update_material(&mut self, id: ObjectId, material: &MaterialSpec);

    fn update_transform(&mut self, id: ObjectId, transform: &ObjectTransform);

    fn set_texture(&mut self, id: ObjectId, texture: &TextureImage);

    /// Remove an object and release its geometry and material
    fn remove_object(&mut self, id: ObjectId);

    fn register_frame_callback(&mut self) -> FrameHandle;

    fn cancel_frame_callback(&mut self, handle: FrameHandle);

    fn render(&mut self, camera: &Camera);
}

/// One recorded backend call
#[derive(Debug, Clone, PartialEq)]
pub enum SceneCommand {
    AttachSurface { width: u32, height: u32 },
    DetachSurface,
    CreateScene { background: Color },
    AddAxesHelper { size: f32 },
    AddLight(Light),
    SetCamera {
        position: [f32; 3],
        fov: f32,
        near: f32,
        far: f32,
    },
    AddGroup { id: GroupId, name: String },
    RemoveGroup(GroupId),
    AddObject {
        id: ObjectId,
        parent: Option<GroupId>,
        material: String,
    },
    UpdateMaterial { id: ObjectId, material: String },
    UpdateTransform(ObjectId),
    SetTexture { id: ObjectId, width: u32, height: u32 },
    RemoveObject(ObjectId),
    RegisterFrameCallback(FrameHandle),
    CancelFrameCallback(FrameHandle),
    Render,
}

/// What a [`RecordingBackend`] knows about a live object
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedObject {
    pub material: MaterialSpec,
    pub transform: ObjectTransform,
    pub parent: Option<GroupId>,
    pub vertex_count: usize,
    pub textured: bool,
}

/// Backend that rasterises nothing and records every command.
///
/// Used headlessly by the demos and as the test double for the viewer.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    commands: Vec<SceneCommand>,
    objects: BTreeMap<ObjectId, RecordedObject>,
    groups: BTreeMap<GroupId, String>,
    surface: Option<(u32, u32)>,
    frame_callback: Option<FrameHandle>,
    next_frame_handle: u64,
    frames_rendered: usize,
    camera_position: Option<Vector3<f32>>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[SceneCommand] {
        &self.commands
    }

    /// Objects currently in the scene
    pub fn objects(&self) -> &BTreeMap<ObjectId, RecordedObject> {
        &self.objects
    }

    pub fn object(&self, id: ObjectId) -> Option<&RecordedObject> {
        self.objects.get(&id)
    }

    pub fn group_names(&self) -> Vec<&str> {
        self.groups.values().map(String::as_str).collect()
    }

    pub fn surface(&self) -> Option<(u32, u32)> {
        self.surface
    }

    pub fn is_surface_attached(&self) -> bool {
        self.surface.is_some()
    }

    pub fn frame_callback(&self) -> Option<FrameHandle> {
        self.frame_callback
    }

    pub fn frames_rendered(&self) -> usize {
        self.frames_rendered
    }

    /// Camera position at the last render
    pub fn last_camera_position(&self) -> Option<Vector3<f32>> {
        self.camera_position
    }

    /// Number of recorded commands matching `predicate`
    pub fn count(&self, predicate: impl Fn(&SceneCommand) -> bool) -> usize {
        self.commands.iter().filter(|c| predicate(c)).count()
    }
}

impl RenderBackend for RecordingBackend {
    fn attach_surface(&mut self, width: u32, height: u32) {
        self.surface = Some((width, height));
        self.commands.push(SceneCommand::AttachSurface { width, height });
    }

    fn detach_surface(&mut self) {
        self.surface = None;
        self.commands.push(SceneCommand::DetachSurface);
    }

    fn create_scene(&mut self, background: Color) {
        self.commands.push(SceneCommand::CreateScene { background });
    }

    fn add_axes_helper(&mut self, size: f32) {
        self.commands.push(SceneCommand::AddAxesHelper { size });
    }

    fn add_light(&mut self, light: Light) {
        self.commands.push(SceneCommand::AddLight(light));
    }

    fn set_camera(&mut self, camera: &Camera) {
        self.commands.push(SceneCommand::SetCamera {
            position: [camera.position.x, camera.position.y, camera.position.z],
            fov: camera.fov,
            near: camera.near,
            far: camera.far,
        });
    }

    fn add_group(&mut self, id: GroupId, name: &str, _anchor: &ObjectTransform) {
        self.groups.insert(id, name.to_string());
        self.commands.push(SceneCommand::AddGroup {
            id,
            name: name.to_string(),
        });
    }

    fn remove_group(&mut self, id: GroupId) {
        self.groups.remove(&id);
        self.commands.push(SceneCommand::RemoveGroup(id));
    }

    fn add_object(&mut self, object: &RenderableObject, parent: Option<GroupId>) {
        self.objects.insert(
            object.id,
            RecordedObject {
                material: object.material.clone(),
                transform: object.transform,
                parent,
                vertex_count: object.geometry.vertex_count(),
                textured: false,
            },
        );
        self.commands.push(SceneCommand::AddObject {
            id: object.id,
            parent,
            material: object.material.variant_name().to_string(),
        });
    }

    fn update_material(&mut self, id: ObjectId, material: &MaterialSpec) {
        if let Some(recorded) = self.objects.get_mut(&id) {
            recorded.material = material.clone();
        }
        self.commands.push(SceneCommand::UpdateMaterial {
            id,
            material: material.variant_name().to_string(),
        });
    }

    fn update_transform(&mut self, id: ObjectId, transform: &ObjectTransform) {
        if let Some(recorded) = self.objects.get_mut(&id) {
            recorded.transform = *transform;
        }
        self.commands.push(SceneCommand::UpdateTransform(id));
    }

    fn set_texture(&mut self, id: ObjectId, texture: &TextureImage) {
        if let Some(recorded) = self.objects.get_mut(&id) {
            recorded.textured = true;
        }
        self.commands.push(SceneCommand::SetTexture {
            id,
            width: texture.width,
            height: texture.height,
        });
    }

    fn remove_object(&mut self, id: ObjectId) {
        self.objects.remove(&id);
        self.commands.push(SceneCommand::RemoveObject(id));
    }

    fn register_frame_callback(&mut self) -> FrameHandle {
        self.next_frame_handle += 1;
        let handle = FrameHandle(self.next_frame_handle);
        self.frame_callback = Some(handle);
        self.commands.push(SceneCommand::RegisterFrameCallback(handle));
        handle
    }

    fn cancel_frame_callback(&mut self, handle: FrameHandle) {
        if self.frame_callback == Some(handle) {
            self.frame_callback = None;
        }
        self.commands.push(SceneCommand::CancelFrameCallback(handle));
    }

    fn render(&mut self, camera: &Camera) {
        self.frames_rendered += 1;
        self.camera_position = Some(camera.position.coords);
        self.commands.push(SceneCommand::Render);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_callback_bookkeeping() {
        let mut backend = RecordingBackend::new();
        let first = backend.register_frame_callback();
        let second = backend.register_frame_callback();
        assert_ne!(first, second);

        backend.cancel_frame_callback(first);
        assert_eq!(backend.frame_callback(), Some(second));

        backend.cancel_frame_callback(second);
        assert_eq!(backend.frame_callback(), None);
    }

    #[test]
    fn test_surface_and_render_counting() {
        let mut backend = RecordingBackend::new();
        backend.attach_surface(800, 600);
        assert_eq!(backend.surface(), Some((800, 600)));

        let camera = Camera::default();
        backend.render(&camera);
        backend.render(&camera);
        assert_eq!(backend.frames_rendered(), 2);
        assert_eq!(backend.count(|c| matches!(c, SceneCommand::Render)), 2);

        backend.detach_surface();
        assert!(!backend.is_surface_attached());
    }
}

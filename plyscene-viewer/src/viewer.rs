//! Viewer lifecycle
//!
//! A [`Viewer`] mounts a scene on a [`RenderBackend`], requests every
//! configured model from a [`GeometrySource`] and composes each one as its
//! load completes, in whatever order that happens. It owns teardown: after
//! [`Viewer::dispose`] every object, group and the output surface have been
//! released, and load callbacks that arrive later are discarded.
//!
//! Everything runs on one thread. Load callbacks hold only a weak handle to
//! the viewer's state plus the generation they were issued for, so a callback
//! from a disposed or remounted viewer can never touch the current scene.

use crate::backend::{FrameHandle, ObjectId, RenderBackend};
use crate::camera::{Camera, OrbitControls};
use crate::config::ViewerConfig;
use crate::diagnostic::Diagnostic;
use crate::scale::ScaleSpec;
use crate::scene::{ObjectSpec, SceneComposer};
use plyscene_core::{ObjectTransform, Point3, RawGeometry, Result, Vector3};
use plyscene_io::{GeometrySource, IoError, LoadRequest, TextureImage, TextureSource};
use std::cell::{Ref, RefCell, RefMut};
use std::path::{Path, PathBuf};
use std::rc::{Rc, Weak};

/// Where a viewer is in its life
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewerState {
    /// Configured, nothing mounted yet
    Idle,
    /// At least one geometry fetch is outstanding
    Loading,
    /// Every fetch has resolved; failed ones are simply absent
    Composed,
    Disposed,
}

struct Shared<B> {
    generation: u64,
    state: ViewerState,
    config: ViewerConfig,
    backend: B,
    composer: SceneComposer,
    camera: Camera,
    controls: OrbitControls,
    frame: Option<FrameHandle>,
    diagnostics: Vec<Diagnostic>,
    progress: Vec<f32>,
    outstanding: usize,
}

impl<B: RenderBackend> Shared<B> {
    fn new(backend: B, config: ViewerConfig) -> Self {
        let camera = Camera::from_config(&config.camera, config.width, config.height);
        let controls = OrbitControls::new(&config.controls, camera.target);
        Self {
            generation: 0,
            state: ViewerState::Idle,
            backend,
            composer: SceneComposer::new(),
            camera,
            controls,
            frame: None,
            diagnostics: Vec::new(),
            progress: vec![0.0; config.models.len()],
            outstanding: 0,
            config,
        }
    }

    /// Whether a callback issued for `generation` must be discarded
    fn is_stale(&self, generation: u64) -> bool {
        self.generation != generation || self.state == ViewerState::Disposed
    }

    fn discard_late(&mut self, path: &Path) {
        log::debug!("Discarding late load of {} after teardown", path.display());
        self.diagnostics.push(Diagnostic::DisposalRace {
            path: path.to_path_buf(),
        });
    }

    fn set_progress(&mut self, generation: u64, index: usize, fraction: f32) {
        if self.is_stale(generation) {
            return;
        }
        if let Some(slot) = self.progress.get_mut(index) {
            *slot = fraction;
            log::debug!("Load progress of model {}: {:.0}%", index, fraction * 100.0);
        }
    }

    /// Compose a finished geometry load. Returns the texture to fetch, if any.
    fn complete_geometry(
        &mut self,
        generation: u64,
        index: usize,
        path: &Path,
        result: std::result::Result<RawGeometry, IoError>,
    ) -> Option<(ObjectId, PathBuf)> {
        if self.is_stale(generation) {
            self.discard_late(path);
            return None;
        }

        let entry = self.config.models.get(index)?;
        let spec = ObjectSpec::from(entry);
        if let Some(slot) = self.progress.get_mut(index) {
            *slot = 1.0;
        }
        self.outstanding = self.outstanding.saturating_sub(1);

        let texture = match result {
            Ok(geometry) => {
                log::info!(
                    "Loaded {} model {} ({} vertices)",
                    spec.role,
                    path.display(),
                    geometry.vertex_count()
                );
                let object = self.composer.add_object(&spec, geometry);
                self.backend.add_object(object, object.group);
                object
                    .material
                    .texture_path()
                    .map(|texture| (object.id, texture.to_path_buf()))
            }
            Err(e) => {
                log::error!("Failed to load {} model {}: {}", spec.role, path.display(), e);
                self.diagnostics.push(Diagnostic::LoadFailure {
                    role: spec.role,
                    path: path.to_path_buf(),
                    message: e.to_string(),
                });
                None
            }
        };
        self.diagnostics.extend(self.composer.drain_diagnostics());

        if self.outstanding == 0 && self.state == ViewerState::Loading {
            self.state = ViewerState::Composed;
            log::info!("Scene composed with {} object(s)", self.composer.len());
        }

        texture
    }

    fn complete_texture(
        &mut self,
        generation: u64,
        id: ObjectId,
        path: &Path,
        result: std::result::Result<TextureImage, IoError>,
    ) {
        if self.is_stale(generation) {
            self.discard_late(path);
            return;
        }
        if self.composer.object(id).is_none() {
            return;
        }

        match result {
            Ok(image) => {
                log::debug!(
                    "Applied texture {} ({}x{})",
                    path.display(),
                    image.width,
                    image.height
                );
                self.backend.set_texture(id, &image);
            }
            Err(e) => self.texture_failed(id, path, e.to_string()),
        }
    }

    fn texture_failed(&mut self, id: ObjectId, path: &Path, message: String) {
        log::warn!("Failed to load texture {}: {}", path.display(), message);
        self.diagnostics.push(Diagnostic::TextureFailure {
            path: path.to_path_buf(),
            message,
        });
        if let Some(material) = self.composer.fall_back_to_flat(id) {
            self.backend.update_material(id, material);
        }
    }

    fn push_transform(&mut self, id: ObjectId, transform: Option<ObjectTransform>) -> bool {
        self.diagnostics.extend(self.composer.drain_diagnostics());
        match transform {
            Some(transform) => {
                self.backend.update_transform(id, &transform);
                true
            }
            None => false,
        }
    }

    fn teardown(&mut self) {
        if let Some(handle) = self.frame.take() {
            self.backend.cancel_frame_callback(handle);
        }

        let (objects, groups) = self.composer.clear();
        for id in objects {
            self.backend.remove_object(id);
        }
        for id in groups {
            self.backend.remove_group(id);
        }
        self.backend.detach_surface();
    }
}

/// A scene viewer bound to a backend, a geometry source and a texture source
pub struct Viewer<B: RenderBackend, G: GeometrySource, T: TextureSource> {
    shared: Rc<RefCell<Shared<B>>>,
    geometry: G,
    textures: Rc<RefCell<T>>,
}

impl<B, G, T> Viewer<B, G, T>
where
    B: RenderBackend + 'static,
    G: GeometrySource,
    T: TextureSource + 'static,
{
    /// Create an idle viewer. Fails only if `config` is invalid.
    pub fn new(backend: B, geometry: G, textures: T, config: ViewerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            shared: Rc::new(RefCell::new(Shared::new(backend, config))),
            geometry,
            textures: Rc::new(RefCell::new(textures)),
        })
    }

    /// Set up the scene and request every configured model.
    ///
    /// Has no effect unless the viewer is idle.
    pub fn mount(&mut self) {
        let (generation, requests) = {
            let mut shared = self.shared.borrow_mut();
            if shared.state != ViewerState::Idle {
                log::warn!("Viewer is {:?}, not mounting", shared.state);
                return;
            }
            let shared = &mut *shared;
            let config = &shared.config;

            shared.backend.attach_surface(config.width, config.height);
            shared.backend.create_scene(config.background_color);
            if let Some(size) = config.axes_helper {
                shared.backend.add_axes_helper(size);
            }
            for light in config.lighting.lights() {
                shared.backend.add_light(light);
            }
            shared.backend.set_camera(&shared.camera);

            for group in &config.control_groups {
                let [x, y, z] = group.anchor;
                let created = shared
                    .composer
                    .create_control_group(&group.name, Point3::new(x, y, z));
                shared
                    .backend
                    .add_group(created.id, &created.name, &created.anchor);
            }

            shared.frame = Some(shared.backend.register_frame_callback());

            let requests: Vec<(usize, PathBuf)> = config
                .models
                .iter()
                .enumerate()
                .map(|(index, entry)| (index, entry.model_path.clone()))
                .collect();

            shared.outstanding = requests.len();
            shared.state = if requests.is_empty() {
                ViewerState::Composed
            } else {
                ViewerState::Loading
            };
            log::info!(
                "Mounted {}x{} viewer, loading {} model(s)",
                config.width,
                config.height,
                requests.len()
            );

            (shared.generation, requests)
        };

        for (index, path) in requests {
            let request = self.geometry_request(generation, index, path.clone());
            self.geometry.load(&path, request);
        }
    }

    fn geometry_request(
        &self,
        generation: u64,
        index: usize,
        path: PathBuf,
    ) -> LoadRequest<RawGeometry> {
        let on_progress = Rc::downgrade(&self.shared);
        let on_complete = Rc::downgrade(&self.shared);
        let textures = Rc::downgrade(&self.textures);

        LoadRequest::new(move |result: std::result::Result<RawGeometry, IoError>| {
            let Some(shared) = on_complete.upgrade() else {
                log::debug!("Viewer dropped before {} loaded", path.display());
                return;
            };
            let texture = shared
                .borrow_mut()
                .complete_geometry(generation, index, &path, result);
            if let Some((id, texture_path)) = texture {
                request_texture(&shared, &textures, generation, id, texture_path);
            }
        })
        .with_progress(move |fraction| {
            if let Some(shared) = on_progress.upgrade() {
                if let Ok(mut shared) = shared.try_borrow_mut() {
                    shared.set_progress(generation, index, fraction);
                }
            }
        })
    }

    /// Advance one frame: apply damped control input, then render.
    /// Returns false once the viewer is no longer mounted.
    pub fn frame(&mut self) -> bool {
        let mut shared = self.shared.borrow_mut();
        let shared = &mut *shared;
        if shared.frame.is_none() || shared.state == ViewerState::Disposed {
            return false;
        }
        shared.controls.update(&mut shared.camera);
        shared.backend.render(&shared.camera);
        true
    }

    /// Orbit the camera around the current target (radians)
    pub fn orbit(&mut self, azimuth: f32, polar: f32) {
        self.shared.borrow_mut().controls.rotate(azimuth, polar);
    }

    /// Change the camera distance; factors below 1 move closer
    pub fn zoom(&mut self, factor: f32) {
        self.shared.borrow_mut().controls.dolly(factor);
    }

    pub fn pan(&mut self, offset: Vector3<f32>) {
        self.shared.borrow_mut().controls.pan(offset);
    }

    /// Orbit around the anchor of the named control group from now on
    pub fn focus_group(&mut self, name: &str) -> bool {
        let mut shared = self.shared.borrow_mut();
        let target = shared.composer.group_by_name(name).map(|g| g.orbit_target());
        match target {
            Some(target) => {
                shared.controls.set_target(target);
                log::debug!("Orbit target moved to group {:?} at {:?}", name, target);
                true
            }
            None => {
                log::warn!("Cannot focus unknown control group {:?}", name);
                false
            }
        }
    }

    /// Re-apply an orientation string to one object, resetting its rotation
    pub fn set_orientation(&mut self, id: ObjectId, orientation: &str) -> bool {
        let mut shared = self.shared.borrow_mut();
        let transform = shared
            .composer
            .reorient(id, orientation)
            .map(|object| object.transform);
        shared.push_transform(id, transform)
    }

    /// Re-apply a scale input to one object
    pub fn set_scale(&mut self, id: ObjectId, scale: &ScaleSpec) -> bool {
        let mut shared = self.shared.borrow_mut();
        let transform = shared.composer.rescale(id, scale).map(|object| object.transform);
        shared.push_transform(id, transform)
    }

    /// Release everything this viewer created. Safe to call repeatedly.
    pub fn dispose(&mut self) {
        let Ok(mut shared) = self.shared.try_borrow_mut() else {
            log::warn!("Viewer state is in use, cannot dispose");
            return;
        };

        match shared.state {
            ViewerState::Disposed => return,
            ViewerState::Idle => {}
            ViewerState::Loading | ViewerState::Composed => shared.teardown(),
        }

        shared.state = ViewerState::Disposed;
        log::info!("Viewer disposed");
    }

    /// Tear down and mount `config` as a fresh scene. Late callbacks from the
    /// previous scene are discarded.
    pub fn remount(&mut self, config: ViewerConfig) -> Result<()> {
        config.validate()?;
        self.dispose();
        {
            let mut shared = self.shared.borrow_mut();
            let camera = Camera::from_config(&config.camera, config.width, config.height);
            shared.controls = OrbitControls::new(&config.controls, camera.target);
            shared.camera = camera;
            shared.generation += 1;
            shared.composer = SceneComposer::new();
            shared.progress = vec![0.0; config.models.len()];
            shared.outstanding = 0;
            shared.config = config;
            shared.state = ViewerState::Idle;
        }
        self.mount();
        Ok(())
    }

    pub fn state(&self) -> ViewerState {
        self.shared.borrow().state
    }

    /// Every diagnostic recorded so far, oldest first
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.shared.borrow().diagnostics.clone()
    }

    /// Mean load progress over the configured models, in [0, 1]
    pub fn load_progress(&self) -> f32 {
        let shared = self.shared.borrow();
        if shared.progress.is_empty() {
            return 1.0;
        }
        shared.progress.iter().sum::<f32>() / shared.progress.len() as f32
    }

    pub fn config(&self) -> Ref<'_, ViewerConfig> {
        Ref::map(self.shared.borrow(), |s| &s.config)
    }

    pub fn backend(&self) -> Ref<'_, B> {
        Ref::map(self.shared.borrow(), |s| &s.backend)
    }

    pub fn composer(&self) -> Ref<'_, SceneComposer> {
        Ref::map(self.shared.borrow(), |s| &s.composer)
    }

    pub fn camera(&self) -> Camera {
        self.shared.borrow().camera.clone()
    }

    pub fn geometry_source(&self) -> &G {
        &self.geometry
    }

    /// The geometry source, for hosts that drive it cooperatively
    pub fn geometry_source_mut(&mut self) -> &mut G {
        &mut self.geometry
    }

    /// The texture source, for hosts that drive it cooperatively.
    ///
    /// Resolving a texture writes to the scene, so no read borrow of the
    /// viewer may be held meanwhile:
    ///
    /// ```compile_fail
    /// use plyscene_core::RawGeometry;
    /// use plyscene_io::{IoError, ManualSource, TextureImage};
    /// use plyscene_viewer::{RecordingBackend, Viewer, ViewerConfig};
    /// use std::path::Path;
    ///
    /// let mut viewer: Viewer<RecordingBackend, ManualSource<RawGeometry>, ManualSource<TextureImage>> =
    ///     Viewer::new(
    ///         RecordingBackend::new(),
    ///         ManualSource::new(),
    ///         ManualSource::new(),
    ///         ViewerConfig::single("m.ply", "", 64, 64),
    ///     )
    ///     .unwrap();
    /// let composer = viewer.composer();
    /// viewer.texture_source_mut().resolve(
    ///     Path::new("m.jpg"),
    ///     Err(IoError::FileNotFound { path: "m.jpg".into() }),
    /// );
    /// drop(composer);
    /// ```
    pub fn texture_source_mut(&mut self) -> RefMut<'_, T> {
        self.textures.borrow_mut()
    }
}

fn request_texture<B, T>(
    shared: &Rc<RefCell<Shared<B>>>,
    textures: &Weak<RefCell<T>>,
    generation: u64,
    id: ObjectId,
    path: PathBuf,
) where
    B: RenderBackend + 'static,
    T: TextureSource + 'static,
{
    let Some(textures) = textures.upgrade() else {
        return;
    };
    let Ok(mut textures) = textures.try_borrow_mut() else {
        shared
            .borrow_mut()
            .texture_failed(id, &path, "texture source busy".to_string());
        return;
    };

    let weak = Rc::downgrade(shared);
    let texture_path = path.clone();
    textures.load(
        &path,
        LoadRequest::new(move |result: std::result::Result<TextureImage, IoError>| {
            if let Some(shared) = weak.upgrade() {
                shared
                    .borrow_mut()
                    .complete_texture(generation, id, &texture_path, result);
            }
        }),
    );
}

impl<B: RenderBackend, G: GeometrySource, T: TextureSource> Drop for Viewer<B, G, T> {
    fn drop(&mut self) {
        let Ok(mut shared) = self.shared.try_borrow_mut() else {
            return;
        };
        if matches!(shared.state, ViewerState::Loading | ViewerState::Composed) {
            shared.teardown();
            log::info!("Viewer disposed on drop");
        }
        shared.state = ViewerState::Disposed;
    }
}

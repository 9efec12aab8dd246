//! Viewer configuration
//!
//! A viewer is described by a list of model entries plus the surface size.
//! Everything else has defaults matching the stock scene: light grey
//! backdrop, a 75° camera far out on +Z, damped orbit controls and a small
//! axes helper.

use crate::backend::Light;
use crate::role::Role;
use crate::scale::ScaleSpec;
use plyscene_core::{Color, Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

pub const DEFAULT_BACKGROUND: Color = Color(0xf0f0f0);
pub const DEFAULT_ORIENTATION: &str = "z";
pub const DEFAULT_AXES_HELPER_SIZE: f32 = 30.0;
pub const SUBJECT_GROUP: &str = "subject";

/// One model to load and compose
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelEntry {
    #[serde(default)]
    pub role: Role,
    #[serde(alias = "modelPath")]
    pub model_path: PathBuf,
    #[serde(default = "default_orientation")]
    pub orientation: String,
    #[serde(default)]
    pub scale: ScaleSpec,
    /// Texture to use instead of the sibling `.jpg`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texture: Option<PathBuf>,
    /// Control group the object is placed in
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "controlGroup")]
    pub control_group: Option<String>,
}

impl ModelEntry {
    pub fn new(role: Role, model_path: impl Into<PathBuf>) -> Self {
        Self {
            role,
            model_path: model_path.into(),
            orientation: default_orientation(),
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

    pub fn with_texture(mut self, texture: impl Into<PathBuf>) -> Self {
        self.texture = Some(texture.into());
        self
    }

    pub fn in_group(mut self, name: impl Into<String>) -> Self {
        self.control_group = Some(name.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees
    #[serde(rename = "fov")]
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub position: [f32; 3],
    pub target: [f32; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 75.0,
            near: 0.01,
            far: 2000.0,
            position: [0.0, 9.0, 1500.0],
            target: [0.0, 0.0, 0.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitControlsConfig {
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub enable_zoom: bool,
    pub enable_pan: bool,
    pub enable_rotate: bool,
    pub rotate_speed: f32,
    /// Closest the camera may get to its target
    pub min_distance: f32,
}

impl Default for OrbitControlsConfig {
    fn default() -> Self {
        Self {
            enable_damping: true,
            damping_factor: 0.05,
            enable_zoom: true,
            enable_pan: true,
            enable_rotate: true,
            rotate_speed: 1.0,
            min_distance: 0.1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmbientLightConfig {
    pub color: Color,
    pub intensity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DirectionalLightConfig {
    pub color: Color,
    pub intensity: f32,
    pub position: [f32; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingConfig {
    pub ambient: Option<AmbientLightConfig>,
    pub directional: Option<DirectionalLightConfig>,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            ambient: Some(AmbientLightConfig {
                color: Color(0x404040),
                intensity: 0.6,
            }),
            directional: Some(DirectionalLightConfig {
                color: Color::WHITE,
                intensity: 0.8,
                position: [1.0, 1.0, 1.0],
            }),
        }
    }
}

impl LightingConfig {
    pub fn lights(&self) -> Vec<Light> {
        let ambient = self.ambient.map(|a| Light::Ambient {
            color: a.color,
            intensity: a.intensity,
        });
        let directional = self.directional.map(|d| Light::Directional {
            color: d.color,
            intensity: d.intensity,
            position: d.position,
        });
        ambient.into_iter().chain(directional).collect()
    }
}

/// A named, independently orbitable group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlGroupConfig {
    pub name: String,
    #[serde(default)]
    pub anchor: [f32; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewerConfig {
    pub models: Vec<ModelEntry>,
    pub width: u32,
    pub height: u32,
    #[serde(default = "default_background", alias = "backgroundColor")]
    pub background_color: Color,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub controls: OrbitControlsConfig,
    #[serde(default)]
    pub lighting: LightingConfig,
    #[serde(default = "default_axes_helper")]
    pub axes_helper: Option<f32>,
    #[serde(default)]
    pub control_groups: Vec<ControlGroupConfig>,
}

fn default_orientation() -> String {
    DEFAULT_ORIENTATION.to_string()
}

fn default_background() -> Color {
    DEFAULT_BACKGROUND
}

fn default_axes_helper() -> Option<f32> {
    Some(DEFAULT_AXES_HELPER_SIZE)
}

impl ViewerConfig {
    pub fn new(models: Vec<ModelEntry>, width: u32, height: u32) -> Self {
        Self {
            models,
            width,
            height,
            background_color: DEFAULT_BACKGROUND,
            camera: CameraConfig::default(),
            controls: OrbitControlsConfig::default(),
            lighting: LightingConfig::default(),
            axes_helper: default_axes_helper(),
            control_groups: Vec::new(),
        }
    }

    /// A single model viewer
    pub fn single(
        model_path: impl Into<PathBuf>,
        orientation: impl Into<String>,
        width: u32,
        height: u32,
    ) -> Self {
        let entry = ModelEntry::new(Role::Model, model_path).with_orientation(orientation);
        Self::new(vec![entry], width, height)
    }

    /// A fixed room with a subject that orbits in its own control group
    pub fn room_and_subject(
        room: ModelEntry,
        subject: ModelEntry,
        width: u32,
        height: u32,
    ) -> Self {
        let room = ModelEntry {
            role: Role::Room,
            ..room
        };
        let subject = ModelEntry {
            role: Role::Subject,
            control_group: Some(SUBJECT_GROUP.to_string()),
            ..subject
        };

        let mut config = Self::new(vec![room, subject], width, height);
        config.control_groups.push(ControlGroupConfig {
            name: SUBJECT_GROUP.to_string(),
            anchor: [0.0, 0.0, 0.0],
        });
        config
    }

    pub fn with_background(mut self, color: Color) -> Self {
        self.background_color = color;
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| Error::Config(format!("Invalid viewer configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize configuration: {}", e)))
    }

    /// Check the settings a surface cannot be mounted without
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::Config(format!(
                "Surface size must be positive, got {}x{}",
                self.width, self.height
            )));
        }

        let camera = &self.camera;
        if !(camera.near > 0.0 && camera.far > camera.near) {
            return Err(Error::Config(format!(
                "Camera clip planes must satisfy 0 < near < far, got near={} far={}",
                camera.near, camera.far
            )));
        }
        if !(camera.fov_degrees > 0.0 && camera.fov_degrees < 180.0) {
            return Err(Error::Config(format!(
                "Camera field of view must be in (0, 180) degrees, got {}",
                camera.fov_degrees
            )));
        }

        if !(0.0..=1.0).contains(&self.controls.damping_factor) {
            return Err(Error::Config(format!(
                "Damping factor must be in [0, 1], got {}",
                self.controls.damping_factor
            )));
        }

        let mut names = HashSet::new();
        for group in &self.control_groups {
            if !names.insert(group.name.as_str()) {
                return Err(Error::Config(format!(
                    "Duplicate control group name: {:?}",
                    group.name
                )));
            }
        }

        for entry in &self.models {
            if entry.model_path.as_os_str().is_empty() {
                return Err(Error::Config(format!(
                    "Model path for {} must not be empty",
                    entry.role
                )));
            }
        }

        Ok(())
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_minimal_json() {
        let config = ViewerConfig::from_json_str(
            r#"{"models": [{"model_path": "models/chair.ply"}], "width": 800, "height": 600}"#,
        )
        .unwrap();

        assert_eq!(config.background_color, DEFAULT_BACKGROUND);
        assert_eq!(config.axes_helper, Some(30.0));
        assert_eq!(config.camera, CameraConfig::default());
        assert_eq!(config.controls, OrbitControlsConfig::default());
        assert_eq!(config.lighting.lights().len(), 2);

        let entry = &config.models[0];
        assert_eq!(entry.role, Role::Model);
        assert_eq!(entry.orientation, "z");
        assert_eq!(entry.scale, ScaleSpec::Uniform(1.0));
        assert!(entry.texture.is_none());
    }

    #[test]
    fn test_full_json() {
        let config = ViewerConfig::from_json_str(
            r#"{
                "models": [
                    {"role": "room", "modelPath": "LivingRoom.ply", "orientation": "x,y,z", "scale": 5},
                    {"role": "subject", "model_path": "chair.ply", "orientation": "",
                     "scale": {"x": 2}, "control_group": "subject"}
                ],
                "width": 1024,
                "height": 768,
                "backgroundColor": 16777215,
                "camera": {"fov": 60},
                "axes_helper": null,
                "control_groups": [{"name": "subject", "anchor": [0, 1, 0]}]
            }"#,
        )
        .unwrap();

        assert_eq!(config.models[0].role, Role::Room);
        assert_eq!(config.models[0].scale, ScaleSpec::Uniform(5.0));
        assert_eq!(
            config.models[1].scale,
            ScaleSpec::per_axis(Some(2.0), None, None)
        );
        assert_eq!(config.background_color, Color::WHITE);
        assert_eq!(config.camera.fov_degrees, 60.0);
        assert_eq!(config.camera.far, 2000.0);
        assert_eq!(config.axes_helper, None);
        assert_eq!(config.control_groups[0].anchor, [0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_null_scale_is_kept_as_invalid() {
        let config = ViewerConfig::from_json_str(
            r#"{"models": [{"model_path": "a.ply", "scale": null}], "width": 1, "height": 1}"#,
        )
        .unwrap();
        assert_eq!(config.models[0].scale, ScaleSpec::Invalid);
    }

    #[test]
    fn test_validation_failures() {
        let zero = ViewerConfig::single("a.ply", "z", 0, 600);
        assert!(matches!(zero.validate(), Err(Error::Config(_))));

        let mut clip = ViewerConfig::single("a.ply", "z", 800, 600);
        clip.camera.near = 10.0;
        clip.camera.far = 5.0;
        assert!(clip.validate().is_err());

        let mut groups = ViewerConfig::single("a.ply", "z", 800, 600);
        for _ in 0..2 {
            groups.control_groups.push(ControlGroupConfig {
                name: "subject".to_string(),
                anchor: [0.0; 3],
            });
        }
        assert!(groups.validate().is_err());

        assert!(ViewerConfig::single("", "z", 800, 600).validate().is_err());
        assert!(ViewerConfig::from_json_str("{\"models\": []}").is_err());
    }

    #[test]
    fn test_room_and_subject() {
        let config = ViewerConfig::room_and_subject(
            ModelEntry::new(Role::Model, "LivingRoom.ply").with_orientation("x,y,z"),
            ModelEntry::new(Role::Model, "chair.ply").with_orientation(""),
            800,
            600,
        );

        assert!(config.validate().is_ok());
        assert_eq!(config.models[0].role, Role::Room);
        assert_eq!(config.models[0].control_group, None);
        assert_eq!(config.models[1].role, Role::Subject);
        assert_eq!(config.models[1].control_group.as_deref(), Some(SUBJECT_GROUP));
        assert_eq!(config.control_groups.len(), 1);
        assert_eq!(config.background_color, DEFAULT_BACKGROUND);
    }

    #[test]
    fn test_json_file_round_trip() {
        let path = std::env::temp_dir().join("plyscene_viewer_config.json");
        let config = ViewerConfig::single("models/scan.ply", "-y", 640, 480)
            .with_background(Color(0x202020));
        std::fs::write(&path, config.to_json_string().unwrap()).unwrap();

        let loaded = ViewerConfig::from_json_file(&path).unwrap();
        assert_eq!(loaded, config);

        let _ = std::fs::remove_file(&path);
    }
}

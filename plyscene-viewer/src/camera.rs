//! Camera utilities for 3D visualization

use crate::config::{CameraConfig, OrbitControlsConfig};
use nalgebra::{Matrix4, Perspective3, Point3, Vector3};
use std::f32::consts::PI;

/// Keeps the orbit away from the poles, where the up vector degenerates
const POLAR_EPSILON: f32 = 1e-3;

/// Deltas smaller than this are treated as settled
const SETTLE_EPSILON: f32 = 1e-6;

/// A perspective camera looking at a target
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    /// Vertical field of view in radians
    pub fov: f32,
    pub aspect_ratio: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    /// Create a new camera
    pub fn new(
        position: Point3<f32>,
        target: Point3<f32>,
        up: Vector3<f32>,
        fov: f32,
        aspect_ratio: f32,
        near: f32,
        far: f32,
    ) -> Self {
        Self {
            position,
            target,
            up,
            fov,
            aspect_ratio,
            near,
            far,
        }
    }

    /// Build the camera described by `config` for a surface of the given size
    pub fn from_config(config: &CameraConfig, width: u32, height: u32) -> Self {
        let [px, py, pz] = config.position;
        let [tx, ty, tz] = config.target;
        Self::new(
            Point3::new(px, py, pz),
            Point3::new(tx, ty, tz),
            Vector3::y(),
            config.fov_degrees.to_radians(),
            aspect_ratio(width, height),
            config.near,
            config.far,
        )
    }

    /// Get the view matrix
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.position, &self.target, &self.up)
    }

    /// Get the projection matrix
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        let perspective = Perspective3::new(self.aspect_ratio, self.fov, self.near, self.far);
        perspective.into_inner()
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.aspect_ratio = aspect_ratio(width, height);
    }

    pub fn distance_to_target(&self) -> f32 {
        (self.position - self.target).norm()
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::from_config(&CameraConfig::default(), 16, 9)
    }
}

fn aspect_ratio(width: u32, height: u32) -> f32 {
    if height == 0 {
        1.0
    } else {
        width as f32 / height as f32
    }
}

/// Orbit, dolly and pan input around a target point.
///
/// Input is accumulated and folded into the camera by [`update`](Self::update),
/// once per frame. With damping enabled only a `damping_factor` share of the
/// pending rotation and pan is applied per frame, so motion eases out.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitControls {
    pub target: Point3<f32>,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub enable_zoom: bool,
    pub enable_pan: bool,
    pub enable_rotate: bool,
    pub rotate_speed: f32,
    pub min_distance: f32,
    pending_azimuth: f32,
    pending_polar: f32,
    pending_scale: f32,
    pending_pan: Vector3<f32>,
}

impl OrbitControls {
    pub fn new(config: &OrbitControlsConfig, target: Point3<f32>) -> Self {
        Self {
            target,
            enable_damping: config.enable_damping,
            damping_factor: config.damping_factor.clamp(0.0, 1.0),
            enable_zoom: config.enable_zoom,
            enable_pan: config.enable_pan,
            enable_rotate: config.enable_rotate,
            rotate_speed: config.rotate_speed,
            min_distance: config.min_distance,
            pending_azimuth: 0.0,
            pending_polar: 0.0,
            pending_scale: 1.0,
            pending_pan: Vector3::zeros(),
        }
    }

    /// Queue a rotation around the target (radians)
    pub fn rotate(&mut self, azimuth: f32, polar: f32) {
        if self.enable_rotate {
            self.pending_azimuth += azimuth * self.rotate_speed;
            self.pending_polar += polar * self.rotate_speed;
        }
    }

    /// Queue a change of distance; factors below 1 move closer
    pub fn dolly(&mut self, factor: f32) {
        if self.enable_zoom && factor.is_finite() && factor > 0.0 {
            self.pending_scale *= factor;
        }
    }

    /// Queue a translation of both camera and target
    pub fn pan(&mut self, offset: Vector3<f32>) {
        if self.enable_pan {
            self.pending_pan += offset;
        }
    }

    /// Move the orbit centre, dropping any queued pan
    pub fn set_target(&mut self, target: Point3<f32>) {
        self.target = target;
        self.pending_pan = Vector3::zeros();
    }

    pub fn is_settled(&self) -> bool {
        self.pending_azimuth.abs() < SETTLE_EPSILON
            && self.pending_polar.abs() < SETTLE_EPSILON
            && (self.pending_scale - 1.0).abs() < SETTLE_EPSILON
            && self.pending_pan.norm() < SETTLE_EPSILON
    }

    /// Fold queued input into `camera`. Returns true if the camera moved.
    pub fn update(&mut self, camera: &mut Camera) -> bool {
        let before = (camera.position, camera.target);

        let share = if self.enable_damping {
            self.damping_factor
        } else {
            1.0
        };

        self.target += self.pending_pan * share;

        let offset = camera.position - camera.target;
        let radius = offset.norm().max(self.min_distance);
        let mut azimuth = offset.x.atan2(offset.z);
        let mut polar = (offset.y / radius).clamp(-1.0, 1.0).acos();

        azimuth += self.pending_azimuth * share;
        polar = (polar + self.pending_polar * share).clamp(POLAR_EPSILON, PI - POLAR_EPSILON);
        let radius = (radius * self.pending_scale).max(self.min_distance);

        let new_offset = Vector3::new(
            radius * polar.sin() * azimuth.sin(),
            radius * polar.cos(),
            radius * polar.sin() * azimuth.cos(),
        );

        camera.target = self.target;
        camera.position = self.target + new_offset;

        if self.enable_damping {
            self.pending_azimuth *= 1.0 - self.damping_factor;
            self.pending_polar *= 1.0 - self.damping_factor;
            self.pending_pan *= 1.0 - self.damping_factor;
        } else {
            self.pending_azimuth = 0.0;
            self.pending_polar = 0.0;
            self.pending_pan = Vector3::zeros();
        }
        self.pending_scale = 1.0;

        (camera.position - before.0).norm() > SETTLE_EPSILON
            || (camera.target - before.1).norm() > SETTLE_EPSILON
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    fn camera_at(position: Point3<f32>) -> Camera {
        Camera::new(
            position,
            Point3::origin(),
            Vector3::y(),
            75f32.to_radians(),
            1.0,
            0.01,
            2000.0,
        )
    }

    fn undamped() -> OrbitControls {
        let config = OrbitControlsConfig {
            enable_damping: false,
            ..OrbitControlsConfig::default()
        };
        OrbitControls::new(&config, Point3::origin())
    }

    #[test]
    fn test_camera_from_config() {
        let camera = Camera::from_config(&CameraConfig::default(), 800, 600);
        assert_eq!(camera.position, Point3::new(0.0, 9.0, 1500.0));
        assert_eq!(camera.target, Point3::origin());
        assert_relative_eq!(camera.fov, 75f32.to_radians());
        assert_relative_eq!(camera.aspect_ratio, 800.0 / 600.0);
        assert_eq!((camera.near, camera.far), (0.01, 2000.0));
    }

    #[test]
    fn test_view_matrix_maps_target_in_front() {
        let camera = camera_at(Point3::new(0.0, 0.0, 10.0));
        let target = camera.view_matrix().transform_point(&Point3::origin());
        assert_relative_eq!(target, Point3::new(0.0, 0.0, -10.0), epsilon = 1e-5);
    }

    #[test]
    fn test_orbit_quarter_turn() {
        let mut camera = camera_at(Point3::new(0.0, 0.0, 10.0));
        let mut controls = undamped();

        controls.rotate(FRAC_PI_2, 0.0);
        assert!(controls.update(&mut camera));
        assert_relative_eq!(camera.position, Point3::new(10.0, 0.0, 0.0), epsilon = 1e-4);
        assert!(controls.is_settled());
        assert!(!controls.update(&mut camera));
    }

    #[test]
    fn test_damping_eases_towards_full_rotation() {
        let mut camera = camera_at(Point3::new(0.0, 0.0, 10.0));
        let mut controls = OrbitControls::new(&OrbitControlsConfig::default(), Point3::origin());

        controls.rotate(FRAC_PI_2, 0.0);
        controls.update(&mut camera);
        let first_step = camera.position.x.atan2(camera.position.z);
        assert_relative_eq!(first_step, FRAC_PI_2 * 0.05, epsilon = 1e-4);

        for _ in 0..500 {
            controls.update(&mut camera);
        }
        assert_relative_eq!(camera.position, Point3::new(10.0, 0.0, 0.0), epsilon = 1e-3);
    }

    #[test]
    fn test_polar_angle_is_clamped() {
        let mut camera = camera_at(Point3::new(0.0, 0.0, 10.0));
        let mut controls = undamped();

        controls.rotate(0.0, -10.0);
        controls.update(&mut camera);
        assert!(camera.position.y < 10.0);
        assert!(camera.position.y > 9.99);
        assert_relative_eq!(camera.distance_to_target(), 10.0, epsilon = 1e-4);
    }

    #[test]
    fn test_dolly_and_disabled_inputs() {
        let mut camera = camera_at(Point3::new(0.0, 0.0, 10.0));
        let mut controls = undamped();

        controls.dolly(0.5);
        controls.update(&mut camera);
        assert_relative_eq!(camera.distance_to_target(), 5.0, epsilon = 1e-4);

        controls.enable_zoom = false;
        controls.dolly(0.1);
        controls.enable_rotate = false;
        controls.rotate(1.0, 1.0);
        assert!(controls.is_settled());
    }

    #[test]
    fn test_retarget_moves_orbit_centre() {
        let mut camera = camera_at(Point3::new(0.0, 0.0, 10.0));
        let mut controls = undamped();

        controls.set_target(Point3::new(5.0, 0.0, 0.0));
        controls.update(&mut camera);
        assert_eq!(camera.target, Point3::new(5.0, 0.0, 0.0));
        assert_relative_eq!(camera.distance_to_target(), 10.0, epsilon = 1e-4);
    }
}

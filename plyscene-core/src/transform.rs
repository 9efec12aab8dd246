//! Object transforms: position, rotation and scale

use nalgebra::{Matrix4, Point3, Translation3, Unit, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// One of the three local axes of an object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn unit(self) -> Unit<Vector3<f32>> {
        match self {
            Axis::X => Vector3::x_axis(),
            Axis::Y => Vector3::y_axis(),
            Axis::Z => Vector3::z_axis(),
        }
    }
}

/// The local transform of a scene object.
///
/// The composed matrix is `translation * rotation * scale`, so scale acts in
/// the object's own frame and rotation never alters it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObjectTransform {
    pub position: Point3<f32>,
    pub rotation: UnitQuaternion<f32>,
    pub scale: Vector3<f32>,
}

impl ObjectTransform {
    /// Create an identity transform
    pub fn identity() -> Self {
        Self {
            position: Point3::origin(),
            rotation: UnitQuaternion::identity(),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }

    /// Create an identity transform placed at `position`
    pub fn at(position: Point3<f32>) -> Self {
        Self {
            position,
            ..Self::identity()
        }
    }

    /// Drop any accumulated rotation
    pub fn reset_rotation(&mut self) {
        self.rotation = UnitQuaternion::identity();
    }

    /// Rotate about one of the object's local axes.
    ///
    /// The rotation is post-multiplied, so it composes with the current
    /// orientation rather than with the world frame.
    pub fn rotate_local(&mut self, axis: Axis, angle: f32) {
        let step = UnitQuaternion::from_axis_angle(&axis.unit(), angle);
        self.rotation *= step;
    }

    pub fn set_scale(&mut self, scale: Vector3<f32>) {
        self.scale = scale;
    }

    pub fn set_uniform_scale(&mut self, scale: f32) {
        self.scale = Vector3::new(scale, scale, scale);
    }

    /// Get the composed homogeneous matrix
    pub fn matrix(&self) -> Matrix4<f32> {
        Translation3::from(self.position.coords).to_homogeneous()
            * self.rotation.to_homogeneous()
            * Matrix4::new_nonuniform_scaling(&self.scale)
    }

    /// Apply the transformation to a point
    pub fn transform_point(&self, point: &Point3<f32>) -> Point3<f32> {
        let scaled = Point3::from(point.coords.component_mul(&self.scale));
        self.rotation * scaled + self.position.coords
    }

    /// Rotation as XYZ Euler angles (roll, pitch, yaw), for diagnostics
    pub fn euler_angles(&self) -> (f32, f32, f32) {
        self.rotation.euler_angles()
    }

    /// Check if this is approximately the identity transformation
    pub fn is_identity(&self, epsilon: f32) -> bool {
        (self.matrix() - Matrix4::identity()).norm() < epsilon
    }
}

impl Default for ObjectTransform {
    fn default() -> Self {
        Self::identity()
    }
}

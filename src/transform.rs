use nalgebra::{Matrix3, Matrix4, Rotation3, Vector3};

use std::ops;

/// Mechanical tilt between the lidar mount and its logical frame, in degrees.
pub const LIDAR_TILT_DEG: f32 = 0.6;

/// A pure rotation of lidar points.
#[derive(Clone, Debug)]
pub struct Rotation(Rotation3<f32>);

impl Rotation {
    pub fn identity() -> Self {
        Self(Rotation3::identity())
    }

    /// Rotation about the lateral (y) axis:
    /// `[[cos a, 0, sin a], [0, 1, 0], [-sin a, 0, cos a]]`.
    pub fn about_lateral(angle: f32) -> Self {
        Self(Rotation3::from_axis_angle(&Vector3::y_axis(), angle))
    }

    /// The fixed tilt correction applied to reconstructed lidar points.
    pub fn lidar_tilt() -> Self {
        Self::about_lateral(LIDAR_TILT_DEG.to_radians())
    }
}

impl ops::Mul<&Vector3<f32>> for &Rotation {
    type Output = Vector3<f32>;

    fn mul(self, rhs: &Vector3<f32>) -> Self::Output {
        self.0 * rhs
    }
}

/// Affine 4x4 transform. Calibration rotations are taken as given, so this does not assume
/// orthonormality the way an isometry would.
#[derive(Clone, Debug, PartialEq)]
pub struct Transform(Matrix4<f32>);

impl Transform {
    /// Places `rotation` in the upper-left block and `translation` in the last column.
    pub fn from_parts(rotation: &Matrix3<f32>, translation: &Vector3<f32>) -> Self {
        let mut matrix = Matrix4::identity();
        matrix.fixed_slice_mut::<3, 3>(0, 0).copy_from(rotation);
        matrix.fixed_slice_mut::<3, 1>(0, 3).copy_from(translation);
        Self(matrix)
    }
}

impl ops::Mul<&Transform> for &Transform {
    type Output = Transform;

    fn mul(self, rhs: &Transform) -> Self::Output {
        Transform(self.0 * rhs.0)
    }
}

impl From<Transform> for Matrix4<f32> {
    fn from(transform: Transform) -> Self {
        transform.0
    }
}

/// Axis convention change from the lidar frame (x forward, y left, z up) to the camera optical
/// frame (x right, y down, z forward): `right = -y`, `down = -z`, `forward = x`.
#[derive(Clone, Copy, Debug, Default)]
pub struct SensorToCamera;

impl SensorToCamera {
    /// The permutation as a transform, mapping `(x, y, z)` to `(-y, -z, x)`.
    pub fn transform(&self) -> Transform {
        #[rustfmt::skip]
        let rotation = Matrix3::new(
            0.0, -1.0,  0.0,
            0.0,  0.0, -1.0,
            1.0,  0.0,  0.0,
        );
        Transform::from_parts(&rotation, &Vector3::zeros())
    }
}

use nalgebra::{Matrix3, Matrix3x4, Vector3};
use serde_derive::Deserialize;

use crate::{error::Error, transform::Transform};

/// Calibration arrays as they are written in the configuration: flat, row-major.
#[derive(Clone, Debug, Deserialize)]
pub struct MatrixFile {
    /// Lidar to camera translation (3 values).
    pub tlc: Vec<f64>,
    /// Lidar to camera rotation (9 values).
    pub rlc: Vec<f64>,
    /// Camera projection matrix (12 values).
    pub camera_matrix: Vec<f64>,
}

/// Lidar-camera extrinsics and the camera projection matrix. Loaded once, read-only afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct Calibration {
    pub translation: Vector3<f32>,
    pub rotation: Matrix3<f32>,
    pub projection: Matrix3x4<f32>,
}

fn finite_f32(name: &str, values: &[f64], expected: usize) -> Result<Vec<f32>, Error> {
    if values.len() != expected {
        return Err(Error::calibration(format!(
            "{name} needs {expected} values, got {}",
            values.len()
        )));
    }

    values
        .iter()
        .map(|v| {
            if v.is_finite() {
                Ok(*v as f32)
            } else {
                Err(Error::calibration(format!("{name} has a non-finite value")))
            }
        })
        .collect()
}

impl Calibration {
    pub fn new(
        translation: Vector3<f32>,
        rotation: Matrix3<f32>,
        projection: Matrix3x4<f32>,
    ) -> Self {
        Self {
            translation,
            rotation,
            projection,
        }
    }

    /// Pinhole calibration with identity extrinsics.
    pub fn pinhole(fx: f32, fy: f32, cx: f32, cy: f32) -> Self {
        #[rustfmt::skip]
        let projection = Matrix3x4::new(
            fx,  0.0, cx,  0.0,
            0.0, fy,  cy,  0.0,
            0.0, 0.0, 1.0, 0.0,
        );
        Self::new(Vector3::zeros(), Matrix3::identity(), projection)
    }

    /// Builds the calibration from the flat arrays, checking their lengths.
    pub fn from_matrix_file(file: &MatrixFile) -> Result<Self, Error> {
        let tlc = finite_f32("tlc", &file.tlc, 3)?;
        let rlc = finite_f32("rlc", &file.rlc, 9)?;
        let camera_matrix = finite_f32("camera_matrix", &file.camera_matrix, 12)?;

        Ok(Self {
            translation: Vector3::from_row_slice(&tlc),
            rotation: Matrix3::from_row_slice(&rlc),
            projection: Matrix3x4::from_row_slice(&camera_matrix),
        })
    }

    /// Sensor (in camera axes) to camera 4x4 transform.
    pub fn extrinsic(&self) -> Transform {
        Transform::from_parts(&self.rotation, &self.translation)
    }
}

use nalgebra::Vector3;
use ndarray::prelude::*;
use ndarray::{Array1, Array2};

/// Unordered lidar points in the sensor frame.
#[derive(Clone, Debug, Default)]
pub struct PointCloud {
    /// Shape is (Nx3).
    pub points: Array2<f32>,
    /// Reflectance per point, shape (N).
    pub intensities: Option<Array1<f32>>,
    /// RGB colors, shape (Nx3).
    pub colors: Option<Array2<u8>>,
}

impl PointCloud {
    pub fn from_points(points: Array2<f32>) -> Self {
        Self {
            points,
            intensities: None,
            colors: None,
        }
    }

    /// Builds a cloud from `(x, y, z, intensity)` tuples.
    pub fn from_xyzi(xyzi: &[[f32; 4]]) -> Self {
        Self {
            points: Array2::from_shape_fn((xyzi.len(), 3), |(i, c)| xyzi[i][c]),
            intensities: Some(xyzi.iter().map(|p| p[3]).collect()),
            colors: None,
        }
    }

    pub fn zeros(len: usize) -> Self {
        Self {
            points: Array2::<f32>::zeros((len, 3)),
            intensities: None,
            colors: None,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len_of(Axis(0))
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn point(&self, index: usize) -> Vector3<f32> {
        Vector3::new(
            self.points[(index, 0)],
            self.points[(index, 1)],
            self.points[(index, 2)],
        )
    }

    pub fn iter_points(&self) -> impl Iterator<Item = Vector3<f32>> + '_ {
        self.points
            .axis_iter(Axis(0))
            .map(|p| Vector3::new(p[0], p[1], p[2]))
    }

    /// Keeps the points whose index is in `indices`, carrying their attributes along.
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            points: self.points.select(Axis(0), indices),
            intensities: self
                .intensities
                .as_ref()
                .map(|intensities| intensities.select(Axis(0), indices)),
            colors: self
                .colors
                .as_ref()
                .map(|colors| colors.select(Axis(0), indices)),
        }
    }
}

/// The colorized output cloud: one logical row, no invalid points.
#[derive(Clone, Debug)]
pub struct ColorPointCloud {
    pub frame_id: String,
    pub points: Array2<f32>,
    pub colors: Array2<u8>,
}

impl ColorPointCloud {
    pub fn new(frame_id: &str, points: Array2<f32>, colors: Array2<u8>) -> Self {
        Self {
            frame_id: frame_id.to_string(),
            points,
            colors,
        }
    }

    pub fn empty(frame_id: &str) -> Self {
        Self::new(frame_id, Array2::zeros((0, 3)), Array2::zeros((0, 3)))
    }

    pub fn len(&self) -> usize {
        self.points.len_of(Axis(0))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every stored point is valid.
    pub fn is_dense(&self) -> bool {
        true
    }

    pub fn width(&self) -> usize {
        self.len()
    }

    pub fn height(&self) -> usize {
        1
    }

    pub fn rgb(&self, index: usize) -> [u8; 3] {
        [
            self.colors[(index, 0)],
            self.colors[(index, 1)],
            self.colors[(index, 2)],
        ]
    }
}

use std::f32::consts::{FRAC_PI_2, PI};

use nalgebra::Vector3;
use ndarray::{Array2, ArrayView2};
use rayon::prelude::*;

use crate::params::Parameters;
use crate::pointcloud::PointCloud;
use crate::transform::Rotation;

/// Converts dense range image cells back into 3D points in the lidar frame.
#[derive(Debug, Clone)]
pub struct Reconstructor {
    /// Field of view bounds, radians, measured so that `π/2` is straight ahead.
    pub min_fov: f32,
    pub max_fov: f32,
    /// Trailing dense rows that are never reconstructed.
    pub skip_last_rows: usize,
    pub tilt: Rotation,
}

impl Reconstructor {
    pub fn new(min_fov: f32, max_fov: f32, skip_last_rows: usize) -> Self {
        Self {
            min_fov,
            max_fov,
            skip_last_rows,
            tilt: Rotation::lidar_tilt(),
        }
    }

    pub fn from_params(params: &Parameters) -> Self {
        Self::new(params.min_fov, params.max_fov, params.interpol_value)
    }

    pub fn with_tilt(mut self, tilt: Rotation) -> Self {
        self.tilt = tilt;
        self
    }

    /// Azimuth of column `col` out of `cols`: `π - 2π·col / cols`.
    pub fn column_angle(col: usize, cols: usize) -> f32 {
        PI - (2.0 * PI * col as f32) / cols as f32
    }

    pub fn in_fov(&self, angle: f32) -> bool {
        !(angle < self.min_fov - FRAC_PI_2 || angle > self.max_fov - FRAC_PI_2)
    }

    /// Point of one cell, None when the cell is empty or its geometry is undefined
    /// (`range² < height²`).
    pub fn cell_point(&self, range: f32, height: f32, angle: f32) -> Option<Vector3<f32>> {
        if range == 0.0 {
            return None;
        }
        let planar = (range * range - height * height).sqrt();
        if !planar.is_finite() {
            return None;
        }
        let point = &self.tilt * &Vector3::new(planar * angle.cos(), planar * angle.sin(), height);
        if point.iter().all(|v| v.is_finite()) {
            Some(point)
        } else {
            None
        }
    }

    /// Row-major reconstruction of every in-view, non-empty cell.
    pub fn reconstruct(&self, range: ArrayView2<f32>, height: ArrayView2<f32>) -> PointCloud {
        debug_assert_eq!(range.dim(), height.dim());
        let (rows, cols) = range.dim();
        let rows = rows.saturating_sub(self.skip_last_rows);

        let visible: Vec<(usize, f32)> = (0..cols)
            .map(|col| (col, Self::column_angle(col, cols)))
            .filter(|(_, angle)| self.in_fov(*angle))
            .collect();

        let points: Vec<Vector3<f32>> = (0..rows)
            .into_par_iter()
            .flat_map_iter(|row| {
                visible.iter().filter_map(move |(col, angle)| {
                    self.cell_point(range[(row, *col)], height[(row, *col)], *angle)
                })
            })
            .collect();

        PointCloud::from_points(Array2::from_shape_fn((points.len(), 3), |(i, c)| {
            points[i][c]
        }))
    }
}

use std::f64::consts::{FRAC_PI_2, PI};

use ndarray::{Array2, Axis};

use crate::memory::{Array2Recycle, FrameBuffers};
use crate::params::Parameters;
use crate::pointcloud::PointCloud;

/// Range and height of the nearest point per angular cell. Rows are elevation bins (top row looks
/// up), columns are azimuth bins. `0` means no data.
#[derive(Debug, Clone)]
pub struct RangeGrid {
    pub range: Array2<f32>,
    pub height: Array2<f32>,
}

impl RangeGrid {
    pub fn rows(&self) -> usize {
        self.range.nrows()
    }

    pub fn cols(&self) -> usize {
        self.range.ncols()
    }

    /// Number of cells holding a measurement.
    pub fn occupied(&self) -> usize {
        self.range.iter().filter(|r| **r != 0.0).count()
    }

    /// Gives the allocations back to the frame buffers.
    pub fn recycle(self, buffers: &mut FrameBuffers) {
        buffers.range = Array2Recycle::Recycle(self.range);
        buffers.height = Array2Recycle::Recycle(self.height);
    }
}

/// Spherical projection of a lidar cloud, sensor at the origin, laser frame.
///
/// A point `(x, y, z)` has azimuth `atan2(-y, x)` and elevation `asin(-z / range)`, binned as
/// `col = round((azimuth + π) / res_x)` and `row = round((elevation + π/2) / res_y)`.
#[derive(Debug, Clone)]
pub struct SphericalProjection {
    /// Azimuth resolution, radians.
    pub resolution_x: f64,
    /// Elevation resolution, radians.
    pub resolution_y: f64,
    pub rows: usize,
    pub cols: usize,
    pub minlen: f32,
    pub maxlen: f32,
}

impl SphericalProjection {
    /// Grid geometry from resolutions and extents in degrees.
    pub fn new(
        resolution_x_deg: f32,
        resolution_y_deg: f32,
        max_angle_width_deg: f32,
        max_angle_height_deg: f32,
    ) -> Self {
        // Resolutions such as 0.2 are not exact in f32, so a quotient within a relative 1e-4
        // of an integer counts as that integer. Otherwise the last partial cell is dropped.
        let cells = |extent: f32, res: f32| {
            let quotient = extent as f64 / res as f64;
            let nearest = quotient.round();
            if (quotient - nearest).abs() <= 1e-4 * nearest {
                nearest as usize
            } else {
                quotient.floor() as usize
            }
        };
        Self {
            resolution_x: (resolution_x_deg as f64).to_radians(),
            resolution_y: (resolution_y_deg as f64).to_radians(),
            rows: cells(max_angle_height_deg, resolution_y_deg),
            cols: cells(max_angle_width_deg, resolution_x_deg),
            minlen: 0.0,
            maxlen: f32::MAX,
        }
    }

    pub fn from_params(params: &Parameters) -> Self {
        Self::new(
            params.angular_resolution_x,
            params.angular_resolution_y,
            params.max_angle_width,
            params.max_angle_height,
        )
        .with_range_bounds(params.minlen, params.maxlen)
    }

    /// Cells whose range falls outside `[minlen, maxlen]` stay empty.
    pub fn with_range_bounds(mut self, minlen: f32, maxlen: f32) -> Self {
        self.minlen = minlen;
        self.maxlen = maxlen;
        self
    }

    /// Returns the `(row, col, range)` of a point, or None when it has no defined cell.
    pub fn cell_of(&self, x: f32, y: f32, z: f32) -> Option<(usize, usize, f32)> {
        let (xd, yd, zd) = (x as f64, y as f64, z as f64);
        let range = (xd * xd + yd * yd + zd * zd).sqrt();
        if !range.is_finite() || range <= 0.0 {
            return None;
        }

        let azimuth = (-yd).atan2(xd);
        let elevation = (-zd / range).asin();

        let col = ((azimuth + PI) / self.resolution_x).round();
        let row = ((elevation + FRAC_PI_2) / self.resolution_y).round();
        if !(col >= 0.0 && row >= 0.0) {
            return None;
        }

        let (row, col) = (row as usize, col as usize);
        if row < self.rows && col < self.cols {
            Some((row, col, range as f32))
        } else {
            None
        }
    }

    /// Fills a [`RangeGrid`] from the cloud. When several points share a cell the nearest one
    /// is kept, and on equal ranges the first one.
    pub fn build(&self, cloud: &PointCloud, buffers: &mut FrameBuffers) -> RangeGrid {
        let dim = (self.rows, self.cols);
        let mut range = buffers.range.take(dim);
        let mut height = buffers.height.take(dim);

        for p in cloud.points.axis_iter(Axis(0)) {
            let (x, y, z) = (p[0], p[1], p[2]);
            if z.is_nan() {
                continue;
            }
            let (row, col, r) = match self.cell_of(x, y, z) {
                Some(cell) => cell,
                None => continue,
            };
            if r < self.minlen || r > self.maxlen {
                continue;
            }

            let current = range[(row, col)];
            if current == 0.0 || r < current {
                range[(row, col)] = r;
                height[(row, col)] = z;
            }
        }

        RangeGrid { range, height }
    }
}

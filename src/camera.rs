use itertools::izip;
use nalgebra::{Matrix3x4, Matrix4, Vector3};
use ndarray::{s, Array2, Array3};
use rayon::prelude::*;

use crate::calibration::Calibration;
use crate::image::draw_filled_circle;
use crate::pointcloud::{ColorPointCloud, PointCloud};
use crate::transform::SensorToCamera;

/// Pixel hit by a lidar point together with the color the marker is drawn with.
#[derive(Clone, Debug, PartialEq)]
pub struct Projection {
    /// Index of the source point.
    pub index: usize,
    pub col: usize,
    pub row: usize,
    pub marker: [u8; 3],
}

/// Marker color of a point `x` meters ahead: red fades to blue with distance up to
/// `maxlen`, green ramps up over the first 10 meters.
pub fn depth_marker_color(x: f32, maxlen: f32) -> [u8; 3] {
    let dx = (255.0 * x / maxlen).trunc();
    let dz = (255.0 * x / 10.0).trunc().min(255.0);
    let clamp = |v: f32| num::clamp(v, 0.0, 255.0) as u8;
    [clamp(255.0 - dx), clamp(dz), clamp(dx)]
}

/// Projects lidar points into the camera image and colors them from it.
#[derive(Clone, Debug)]
pub struct CameraProjector {
    /// `P · E · S`, applied to homogeneous lidar points.
    lidar_to_pixel: Matrix3x4<f32>,
    maxlen: f32,
    marker_radius: i64,
    frame_id: String,
}

impl CameraProjector {
    pub fn new(calibration: &Calibration, maxlen: f32) -> Self {
        let lidar_to_camera = &calibration.extrinsic() * &SensorToCamera.transform();
        Self {
            lidar_to_pixel: calibration.projection * Matrix4::from(lidar_to_camera),
            maxlen,
            marker_radius: 1,
            frame_id: "velodyne".to_string(),
        }
    }

    pub fn with_marker_radius(mut self, marker_radius: i64) -> Self {
        self.marker_radius = marker_radius;
        self
    }

    pub fn with_frame_id(mut self, frame_id: &str) -> Self {
        self.frame_id = frame_id.to_string();
        self
    }

    pub fn frame_id(&self) -> &str {
        &self.frame_id
    }

    /// Project a lidar point into image space.
    ///
    /// # Arguments
    ///
    /// * point: The point in the lidar frame.
    ///
    /// # Returns
    ///
    /// * (u and v) sub-pixel coordinates, None when they are not finite
    ///   (e.g. the point lies on the camera plane).
    pub fn project(&self, point: &Vector3<f32>) -> Option<(f32, f32)> {
        let q = self.lidar_to_pixel * point.push(1.0);
        let (u, v) = (q[0] / q[2], q[1] / q[2]);
        if u.is_finite() && v.is_finite() {
            Some((u, v))
        } else {
            None
        }
    }

    /// Pixel `(col, row)` of the point when it falls inside a `width`×`height` image.
    pub fn project_if_visible(
        &self,
        point: &Vector3<f32>,
        width: usize,
        height: usize,
    ) -> Option<(usize, usize)> {
        let (u, v) = self.project(point)?;
        let (col, row) = (u.floor() as i64, v.floor() as i64);

        if col >= 0 && col < width as i64 && row >= 0 && row < height as i64 {
            Some((col as usize, row as usize))
        } else {
            None
        }
    }

    /// Visible projections of every point, in point order.
    pub fn project_cloud(&self, cloud: &PointCloud, width: usize, height: usize) -> Vec<Projection> {
        (0..cloud.len())
            .into_par_iter()
            .filter_map(|index| {
                let point = cloud.point(index);
                self.project_if_visible(&point, width, height)
                    .map(|(col, row)| Projection {
                        index,
                        col,
                        row,
                        marker: depth_marker_color(point[0], self.maxlen),
                    })
            })
            .collect()
    }

    /// Colors the cloud from `image` and draws a depth marker for each visible point.
    ///
    /// # Arguments
    ///
    /// * cloud: Points in the lidar frame.
    /// * image: RGB image of shape (height, width, 3). Colors are always sampled from it,
    ///   never from the annotated copy.
    ///
    /// # Returns
    ///
    /// * The annotated copy of the image and the visible points with their colors.
    pub fn colorize(&self, cloud: &PointCloud, image: &Array3<u8>) -> (Array3<u8>, ColorPointCloud) {
        let (height, width, _) = image.dim();
        let projections = self.project_cloud(cloud, width, height);

        let mut points = Array2::<f32>::zeros((projections.len(), 3));
        let mut colors = Array2::<u8>::zeros((projections.len(), 3));
        let mut annotated = image.clone();

        for (proj, mut point, mut color) in izip!(&projections, points.rows_mut(), colors.rows_mut())
        {
            point.assign(&cloud.points.row(proj.index));
            color.assign(&image.slice(s![proj.row, proj.col, ..]));
            draw_filled_circle(
                &mut annotated,
                proj.col as i64,
                proj.row as i64,
                self.marker_radius,
                proj.marker,
            );
        }

        (
            annotated,
            ColorPointCloud::new(&self.frame_id, points, colors),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{depth_marker_color, CameraProjector};
    use crate::calibration::Calibration;
    use crate::pointcloud::PointCloud;
    use crate::unit_test::{gradient_image, pinhole_calibration};
    use approx::assert_abs_diff_eq;
    use nalgebra::{Matrix3, Vector3};
    use ndarray::Array3;
    use rstest::rstest;

    #[rstest]
    fn should_project_forward_point_to_center(pinhole_calibration: Calibration) {
        let projector = CameraProjector::new(&pinhole_calibration, 100.0);
        let (u, v) = projector.project(&Vector3::new(10.0, 0.0, 0.0)).unwrap();
        assert_abs_diff_eq!(u, 32.0, epsilon = 1e-4);
        assert_abs_diff_eq!(v, 24.0, epsilon = 1e-4);

        // Left of the sensor is left in the image, up is up.
        let (u, v) = projector.project(&Vector3::new(10.0, 1.0, 1.0)).unwrap();
        assert!(u < 32.0);
        assert!(v < 24.0);
    }

    #[rstest]
    fn should_drop_points_outside(pinhole_calibration: Calibration) {
        let projector = CameraProjector::new(&pinhole_calibration, 100.0);
        assert_eq!(
            projector.project_if_visible(&Vector3::new(10.0, 0.0, 0.0), 64, 48),
            Some((32, 24))
        );
        assert!(projector
            .project_if_visible(&Vector3::new(10.0, 50.0, 0.0), 64, 48)
            .is_none());
        // On the camera plane the projection is undefined.
        assert!(projector.project(&Vector3::new(0.0, 0.0, 0.0)).is_none());
    }

    #[test]
    fn should_honor_extrinsic_translation() {
        let mut calib = Calibration::pinhole(40.0, 40.0, 32.0, 24.0);
        calib.translation = Vector3::new(1.0, 0.0, 0.0);
        calib.rotation = Matrix3::identity();
        let projector = CameraProjector::new(&calib, 100.0);
        let (u, _) = projector.project(&Vector3::new(10.0, 0.0, 0.0)).unwrap();
        assert_abs_diff_eq!(u, 32.0 + 40.0 * 0.1, epsilon = 1e-4);
    }

    #[test]
    fn should_compute_marker_colors() {
        assert_eq!(depth_marker_color(0.0, 100.0), [255, 0, 0]);
        assert_eq!(depth_marker_color(5.0, 100.0), [243, 127, 12]);
        assert_eq!(depth_marker_color(50.0, 100.0), [128, 255, 127]);
        assert_eq!(depth_marker_color(200.0, 100.0), [0, 255, 255]);
    }

    #[rstest]
    fn should_sample_input_colors(pinhole_calibration: Calibration, gradient_image: Array3<u8>) {
        let projector = CameraProjector::new(&pinhole_calibration, 100.0);
        // Two points on neighbouring pixels: the second must not pick up the first marker.
        let cloud = PointCloud::from_xyzi(&[
            [10.0, 0.0, 0.0, 0.0],
            [10.0, -0.25, 0.0, 0.0],
            [10.0, 100.0, 0.0, 0.0],
        ]);
        let (annotated, colored) = projector.colorize(&cloud, &gradient_image);

        assert_eq!(colored.len(), 2);
        assert_eq!(colored.frame_id, "velodyne");
        assert_eq!(colored.rgb(0), [32, 24, 30]);
        assert_eq!(colored.rgb(1), [33, 24, 30]);

        let marker = depth_marker_color(10.0, 100.0);
        assert_eq!(annotated[(24, 32, 0)], marker[0]);
        assert_eq!(annotated[(24, 33, 2)], marker[2]);
        assert_eq!(annotated[(0, 0, 0)], gradient_image[(0, 0, 0)]);
        assert_eq!(annotated.dim(), gradient_image.dim());
    }
}

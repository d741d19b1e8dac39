use ndarray::Axis;

use crate::pointcloud::PointCloud;

/// Removes non-finite points and points whose planar distance `sqrt(x² + y²)` is outside
/// `[minlen, maxlen]`. Point order is kept.
pub fn prefilter(cloud: &PointCloud, minlen: f32, maxlen: f32) -> PointCloud {
    let keep: Vec<usize> = cloud
        .points
        .axis_iter(Axis(0))
        .enumerate()
        .filter(|(_, p)| {
            if !p.iter().all(|v| v.is_finite()) {
                return false;
            }
            let distance = p[0].hypot(p[1]);
            distance >= minlen && distance <= maxlen
        })
        .map(|(i, _)| i)
        .collect();

    cloud.select(&keep)
}

#[cfg(test)]
mod tests {
    use super::prefilter;
    use crate::pointcloud::PointCloud;
    use crate::unit_test::scattered_cloud;
    use rstest::rstest;

    #[test]
    fn should_drop_invalid_and_out_of_range() {
        let cloud = PointCloud::from_xyzi(&[
            [5.0, 0.0, 0.0, 1.0],
            [f32::NAN, 0.0, 0.0, 2.0],
            [0.001, 0.0, 3.0, 3.0],
            [150.0, 0.0, 0.0, 4.0],
            [0.0, f32::INFINITY, 0.0, 5.0],
            [3.0, 4.0, -20.0, 6.0],
        ]);
        let filtered = prefilter(&cloud, 0.01, 100.0);

        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered.point(0), nalgebra::Vector3::new(5.0, 0.0, 0.0));
        assert_eq!(filtered.point(1), nalgebra::Vector3::new(3.0, 4.0, -20.0));
        assert_eq!(filtered.intensities.unwrap().to_vec(), vec![1.0, 6.0]);
    }

    #[test]
    fn should_keep_bounds_inclusive() {
        let cloud = PointCloud::from_xyzi(&[[1.0, 0.0, 0.0, 0.0], [0.0, 10.0, 0.0, 0.0]]);
        assert_eq!(prefilter(&cloud, 1.0, 10.0).len(), 2);
    }

    #[rstest]
    fn should_satisfy_radial_bounds(scattered_cloud: PointCloud) {
        let (minlen, maxlen) = (2.0, 30.0);
        let filtered = prefilter(&scattered_cloud, minlen, maxlen);
        assert!(!filtered.is_empty());
        assert!(filtered.len() < scattered_cloud.len());
        for p in filtered.iter_points() {
            let d = p[0].hypot(p[1]);
            assert!(d >= minlen && d <= maxlen);
        }
    }

    #[test]
    fn should_accept_empty_cloud() {
        assert!(prefilter(&PointCloud::zeros(0), 0.01, 100.0).is_empty());
    }
}

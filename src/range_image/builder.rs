use log::debug;

use crate::memory::FrameBuffers;
use crate::params::Parameters;
use crate::pointcloud::PointCloud;

use super::{DenseGrid, Densifier, RangeGrid, Reconstructor, SphericalProjection, VarianceFilter};

#[derive(Debug, Clone)]
/// Builds the cleaned, densified point cloud from a prefiltered lidar cloud:
/// spherical range image, row interpolation, optional variance filter and reconstruction.
pub struct RangeImageBuilder {
    projection: SphericalProjection,
    densifier: Densifier,
    variance_filter: Option<VarianceFilter>,
    reconstructor: Reconstructor,
}

impl Default for RangeImageBuilder {
    /// Creates a new builder with the reference parameters.
    fn default() -> Self {
        Self::from_params(&Parameters::default())
    }
}

impl RangeImageBuilder {
    pub fn from_params(params: &Parameters) -> Self {
        Self {
            projection: SphericalProjection::from_params(params),
            densifier: Densifier::new(params.interpol_value),
            variance_filter: if params.filter_output {
                Some(VarianceFilter::from_params(params))
            } else {
                None
            },
            reconstructor: Reconstructor::from_params(params),
        }
    }

    /// Enables or disables the block variance filter.
    /// See [`VarianceFilter`].
    pub fn with_variance_filter(mut self, filter: Option<VarianceFilter>) -> Self {
        self.variance_filter = filter;
        self
    }

    /// Replaces the reconstruction stage, e.g. to change its tilt correction.
    pub fn with_reconstructor(mut self, reconstructor: Reconstructor) -> Self {
        self.reconstructor = reconstructor;
        self
    }

    pub fn projection(&self) -> &SphericalProjection {
        &self.projection
    }

    /// Runs the grid stages and returns the range grid and the filtered dense grid. The caller
    /// gives both back to `buffers` with `recycle` when done.
    pub fn build_grids(&self, cloud: &PointCloud, buffers: &mut FrameBuffers) -> (RangeGrid, DenseGrid) {
        let grid = self.projection.build(cloud, buffers);
        let mut dense = self.densifier.densify(&grid, buffers);

        if let Some(filter) = &self.variance_filter {
            let zeroed = filter.apply(dense.range.view(), &mut dense.suppressed);
            debug!("variance filter zeroed {zeroed} blocks");
        }

        debug!(
            "range grid {}x{} with {} cells, dense grid {}x{}",
            grid.rows(),
            grid.cols(),
            grid.occupied(),
            dense.rows(),
            dense.cols()
        );
        (grid, dense)
    }

    /// Builds the reconstructed point cloud from the given prefiltered cloud.
    ///
    /// # Arguments
    ///
    /// * `cloud` - Lidar points, already prefiltered.
    /// * `buffers` - Scratch grids, exclusively owned for the duration of the call.
    ///
    /// # Returns
    ///
    /// The reconstructed points, row-major over the dense grid.
    pub fn build(&self, cloud: &PointCloud, buffers: &mut FrameBuffers) -> PointCloud {
        let (grid, dense) = self.build_grids(cloud, buffers);
        let points = self
            .reconstructor
            .reconstruct(dense.suppressed.view(), dense.height.view());
        debug!("reconstructed {} points", points.len());

        grid.recycle(buffers);
        dense.recycle(buffers);
        points
    }
}

#[cfg(test)]
mod tests {
    use super::RangeImageBuilder;
    use crate::memory::FrameBuffers;
    use crate::params::Parameters;
    use crate::pointcloud::PointCloud;
    use crate::range_image::{Reconstructor, VarianceFilter};
    use crate::transform::Rotation;
    use crate::unit_test::wall_cloud;
    use approx::assert_abs_diff_eq;
    use rstest::rstest;

    fn small_params() -> Parameters {
        Parameters::default()
            .with_resolution(1.0, 2.0)
            .with_interpolation(4)
    }

    #[rstest]
    fn should_reconstruct_a_wall(wall_cloud: PointCloud) {
        let params = small_params();
        let builder = RangeImageBuilder::from_params(&params).with_reconstructor(
            Reconstructor::from_params(&params).with_tilt(Rotation::identity()),
        );
        let mut buffers = FrameBuffers::new();
        let (grid, dense) = builder.build_grids(&wall_cloud, &mut buffers);
        let occupied = grid.occupied();
        grid.recycle(&mut buffers);
        dense.recycle(&mut buffers);

        let points = builder.build(&wall_cloud, &mut buffers);
        assert!(points.len() > occupied);
        for p in points.iter_points() {
            // The wall is the plane x = 10; densification stays on it up to angular binning.
            assert_abs_diff_eq!(p[0], 10.0, epsilon = 0.3);
        }
    }

    #[rstest]
    fn should_recover_lateral_sign(wall_cloud: PointCloud) {
        let params = small_params().with_variance_filter(false, 0.0);
        let builder = RangeImageBuilder::from_params(&params);
        let points = builder.build(&wall_cloud, &mut FrameBuffers::new());

        // The wall spans y in [-1.95, 4.67]; a mirrored reconstruction would swap the extents.
        let (min_y, max_y) = points
            .iter_points()
            .fold((f32::MAX, f32::MIN), |(lo, hi), p| (lo.min(p[1]), hi.max(p[1])));
        assert!(max_y > 3.5 && max_y < 5.0);
        assert!(min_y > -2.5 && min_y < -1.0);
    }

    #[test]
    fn should_recover_point_between_neighbours() {
        let params = Parameters::default()
            .with_resolution(0.5, 1.0)
            .with_interpolation(2)
            .with_variance_filter(false, 0.0);
        let builder = RangeImageBuilder::from_params(&params).with_reconstructor(
            Reconstructor::from_params(&params).with_tilt(Rotation::identity()),
        );
        let (azimuth, r) = (11.5f32.to_radians(), 10.0f32);
        let column: Vec<[f32; 4]> = [-1.0f32, 0.0, 1.0]
            .iter()
            .map(|el| {
                let el = el.to_radians();
                [
                    r * el.cos() * azimuth.cos(),
                    r * el.cos() * azimuth.sin(),
                    r * el.sin(),
                    0.0,
                ]
            })
            .collect();
        let cloud = PointCloud::from_xyzi(&column);

        // An occupied cell survives only between two occupied neighbours, the outer knots fall
        // in the dead zone of the empty rows around them.
        let points = builder.build(&cloud, &mut FrameBuffers::new());
        assert_eq!(points.len(), 3);
        let middle = points.point(1);
        assert_abs_diff_eq!(middle[0], cloud.point(1)[0], epsilon = 1e-3);
        assert_abs_diff_eq!(middle[1], cloud.point(1)[1], epsilon = 1e-3);
        assert_abs_diff_eq!(middle[2], 0.0, epsilon = 1e-6);
    }

    #[rstest]
    #[case(0.1, 3600)]
    #[case(0.2, 1800)]
    #[case(0.4, 900)]
    #[case(0.5, 720)]
    fn should_keep_straight_ahead_at_zero_azimuth(#[case] resolution: f32, #[case] cols: usize) {
        let params = Parameters::default()
            .with_resolution(resolution, 1.0)
            .with_interpolation(2)
            .with_variance_filter(false, 0.0);
        let builder = RangeImageBuilder::from_params(&params).with_reconstructor(
            Reconstructor::from_params(&params).with_tilt(Rotation::identity()),
        );
        assert_eq!(builder.projection().cols, cols);

        let column: Vec<[f32; 4]> = [-1.0f32, 0.0, 1.0]
            .iter()
            .map(|el| {
                let el = el.to_radians();
                [10.0 * el.cos(), 0.0, 10.0 * el.sin(), 0.0]
            })
            .collect();
        let points = builder.build(&PointCloud::from_xyzi(&column), &mut FrameBuffers::new());

        assert_eq!(points.len(), 3);
        let middle = points.point(1);
        assert_abs_diff_eq!(middle[1].atan2(middle[0]), 0.0, epsilon = 1e-5);
        assert_abs_diff_eq!(middle[0], 10.0, epsilon = 1e-3);
    }

    #[test]
    fn should_handle_empty_cloud() {
        let builder = RangeImageBuilder::from_params(&small_params());
        let points = builder.build(&PointCloud::zeros(0), &mut FrameBuffers::new());
        assert!(points.is_empty());
    }

    #[rstest]
    fn should_be_repeatable(wall_cloud: PointCloud) {
        let builder = RangeImageBuilder::from_params(&small_params())
            .with_variance_filter(Some(VarianceFilter::new(0.5, 4)));
        let mut buffers = FrameBuffers::new();
        let first = builder.build(&wall_cloud, &mut buffers);
        let _other = builder.build(&PointCloud::from_xyzi(&[[3.0, 0.0, 0.0, 0.0]]), &mut buffers);
        let second = builder.build(&wall_cloud, &mut buffers);
        assert_eq!(first.points, second.points);
    }
}

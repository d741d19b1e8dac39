use log::debug;
use ndarray::Array3;

use crate::calibration::Calibration;
use crate::camera::CameraProjector;
use crate::error::Error;
use crate::image::check_rgb;
use crate::memory::{FrameBuffers, GridPool};
use crate::params::Parameters;
use crate::pointcloud::{ColorPointCloud, PointCloud};
use crate::prefilter::prefilter;
use crate::range_image::RangeImageBuilder;

/// Result of fusing one cloud with one image.
#[derive(Clone, Debug)]
pub struct FusionOutput {
    /// Copy of the input image with a depth marker per visible point.
    pub image: Array3<u8>,
    /// The visible reconstructed points colored from the input image.
    pub cloud: ColorPointCloud,
}

/// Lidar-camera fusion: prefilter, range image densification and filtering, reconstruction,
/// projection and colorization. Parameters and calibration are fixed at construction;
/// frames can be processed concurrently through [`FusionPipeline::process`].
#[derive(Debug)]
pub struct FusionPipeline {
    params: Parameters,
    builder: RangeImageBuilder,
    projector: CameraProjector,
    pool: GridPool,
}

impl FusionPipeline {
    pub fn new(params: Parameters, calibration: &Calibration) -> Result<Self, Error> {
        params.validate()?;

        let builder = RangeImageBuilder::from_params(&params);
        let projector = CameraProjector::new(calibration, params.maxlen)
            .with_marker_radius(params.marker_radius)
            .with_frame_id(&params.frame_id);

        Ok(Self {
            params,
            builder,
            projector,
            pool: GridPool::new(),
        })
    }

    /// Replaces the range image stages, e.g. to change the reconstruction tilt.
    pub fn with_builder(mut self, builder: RangeImageBuilder) -> Self {
        self.builder = builder;
        self
    }

    pub fn params(&self) -> &Parameters {
        &self.params
    }

    pub fn projector(&self) -> &CameraProjector {
        &self.projector
    }

    /// Processes one frame with scratch grids taken from the internal pool.
    pub fn process(&self, cloud: &PointCloud, image: &Array3<u8>) -> Result<FusionOutput, Error> {
        let mut buffers = self.pool.acquire();
        let result = self.process_with(&mut buffers, cloud, image);
        self.pool.release(buffers);
        result
    }

    /// Processes one frame.
    ///
    /// # Arguments
    ///
    /// * `buffers` - Scratch grids, exclusively used by this frame.
    /// * `cloud` - Lidar points in the sensor frame.
    /// * `image` - RGB image of shape (height, width, 3).
    ///
    /// # Returns
    ///
    /// The annotated image and the colored cloud. An empty cloud, before or after
    /// prefiltering, yields the untouched image and an empty cloud.
    pub fn process_with(
        &self,
        buffers: &mut FrameBuffers,
        cloud: &PointCloud,
        image: &Array3<u8>,
    ) -> Result<FusionOutput, Error> {
        check_rgb(image)?;

        let filtered = prefilter(cloud, self.params.minlen, self.params.maxlen);
        debug!("prefilter kept {} of {} points", filtered.len(), cloud.len());
        if filtered.is_empty() {
            debug!("no points left, passing the image through");
            return Ok(FusionOutput {
                image: image.clone(),
                cloud: ColorPointCloud::empty(self.projector.frame_id()),
            });
        }

        let reconstructed = self.builder.build(&filtered, buffers);
        let (annotated, colored) = self.projector.colorize(&reconstructed, image);
        debug!(
            "{} of {} reconstructed points are visible",
            colored.len(),
            reconstructed.len()
        );

        Ok(FusionOutput {
            image: annotated,
            cloud: colored,
        })
    }

    /// Number of scratch grid sets waiting in the pool.
    pub fn idle_buffers(&self) -> usize {
        self.pool.idle()
    }
}

#[cfg(test)]
mod tests {
    use super::FusionPipeline;
    use crate::calibration::Calibration;
    use crate::error::Error;
    use crate::params::Parameters;
    use crate::memory::FrameBuffers;
    use crate::pointcloud::PointCloud;
    use crate::range_image::{RangeImageBuilder, Reconstructor};
    use crate::transform::Rotation;
    use crate::unit_test::{gradient_image, pinhole_calibration, wall_cloud};
    use ndarray::{Array2, Array3};
    use rstest::rstest;

    fn params() -> Parameters {
        Parameters::default()
            .with_resolution(1.0, 2.0)
            .with_interpolation(4)
    }

    #[rstest]
    fn should_colorize_wall(
        wall_cloud: PointCloud,
        gradient_image: Array3<u8>,
        pinhole_calibration: Calibration,
    ) {
        let pipeline = FusionPipeline::new(params(), &pinhole_calibration).unwrap();
        let output = pipeline.process(&wall_cloud, &gradient_image).unwrap();

        assert!(!output.cloud.is_empty());
        assert_eq!(output.cloud.frame_id, "velodyne");
        assert_eq!(output.cloud.height(), 1);
        assert_eq!(output.cloud.width(), output.cloud.len());
        assert_eq!(output.image.dim(), gradient_image.dim());
        assert_ne!(output.image, gradient_image);
        assert_eq!(pipeline.idle_buffers(), 1);
    }

    #[rstest]
    fn should_be_idempotent(
        wall_cloud: PointCloud,
        gradient_image: Array3<u8>,
        pinhole_calibration: Calibration,
    ) {
        let pipeline = FusionPipeline::new(params(), &pinhole_calibration).unwrap();
        let first = pipeline.process(&wall_cloud, &gradient_image).unwrap();
        let second = pipeline.process(&wall_cloud, &gradient_image).unwrap();

        assert_eq!(first.image, second.image);
        assert_eq!(first.cloud.points, second.cloud.points);
        assert_eq!(first.cloud.colors, second.cloud.colors);
    }

    #[rstest]
    fn should_use_replaced_builder(
        wall_cloud: PointCloud,
        gradient_image: Array3<u8>,
        pinhole_calibration: Calibration,
    ) {
        let params = params();
        let level = RangeImageBuilder::from_params(&params).with_reconstructor(
            Reconstructor::from_params(&params).with_tilt(Rotation::identity()),
        );
        let tilted = FusionPipeline::new(params.clone(), &pinhole_calibration).unwrap();
        let pipeline = FusionPipeline::new(params, &pinhole_calibration)
            .unwrap()
            .with_builder(level.clone());

        let output = pipeline.process(&wall_cloud, &gradient_image).unwrap();
        let (height, width, _) = gradient_image.dim();
        let expected: Vec<f32> = level
            .build(&wall_cloud, &mut FrameBuffers::new())
            .iter_points()
            .filter(|p| pipeline.projector().project_if_visible(p, width, height).is_some())
            .flat_map(|p| [p[0], p[1], p[2]])
            .collect();

        assert!(!output.cloud.is_empty());
        assert_eq!(
            output.cloud.points,
            Array2::from_shape_vec((expected.len() / 3, 3), expected).unwrap()
        );
        assert_ne!(
            output.cloud.points,
            tilted.process(&wall_cloud, &gradient_image).unwrap().cloud.points
        );
    }

    #[rstest]
    fn should_pass_through_when_nothing_survives(
        gradient_image: Array3<u8>,
        pinhole_calibration: Calibration,
    ) {
        let pipeline = FusionPipeline::new(params(), &pinhole_calibration).unwrap();
        let far = PointCloud::from_xyzi(&[[500.0, 0.0, 0.0, 1.0], [f32::NAN, 0.0, 0.0, 1.0]]);

        for cloud in [far, PointCloud::zeros(0)] {
            let output = pipeline.process(&cloud, &gradient_image).unwrap();
            assert!(output.cloud.is_empty());
            assert_eq!(output.image, gradient_image);
        }
    }

    #[rstest]
    fn should_reject_non_rgb_images(wall_cloud: PointCloud, pinhole_calibration: Calibration) {
        let pipeline = FusionPipeline::new(params(), &pinhole_calibration).unwrap();
        assert!(matches!(
            pipeline.process(&wall_cloud, &Array3::zeros((48, 64, 4))),
            Err(Error::Conversion(_))
        ));
    }

    #[rstest]
    fn should_reject_invalid_params(pinhole_calibration: Calibration) {
        assert!(matches!(
            FusionPipeline::new(params().with_interpolation(0), &pinhole_calibration),
            Err(Error::InvalidParameter(_))
        ));
    }
}

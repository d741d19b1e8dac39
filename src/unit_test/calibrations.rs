use rstest::fixture;

use crate::calibration::Calibration;

/// Pinhole camera with identity extrinsics centred on a 64x48 image.
#[fixture]
pub fn pinhole_calibration() -> Calibration {
    Calibration::pinhole(40.0, 40.0, 32.0, 24.0)
}

mod calibrations;
pub(crate) use calibrations::pinhole_calibration;
mod images;
pub(crate) use images::gradient_image;
mod point_clouds;
pub(crate) use point_clouds::{scattered_cloud, wall_cloud};

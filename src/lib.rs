pub mod calibration;
pub mod camera;
pub mod error;
pub mod image;
pub mod io;
pub mod memory;
pub mod params;
pub mod pipeline;
pub mod pointcloud;
pub mod prefilter;
pub mod range_image;
pub mod transform;

#[cfg(test)]
mod unit_test;

pub use crate::error::Error;
pub use crate::params::Parameters;
pub use crate::pipeline::{FusionOutput, FusionPipeline};

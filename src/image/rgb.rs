use image::{flat::SampleLayout, RgbImage};
use ndarray::{Array3, ShapeBuilder};

use crate::error::Error;

/// Trait to convert into ndarray::Array3 with the shape [height, width, channels], the layout
/// the pipeline samples and draws on.
pub trait IntoArray3 {
    fn into_array3(self) -> Result<Array3<u8>, Error>;
}

impl IntoArray3 for RgbImage {
    fn into_array3(self) -> Result<Array3<u8>, Error> {
        let SampleLayout {
            channels,
            channel_stride,
            height,
            height_stride,
            width,
            width_stride,
        } = self.sample_layout();
        let shape = (height as usize, width as usize, channels as usize);
        let strides = (height_stride, width_stride, channel_stride);
        Array3::from_shape_vec(shape.strides(strides), self.into_raw())
            .map_err(|err| Error::Conversion(err.to_string()))
    }
}

/// Trait to convert objects into image::RgbImage
pub trait IntoImageRgb8 {
    fn into_image_rgb8(self) -> Result<RgbImage, Error>;
}

impl IntoImageRgb8 for Array3<u8> {
    fn into_image_rgb8(self) -> Result<RgbImage, Error> {
        let (height, width, channels) = self.dim();
        if channels != 3 {
            return Err(Error::Conversion(format!(
                "expected 3 channels, got {channels}"
            )));
        }
        let raw = if self.is_standard_layout() {
            self.into_raw_vec()
        } else {
            self.iter().copied().collect()
        };
        RgbImage::from_raw(width as u32, height as u32, raw)
            .ok_or_else(|| Error::Conversion("pixel buffer does not match image size".to_string()))
    }
}

/// Decodes an encoded image (PNG, JPEG, ...) into an RGB pixel grid.
pub fn decode_rgb(bytes: &[u8]) -> Result<Array3<u8>, Error> {
    let decoded = image::load_from_memory(bytes).map_err(|err| Error::Conversion(err.to_string()))?;
    decoded.into_rgb8().into_array3()
}

/// Checks that `image` is a (height, width, 3) pixel grid.
pub fn check_rgb(image: &Array3<u8>) -> Result<(), Error> {
    match image.dim() {
        (_, _, 3) => Ok(()),
        (_, _, channels) => Err(Error::Conversion(format!(
            "expected 3 channels, got {channels}"
        ))),
    }
}

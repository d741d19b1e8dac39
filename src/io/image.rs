use std::path::Path;

use ndarray::Array3;

use crate::error::Error;
use crate::image::{decode_rgb, IntoImageRgb8};

/// Loads any image the `image` crate decodes as an RGB pixel grid. The format is guessed
/// from the content, not the extension.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<Array3<u8>, Error> {
    decode_rgb(&std::fs::read(path)?)
}

/// Saves an RGB pixel grid; the format follows the file extension.
pub fn save_image<P: AsRef<Path>>(path: P, image: &Array3<u8>) -> Result<(), Error> {
    image.clone().into_image_rgb8()?.save(path)?;
    Ok(())
}

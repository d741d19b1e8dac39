use ndarray::Array3;
use rstest::fixture;

/// 64x48 image whose pixel at (row, col) is `[col, row, 30]`.
#[fixture]
pub fn gradient_image() -> Array3<u8> {
    Array3::from_shape_fn((48, 64, 3), |(row, col, c)| match c {
        0 => col as u8,
        1 => row as u8,
        _ => 30,
    })
}

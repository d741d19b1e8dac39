mod rgb;
pub use rgb::{check_rgb, decode_rgb, IntoArray3, IntoImageRgb8};

mod draw;
pub use draw::draw_filled_circle;

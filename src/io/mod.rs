mod config;
pub use config::{load_config, parse_config};

mod image;
pub use self::image::{load_image, save_image};

mod ply;
pub use ply::{read_lidar_ply, write_color_ply};

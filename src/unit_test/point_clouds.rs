use rstest::fixture;

use crate::pointcloud::PointCloud;

/// A flat wall at x = 10 sampled on a regular azimuth/elevation lattice, from -11° to 25°
/// in azimuth (0.5° steps) and ±10° in elevation (1° steps).
#[fixture]
pub fn wall_cloud() -> PointCloud {
    let mut xyzi = Vec::new();
    for step_az in 0..=72 {
        let azimuth = (-11.0f32 + 0.5 * step_az as f32).to_radians();
        let y = 10.0 * azimuth.tan();
        for step_el in 0..=20 {
            let elevation = (-10.0f32 + step_el as f32).to_radians();
            let z = (100.0 + y * y).sqrt() * elevation.tan();
            xyzi.push([10.0, y, z, 1.0]);
        }
    }
    PointCloud::from_xyzi(&xyzi)
}

/// Deterministic cloud spread over radii 0 to 40 m in every direction, plus a few
/// non-finite points.
#[fixture]
pub fn scattered_cloud() -> PointCloud {
    let mut xyzi = Vec::new();
    for i in 0..400 {
        let radius = 0.1 * i as f32;
        let angle = (i as f32 * 37.0).to_radians();
        let z = ((i % 7) as f32 - 3.0) * 0.5;
        xyzi.push([radius * angle.cos(), radius * angle.sin(), z, (i % 255) as f32]);
    }
    xyzi.push([f32::NAN, 1.0, 1.0, 0.0]);
    xyzi.push([5.0, f32::INFINITY, 0.0, 0.0]);
    PointCloud::from_xyzi(&xyzi)
}

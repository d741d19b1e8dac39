use ndarray::Array3;

/// Paints a filled disc of `radius` pixels centred at `(x, y)`, clipped to the image.
pub fn draw_filled_circle(image: &mut Array3<u8>, x: i64, y: i64, radius: i64, color: [u8; 3]) {
    let (height, width, _) = image.dim();
    if radius < 0 || height == 0 || width == 0 {
        return;
    }
    let radius_sq = radius.saturating_mul(radius);
    let rows = y.saturating_sub(radius).max(0)..=y.saturating_add(radius).min(height as i64 - 1);
    let cols = x.saturating_sub(radius).max(0)..=x.saturating_add(radius).min(width as i64 - 1);

    for row in rows {
        let dy = row.saturating_sub(y);
        for col in cols.clone() {
            let dx = col.saturating_sub(x);
            if dx.saturating_mul(dx).saturating_add(dy.saturating_mul(dy)) > radius_sq {
                continue;
            }
            for (c, value) in color.iter().enumerate() {
                image[(row as usize, col as usize, c)] = *value;
            }
        }
    }
}

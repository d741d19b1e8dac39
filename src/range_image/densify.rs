use ndarray::{Array2, ArrayView2, ArrayViewMut1, Zip};

use crate::memory::{Array2Recycle, FrameBuffers};

use super::RangeGrid;

/// Row-oversampled range image.
#[derive(Debug, Clone)]
pub struct DenseGrid {
    /// Interpolated ranges, before any suppression.
    pub range: Array2<f32>,
    /// Interpolated heights.
    pub height: Array2<f32>,
    /// Interpolated ranges with the dead zones around missing data zeroed. The variance filter
    /// writes into this grid as well; reconstruction reads it.
    pub suppressed: Array2<f32>,
    pub interpol_value: usize,
}

impl DenseGrid {
    pub fn rows(&self) -> usize {
        self.range.nrows()
    }

    pub fn cols(&self) -> usize {
        self.range.ncols()
    }

    pub fn recycle(self, buffers: &mut FrameBuffers) {
        buffers.dense_range = Array2Recycle::Recycle(self.range);
        buffers.dense_height = Array2Recycle::Recycle(self.height);
        buffers.suppressed = Array2Recycle::Recycle(self.suppressed);
    }
}

/// Number of rows after resampling `rows` knots at `1 / interpol_value` spacing.
pub fn dense_rows(rows: usize, interpol_value: usize) -> usize {
    if rows == 0 {
        0
    } else {
        (rows - 1) * interpol_value + 1
    }
}

fn interpolate_column(src: ArrayView2<f32>, col: usize, interpol_value: usize, mut dst: ArrayViewMut1<f32>) {
    let knots = src.nrows();
    let step = 1.0 / interpol_value as f32;
    for (r, value) in dst.iter_mut().enumerate() {
        let k = r / interpol_value;
        let sub = r % interpol_value;
        *value = if sub == 0 || k + 1 >= knots {
            src[(k, col)]
        } else {
            let t = sub as f32 * step;
            src[(k, col)] * (1.0 - t) + src[(k + 1, col)] * t
        };
    }
}

/// Linear resampling of every column along the row axis. Output row `k * interpol_value` is
/// exactly input row `k`.
pub fn interpolate_rows(src: ArrayView2<f32>, interpol_value: usize, dst: &mut Array2<f32>) {
    debug_assert_eq!(dst.nrows(), dense_rows(src.nrows(), interpol_value));
    Zip::indexed(dst.columns_mut()).par_for_each(|col, column| {
        interpolate_column(src, col, interpol_value, column);
    });
}

/// Zeroes `interpol_value` dense rows on both sides of every empty cell of the original grid, so
/// interpolation cannot bridge a gap in the data.
pub fn suppress_artifacts(original: ArrayView2<f32>, interpol_value: usize, dense: &mut Array2<f32>) {
    let dense_rows = dense.nrows();
    if dense_rows == 0 {
        return;
    }
    Zip::indexed(dense.columns_mut()).par_for_each(|col, mut column| {
        for k in 0..original.nrows() {
            if original[(k, col)] != 0.0 {
                continue;
            }
            let center = k * interpol_value;
            let first = center.saturating_sub(interpol_value);
            let last = (center + interpol_value).min(dense_rows - 1);
            for r in first..=last {
                column[r] = 0.0;
            }
        }
    });
}

/// Interpolates range and height grids along the elevation axis.
#[derive(Debug, Clone)]
pub struct Densifier {
    pub interpol_value: usize,
}

impl Densifier {
    pub fn new(interpol_value: usize) -> Self {
        Self { interpol_value }
    }

    pub fn densify(&self, grid: &RangeGrid, buffers: &mut FrameBuffers) -> DenseGrid {
        let dim = (dense_rows(grid.rows(), self.interpol_value), grid.cols());

        let mut range = buffers.dense_range.take(dim);
        let mut height = buffers.dense_height.take(dim);
        interpolate_rows(grid.range.view(), self.interpol_value, &mut range);
        interpolate_rows(grid.height.view(), self.interpol_value, &mut height);

        let mut suppressed = buffers.suppressed.take(dim);
        suppressed.assign(&range);
        suppress_artifacts(grid.range.view(), self.interpol_value, &mut suppressed);

        DenseGrid {
            range,
            height,
            suppressed,
            interpol_value: self.interpol_value,
        }
    }
}

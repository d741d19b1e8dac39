use std::ops::Range;

use ndarray::{Array2, ArrayView2, Zip};

use crate::params::{BlockBoundary, Parameters, VarianceStatistic};

/// Removes vertical runs of interpolated range that bridge a depth discontinuity.
///
/// Each column is cut into blocks of `block` dense rows. The statistic of a block is computed
/// on the interpolated (unsuppressed) ranges; when it exceeds `max_var` the block is zeroed in
/// the output grid.
#[derive(Debug, Clone)]
pub struct VarianceFilter {
    pub max_var: f64,
    pub block: usize,
    pub statistic: VarianceStatistic,
    pub boundary: BlockBoundary,
}

impl VarianceFilter {
    pub fn new(max_var: f64, block: usize) -> Self {
        Self {
            max_var,
            block,
            statistic: VarianceStatistic::Population,
            boundary: BlockBoundary::SkipPartial,
        }
    }

    pub fn from_params(params: &Parameters) -> Self {
        Self {
            max_var: params.max_var,
            block: params.interpol_value,
            statistic: params.variance_statistic,
            boundary: params.block_boundary,
        }
    }

    pub fn with_statistic(mut self, statistic: VarianceStatistic) -> Self {
        self.statistic = statistic;
        self
    }

    pub fn with_boundary(mut self, boundary: BlockBoundary) -> Self {
        self.boundary = boundary;
        self
    }

    /// Row ranges tested in every column.
    pub fn blocks(&self, rows: usize) -> Vec<Range<usize>> {
        if self.block == 0 || rows == 0 {
            return Vec::new();
        }

        let whole = (rows - 1) / self.block;
        let mut blocks: Vec<Range<usize>> = (0..whole)
            .map(|b| b * self.block..(b + 1) * self.block)
            .collect();

        if self.boundary == BlockBoundary::IncludePartial {
            let covered = whole * self.block;
            if covered < rows {
                blocks.push(covered..rows);
            }
        }

        blocks
    }

    /// Statistic of one block of range values.
    pub fn statistic(&self, values: &[f32]) -> f64 {
        if values.is_empty() {
            return 0.0;
        }

        let n = values.len() as f64;
        let mean = values.iter().map(|v| *v as f64).sum::<f64>() / n;
        let squares: f64 = values
            .iter()
            .map(|v| (*v as f64 - mean).powi(2))
            .sum();

        match self.statistic {
            VarianceStatistic::Population => squares / n,
            VarianceStatistic::SumOfSquares => squares,
        }
    }

    /// Zeroes, in `output`, every block whose statistic over `interpolated` exceeds `max_var`.
    /// Returns the number of zeroed blocks.
    pub fn apply(&self, interpolated: ArrayView2<f32>, output: &mut Array2<f32>) -> usize {
        debug_assert_eq!(interpolated.dim(), output.dim());
        let blocks = self.blocks(interpolated.nrows());

        let zeroed = Zip::from(output.columns_mut())
            .and(interpolated.columns())
            .par_map_collect(|mut out_col, in_col| {
                let mut count = 0;
                let mut values = Vec::with_capacity(self.block);
                for rows in blocks.iter() {
                    values.clear();
                    values.extend(rows.clone().map(|r| in_col[r]));
                    if self.statistic(&values) > self.max_var {
                        rows.clone().for_each(|r| out_col[r] = 0.0);
                        count += 1;
                    }
                }
                count
            });

        zeroed.sum()
    }
}

use serde_derive::Deserialize;

use crate::error::Error;

/// Largest accepted marker radius, in pixels.
pub const MAX_MARKER_RADIUS: i64 = 4096;

/// Statistic used by the block variance filter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VarianceStatistic {
    /// `Σ(v - μ)² / n`.
    Population,
    /// `Σ(v - μ)²`, without normalization.
    SumOfSquares,
}

/// What the variance filter does with the rows that do not fill a whole block at the end of a
/// column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockBoundary {
    /// Only whole blocks below `(dense_rows - 1) / f` are tested, trailing rows are kept as-is.
    SkipPartial,
    /// The trailing rows are tested as a shorter block.
    IncludePartial,
}

/// Tunable parameters of the fusion pipeline. Angles are in the units the operators write them:
/// grid resolution and extent in degrees, field of view in radians.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Parameters {
    /// Maximum planar distance of a lidar point.
    pub maxlen: f32,
    /// Minimum planar distance of a lidar point.
    pub minlen: f32,
    #[serde(rename = "max_ang_FOV")]
    pub max_fov: f32,
    #[serde(rename = "min_ang_FOV")]
    pub min_fov: f32,
    #[serde(rename = "pcTopic")]
    pub pc_topic: String,
    #[serde(rename = "imgTopic")]
    pub img_topic: String,
    pub max_var: f64,
    #[serde(rename = "filter_output_pc")]
    pub filter_output: bool,
    /// Azimuth resolution, degrees.
    #[serde(rename = "x_resolution")]
    pub angular_resolution_x: f32,
    /// Elevation resolution, degrees.
    #[serde(rename = "ang_Y_resolution")]
    pub angular_resolution_y: f32,
    pub max_angle_width: f32,
    pub max_angle_height: f32,
    /// Row oversampling factor of the densifier.
    #[serde(rename = "y_interpolation")]
    pub interpol_value: usize,
    pub variance_statistic: VarianceStatistic,
    pub block_boundary: BlockBoundary,
    pub marker_radius: i64,
    pub frame_id: String,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            maxlen: 100.0,
            minlen: 0.01,
            max_fov: 3.0,
            min_fov: 0.4,
            pc_topic: "/velodyne_points".to_string(),
            img_topic: "/camera/color/image_raw".to_string(),
            max_var: 50.0,
            filter_output: true,
            angular_resolution_x: 0.5,
            angular_resolution_y: 2.1,
            max_angle_width: 360.0,
            max_angle_height: 180.0,
            interpol_value: 20,
            variance_statistic: VarianceStatistic::Population,
            block_boundary: BlockBoundary::SkipPartial,
            marker_radius: 1,
            frame_id: "velodyne".to_string(),
        }
    }
}

impl Parameters {
    /// Checks the values that would make the grid or the filters undefined.
    pub fn validate(&self) -> Result<(), Error> {
        let positive = [
            ("x_resolution", self.angular_resolution_x),
            ("ang_Y_resolution", self.angular_resolution_y),
            ("max_angle_width", self.max_angle_width),
            ("max_angle_height", self.max_angle_height),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(Error::invalid_parameter(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }

        if !(self.minlen <= self.maxlen) {
            return Err(Error::invalid_parameter(format!(
                "minlen ({}) must not exceed maxlen ({})",
                self.minlen, self.maxlen
            )));
        }

        if self.interpol_value == 0 {
            return Err(Error::invalid_parameter("y_interpolation must be >= 1"));
        }

        if !(0..=MAX_MARKER_RADIUS).contains(&self.marker_radius) {
            return Err(Error::invalid_parameter(format!(
                "marker_radius ({}) must be within 0..={MAX_MARKER_RADIUS}",
                self.marker_radius
            )));
        }

        Ok(())
    }

    /// Builder-style setter for the oversampling factor.
    pub fn with_interpolation(mut self, interpol_value: usize) -> Self {
        self.interpol_value = interpol_value;
        self
    }

    /// Builder-style setter for the grid resolution, in degrees.
    pub fn with_resolution(mut self, azimuth_deg: f32, elevation_deg: f32) -> Self {
        self.angular_resolution_x = azimuth_deg;
        self.angular_resolution_y = elevation_deg;
        self
    }

    /// Builder-style setter for the radial bounds.
    pub fn with_range(mut self, minlen: f32, maxlen: f32) -> Self {
        self.minlen = minlen;
        self.maxlen = maxlen;
        self
    }

    /// Builder-style setter for the variance filter.
    pub fn with_variance_filter(mut self, enabled: bool, max_var: f64) -> Self {
        self.filter_output = enabled;
        self.max_var = max_var;
        self
    }
}

use std::path::Path;

use serde_derive::Deserialize;

use crate::calibration::{Calibration, MatrixFile};
use crate::error::Error;
use crate::params::Parameters;

/// Layout of the JSON configuration: the pipeline parameters at the top level, the
/// calibration arrays under `matrix_file`.
#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(flatten)]
    params: Parameters,
    matrix_file: Option<MatrixFile>,
}

/// Parses a configuration document. Parameters fall back to their defaults, the calibration
/// is mandatory.
pub fn parse_config(text: &str) -> Result<(Parameters, Calibration), Error> {
    let config: ConfigFile = serde_json::from_str(text)?;
    let matrix_file = config
        .matrix_file
        .ok_or_else(|| Error::calibration("missing matrix_file section"))?;
    let calibration = Calibration::from_matrix_file(&matrix_file)?;
    config.params.validate()?;
    Ok((config.params, calibration))
}

/// Loads and validates the configuration file at `path`.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<(Parameters, Calibration), Error> {
    parse_config(&std::fs::read_to_string(path)?)
}

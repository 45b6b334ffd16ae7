use std::path::PathBuf;

use jamrisk_core::table::DatasetError;
use jamrisk_factor::FactorError;
use jamrisk_risk::RiskError;

#[derive(thiserror::Error, Debug)]
pub enum JamRiskAppError {
    #[error("invalid user input: {0}")]
    InvalidUserInput(String),
    #[error("Error writing to '{path}': {message}")]
    WriteError { path: PathBuf, message: String },
    #[error("output file '{0}' already exists, use --overwrite to replace it")]
    OutputExists(PathBuf),
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error("risk simulation failed: {0}")]
    Risk(#[from] RiskError),
    #[error("factor analysis failed: {0}")]
    Factor(#[from] FactorError),
}

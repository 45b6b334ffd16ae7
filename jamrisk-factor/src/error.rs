use std::fmt::Display;

use itertools::Itertools;
use jamrisk_core::table::DatasetError;
use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug)]
pub enum FactorError {
    #[error("data is not adequate for factor analysis (KMO={kmo:.4}, Bartlett p-value={bartlett_p_value:.4e}), set proceed_on_inadequate to override")]
    InadequateData { kmo: f64, bartlett_p_value: f64 },
    #[error("malformed factor analysis input: {0}")]
    MalformedInput(String),
    #[error("singular correlation matrix: {0}")]
    SingularMatrix(String),
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error(transparent)]
    Dataset(#[from] DatasetError),
}

/// non-fatal conditions encountered while fitting a factor model. these are
/// carried in the model output so they can be audited downstream.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FactorWarning {
    /// no eigenvalue exceeded the Kaiser threshold, one factor was retained
    DegenerateFactorCount {
        kaiser_threshold: f64,
        largest_eigenvalue: f64,
    },
    /// adequacy checks failed but the run proceeded by request
    InadequateData { kmo: f64, bartlett_p_value: f64 },
    /// communality estimates reached their upper bound
    HeywoodCase { features: Vec<String> },
    /// an iterative stage stopped at its iteration limit
    NotConverged { stage: String, iterations: usize },
}

impl Display for FactorWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FactorWarning::DegenerateFactorCount {
                kaiser_threshold,
                largest_eigenvalue,
            } => write!(
                f,
                "no eigenvalue above the Kaiser threshold {kaiser_threshold} (largest is {largest_eigenvalue:.4}), retaining 1 factor"
            ),
            FactorWarning::InadequateData {
                kmo,
                bartlett_p_value,
            } => write!(
                f,
                "proceeding with inadequate data (KMO={kmo:.4}, Bartlett p-value={bartlett_p_value:.4e})"
            ),
            FactorWarning::HeywoodCase { features } => write!(
                f,
                "Heywood case, communality at its upper bound for features [{}]",
                features.iter().join(", ")
            ),
            FactorWarning::NotConverged { stage, iterations } => {
                write!(f, "{stage} did not converge within {iterations} iterations")
            }
        }
    }
}

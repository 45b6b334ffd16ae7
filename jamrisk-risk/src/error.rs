use itertools::Itertools;
use jamrisk_core::{model::WeatherScenario, table::DatasetError};

use crate::scenario::ExcludedScenario;

#[derive(thiserror::Error, Debug)]
pub enum RiskError {
    #[error("no weather scenario has the minimum of {min_samples} samples required for simulation, sample sizes: [{}]", describe_excluded(.excluded))]
    InsufficientData {
        min_samples: usize,
        excluded: Vec<ExcludedScenario>,
    },
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("failure sampling scenario '{scenario}': {message}")]
    Sampling {
        scenario: WeatherScenario,
        message: String,
    },
    #[error(transparent)]
    Dataset(#[from] DatasetError),
}

fn describe_excluded(excluded: &[ExcludedScenario]) -> String {
    excluded
        .iter()
        .map(|e| format!("{}={}", e.scenario, e.sample_size))
        .join(", ")
}

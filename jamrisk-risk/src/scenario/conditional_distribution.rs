use itertools::Itertools;
use jamrisk_core::{config::ScenarioParameters, model::ObservationSet, model::WeatherScenario};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use super::{RecordAudit, ScenarioPartition};
use crate::RiskError;

/// empirical distribution of the congestion indicator within one scenario.
#[derive(Debug, Clone)]
pub struct ConditionalDistribution {
    pub scenario: WeatherScenario,
    /// observed congestion indicator values
    pub values: Vec<f64>,
    pub mean: f64,
    /// sample standard deviation
    pub std_dev: f64,
}

/// a scenario flagged as having insufficient data for simulation.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExcludedScenario {
    pub scenario: WeatherScenario,
    pub sample_size: usize,
}

/// all scenario distributions estimated from one dataset. recomputed on
/// every engine run.
#[derive(Debug, Clone)]
pub struct ConditionalDistributions {
    /// scenarios meeting the minimum sample size, in scenario order
    pub distributions: Vec<ConditionalDistribution>,
    /// scenarios below the minimum sample size, in scenario order
    pub excluded: Vec<ExcludedScenario>,
    pub min_scenario_samples: usize,
    pub records: RecordAudit,
}

impl ConditionalDistribution {
    /// summarizes the values observed in a scenario. requires at least two values.
    pub fn new(scenario: WeatherScenario, values: Vec<f64>) -> ConditionalDistribution {
        let mean = values.iter().mean();
        let std_dev = values.iter().std_dev();
        ConditionalDistribution {
            scenario,
            values,
            mean,
            std_dev,
        }
    }

    pub fn sample_size(&self) -> usize {
        self.values.len()
    }
}

/// estimates the conditional distribution of the congestion indicator for
/// each weather scenario. scenarios with fewer than `min_scenario_samples`
/// records are reported as excluded. fails when no scenario qualifies.
pub fn estimate_conditional_distributions(
    observations: &ObservationSet,
    partition: &ScenarioPartition,
    params: &ScenarioParameters,
) -> Result<ConditionalDistributions, RiskError> {
    let min_samples = params.min_scenario_samples;
    let (distributions, excluded): (Vec<_>, Vec<_>) = partition
        .buckets()
        .iter()
        .partition(|(_, indices)| indices.len() >= min_samples);

    let excluded = excluded
        .into_iter()
        .map(|(scenario, indices)| ExcludedScenario {
            scenario: *scenario,
            sample_size: indices.len(),
        })
        .collect_vec();
    for e in excluded.iter().filter(|e| e.sample_size > 0) {
        log::warn!(
            "scenario '{}' has insufficient data ({} < {min_samples} samples), excluded from simulation",
            e.scenario,
            e.sample_size
        );
    }
    if distributions.is_empty() {
        return Err(RiskError::InsufficientData {
            min_samples,
            excluded,
        });
    }

    let distributions = distributions
        .into_iter()
        .map(|(scenario, indices)| {
            let values = indices
                .iter()
                .map(|i| observations.records[*i].congestion_indicator)
                .collect_vec();
            let dist = ConditionalDistribution::new(*scenario, values);
            log::debug!(
                "scenario '{}': n={} mean={:.4} std={:.4}",
                dist.scenario,
                dist.sample_size(),
                dist.mean,
                dist.std_dev
            );
            dist
        })
        .collect_vec();
    log::info!(
        "estimated {} conditional distributions, {} scenarios excluded",
        distributions.len(),
        excluded.len()
    );

    Ok(ConditionalDistributions {
        distributions,
        excluded,
        min_scenario_samples: min_samples,
        records: partition.audit,
    })
}

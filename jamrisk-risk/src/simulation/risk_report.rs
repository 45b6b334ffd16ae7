use itertools::Itertools;
use jamrisk_core::{
    config::{JamDirection, SamplingMethod},
    model::WeatherScenario,
};
use serde::{Deserialize, Serialize};

use crate::scenario::{ExcludedScenario, RecordAudit};

/// reliability annotation attached to every scenario row.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Reliability {
    Reliable,
    /// fewer simulation runs than the configured floor
    SmallSample,
    /// scenario excluded from simulation
    InsufficientData,
}

/// simulated jam probability for one weather scenario.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ScenarioRisk {
    pub scenario: WeatherScenario,
    /// observed records in the scenario
    pub sample_size: usize,
    pub num_runs: usize,
    /// draws classified as a jam
    pub jams: usize,
    pub p_jam: f64,
    pub ci_low: f64,
    pub ci_high: f64,
    /// `z * sqrt(p(1-p)/N)` before clipping to [0, 1]
    pub ci_half_width: f64,
    pub reliability: Reliability,
    pub indicator_mean: f64,
    pub indicator_std: f64,
}

/// result of one Monte Carlo engine invocation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RiskReport {
    /// simulated scenarios in scenario order
    pub risks: Vec<ScenarioRisk>,
    /// scenarios excluded for insufficient data
    pub excluded: Vec<ExcludedScenario>,
    pub records: RecordAudit,
    pub min_scenario_samples: usize,
    pub num_runs: usize,
    pub jam_threshold: f64,
    pub jam_direction: JamDirection,
    pub sampling_method: SamplingMethod,
    pub ci_z: f64,
    /// user-provided seed. None marks a non-reproducible run.
    pub seed: Option<u64>,
    /// seed actually used to drive the generator
    pub effective_seed: u64,
}

/// flat row of the published risk report table.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RiskReportRow {
    pub scenario: String,
    pub sample_size: usize,
    pub num_runs: Option<usize>,
    pub p_jam: Option<f64>,
    pub ci_low: Option<f64>,
    pub ci_high: Option<f64>,
    pub reliability: Reliability,
    pub indicator_mean: Option<f64>,
    pub indicator_std: Option<f64>,
}

impl RiskReport {
    pub fn get(&self, scenario: &WeatherScenario) -> Option<&ScenarioRisk> {
        self.risks.iter().find(|r| &r.scenario == scenario)
    }

    pub fn is_reproducible(&self) -> bool {
        self.seed.is_some()
    }

    /// the simulated scenario with the highest jam probability.
    pub fn highest_risk(&self) -> Option<&ScenarioRisk> {
        self.risks.iter().max_by(|a, b| a.p_jam.total_cmp(&b.p_jam))
    }

    /// one row per weather scenario, simulated or excluded, in scenario order.
    pub fn rows(&self) -> Vec<RiskReportRow> {
        let simulated = self.risks.iter().map(|r| {
            (
                r.scenario,
                RiskReportRow {
                    scenario: r.scenario.label(),
                    sample_size: r.sample_size,
                    num_runs: Some(r.num_runs),
                    p_jam: Some(r.p_jam),
                    ci_low: Some(r.ci_low),
                    ci_high: Some(r.ci_high),
                    reliability: r.reliability,
                    indicator_mean: Some(r.indicator_mean),
                    indicator_std: Some(r.indicator_std),
                },
            )
        });
        let excluded = self.excluded.iter().map(|e| {
            (
                e.scenario,
                RiskReportRow {
                    scenario: e.scenario.label(),
                    sample_size: e.sample_size,
                    num_runs: None,
                    p_jam: None,
                    ci_low: None,
                    ci_high: None,
                    reliability: Reliability::InsufficientData,
                    indicator_mean: None,
                    indicator_std: None,
                },
            )
        });
        simulated
            .chain(excluded)
            .sorted_by_key(|(scenario, _)| scenario.index())
            .map(|(_, row)| row)
            .collect_vec()
    }
}

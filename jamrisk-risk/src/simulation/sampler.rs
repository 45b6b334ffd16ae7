use jamrisk_core::config::SamplingMethod;
use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::{scenario::ConditionalDistribution, RiskError};

/// draws congestion indicator values for one scenario.
#[derive(Debug, Clone)]
pub enum ScenarioSampler<'a> {
    /// normal approximation of the scenario distribution
    Normal(Normal<f64>),
    /// uniform resampling of the observed values
    Bootstrap(&'a [f64]),
}

impl<'a> ScenarioSampler<'a> {
    pub fn new(
        distribution: &'a ConditionalDistribution,
        method: SamplingMethod,
    ) -> Result<ScenarioSampler<'a>, RiskError> {
        match method {
            SamplingMethod::Normal => Normal::new(distribution.mean, distribution.std_dev)
                .map(ScenarioSampler::Normal)
                .map_err(|e| RiskError::Sampling {
                    scenario: distribution.scenario,
                    message: format!(
                        "invalid normal approximation (mean={}, std={}): {e}",
                        distribution.mean, distribution.std_dev
                    ),
                }),
            SamplingMethod::Bootstrap if distribution.values.is_empty() => {
                Err(RiskError::Sampling {
                    scenario: distribution.scenario,
                    message: String::from("cannot bootstrap from an empty sample"),
                })
            }
            SamplingMethod::Bootstrap => Ok(ScenarioSampler::Bootstrap(&distribution.values)),
        }
    }

    pub fn draw<R: Rng>(&self, rng: &mut R) -> f64 {
        match self {
            ScenarioSampler::Normal(normal) => normal.sample(rng),
            ScenarioSampler::Bootstrap(values) => values[rng.gen_range(0..values.len())],
        }
    }
}

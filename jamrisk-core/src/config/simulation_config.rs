use serde::{Deserialize, Serialize};

use crate::table::DatasetError;

/// which side of the jam threshold counts as a jam.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum JamDirection {
    /// indicator below the threshold is a jam, e.g. average speed
    #[default]
    Below,
    /// indicator above the threshold is a jam, e.g. vehicle count or a 0/1 flag
    Above,
}

/// how draws are produced from a conditional distribution.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SamplingMethod {
    /// normal approximation from the scenario mean and standard deviation
    #[default]
    Normal,
    /// resample the observed indicator values with replacement
    Bootstrap,
}

/// serializable configuration for the Monte Carlo risk simulation.
/// builds to a [`SimulationParameters`].
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct SimulationConfig {
    /// draws per scenario. defaults to 5000
    pub num_runs: Option<usize>,
    /// congestion indicator value defining a jam. required.
    pub jam_threshold: Option<f64>,
    /// defaults to below
    pub jam_direction: Option<JamDirection>,
    /// seed for reproducible runs. when absent the run is not reproducible.
    pub random_seed: Option<u64>,
    /// z value of the confidence interval. defaults to 1.96
    pub ci_z: Option<f64>,
    /// runs below this count are flagged as unreliable. defaults to 1000
    pub min_reliable_runs: Option<usize>,
    /// defaults to normal
    pub sampling_method: Option<SamplingMethod>,
    /// distribute draw chunks over the rayon thread pool. defaults to true
    pub parallel: Option<bool>,
    /// draws per chunk, each chunk owning one random stream. defaults to 1024
    pub chunk_size: Option<usize>,
}

/// validated, immutable simulation parameters.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SimulationParameters {
    pub num_runs: usize,
    pub jam_threshold: f64,
    pub jam_direction: JamDirection,
    pub random_seed: Option<u64>,
    pub ci_z: f64,
    pub min_reliable_runs: usize,
    pub sampling_method: SamplingMethod,
    pub parallel: bool,
    pub chunk_size: usize,
}

impl SimulationParameters {
    pub const DEFAULT_NUM_RUNS: usize = 5000;
    pub const DEFAULT_CI_Z: f64 = 1.96;
    pub const DEFAULT_MIN_RELIABLE_RUNS: usize = 1000;
    pub const DEFAULT_CHUNK_SIZE: usize = 1024;

    /// parameters with every default applied around the given jam threshold.
    pub fn new(jam_threshold: f64) -> Self {
        Self {
            num_runs: Self::DEFAULT_NUM_RUNS,
            jam_threshold,
            jam_direction: JamDirection::default(),
            random_seed: None,
            ci_z: Self::DEFAULT_CI_Z,
            min_reliable_runs: Self::DEFAULT_MIN_RELIABLE_RUNS,
            sampling_method: SamplingMethod::default(),
            parallel: true,
            chunk_size: Self::DEFAULT_CHUNK_SIZE,
        }
    }

    /// true when a value of the congestion indicator counts as a jam.
    pub fn is_jam(&self, value: f64) -> bool {
        match self.jam_direction {
            JamDirection::Below => value < self.jam_threshold,
            JamDirection::Above => value > self.jam_threshold,
        }
    }
}

impl SimulationConfig {
    pub fn build(&self) -> Result<SimulationParameters, DatasetError> {
        let jam_threshold = self.jam_threshold.ok_or_else(|| {
            DatasetError::InvalidConfiguration(String::from(
                "simulation requires a 'jam_threshold' value",
            ))
        })?;
        if !jam_threshold.is_finite() {
            return Err(DatasetError::InvalidConfiguration(format!(
                "jam_threshold must be finite, found {jam_threshold}"
            )));
        }
        let defaults = SimulationParameters::new(jam_threshold);
        let params = SimulationParameters {
            num_runs: self.num_runs.unwrap_or(defaults.num_runs),
            jam_threshold,
            jam_direction: self.jam_direction.unwrap_or(defaults.jam_direction),
            random_seed: self.random_seed,
            ci_z: self.ci_z.unwrap_or(defaults.ci_z),
            min_reliable_runs: self.min_reliable_runs.unwrap_or(defaults.min_reliable_runs),
            sampling_method: self.sampling_method.unwrap_or(defaults.sampling_method),
            parallel: self.parallel.unwrap_or(defaults.parallel),
            chunk_size: self.chunk_size.unwrap_or(defaults.chunk_size),
        };
        if params.num_runs == 0 {
            return Err(DatasetError::InvalidConfiguration(String::from(
                "num_runs must be positive",
            )));
        }
        if params.chunk_size == 0 {
            return Err(DatasetError::InvalidConfiguration(String::from(
                "chunk_size must be positive",
            )));
        }
        if !(params.ci_z.is_finite() && params.ci_z > 0.0) {
            return Err(DatasetError::InvalidConfiguration(format!(
                "ci_z must be a positive number, found {}",
                params.ci_z
            )));
        }
        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_is_required() {
        let result = SimulationConfig::default().build();
        assert!(matches!(result, Err(DatasetError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_defaults_applied() {
        let conf = SimulationConfig {
            jam_threshold: Some(20.0),
            random_seed: Some(42),
            ..Default::default()
        };
        let params = conf.build().expect("config should be valid");
        assert_eq!(params.num_runs, 5000);
        assert_eq!(params.ci_z, 1.96);
        assert_eq!(params.random_seed, Some(42));
        assert_eq!(params.jam_direction, JamDirection::Below);
    }

    #[test]
    fn test_jam_direction() {
        let mut params = SimulationParameters::new(20.0);
        assert!(params.is_jam(19.9));
        assert!(!params.is_jam(20.0));
        params.jam_direction = JamDirection::Above;
        assert!(params.is_jam(20.1));
        assert!(!params.is_jam(20.0));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let base = SimulationConfig {
            jam_threshold: Some(20.0),
            ..Default::default()
        };
        let zero_runs = SimulationConfig {
            num_runs: Some(0),
            ..base.clone()
        };
        assert!(zero_runs.build().is_err());
        let bad_z = SimulationConfig {
            ci_z: Some(-1.0),
            ..base
        };
        assert!(bad_z.build().is_err());
    }
}

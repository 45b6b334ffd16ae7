use serde::{Deserialize, Serialize};

use crate::table::DatasetError;

/// serializable configuration for weather scenario bucketing and the
/// conditional distribution estimate. builds to a [`ScenarioParameters`].
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ScenarioConfig {
    /// use the categorical weather label when it is recognized. defaults to true
    pub use_condition_label: Option<bool>,
    /// precipitation (mm) at or above which a record counts as precipitating. defaults to 0.1
    pub rain_min_mm: Option<f64>,
    /// precipitating records at or below this temperature (°C) are snow. defaults to 1.0
    pub snow_max_temperature_c: Option<f64>,
    /// dry records with visibility (m) below this are fog. defaults to 1000
    pub fog_max_visibility_m: Option<f64>,
    /// precipitation (mm) at or above which intensity is high. defaults to 10
    pub high_precipitation_mm: Option<f64>,
    /// scenarios with fewer records are excluded from simulation. defaults to 30
    pub min_scenario_samples: Option<usize>,
}

/// validated, immutable scenario bucketing parameters.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ScenarioParameters {
    pub use_condition_label: bool,
    pub rain_min_mm: f64,
    pub snow_max_temperature_c: f64,
    pub fog_max_visibility_m: f64,
    pub high_precipitation_mm: f64,
    pub min_scenario_samples: usize,
}

impl Default for ScenarioParameters {
    fn default() -> Self {
        Self {
            use_condition_label: true,
            rain_min_mm: 0.1,
            snow_max_temperature_c: 1.0,
            fog_max_visibility_m: 1000.0,
            high_precipitation_mm: 10.0,
            min_scenario_samples: 30,
        }
    }
}

impl ScenarioConfig {
    pub fn build(&self) -> Result<ScenarioParameters, DatasetError> {
        let defaults = ScenarioParameters::default();
        let params = ScenarioParameters {
            use_condition_label: self
                .use_condition_label
                .unwrap_or(defaults.use_condition_label),
            rain_min_mm: self.rain_min_mm.unwrap_or(defaults.rain_min_mm),
            snow_max_temperature_c: self
                .snow_max_temperature_c
                .unwrap_or(defaults.snow_max_temperature_c),
            fog_max_visibility_m: self
                .fog_max_visibility_m
                .unwrap_or(defaults.fog_max_visibility_m),
            high_precipitation_mm: self
                .high_precipitation_mm
                .unwrap_or(defaults.high_precipitation_mm),
            min_scenario_samples: self
                .min_scenario_samples
                .unwrap_or(defaults.min_scenario_samples),
        };
        let thresholds = [
            ("rain_min_mm", params.rain_min_mm),
            ("snow_max_temperature_c", params.snow_max_temperature_c),
            ("fog_max_visibility_m", params.fog_max_visibility_m),
            ("high_precipitation_mm", params.high_precipitation_mm),
        ];
        if let Some((name, value)) = thresholds.iter().find(|(_, v)| !v.is_finite()) {
            return Err(DatasetError::InvalidConfiguration(format!(
                "scenario threshold '{name}' must be finite, found {value}"
            )));
        }
        if params.rain_min_mm < 0.0 || params.high_precipitation_mm < 0.0 {
            return Err(DatasetError::InvalidConfiguration(String::from(
                "precipitation thresholds must be non-negative",
            )));
        }
        if params.min_scenario_samples < 2 {
            return Err(DatasetError::InvalidConfiguration(format!(
                "min_scenario_samples must be at least 2 to estimate a standard deviation, found {}",
                params.min_scenario_samples
            )));
        }
        Ok(params)
    }
}

use serde::{Deserialize, Serialize};

use crate::table::DatasetError;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RotationMethod {
    #[default]
    Varimax,
    Quartimax,
    None,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    /// iterated principal axis factoring
    #[default]
    PrincipalAxis,
    /// maximum likelihood
    #[serde(alias = "maximum_likelihood")]
    Ml,
}

/// serializable configuration for the factor analysis engine.
/// builds to a [`FactorParameters`].
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct FactorConfig {
    /// feature columns to analyze. defaults to the standard traffic/weather
    /// features present in the dataset.
    pub features: Option<Vec<String>>,
    /// eigenvalues above this are retained as factors. defaults to 1.0
    pub kaiser_threshold: Option<f64>,
    /// optional upper bound on the retained factor count
    pub max_factors: Option<usize>,
    /// varimax, quartimax or none. defaults to varimax
    pub rotation_method: Option<RotationMethod>,
    /// defaults to principal_axis
    pub extraction_method: Option<ExtractionMethod>,
    /// continue with a warning when adequacy checks fail. defaults to false
    pub proceed_on_inadequate: Option<bool>,
    /// minimum acceptable KMO. defaults to 0.6
    pub min_kmo: Option<f64>,
    /// Bartlett's test significance level. defaults to 0.05
    pub bartlett_alpha: Option<f64>,
    /// iteration cap for extraction and rotation. defaults to 500
    pub max_iterations: Option<usize>,
    /// convergence tolerance for extraction and rotation. defaults to 1e-6
    pub tolerance: Option<f64>,
}

/// validated, immutable factor analysis parameters.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FactorParameters {
    pub features: Option<Vec<String>>,
    pub kaiser_threshold: f64,
    pub max_factors: Option<usize>,
    pub rotation_method: RotationMethod,
    pub extraction_method: ExtractionMethod,
    pub proceed_on_inadequate: bool,
    pub min_kmo: f64,
    pub bartlett_alpha: f64,
    pub max_iterations: usize,
    pub tolerance: f64,
}

impl Default for FactorParameters {
    fn default() -> Self {
        Self {
            features: None,
            kaiser_threshold: 1.0,
            max_factors: None,
            rotation_method: RotationMethod::default(),
            extraction_method: ExtractionMethod::default(),
            proceed_on_inadequate: false,
            min_kmo: 0.6,
            bartlett_alpha: 0.05,
            max_iterations: 500,
            tolerance: 1e-6,
        }
    }
}

impl FactorConfig {
    pub fn build(&self) -> Result<FactorParameters, DatasetError> {
        let defaults = FactorParameters::default();
        let params = FactorParameters {
            features: self.features.clone(),
            kaiser_threshold: self.kaiser_threshold.unwrap_or(defaults.kaiser_threshold),
            max_factors: self.max_factors,
            rotation_method: self.rotation_method.unwrap_or(defaults.rotation_method),
            extraction_method: self.extraction_method.unwrap_or(defaults.extraction_method),
            proceed_on_inadequate: self
                .proceed_on_inadequate
                .unwrap_or(defaults.proceed_on_inadequate),
            min_kmo: self.min_kmo.unwrap_or(defaults.min_kmo),
            bartlett_alpha: self.bartlett_alpha.unwrap_or(defaults.bartlett_alpha),
            max_iterations: self.max_iterations.unwrap_or(defaults.max_iterations),
            tolerance: self.tolerance.unwrap_or(defaults.tolerance),
        };
        if !params.kaiser_threshold.is_finite() || params.kaiser_threshold < 0.0 {
            return Err(DatasetError::InvalidConfiguration(format!(
                "kaiser_threshold must be a non-negative number, found {}",
                params.kaiser_threshold
            )));
        }
        if params.max_factors == Some(0) {
            return Err(DatasetError::InvalidConfiguration(String::from(
                "max_factors must be positive when provided",
            )));
        }
        if !(0.0..=1.0).contains(&params.min_kmo) {
            return Err(DatasetError::InvalidConfiguration(format!(
                "min_kmo must be in [0, 1], found {}",
                params.min_kmo
            )));
        }
        if !(params.bartlett_alpha > 0.0 && params.bartlett_alpha < 1.0) {
            return Err(DatasetError::InvalidConfiguration(format!(
                "bartlett_alpha must be in (0, 1), found {}",
                params.bartlett_alpha
            )));
        }
        if params.max_iterations == 0 || !(params.tolerance > 0.0) {
            return Err(DatasetError::InvalidConfiguration(String::from(
                "max_iterations and tolerance must be positive",
            )));
        }
        Ok(params)
    }
}

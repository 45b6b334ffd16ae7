use std::path::Path;

use config::{Config, Environment, File};
use jamrisk_core::config::{
    EngineConfig, FactorConfig, InputConfig, ScenarioConfig, SimulationConfig,
};
use serde::de::DeserializeOwned;

use super::JamRiskAppError;

/// prefix of environment variables overriding configuration values, as in
/// `JAMRISK__SIMULATION__NUM_RUNS=10000`.
pub const ENV_PREFIX: &str = "JAMRISK";

/// loads the engine configuration from an optional TOML file with
/// environment variable overrides applied on top. missing sections use
/// their defaults.
pub fn load_engine_config(config_file: Option<&str>) -> Result<EngineConfig, JamRiskAppError> {
    let source_name = config_file.unwrap_or("environment");
    let mut builder = Config::builder();
    if let Some(file) = config_file {
        let filepath = Path::new(file);
        if !filepath.is_file() {
            return Err(JamRiskAppError::InvalidUserInput(format!(
                "configuration file '{file}' does not exist"
            )));
        }
        builder = builder.add_source(File::from(filepath));
    }
    let config = builder
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("factor.features"),
        )
        .build()
        .map_err(|e| {
            JamRiskAppError::InvalidUserInput(format!("file '{source_name}' produced error: {e}"))
        })?;

    let input = get_section::<InputConfig>(&config, "input", source_name)?;
    let scenario = get_section::<ScenarioConfig>(&config, "scenario", source_name)?;
    let simulation = get_section::<SimulationConfig>(&config, "simulation", source_name)?;
    let factor = get_section::<FactorConfig>(&config, "factor", source_name)?;
    Ok(EngineConfig {
        input,
        scenario,
        simulation,
        factor,
    })
}

fn get_section<T>(config: &Config, key: &str, source_name: &str) -> Result<T, JamRiskAppError>
where
    T: DeserializeOwned + Default,
{
    config
        .get::<Option<T>>(key)
        .map(Option::unwrap_or_default)
        .or_else(|e| match e {
            config::ConfigError::NotFound(_) => Ok(T::default()),
            other => Err(other),
        })
        .map_err(|e| {
            JamRiskAppError::InvalidUserInput(format!(
                "error reading '{key}' key in '{source_name}': {e}"
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use jamrisk_core::config::{ExtractionMethod, JamDirection};
    use std::{io::Write, path::PathBuf};

    #[test]
    fn test_example_configuration_builds() {
        let conf_path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .parent()
            .expect("test invariant failed: crate dir has no parent")
            .join("configuration")
            .join("jamrisk.toml");
        let conf = load_engine_config(conf_path.to_str()).expect("example config should load");
        let scenario = conf.scenario.build().expect("scenario section is valid");
        assert_eq!(scenario.min_scenario_samples, 30);
        let simulation = conf.simulation.build().expect("simulation section is valid");
        assert_eq!(simulation.random_seed, Some(42));
        assert_eq!(simulation.jam_threshold, 20.0);
        let factor = conf.factor.build().expect("factor section is valid");
        assert_eq!(factor.features.map(|f| f.len()), Some(9));
    }

    #[test]
    fn test_load_sections_from_file() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("test invariant failed: temp file");
        writeln!(
            file,
            r#"
[input]
path = "merged.csv"

[input.columns]
congestion_indicator = "vehicle_count"

[simulation]
num_runs = 2000
jam_threshold = 2500.0
jam_direction = "above"
random_seed = 7

[factor]
extraction_method = "ml"
features = ["vehicle_count", "rain_mm", "humidity"]
"#
        )
        .expect("test invariant failed: write config");
        let path = file
            .path()
            .to_str()
            .expect("test invariant failed: utf-8 path");
        let conf = load_engine_config(Some(path)).expect("config should load");
        assert_eq!(conf.input.path.as_deref(), Some("merged.csv"));
        assert_eq!(conf.input.columns.congestion_indicator, "vehicle_count");
        assert_eq!(conf.input.columns.precipitation, "rain_mm");
        assert_eq!(conf.simulation.num_runs, Some(2000));
        assert_eq!(conf.simulation.jam_direction, Some(JamDirection::Above));
        assert_eq!(conf.simulation.random_seed, Some(7));
        assert_eq!(conf.factor.extraction_method, Some(ExtractionMethod::Ml));
        assert_eq!(conf.factor.features.as_ref().map(Vec::len), Some(3));
        assert!(conf.scenario.min_scenario_samples.is_none());
    }

    #[test]
    fn test_missing_file_rejected() {
        let result = load_engine_config(Some("/definitely/not/here/jamrisk.toml"));
        assert!(matches!(result, Err(JamRiskAppError::InvalidUserInput(_))));
    }
}

use std::path::Path;

use clap::{Args, Parser, Subcommand};
use jamrisk_core::config::EngineConfig;
use serde::{Deserialize, Serialize};

use super::{load_engine_config, JamRiskAppError, Pipeline};

/// Weather-conditioned traffic congestion risk simulation and latent factor analysis
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct JamRiskApp {
    #[command(subcommand)]
    pub op: JamRiskOperation,
}

#[derive(Debug, Clone, Serialize, Deserialize, Subcommand)]
pub enum JamRiskOperation {
    /// estimate jam probabilities per weather scenario with a Monte Carlo simulation
    Simulate {
        #[command(flatten)]
        common: CommonArgs,
        #[command(flatten)]
        simulation: SimulationArgs,
    },
    /// extract latent drivers of congestion from the numeric traffic/weather features
    Factors {
        #[command(flatten)]
        common: CommonArgs,
        #[command(flatten)]
        factor: FactorArgs,
    },
    /// run the risk simulation and the factor analysis on the same dataset
    Run {
        #[command(flatten)]
        common: CommonArgs,
        #[command(flatten)]
        simulation: SimulationArgs,
        #[command(flatten)]
        factor: FactorArgs,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, Args)]
pub struct CommonArgs {
    /// TOML file with [input], [scenario], [simulation] and [factor] sections.
    /// values may also be set with JAMRISK__SECTION__KEY environment variables.
    #[arg(short, long)]
    pub config_file: Option<String>,

    /// merged traffic/weather dataset (.csv or .parquet). overrides input.path.
    #[arg(short, long)]
    pub input: Option<String>,

    /// location on disk to write output files. if not provided,
    /// use the current working directory.
    #[arg(short, long)]
    pub output_directory: Option<String>,

    /// replace output files left by a previous run.
    #[arg(long)]
    pub overwrite: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Args)]
pub struct SimulationArgs {
    /// random seed, overrides simulation.random_seed
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// draws per scenario, overrides simulation.num_runs
    #[arg(short = 'n', long)]
    pub runs: Option<usize>,

    /// congestion indicator value defining a jam, overrides simulation.jam_threshold
    #[arg(short, long, allow_hyphen_values(true))]
    pub threshold: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Args)]
pub struct FactorArgs {
    /// continue the factor analysis with a warning when adequacy checks fail
    #[arg(long)]
    pub proceed_on_inadequate: bool,
}

impl SimulationArgs {
    fn apply(&self, config: &mut EngineConfig) {
        if let Some(seed) = self.seed {
            config.simulation.random_seed = Some(seed);
        }
        if let Some(runs) = self.runs {
            config.simulation.num_runs = Some(runs);
        }
        if let Some(threshold) = self.threshold {
            config.simulation.jam_threshold = Some(threshold);
        }
    }
}

impl FactorArgs {
    fn apply(&self, config: &mut EngineConfig) {
        if self.proceed_on_inadequate {
            config.factor.proceed_on_inadequate = Some(true);
        }
    }
}

impl CommonArgs {
    /// loads the configuration and applies the command line overrides.
    fn load(&self) -> Result<EngineConfig, JamRiskAppError> {
        let mut config = load_engine_config(self.config_file.as_deref())?;
        if let Some(input) = &self.input {
            config.input.path = Some(input.clone());
        }
        Ok(config)
    }

    fn pipeline(&self, config: EngineConfig) -> Result<Pipeline, JamRiskAppError> {
        let outdir = match &self.output_directory {
            Some(out) => Path::new(out),
            None => Path::new(""),
        };
        Pipeline::new(config, outdir, self.overwrite)
    }
}

impl JamRiskOperation {
    pub fn run(&self) -> Result<(), JamRiskAppError> {
        match self {
            JamRiskOperation::Simulate { common, simulation } => {
                let mut config = common.load()?;
                simulation.apply(&mut config);
                common.pipeline(config)?.run(true, false)
            }
            JamRiskOperation::Factors { common, factor } => {
                let mut config = common.load()?;
                factor.apply(&mut config);
                common.pipeline(config)?.run(false, true)
            }
            JamRiskOperation::Run {
                common,
                simulation,
                factor,
            } => {
                let mut config = common.load()?;
                simulation.apply(&mut config);
                factor.apply(&mut config);
                common.pipeline(config)?.run(true, true)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_command() {
        let app = JamRiskApp::try_parse_from([
            "jamrisk",
            "run",
            "--config-file",
            "jamrisk.toml",
            "--input",
            "merged.csv",
            "--seed",
            "42",
            "--threshold",
            "20",
            "--proceed-on-inadequate",
        ])
        .expect("arguments should parse");
        match app.op {
            JamRiskOperation::Run {
                common,
                simulation,
                factor,
            } => {
                assert_eq!(common.config_file.as_deref(), Some("jamrisk.toml"));
                assert_eq!(common.input.as_deref(), Some("merged.csv"));
                assert!(!common.overwrite);
                assert_eq!(simulation.seed, Some(42));
                assert_eq!(simulation.threshold, Some(20.0));
                assert!(factor.proceed_on_inadequate);
            }
            _ => panic!("expected the run command"),
        }
    }

    #[test]
    fn test_overrides_applied() {
        let mut config = EngineConfig::default();
        config.simulation.num_runs = Some(100);
        let args = SimulationArgs {
            seed: Some(3),
            runs: None,
            threshold: Some(-1.5),
        };
        args.apply(&mut config);
        assert_eq!(config.simulation.random_seed, Some(3));
        assert_eq!(config.simulation.num_runs, Some(100));
        assert_eq!(config.simulation.jam_threshold, Some(-1.5));
    }
}

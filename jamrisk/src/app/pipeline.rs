use std::path::{Path, PathBuf};

use jamrisk_core::{
    config::{ColumnMapping, EngineConfig, FactorParameters, ScenarioParameters, SimulationParameters},
    model::ObservationSet,
    table::{read_table, DataTable},
};
use jamrisk_factor::FactorModel;
use jamrisk_risk::{
    scenario::{estimate_conditional_distributions, partition},
    simulation::{simulate, RiskReport},
};

use super::{
    publish::{self, EffectiveConfig, RunSummary},
    JamRiskAppError,
};

/// runs the congestion risk simulation on a merged dataset.
pub fn run_simulation(
    table: &DataTable,
    columns: &ColumnMapping,
    scenario: &ScenarioParameters,
    simulation: &SimulationParameters,
) -> Result<RiskReport, JamRiskAppError> {
    let observations = ObservationSet::from_table(table, columns)?;
    let partition = partition(&observations, scenario);
    let distributions = estimate_conditional_distributions(&observations, &partition, scenario)?;
    let report = simulate(&distributions, simulation)?;
    if let Some(top) = report.highest_risk() {
        log::info!(
            "highest jam probability: '{}' with p_jam={:.4}",
            top.scenario,
            top.p_jam
        );
    }
    Ok(report)
}

/// runs the factor analysis on a merged dataset.
pub fn run_factors(
    table: &DataTable,
    params: &FactorParameters,
) -> Result<FactorModel, JamRiskAppError> {
    let model = jamrisk_factor::fit_table(table, params)?;
    log::info!(
        "factor model with {} factors explains {:.1}% of the variance",
        model.n_factors,
        model.cumulative_variance.last().copied().unwrap_or_default() * 100.0
    );
    Ok(model)
}

/// results of one pipeline execution. a stage that was not requested is None.
#[derive(Debug)]
pub struct PipelineOutcome {
    pub risk: Option<Result<RiskReport, JamRiskAppError>>,
    pub factors: Option<Result<FactorModel, JamRiskAppError>>,
}

/// a loaded dataset together with the configuration and output location of
/// one command line invocation.
pub struct Pipeline {
    config: EngineConfig,
    input_path: PathBuf,
    table: DataTable,
    output_directory: PathBuf,
    overwrite: bool,
}

impl Pipeline {
    /// reads the dataset named by the input configuration.
    pub fn new(
        config: EngineConfig,
        output_directory: &Path,
        overwrite: bool,
    ) -> Result<Pipeline, JamRiskAppError> {
        let input_path = match &config.input.path {
            Some(path) => PathBuf::from(path),
            None => {
                return Err(JamRiskAppError::InvalidUserInput(String::from(
                    "no input dataset provided, set input.path or pass --input",
                )))
            }
        };
        let table = read_table(&input_path, config.input.format)?;
        Ok(Pipeline {
            config,
            input_path,
            table,
            output_directory: output_directory.to_path_buf(),
            overwrite,
        })
    }

    pub fn table(&self) -> &DataTable {
        &self.table
    }

    /// validates the configuration of the requested stages and runs them.
    /// when both are requested they run concurrently over the shared table.
    pub fn execute(
        &self,
        simulate: bool,
        factors: bool,
    ) -> Result<(PipelineOutcome, EffectiveConfig), JamRiskAppError> {
        let scenario_params = self.config.scenario.build()?;
        let simulation_params = if simulate {
            Some(self.config.simulation.build()?)
        } else {
            None
        };
        let factor_params = if factors {
            Some(self.config.factor.build()?)
        } else {
            None
        };

        let risk_stage = || {
            simulation_params.as_ref().map(|params| {
                run_simulation(
                    &self.table,
                    &self.config.input.columns,
                    &scenario_params,
                    params,
                )
            })
        };
        let factor_stage = || {
            factor_params
                .as_ref()
                .map(|params| run_factors(&self.table, params))
        };
        let (risk, factors) = rayon::join(risk_stage, factor_stage);

        let effective = EffectiveConfig {
            input: self.config.input.clone(),
            scenario: simulation_params.as_ref().map(|_| scenario_params.clone()),
            simulation: simulation_params.clone(),
            factor: factor_params.clone(),
        };
        Ok((PipelineOutcome { risk, factors }, effective))
    }

    /// runs the requested stages and publishes every result that was
    /// produced. fails with the first stage error after publishing.
    pub fn run(&self, simulate: bool, factors: bool) -> Result<(), JamRiskAppError> {
        let outdir = &self.output_directory;
        publish::create_dirs(outdir)?;
        publish::check_targets(outdir, &publish::output_files(simulate, factors), self.overwrite)?;

        let (outcome, effective) = self.execute(simulate, factors)?;
        let mut summary = RunSummary::new(
            &self.input_path,
            self.table.n_rows(),
            &self.config.input.columns.congestion_indicator,
        );
        let mut errors = vec![];

        match outcome.risk {
            Some(Ok(report)) => {
                summary.add_risk_report(&report);
                summary.add_file(publish::write_risk_report(&report, outdir, self.overwrite)?);
            }
            Some(Err(e)) => {
                log::error!("{e}");
                summary.errors.push(e.to_string());
                errors.push(e);
            }
            None => {}
        }
        match outcome.factors {
            Some(Ok(model)) => {
                summary.add_factor_model(&model);
                summary.add_file(publish::write_factor_loadings(&model, outdir, self.overwrite)?);
                summary.add_file(publish::write_scree(&model, outdir, self.overwrite)?);
                summary.add_file(publish::write_factor_diagnostics(
                    &model,
                    outdir,
                    self.overwrite,
                )?);
            }
            Some(Err(e)) => {
                log::error!("{e}");
                summary.errors.push(e.to_string());
                errors.push(e);
            }
            None => {}
        }
        summary.add_file(publish::write_effective_config(
            &effective,
            outdir,
            self.overwrite,
        )?);
        let summary_path = publish::write_run_summary(&mut summary, outdir, self.overwrite)?;
        log::info!("run summary written to '{}'", summary_path.display());

        match errors.into_iter().next() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

//! writes engine results as flat files for dashboard consumption.
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use itertools::Itertools;
use jamrisk_core::config::{
    ExtractionMethod, FactorParameters, InputConfig, RotationMethod, ScenarioParameters,
    SimulationParameters,
};
use jamrisk_factor::{adequacy::AdequacyDiagnostics, FactorModel, FactorWarning};
use jamrisk_risk::{scenario::RecordAudit, simulation::RiskReport};
use serde::{Deserialize, Serialize};

use super::JamRiskAppError;

pub const RISK_REPORT_FILENAME: &str = "risk_report.csv";
pub const FACTOR_LOADINGS_FILENAME: &str = "factor_loadings.csv";
pub const SCREE_FILENAME: &str = "scree.csv";
pub const FACTOR_DIAGNOSTICS_FILENAME: &str = "factor_diagnostics.json";
pub const RUN_SUMMARY_FILENAME: &str = "run_summary.json";
pub const EFFECTIVE_CONFIG_FILENAME: &str = "effective_config.toml";

/// the parameters actually used by a run, after defaults and overrides.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct EffectiveConfig {
    pub input: InputConfig,
    pub scenario: Option<ScenarioParameters>,
    pub simulation: Option<SimulationParameters>,
    pub factor: Option<FactorParameters>,
}

/// audit record of one command line invocation.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RunSummary {
    pub created_at: String,
    pub input_path: String,
    pub input_rows: usize,
    pub congestion_indicator: String,
    pub records: Option<RecordAudit>,
    pub simulated_scenarios: Option<usize>,
    pub excluded_scenarios: Option<usize>,
    /// user-provided seed, None for a non-reproducible run
    pub seed: Option<u64>,
    pub effective_seed: Option<u64>,
    pub reproducible: Option<bool>,
    pub factor_observations: Option<usize>,
    pub factor_dropped_rows: Option<usize>,
    pub n_factors: Option<usize>,
    pub factor_warnings: Vec<String>,
    pub files_written: Vec<String>,
    pub errors: Vec<String>,
}

/// factor model diagnostics published next to the loadings.
#[derive(Serialize, Debug)]
struct FactorDiagnostics<'a> {
    features: &'a [String],
    n_factors: usize,
    extraction_method: ExtractionMethod,
    rotation_method: RotationMethod,
    extraction_iterations: usize,
    rotation_iterations: usize,
    adequacy: &'a AdequacyDiagnostics,
    msa: Vec<FeatureMsa<'a>>,
    ss_loadings: &'a [f64],
    proportion_variance: &'a [f64],
    cumulative_variance: &'a [f64],
    n_observations: usize,
    dropped_rows: usize,
    warnings: &'a [FactorWarning],
    warning_messages: Vec<String>,
}

#[derive(Serialize, Debug)]
struct FeatureMsa<'a> {
    feature: &'a str,
    msa: f64,
}

impl RunSummary {
    pub fn new(input_path: &Path, input_rows: usize, congestion_indicator: &str) -> RunSummary {
        RunSummary {
            created_at: chrono::Local::now().to_rfc3339(),
            input_path: input_path.display().to_string(),
            input_rows,
            congestion_indicator: congestion_indicator.to_string(),
            records: None,
            simulated_scenarios: None,
            excluded_scenarios: None,
            seed: None,
            effective_seed: None,
            reproducible: None,
            factor_observations: None,
            factor_dropped_rows: None,
            n_factors: None,
            factor_warnings: vec![],
            files_written: vec![],
            errors: vec![],
        }
    }

    pub fn add_risk_report(&mut self, report: &RiskReport) {
        self.records = Some(report.records);
        self.simulated_scenarios = Some(report.risks.len());
        self.excluded_scenarios = Some(report.excluded.len());
        self.seed = report.seed;
        self.effective_seed = Some(report.effective_seed);
        self.reproducible = Some(report.is_reproducible());
    }

    pub fn add_factor_model(&mut self, model: &FactorModel) {
        self.factor_observations = Some(model.n_observations);
        self.factor_dropped_rows = Some(model.dropped_rows);
        self.n_factors = Some(model.n_factors);
        self.factor_warnings = model.warnings.iter().map(|w| w.to_string()).collect_vec();
    }

    pub fn add_file(&mut self, path: PathBuf) {
        self.files_written.push(path.display().to_string());
    }
}

/// names of the files written for the requested stages.
pub fn output_files(simulate: bool, factors: bool) -> Vec<&'static str> {
    let mut files = vec![];
    if simulate {
        files.push(RISK_REPORT_FILENAME);
    }
    if factors {
        files.extend([
            FACTOR_LOADINGS_FILENAME,
            SCREE_FILENAME,
            FACTOR_DIAGNOSTICS_FILENAME,
        ]);
    }
    files.extend([EFFECTIVE_CONFIG_FILENAME, RUN_SUMMARY_FILENAME]);
    files
}

/// helper function to "mkdir -p path" - make all directories along a path
pub fn create_dirs<P>(path: P) -> Result<(), JamRiskAppError>
where
    P: AsRef<Path>,
{
    let dirspath = path.as_ref();
    if dirspath.as_os_str().is_empty() || dirspath.is_dir() {
        return Ok(());
    }
    std::fs::create_dir_all(dirspath).map_err(|e| {
        let msg = format!(
            "error building output directory '{}': {e}",
            dirspath.display()
        );
        JamRiskAppError::InvalidUserInput(msg)
    })
}

/// fails when any of the files already exists and overwriting is not allowed.
pub fn check_targets(
    output_directory: &Path,
    filenames: &[&str],
    overwrite: bool,
) -> Result<(), JamRiskAppError> {
    if overwrite {
        return Ok(());
    }
    match filenames
        .iter()
        .map(|f| output_directory.join(f))
        .find(|p| p.exists())
    {
        Some(existing) => Err(JamRiskAppError::OutputExists(existing)),
        None => Ok(()),
    }
}

/// one row per weather scenario, excluded scenarios with empty numeric fields.
pub fn write_risk_report(
    report: &RiskReport,
    output_directory: &Path,
    overwrite: bool,
) -> Result<PathBuf, JamRiskAppError> {
    let (path, mut writer) = create_csv_writer(output_directory, RISK_REPORT_FILENAME, overwrite)?;
    for row in report.rows() {
        writer
            .serialize(&row)
            .map_err(|e| write_error(&path, format!("failed to write row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| write_error(&path, format!("failed to flush: {e}")))?;
    log::info!("wrote risk report to '{}'", path.display());
    Ok(path)
}

/// feature × factor loadings with communality and uniqueness columns.
pub fn write_factor_loadings(
    model: &FactorModel,
    output_directory: &Path,
    overwrite: bool,
) -> Result<PathBuf, JamRiskAppError> {
    let (path, mut writer) =
        create_csv_writer(output_directory, FACTOR_LOADINGS_FILENAME, overwrite)?;
    let header = std::iter::once(String::from("feature"))
        .chain(model.factor_names())
        .chain([String::from("communality"), String::from("uniqueness")])
        .collect_vec();
    writer
        .write_record(&header)
        .map_err(|e| write_error(&path, format!("failed to write header: {e}")))?;
    for row in model.loading_rows() {
        let record = std::iter::once(row.feature.to_string())
            .chain(row.loadings.iter().map(|l| l.to_string()))
            .chain([row.communality.to_string(), row.uniqueness.to_string()])
            .collect_vec();
        writer
            .write_record(&record)
            .map_err(|e| write_error(&path, format!("failed to write row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| write_error(&path, format!("failed to flush: {e}")))?;
    log::info!("wrote factor loadings to '{}'", path.display());
    Ok(path)
}

/// the eigenvalue sequence with explained variance, for a scree plot.
pub fn write_scree(
    model: &FactorModel,
    output_directory: &Path,
    overwrite: bool,
) -> Result<PathBuf, JamRiskAppError> {
    let (path, mut writer) = create_csv_writer(output_directory, SCREE_FILENAME, overwrite)?;
    for row in model.scree_rows() {
        writer
            .serialize(&row)
            .map_err(|e| write_error(&path, format!("failed to write row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| write_error(&path, format!("failed to flush: {e}")))?;
    Ok(path)
}

pub fn write_factor_diagnostics(
    model: &FactorModel,
    output_directory: &Path,
    overwrite: bool,
) -> Result<PathBuf, JamRiskAppError> {
    let diagnostics = FactorDiagnostics {
        features: &model.features,
        n_factors: model.n_factors,
        extraction_method: model.extraction_method,
        rotation_method: model.rotation_method,
        extraction_iterations: model.extraction_iterations,
        rotation_iterations: model.rotation_iterations,
        adequacy: &model.adequacy,
        msa: model
            .features
            .iter()
            .zip(model.adequacy.msa.iter())
            .map(|(feature, msa)| FeatureMsa { feature, msa: *msa })
            .collect_vec(),
        ss_loadings: &model.ss_loadings,
        proportion_variance: &model.proportion_variance,
        cumulative_variance: &model.cumulative_variance,
        n_observations: model.n_observations,
        dropped_rows: model.dropped_rows,
        warnings: &model.warnings,
        warning_messages: model.warnings.iter().map(|w| w.to_string()).collect_vec(),
    };
    write_json(&diagnostics, output_directory, FACTOR_DIAGNOSTICS_FILENAME, overwrite)
}

/// writes the summary, listing itself among the written files.
pub fn write_run_summary(
    summary: &mut RunSummary,
    output_directory: &Path,
    overwrite: bool,
) -> Result<PathBuf, JamRiskAppError> {
    summary.add_file(output_directory.join(RUN_SUMMARY_FILENAME));
    write_json(summary, output_directory, RUN_SUMMARY_FILENAME, overwrite)
}

pub fn write_effective_config(
    config: &EffectiveConfig,
    output_directory: &Path,
    overwrite: bool,
) -> Result<PathBuf, JamRiskAppError> {
    let path = target_path(output_directory, EFFECTIVE_CONFIG_FILENAME, overwrite)?;
    let contents = toml::to_string_pretty(config)
        .map_err(|e| write_error(&path, format!("failed to serialize configuration: {e}")))?;
    std::fs::write(&path, contents).map_err(|e| write_error(&path, e.to_string()))?;
    Ok(path)
}

fn write_json<T: Serialize>(
    value: &T,
    output_directory: &Path,
    filename: &str,
    overwrite: bool,
) -> Result<PathBuf, JamRiskAppError> {
    let path = target_path(output_directory, filename, overwrite)?;
    let file = File::create(&path).map_err(|e| write_error(&path, e.to_string()))?;
    serialize_json(value, BufWriter::new(file), &path)?;
    Ok(path)
}

fn serialize_json<T, W>(value: &T, mut writer: W, path: &Path) -> Result<(), JamRiskAppError>
where
    T: Serialize,
    W: Write,
{
    serde_json::to_writer_pretty(&mut writer, value)
        .map_err(|e| write_error(path, format!("failed to serialize: {e}")))?;
    writer
        .flush()
        .map_err(|e| write_error(path, format!("failed to flush: {e}")))
}

fn create_csv_writer(
    output_directory: &Path,
    filename: &str,
    overwrite: bool,
) -> Result<(PathBuf, csv::Writer<File>), JamRiskAppError> {
    let path = target_path(output_directory, filename, overwrite)?;
    let writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_path(&path)
        .map_err(|e| write_error(&path, e.to_string()))?;
    Ok((path, writer))
}

fn target_path(
    output_directory: &Path,
    filename: &str,
    overwrite: bool,
) -> Result<PathBuf, JamRiskAppError> {
    let path = output_directory.join(filename);
    if path.exists() && !overwrite {
        return Err(JamRiskAppError::OutputExists(path));
    }
    Ok(path)
}

fn write_error(path: &Path, message: String) -> JamRiskAppError {
    JamRiskAppError::WriteError {
        path: path.to_path_buf(),
        message,
    }
}

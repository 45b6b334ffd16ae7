mod config_loader;
mod error;
mod jamrisk_app;
mod pipeline;
pub mod publish;

pub use config_loader::load_engine_config;
pub use error::JamRiskAppError;
pub use jamrisk_app::{CommonArgs, FactorArgs, JamRiskApp, JamRiskOperation, SimulationArgs};
pub use pipeline::{run_factors, run_simulation, Pipeline, PipelineOutcome};

mod engine_config;
mod factor_config;
mod input_config;
mod scenario_config;
mod simulation_config;

pub use engine_config::EngineConfig;
pub use factor_config::{ExtractionMethod, FactorConfig, FactorParameters, RotationMethod};
pub use input_config::{ColumnMapping, InputConfig};
pub use scenario_config::{ScenarioConfig, ScenarioParameters};
pub use simulation_config::{JamDirection, SamplingMethod, SimulationConfig, SimulationParameters};

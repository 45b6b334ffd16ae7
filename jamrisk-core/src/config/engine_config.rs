use serde::{Deserialize, Serialize};

use super::{FactorConfig, InputConfig, ScenarioConfig, SimulationConfig};

/// complete engine configuration as read from a configuration file. each
/// section builds independently into the immutable parameters of one engine.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct EngineConfig {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub scenario: ScenarioConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub factor: FactorConfig,
}

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// coarse weather condition used to bucket observations.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    Clear,
    Rain,
    Snow,
    Fog,
}

/// precipitation intensity bucket.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum PrecipitationIntensity {
    Low,
    High,
}

/// a discrete weather bucket, the cartesian product of condition and
/// precipitation intensity. labels take the form `rain,high-precip`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WeatherScenario {
    pub condition: WeatherCondition,
    pub intensity: PrecipitationIntensity,
}

impl WeatherCondition {
    pub const ALL: [WeatherCondition; 4] = [
        WeatherCondition::Clear,
        WeatherCondition::Rain,
        WeatherCondition::Snow,
        WeatherCondition::Fog,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WeatherCondition::Clear => "clear",
            WeatherCondition::Rain => "rain",
            WeatherCondition::Snow => "snow",
            WeatherCondition::Fog => "fog",
        }
    }

    /// interprets a categorical weather label from the source dataset.
    /// unrecognized labels return None so the caller can fall back to the
    /// numeric bucketing rule.
    pub fn from_label(label: &str) -> Option<WeatherCondition> {
        match label.trim().to_ascii_lowercase().as_str() {
            "clear" | "sunny" | "cloudy" | "overcast" => Some(WeatherCondition::Clear),
            "rain" | "storm" | "drizzle" | "thunderstorm" | "showers" => {
                Some(WeatherCondition::Rain)
            }
            "snow" | "sleet" | "hail" => Some(WeatherCondition::Snow),
            "fog" | "mist" | "haze" => Some(WeatherCondition::Fog),
            _ => None,
        }
    }

    fn index(&self) -> usize {
        match self {
            WeatherCondition::Clear => 0,
            WeatherCondition::Rain => 1,
            WeatherCondition::Snow => 2,
            WeatherCondition::Fog => 3,
        }
    }
}

impl PrecipitationIntensity {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrecipitationIntensity::Low => "low",
            PrecipitationIntensity::High => "high",
        }
    }

    fn index(&self) -> usize {
        match self {
            PrecipitationIntensity::Low => 0,
            PrecipitationIntensity::High => 1,
        }
    }
}

impl WeatherScenario {
    pub const COUNT: usize = 8;

    pub fn new(condition: WeatherCondition, intensity: PrecipitationIntensity) -> Self {
        Self {
            condition,
            intensity,
        }
    }

    /// every scenario, in stable order.
    pub fn all() -> Vec<WeatherScenario> {
        WeatherCondition::ALL
            .iter()
            .flat_map(|c| {
                [PrecipitationIntensity::Low, PrecipitationIntensity::High]
                    .into_iter()
                    .map(|i| WeatherScenario::new(*c, i))
            })
            .collect()
    }

    /// position of this scenario in [`WeatherScenario::all`], stable across runs.
    pub fn index(&self) -> usize {
        self.condition.index() * 2 + self.intensity.index()
    }

    pub fn label(&self) -> String {
        format!("{},{}-precip", self.condition.as_str(), self.intensity.as_str())
    }
}

impl std::fmt::Display for WeatherScenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for WeatherScenario {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WeatherScenario::all()
            .into_iter()
            .find(|scenario| scenario.label() == s.trim())
            .ok_or_else(|| format!("unknown weather scenario label '{s}'"))
    }
}

use serde::{Deserialize, Serialize};

use crate::table::TableFormat;

/// configures where the merged dataset is read from and how its columns map
/// onto observation attributes.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct InputConfig {
    /// path to the merged dataset. may be overridden on the command line.
    pub path: Option<String>,
    /// file format. inferred from the file extension when not provided.
    pub format: Option<TableFormat>,
    #[serde(default)]
    pub columns: ColumnMapping,
}

/// names of the merged dataset columns holding each observation attribute.
/// defaults match the merged traffic/weather dataset layout.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ColumnMapping {
    pub timestamp: String,
    pub location_id: String,
    pub congestion_indicator: String,
    pub precipitation: String,
    pub temperature: String,
    pub visibility: String,
    pub wind_speed: String,
    /// optional categorical condition label column
    pub weather_condition: Option<String>,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            timestamp: String::from("date_time"),
            location_id: String::from("city"),
            congestion_indicator: String::from("avg_speed_kmh"),
            precipitation: String::from("rain_mm"),
            temperature: String::from("temperature_c"),
            visibility: String::from("visibility_weather"),
            wind_speed: String::from("wind_speed_kmh"),
            weather_condition: Some(String::from("weather_condition")),
        }
    }
}

impl ColumnMapping {
    /// columns that must be present in every input dataset.
    pub fn required(&self) -> Vec<&str> {
        vec![
            self.timestamp.as_str(),
            self.location_id.as_str(),
            self.congestion_indicator.as_str(),
            self.precipitation.as_str(),
            self.temperature.as_str(),
            self.visibility.as_str(),
            self.wind_speed.as_str(),
        ]
    }
}

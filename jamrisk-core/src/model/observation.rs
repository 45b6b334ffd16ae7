use itertools::izip;
use serde::{Deserialize, Serialize};

use crate::{
    config::ColumnMapping,
    table::{DataTable, DatasetError},
};

/// one row of the merged traffic/weather dataset.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ObservationRecord {
    pub timestamp: Option<String>,
    pub location_id: Option<String>,
    /// e.g. average speed, vehicle count or a 0/1 jam flag
    pub congestion_indicator: f64,
    pub precipitation_mm: Option<f64>,
    pub temperature_c: Option<f64>,
    pub visibility_m: Option<f64>,
    pub wind_speed_kmh: Option<f64>,
    /// categorical weather condition, when the dataset provides one
    pub weather_label: Option<String>,
}

/// the valid observation records of a dataset along with a count of the rows
/// that were rejected.
#[derive(Debug, Clone, Default)]
pub struct ObservationSet {
    pub records: Vec<ObservationRecord>,
    /// number of rows in the source table
    pub total_rows: usize,
    /// rows excluded because the congestion indicator was null
    pub missing_congestion_indicator: usize,
}

impl ObservationRecord {
    /// a record with only the attributes needed for scenario bucketing, used
    /// when building synthetic datasets.
    pub fn new(
        congestion_indicator: f64,
        precipitation_mm: Option<f64>,
        temperature_c: Option<f64>,
        visibility_m: Option<f64>,
        weather_label: Option<&str>,
    ) -> Self {
        Self {
            timestamp: None,
            location_id: None,
            congestion_indicator,
            precipitation_mm,
            temperature_c,
            visibility_m,
            wind_speed_kmh: None,
            weather_label: weather_label.map(String::from),
        }
    }
}

impl ObservationSet {
    pub fn new(records: Vec<ObservationRecord>) -> Self {
        Self {
            total_rows: records.len(),
            records,
            missing_congestion_indicator: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// validates the table against the input contract and extracts observation
    /// records. all required columns are checked before any row is read.
    pub fn from_table(
        table: &DataTable,
        columns: &ColumnMapping,
    ) -> Result<ObservationSet, DatasetError> {
        table.require_columns(&columns.required())?;

        let timestamps = table.labels(&columns.timestamp)?;
        let locations = table.labels(&columns.location_id)?;
        let indicator = finite_numeric(table, &columns.congestion_indicator)?;
        let precipitation = finite_numeric(table, &columns.precipitation)?;
        let temperature = finite_numeric(table, &columns.temperature)?;
        let visibility = finite_numeric(table, &columns.visibility)?;
        let wind_speed = finite_numeric(table, &columns.wind_speed)?;
        let labels = match &columns.weather_condition {
            Some(name) if table.has_column(name) => table.labels(name)?,
            Some(name) => {
                log::warn!(
                    "weather condition column '{name}' not found, scenarios will be derived from numeric thresholds only"
                );
                vec![None; table.n_rows()]
            }
            None => vec![None; table.n_rows()],
        };

        let mut result = ObservationSet {
            total_rows: table.n_rows(),
            ..Default::default()
        };
        let rows = izip!(
            timestamps,
            locations,
            indicator,
            precipitation,
            temperature,
            visibility,
            wind_speed,
            labels
        );
        for (timestamp, location_id, ind, precip, temp, vis, wind, label) in rows {
            match ind {
                None => result.missing_congestion_indicator += 1,
                Some(congestion_indicator) => result.records.push(ObservationRecord {
                    timestamp,
                    location_id,
                    congestion_indicator: *congestion_indicator,
                    precipitation_mm: *precip,
                    temperature_c: *temp,
                    visibility_m: *vis,
                    wind_speed_kmh: *wind,
                    weather_label: label,
                }),
            }
        }
        if result.missing_congestion_indicator > 0 {
            log::info!(
                "excluded {} of {} rows with a null '{}' value",
                result.missing_congestion_indicator,
                result.total_rows,
                columns.congestion_indicator
            );
        }
        Ok(result)
    }
}

/// numeric column access that also rejects infinite values.
fn finite_numeric<'a>(
    table: &'a DataTable,
    name: &str,
) -> Result<&'a [Option<f64>], DatasetError> {
    let values = table.numeric(name)?;
    match values
        .iter()
        .position(|v| v.map(|v| !v.is_finite()).unwrap_or(false))
    {
        Some(row) => Err(DatasetError::MalformedInput(format!(
            "column '{name}' holds a non-finite value at row {row}"
        ))),
        None => Ok(values),
    }
}

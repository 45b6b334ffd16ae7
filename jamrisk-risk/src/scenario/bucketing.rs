use itertools::Itertools;
use jamrisk_core::{
    config::ScenarioParameters,
    model::{
        ObservationRecord, ObservationSet, PrecipitationIntensity, WeatherCondition,
        WeatherScenario,
    },
};

use super::RecordAudit;

/// assignment of observation records to weather scenarios. buckets hold
/// indices into [`ObservationSet::records`], one bucket per scenario in
/// [`WeatherScenario::all`] order.
#[derive(Debug, Clone)]
pub struct ScenarioPartition {
    buckets: Vec<(WeatherScenario, Vec<usize>)>,
    pub audit: RecordAudit,
}

impl ScenarioPartition {
    pub fn buckets(&self) -> &[(WeatherScenario, Vec<usize>)] {
        &self.buckets
    }

    pub fn bucket(&self, scenario: &WeatherScenario) -> &[usize] {
        &self.buckets[scenario.index()].1
    }
}

/// determines the weather scenario of a record.
///
/// the condition comes from the categorical label when enabled and recognized,
/// otherwise from the numeric thresholds:
///   - precipitation >= `rain_min_mm`: snow when temperature <= `snow_max_temperature_c`, else rain
///   - otherwise fog when visibility < `fog_max_visibility_m`, else clear
///
/// intensity is high when precipitation >= `high_precipitation_mm`.
/// returns None when a value needed by the rule is null.
pub fn assign_scenario(
    record: &ObservationRecord,
    params: &ScenarioParameters,
) -> Option<WeatherScenario> {
    let precipitation = record.precipitation_mm?;
    let labelled = if params.use_condition_label {
        record
            .weather_label
            .as_deref()
            .and_then(WeatherCondition::from_label)
    } else {
        None
    };
    let condition = match labelled {
        Some(condition) => condition,
        None => numeric_condition(record, precipitation, params)?,
    };
    let intensity = if precipitation >= params.high_precipitation_mm {
        PrecipitationIntensity::High
    } else {
        PrecipitationIntensity::Low
    };
    Some(WeatherScenario::new(condition, intensity))
}

fn numeric_condition(
    record: &ObservationRecord,
    precipitation: f64,
    params: &ScenarioParameters,
) -> Option<WeatherCondition> {
    if precipitation >= params.rain_min_mm {
        if record.temperature_c? <= params.snow_max_temperature_c {
            Some(WeatherCondition::Snow)
        } else {
            Some(WeatherCondition::Rain)
        }
    } else if record.visibility_m? < params.fog_max_visibility_m {
        Some(WeatherCondition::Fog)
    } else {
        Some(WeatherCondition::Clear)
    }
}

/// partitions the observations into weather scenarios. every record lands in
/// exactly one bucket or is counted as undeterminable.
pub fn partition(observations: &ObservationSet, params: &ScenarioParameters) -> ScenarioPartition {
    let mut buckets = WeatherScenario::all()
        .into_iter()
        .map(|s| (s, vec![]))
        .collect_vec();
    let mut undeterminable = 0;
    for (idx, record) in observations.records.iter().enumerate() {
        match assign_scenario(record, params) {
            Some(scenario) => buckets[scenario.index()].1.push(idx),
            None => undeterminable += 1,
        }
    }
    if undeterminable > 0 {
        log::warn!(
            "{undeterminable} of {} records excluded: weather scenario could not be determined",
            observations.len()
        );
    }
    let audit = RecordAudit {
        total_rows: observations.total_rows,
        missing_congestion_indicator: observations.missing_congestion_indicator,
        undeterminable_scenario: undeterminable,
        assigned: observations.len() - undeterminable,
    };
    ScenarioPartition { buckets, audit }
}

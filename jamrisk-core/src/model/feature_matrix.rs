use itertools::Itertools;

use crate::table::{DataTable, DatasetError};

/// numeric features considered for factor analysis when the user does not
/// select any. features absent from the dataset are skipped.
pub const DEFAULT_FEATURES: [&str; 9] = [
    "vehicle_count",
    "avg_speed_kmh",
    "accident_count",
    "temperature_c",
    "humidity",
    "rain_mm",
    "wind_speed_kmh",
    "visibility_weather",
    "air_pressure_hpa",
];

/// dense observation × feature matrix of raw (unstandardized) values,
/// stored column-major. rows with a null in any selected feature are dropped
/// when built from a table.
#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    names: Vec<String>,
    n_rows: usize,
    values: Vec<f64>,
    dropped_rows: usize,
}

impl FeatureMatrix {
    /// builds a matrix from complete columns of equal length.
    pub fn new(names: Vec<String>, columns: Vec<Vec<f64>>) -> Result<FeatureMatrix, DatasetError> {
        if names.len() != columns.len() {
            return Err(DatasetError::MalformedInput(format!(
                "{} feature names given for {} columns",
                names.len(),
                columns.len()
            )));
        }
        if let Some(dup) = names.iter().duplicates().next() {
            return Err(DatasetError::MalformedInput(format!(
                "feature '{dup}' selected more than once"
            )));
        }
        let n_rows = columns.first().map(Vec::len).unwrap_or_default();
        if let Some((name, col)) = names.iter().zip(columns.iter()).find(|(_, c)| c.len() != n_rows) {
            return Err(DatasetError::MalformedInput(format!(
                "feature '{name}' has {} rows, expected {n_rows}",
                col.len()
            )));
        }
        Ok(FeatureMatrix {
            names,
            n_rows,
            values: columns.into_iter().flatten().collect_vec(),
            dropped_rows: 0,
        })
    }

    /// selects numeric feature columns from the table. `requested` features
    /// must all exist; when None, the [`DEFAULT_FEATURES`] present in the
    /// table are used.
    pub fn from_table(
        table: &DataTable,
        requested: Option<&[String]>,
    ) -> Result<FeatureMatrix, DatasetError> {
        let names: Vec<String> = match requested {
            Some(features) => {
                let as_str = features.iter().map(String::as_str).collect_vec();
                table.require_columns(&as_str)?;
                features.to_vec()
            }
            None => {
                let (present, absent): (Vec<&str>, Vec<&str>) = DEFAULT_FEATURES
                    .into_iter()
                    .partition(|f| table.has_column(f));
                if !absent.is_empty() {
                    log::warn!(
                        "default factor features not found in dataset and skipped: [{}]",
                        absent.iter().join(", ")
                    );
                }
                present.into_iter().map(String::from).collect_vec()
            }
        };

        let source = names
            .iter()
            .map(|n| table.numeric(n))
            .collect::<Result<Vec<_>, _>>()?;

        let complete_rows = (0..table.n_rows())
            .filter(|row| source.iter().all(|col| col[*row].is_some()))
            .collect_vec();
        let dropped_rows = table.n_rows() - complete_rows.len();
        if dropped_rows > 0 {
            log::info!(
                "dropped {dropped_rows} of {} rows with null feature values",
                table.n_rows()
            );
        }
        let columns = source
            .iter()
            .map(|col| {
                complete_rows
                    .iter()
                    .filter_map(|row| col[*row])
                    .collect_vec()
            })
            .collect_vec();
        let mut matrix = FeatureMatrix::new(names, columns)?;
        matrix.dropped_rows = dropped_rows;
        Ok(matrix)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_features(&self) -> usize {
        self.names.len()
    }

    /// rows dropped from the source table due to null values
    pub fn dropped_rows(&self) -> usize {
        self.dropped_rows
    }

    pub fn column(&self, index: usize) -> &[f64] {
        let start = index * self.n_rows;
        &self.values[start..start + self.n_rows]
    }

    /// all values, column after column.
    pub fn column_major(&self) -> &[f64] {
        &self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Column;

    #[test]
    fn test_default_features_drop_incomplete_rows() {
        let table = DataTable::from_columns(vec![
            ("vehicle_count", Column::Numeric(vec![Some(1200.0), Some(3100.0), None])),
            ("avg_speed_kmh", Column::Numeric(vec![Some(55.0), Some(21.0), Some(40.0)])),
            ("rain_mm", Column::Numeric(vec![Some(0.0), Some(12.0), Some(3.0)])),
            ("city", Column::Text(vec![Some(String::from("London")); 3])),
        ])
        .expect("test invariant failed: table should build");
        let matrix = FeatureMatrix::from_table(&table, None).expect("matrix should build");
        assert_eq!(matrix.names(), &["vehicle_count", "avg_speed_kmh", "rain_mm"]);
        assert_eq!(matrix.n_rows(), 2);
        assert_eq!(matrix.dropped_rows(), 1);
        assert_eq!(matrix.column(1), &[55.0, 21.0]);
    }

    #[test]
    fn test_requested_feature_must_exist() {
        let table = DataTable::from_columns(vec![(
            "rain_mm",
            Column::Numeric(vec![Some(0.0)]),
        )])
        .expect("test invariant failed: table should build");
        let requested = vec![String::from("rain_mm"), String::from("humidity")];
        let result = FeatureMatrix::from_table(&table, Some(requested.as_slice()));
        assert!(matches!(result, Err(DatasetError::MalformedInput(_))));
    }
}

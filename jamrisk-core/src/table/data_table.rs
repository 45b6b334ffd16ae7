use indexmap::IndexMap;
use itertools::Itertools;

use super::DatasetError;

/// cell tokens treated as missing values, compared case-insensitively.
pub const NULL_TOKENS: [&str; 5] = ["", "na", "nan", "null", "none"];

/// a single column of the merged dataset. numeric columns are stored as
/// f64 regardless of their integer/float origin.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Numeric(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Numeric(v) => v.len(),
            Column::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// builds a column from raw text cells, producing a numeric column
    /// when every non-null cell parses as a number.
    pub fn from_raw_cells(cells: Vec<String>) -> Column {
        let parsed = cells
            .iter()
            .map(|c| {
                if is_null_token(c) {
                    Ok(None)
                } else {
                    c.trim().parse::<f64>().map(Some)
                }
            })
            .collect::<Result<Vec<_>, _>>();
        match parsed {
            Ok(values) => Column::Numeric(values),
            Err(_) => Column::Text(
                cells
                    .into_iter()
                    .map(|c| if is_null_token(&c) { None } else { Some(c) })
                    .collect_vec(),
            ),
        }
    }
}

pub fn is_null_token(cell: &str) -> bool {
    let trimmed = cell.trim();
    NULL_TOKENS.iter().any(|t| trimmed.eq_ignore_ascii_case(t))
}

/// column-oriented, in-memory view of the merged traffic/weather dataset.
#[derive(Debug, Clone, Default)]
pub struct DataTable {
    n_rows: usize,
    columns: IndexMap<String, Column>,
}

impl DataTable {
    /// creates a table, failing if the columns are of unequal length.
    pub fn new(columns: IndexMap<String, Column>) -> Result<DataTable, DatasetError> {
        let lengths = columns.values().map(Column::len).unique().collect_vec();
        match lengths.as_slice() {
            [] => Ok(DataTable::default()),
            [n_rows] => Ok(DataTable {
                n_rows: *n_rows,
                columns,
            }),
            _ => {
                let described = columns
                    .iter()
                    .map(|(name, col)| format!("{name}={}", col.len()))
                    .join(", ");
                Err(DatasetError::MalformedInput(format!(
                    "columns have unequal lengths: {described}"
                )))
            }
        }
    }

    pub fn from_columns<S>(columns: Vec<(S, Column)>) -> Result<DataTable, DatasetError>
    where
        S: Into<String>,
    {
        let mut map = IndexMap::new();
        for (name, column) in columns {
            let name: String = name.into();
            if map.insert(name.clone(), column).is_some() {
                return Err(DatasetError::MalformedInput(format!(
                    "duplicate column '{name}'"
                )));
            }
        }
        DataTable::new(map)
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.keys().map(String::as_str).collect_vec()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    /// fails with a single error listing every missing column.
    pub fn require_columns(&self, names: &[&str]) -> Result<(), DatasetError> {
        let missing = names
            .iter()
            .filter(|n| !self.columns.contains_key(**n))
            .collect_vec();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(DatasetError::MalformedInput(format!(
                "required columns missing from dataset: [{}]. available columns: [{}]",
                missing.iter().join(", "),
                self.columns.keys().join(", ")
            )))
        }
    }

    /// access a column that must hold numeric values.
    pub fn numeric(&self, name: &str) -> Result<&[Option<f64>], DatasetError> {
        match self.columns.get(name) {
            Some(Column::Numeric(values)) => Ok(values),
            Some(Column::Text(values)) => {
                let (row, example) = values
                    .iter()
                    .enumerate()
                    .find_map(|(i, v)| v.as_ref().map(|v| (i, v.clone())))
                    .unwrap_or_default();
                Err(DatasetError::MalformedInput(format!(
                    "column '{name}' must be numeric but row {row} holds '{example}'"
                )))
            }
            None => Err(DatasetError::MalformedInput(format!(
                "required numeric column '{name}' missing from dataset"
            ))),
        }
    }

    /// access a column as labels. numeric columns are rendered as text so that
    /// identifiers stored as integers can still be used as labels.
    pub fn labels(&self, name: &str) -> Result<Vec<Option<String>>, DatasetError> {
        match self.columns.get(name) {
            Some(Column::Text(values)) => Ok(values.clone()),
            Some(Column::Numeric(values)) => Ok(values
                .iter()
                .map(|v| v.map(|v| v.to_string()))
                .collect_vec()),
            None => Err(DatasetError::MalformedInput(format!(
                "required column '{name}' missing from dataset"
            ))),
        }
    }
}

use std::path::Path;

use indexmap::IndexMap;
use itertools::Itertools;
use kdam::tqdm;

use super::{Column, DataTable, DatasetError};

/// reads a CSV file with a header row into a [`DataTable`]. column types are
/// inferred after reading: a column is numeric when every non-null cell parses.
pub fn read_csv(path: &Path) -> Result<DataTable, DatasetError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_path(path)
        .map_err(|e| DatasetError::ReadError {
            path: path.to_owned(),
            message: e.to_string(),
        })?;
    let headers = reader
        .headers()
        .map_err(|e| DatasetError::ReadError {
            path: path.to_owned(),
            message: format!("failed reading header row: {e}"),
        })?
        .iter()
        .map(String::from)
        .collect_vec();
    if let Some(dup) = headers.iter().duplicates().next() {
        return Err(DatasetError::MalformedInput(format!(
            "duplicate column '{dup}' in header of '{}'",
            path.display()
        )));
    }

    let mut cells: Vec<Vec<String>> = vec![vec![]; headers.len()];
    let rows = tqdm!(reader.records(), desc = "read merged dataset");
    for (row_idx, row) in rows.enumerate() {
        let record = row.map_err(|e| DatasetError::ReadError {
            path: path.to_owned(),
            message: format!("failed reading row {row_idx}: {e}"),
        })?;
        if record.len() != headers.len() {
            return Err(DatasetError::MalformedInput(format!(
                "row {row_idx} has {} fields but header has {}",
                record.len(),
                headers.len()
            )));
        }
        for (col, value) in cells.iter_mut().zip(record.iter()) {
            col.push(value.to_string());
        }
    }
    eprintln!();

    let columns: IndexMap<String, Column> = headers
        .into_iter()
        .zip(cells)
        .map(|(name, col)| (name, Column::from_raw_cells(col)))
        .collect();
    DataTable::new(columns)
}

mod csv_source;
mod data_table;
mod error;
mod parquet_source;
mod table_format;

pub use data_table::{Column, DataTable};
pub use error::DatasetError;
pub use table_format::TableFormat;

use std::path::Path;

/// reads a merged traffic/weather dataset from disk. when no format is given,
/// the format is inferred from the file extension.
pub fn read_table(path: &Path, format: Option<TableFormat>) -> Result<DataTable, DatasetError> {
    let format = match format {
        Some(f) => f,
        None => TableFormat::try_from(path)?,
    };
    log::info!("reading {format} dataset from '{}'", path.display());
    let table = match format {
        TableFormat::Csv => csv_source::read_csv(path)?,
        TableFormat::Parquet => parquet_source::read_parquet(path)?,
    };
    log::info!(
        "read {} rows with {} columns",
        table.n_rows(),
        table.column_names().len()
    );
    Ok(table)
}

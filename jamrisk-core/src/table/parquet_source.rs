use std::{fs::File, path::Path};

use arrow::{
    array::{Array, ArrayRef, AsArray, RecordBatch},
    compute::cast,
    datatypes::{DataType, Float64Type},
    record_batch::RecordBatchReader,
};
use indexmap::IndexMap;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::{Column, DataTable, DatasetError};

/// reads a local Parquet file into a [`DataTable`]. numeric and boolean arrow
/// columns become numeric columns; every other type is rendered as text.
pub fn read_parquet(path: &Path) -> Result<DataTable, DatasetError> {
    let file = File::open(path).map_err(|e| DatasetError::ReadError {
        path: path.to_owned(),
        message: e.to_string(),
    })?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)
        .map_err(|e| DatasetError::ReadError {
            path: path.to_owned(),
            message: format!("failed to create ArrowBuilder instance: {e}"),
        })?
        .build()
        .map_err(|e| DatasetError::ReadError {
            path: path.to_owned(),
            message: format!("failed to create Parquet reader: {e}"),
        })?;

    let schema = reader.schema();
    let mut columns: IndexMap<String, Column> = schema
        .fields()
        .iter()
        .map(|f| {
            let column = if is_numeric_type(f.data_type()) {
                Column::Numeric(vec![])
            } else {
                Column::Text(vec![])
            };
            (f.name().clone(), column)
        })
        .collect();

    for batch in reader {
        let batch = batch.map_err(|e| DatasetError::ReadError {
            path: path.to_owned(),
            message: format!("failed to retrieve record batch: {e}"),
        })?;
        append_batch(&batch, &mut columns)?;
    }
    DataTable::new(columns)
}

fn is_numeric_type(data_type: &DataType) -> bool {
    data_type.is_numeric() || matches!(data_type, DataType::Boolean)
}

fn append_batch(
    batch: &RecordBatch,
    columns: &mut IndexMap<String, Column>,
) -> Result<(), DatasetError> {
    let schema = batch.schema();
    for (field, array) in schema.fields().iter().zip(batch.columns()) {
        let column = columns.get_mut(field.name()).ok_or_else(|| {
            DatasetError::MalformedInput(format!(
                "record batch column '{}' not found in file schema",
                field.name()
            ))
        })?;
        match column {
            Column::Numeric(values) => {
                let casted = cast_column(field.name(), array, &DataType::Float64)?;
                let floats = casted.as_primitive::<Float64Type>();
                values.extend(floats.iter());
            }
            Column::Text(values) => {
                let casted = cast_column(field.name(), array, &DataType::Utf8)?;
                let strings = casted.as_string::<i32>();
                values.extend(strings.iter().map(|s| s.map(String::from)));
            }
        }
    }
    Ok(())
}

fn cast_column(name: &str, array: &ArrayRef, to: &DataType) -> Result<ArrayRef, DatasetError> {
    cast(array, to).map_err(|e| {
        DatasetError::MalformedInput(format!(
            "column '{name}' of type {} cannot be read as {to}: {e}",
            array.data_type()
        ))
    })
}

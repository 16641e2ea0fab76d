//! CSV loading and writing for datasets.

use crate::data::dataset::Dataset;
use crate::data::schema::{ColumnType, infer_column_type};
use crate::error::MlError;
use serde_json::Value;
use std::path::Path;

/// Raw cell texts treated as missing values.
const NULL_MARKERS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "NULL", "null", "None", "<NA>",
];

fn is_null_marker(raw: &str) -> bool {
    NULL_MARKERS.contains(&raw.trim())
}

/// Read a CSV file with a header row into a typed [`Dataset`].
///
/// Column types are inferred per column (see [`infer_column_type`]).
pub fn read_csv(path: &Path) -> Result<Dataset, MlError> {
    let input_err = |source: csv::Error| MlError::Input {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(input_err)?;

    let columns: Vec<String> = reader
        .headers()
        .map_err(input_err)?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut raw_rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record.map_err(input_err)?;
        raw_rows.push(record.iter().map(str::to_string).collect());
    }

    let types: Vec<Option<ColumnType>> = (0..columns.len())
        .map(|col| {
            let values: Vec<&str> = raw_rows
                .iter()
                .map(|row| row[col].as_str())
                .filter(|raw| !is_null_marker(raw))
                .collect();
            infer_column_type(&values)
        })
        .collect();

    let rows = raw_rows
        .into_iter()
        .map(|row| {
            row.into_iter()
                .zip(&types)
                .map(|(raw, dtype)| convert_cell(raw, *dtype))
                .collect()
        })
        .collect();

    let dataset = Dataset::new(columns, rows)?;
    tracing::debug!(
        path = %path.display(),
        rows = dataset.row_count(),
        columns = dataset.column_count(),
        "Loaded CSV"
    );
    Ok(dataset)
}

fn convert_cell(raw: String, dtype: Option<ColumnType>) -> Value {
    if is_null_marker(&raw) {
        return Value::Null;
    }
    match dtype {
        Some(ColumnType::Integer) => raw
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or(Value::String(raw)),
        Some(ColumnType::Float) => raw
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::String(raw)),
        Some(ColumnType::Boolean) => Value::Bool(raw.eq_ignore_ascii_case("true")),
        _ => Value::String(raw),
    }
}

fn render_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        other => other.to_string(),
    }
}

/// Serialize a dataset to CSV bytes: header first, no index column, nulls empty.
pub fn to_csv_bytes(dataset: &Dataset) -> Result<Vec<u8>, MlError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(dataset.columns())?;
    for row in dataset.rows() {
        writer.write_record(row.iter().map(render_cell))?;
    }
    writer
        .into_inner()
        .map_err(|e| MlError::dataset(format!("Failed to flush CSV buffer: {e}")))
}

/// Atomically write a dataset to `path`.
pub fn write_csv(dataset: &Dataset, path: &Path) -> Result<(), MlError> {
    let bytes = to_csv_bytes(dataset)?;
    jobprep_core::persistence::atomic_write(path, &bytes)?;
    tracing::debug!(
        path = %path.display(),
        rows = dataset.row_count(),
        columns = dataset.column_count(),
        "Wrote CSV"
    );
    Ok(())
}

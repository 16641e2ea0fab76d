//! Date/time decomposition into integer component columns.

use crate::data::dataset::Dataset;
use crate::data::dates;
use crate::error::MlError;
use chrono::{Datelike, NaiveDateTime, Timelike};
use serde_json::Value;

/// Components extracted from a date/time, in column order.
pub const DATETIME_PARTS: [&str; 6] = ["year", "month", "day", "hour", "minute", "second"];

/// Names of the six derived columns for `field`.
///
/// A `date_`-prefixed field keeps its suffix (`date_of_job_post` becomes
/// `year_of_job_post`, ...); any other field gets `<field>_<part>`.
pub fn derived_column_names(field: &str) -> [String; 6] {
    DATETIME_PARTS.map(|part| match field.strip_prefix("date_") {
        Some(suffix) if !suffix.is_empty() => format!("{part}_{suffix}"),
        _ => format!("{field}_{part}"),
    })
}

/// Split a date/time into `[year, month, day, hour, minute, second]`.
pub fn decompose(dt: &NaiveDateTime) -> [i64; 6] {
    [
        i64::from(dt.year()),
        i64::from(dt.month()),
        i64::from(dt.day()),
        i64::from(dt.hour()),
        i64::from(dt.minute()),
        i64::from(dt.second()),
    ]
}

/// Outcome of decomposing one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecomposeSummary {
    pub parsed: usize,
    /// Non-null values that did not parse; their six parts are null.
    pub coercion_failures: usize,
}

/// Append the six component columns of `field`. The original column stays.
pub fn decompose_column(dataset: &mut Dataset, field: &str) -> Result<DecomposeSummary, MlError> {
    let idx = dataset
        .column_index(field)
        .ok_or_else(|| MlError::dataset(format!("date column '{field}' not found")))?;

    let mut summary = DecomposeSummary {
        parsed: 0,
        coercion_failures: 0,
    };
    let mut parts: [Vec<Value>; 6] = Default::default();
    for row in dataset.rows() {
        let cell = &row[idx];
        match dates::parse_cell(cell) {
            Some(dt) => {
                summary.parsed += 1;
                for (column, value) in parts.iter_mut().zip(decompose(&dt)) {
                    column.push(Value::from(value));
                }
            }
            None => {
                if !cell.is_null() {
                    summary.coercion_failures += 1;
                }
                for column in parts.iter_mut() {
                    column.push(Value::Null);
                }
            }
        }
    }

    for (name, values) in derived_column_names(field).iter().zip(parts) {
        dataset.set_column(name, values)?;
    }
    if summary.coercion_failures > 0 {
        tracing::warn!(
            field,
            failures = summary.coercion_failures,
            "Unparsable date values decomposed to null"
        );
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_derived_names() {
        assert_eq!(
            derived_column_names("date_of_job_post"),
            [
                "year_of_job_post",
                "month_of_job_post",
                "day_of_job_post",
                "hour_of_job_post",
                "minute_of_job_post",
                "second_of_job_post",
            ]
            .map(String::from)
        );
        assert_eq!(derived_column_names("posted")[0], "posted_year");
        assert_eq!(derived_column_names("date_")[5], "date__second");
    }

    #[test]
    fn test_decompose_column() {
        let mut ds = Dataset::new(
            vec!["date_of_job_post".into()],
            vec![
                vec![json!("2024-03-05 14:30:09")],
                vec![json!("not a date")],
                vec![Value::Null],
            ],
        )
        .unwrap();

        let summary = decompose_column(&mut ds, "date_of_job_post").unwrap();
        assert_eq!(summary.parsed, 1);
        assert_eq!(summary.coercion_failures, 1);
        assert_eq!(ds.column_count(), 7);
        assert_eq!(ds.get(0, "year_of_job_post"), Some(&json!(2024)));
        assert_eq!(ds.get(0, "second_of_job_post"), Some(&json!(9)));
        assert_eq!(ds.get(1, "month_of_job_post"), Some(&Value::Null));
        assert_eq!(ds.get(2, "hour_of_job_post"), Some(&Value::Null));
        assert_eq!(ds.get(0, "date_of_job_post"), Some(&json!("2024-03-05 14:30:09")));
    }

    #[test]
    fn test_missing_column() {
        let mut ds = Dataset::new(vec!["a".into()], vec![]).unwrap();
        assert!(decompose_column(&mut ds, "date_of_job_post").is_err());
    }
}

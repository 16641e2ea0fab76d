//! In-memory tabular dataset.

use crate::error::MlError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An ordered table of rows sharing one column list.
///
/// Cells are `serde_json::Value`s so checks can inspect the runtime type a
/// value was loaded as (string, number, boolean or null).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Dataset {
    /// Build a dataset, checking that every row has one cell per column.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self, MlError> {
        if let Some((idx, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != columns.len())
        {
            return Err(MlError::dataset(format!(
                "row {idx} has {} cells, expected {}",
                row.len(),
                columns.len()
            )));
        }
        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Cell at `(row, column)`.
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }

    /// All values of a column, in row order.
    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|row| &row[idx]).collect())
    }

    fn require_column(&self, name: &str) -> Result<usize, MlError> {
        self.column_index(name)
            .ok_or_else(|| MlError::dataset(format!("column '{name}' not found")))
    }

    /// Append a column, or overwrite it if the name already exists.
    pub fn set_column(&mut self, name: &str, values: Vec<Value>) -> Result<(), MlError> {
        if values.len() != self.rows.len() {
            return Err(MlError::dataset(format!(
                "column '{name}' has {} values, dataset has {} rows",
                values.len(),
                self.rows.len()
            )));
        }
        match self.column_index(name) {
            Some(idx) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[idx] = value;
                }
            }
            None => {
                self.columns.push(name.to_string());
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
        Ok(())
    }

    /// Replace every cell of a column with `f(cell)`.
    pub fn map_column<F>(&mut self, name: &str, mut f: F) -> Result<(), MlError>
    where
        F: FnMut(&Value) -> Value,
    {
        let idx = self.require_column(name)?;
        for row in &mut self.rows {
            let mapped = f(&row[idx]);
            row[idx] = mapped;
        }
        Ok(())
    }

    /// Remove a column. Returns `false` if it did not exist.
    pub fn drop_column(&mut self, name: &str) -> bool {
        let Some(idx) = self.column_index(name) else {
            return false;
        };
        self.columns.remove(idx);
        for row in &mut self.rows {
            row.remove(idx);
        }
        true
    }

    /// Keep only rows for which `keep(index, row)` is true; returns rows removed.
    pub fn retain_rows<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(usize, &[Value]) -> bool,
    {
        let before = self.rows.len();
        let mut idx = 0;
        self.rows.retain(|row| {
            let kept = keep(idx, row);
            idx += 1;
            kept
        });
        before - self.rows.len()
    }

    /// New dataset with the rows at `indices`, in that order.
    pub fn take_rows(&self, indices: &[usize]) -> Result<Dataset, MlError> {
        let mut rows = Vec::with_capacity(indices.len());
        for &i in indices {
            let row = self
                .rows
                .get(i)
                .ok_or_else(|| MlError::dataset(format!("row index {i} out of bounds")))?;
            rows.push(row.clone());
        }
        Ok(Dataset {
            columns: self.columns.clone(),
            rows,
        })
    }

    /// `(rows, columns)`, the way shapes are reported in logs.
    pub fn shape(&self) -> (usize, usize) {
        (self.row_count(), self.column_count())
    }
}

/// Render a cell as the text used for keys and categorical codes.
pub fn cell_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(true) => Some("True".to_string()),
        Value::Bool(false) => Some("False".to_string()),
        other => Some(other.to_string()),
    }
}

/// Name of a cell's runtime type, for log messages.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Dataset {
        Dataset::new(
            vec!["a".into(), "b".into()],
            vec![vec![json!(1), json!("x")], vec![json!(2), Value::Null]],
        )
        .unwrap()
    }

    #[test]
    fn test_new_rejects_ragged_rows() {
        let err = Dataset::new(vec!["a".into()], vec![vec![json!(1), json!(2)]]).unwrap_err();
        assert!(err.to_string().contains("row 0 has 2 cells"));
    }

    #[test]
    fn test_set_column_appends_and_overwrites() {
        let mut ds = sample();
        ds.set_column("c", vec![json!(true), json!(false)]).unwrap();
        assert_eq!(ds.columns(), &["a", "b", "c"]);
        ds.set_column("a", vec![json!(10), json!(20)]).unwrap();
        assert_eq!(ds.get(1, "a"), Some(&json!(20)));
        assert_eq!(ds.column_count(), 3);
    }

    #[test]
    fn test_set_column_length_mismatch() {
        let mut ds = sample();
        assert!(ds.set_column("c", vec![json!(1)]).is_err());
    }

    #[test]
    fn test_drop_column() {
        let mut ds = sample();
        assert!(ds.drop_column("a"));
        assert!(!ds.drop_column("a"));
        assert_eq!(ds.columns(), &["b"]);
        assert_eq!(ds.rows()[0], vec![json!("x")]);
    }

    #[test]
    fn test_retain_rows_reports_removed() {
        let mut ds = sample();
        let removed = ds.retain_rows(|_, row| !row.iter().any(Value::is_null));
        assert_eq!(removed, 1);
        assert_eq!(ds.row_count(), 1);
    }

    #[test]
    fn test_take_rows_out_of_bounds() {
        let ds = sample();
        assert_eq!(ds.take_rows(&[1, 0]).unwrap().get(0, "a"), Some(&json!(2)));
        assert!(ds.take_rows(&[5]).is_err());
    }

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(&json!("Remote")), Some("Remote".into()));
        assert_eq!(cell_text(&json!(3)), Some("3".into()));
        assert_eq!(cell_text(&json!(true)), Some("True".into()));
        assert_eq!(cell_text(&Value::Null), None);
    }
}

//! Schema definition, loading and column type inference.

use crate::error::MlError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Declared column data type.
///
/// Pandas dtype names (`object`, `int64`, `float64`, ...) are accepted as
/// aliases so existing schema files load unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    #[serde(alias = "int64", alias = "int")]
    Integer,
    #[serde(alias = "float64")]
    Float,
    #[serde(alias = "object", alias = "str")]
    String,
    #[serde(alias = "bool")]
    Boolean,
    #[serde(alias = "datetime64", alias = "datetime")]
    DateTime,
    List,
}

/// Expected columns of a dataset plus the regression target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDefinition {
    #[serde(alias = "COLUMNS")]
    pub columns: BTreeMap<String, ColumnType>,
    pub target_column: String,
}

impl SchemaDefinition {
    /// The job-posting schema used when no schema file is configured.
    pub fn job_postings() -> Self {
        let columns = [
            ("title", ColumnType::String),
            ("company_name", ColumnType::String),
            ("job_location", ColumnType::String),
            ("job_type", ColumnType::String),
            ("job_link", ColumnType::String),
            ("job_qualifications", ColumnType::List),
            ("job_description", ColumnType::String),
            ("job_summary", ColumnType::String),
            ("date_of_job_post", ColumnType::DateTime),
            ("salary", ColumnType::Float),
        ]
        .into_iter()
        .map(|(name, dtype)| (name.to_string(), dtype))
        .collect();

        Self {
            columns,
            target_column: "salary".to_string(),
        }
    }

    /// Load a schema from a YAML file.
    pub fn load(path: &Path) -> Result<Self, MlError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            MlError::schema(format!("Failed to read schema {}: {e}", path.display()))
        })?;
        let schema: Self = serde_yaml::from_str(&content)?;
        if !schema.columns.contains_key(&schema.target_column) {
            return Err(MlError::schema(format!(
                "target column '{}' is not declared in {}",
                schema.target_column,
                path.display()
            )));
        }
        Ok(schema)
    }

    /// Load from `path` when given, otherwise use the built-in schema.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, MlError> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::job_postings()),
        }
    }

    pub fn expected_columns(&self) -> BTreeSet<&str> {
        self.columns.keys().map(String::as_str).collect()
    }

    /// Declared columns of type `dtype`, in name order.
    pub fn columns_of_type(&self, dtype: ColumnType) -> Vec<String> {
        self.columns
            .iter()
            .filter(|(_, t)| **t == dtype)
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// SHA-256 over the canonical JSON rendering; columns are already sorted.
    pub fn schema_hash(&self) -> String {
        let canonical = serde_json::to_string(self).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

/// Infer the type of a CSV column from its non-null raw values.
///
/// The whole column decides: a single non-numeric value makes every value a
/// string, so one stray `"123"` in a text column stays text.
pub fn infer_column_type(values: &[&str]) -> Option<ColumnType> {
    if values.is_empty() {
        return None;
    }
    if values.iter().all(|v| v.parse::<i64>().is_ok()) {
        return Some(ColumnType::Integer);
    }
    if values
        .iter()
        .all(|v| v.parse::<f64>().is_ok_and(f64::is_finite))
    {
        return Some(ColumnType::Float);
    }
    if values
        .iter()
        .all(|v| matches!(*v, "True" | "False" | "true" | "false"))
    {
        return Some(ColumnType::Boolean);
    }
    Some(ColumnType::String)
}

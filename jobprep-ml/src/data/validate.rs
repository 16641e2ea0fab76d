//! Dataset validation against the expected schema.
//!
//! Content checks never fail: offending rows are logged, counted in the
//! [`ValidationReport`] and left in place. Only writing the status artifacts
//! can fail the run.

use crate::data::dataset::{Dataset, cell_text, type_name};
use crate::data::dates;
use crate::data::literal::parse_string_list;
use crate::data::schema::{ColumnType, SchemaDefinition};
use crate::data::source;
use crate::error::MlError;
use crate::pipeline::gate::GateStatus;
use chrono::{DateTime, Utc};
use jobprep_core::DataValidationConfig;
use jobprep_core::persistence::{atomic_write, atomic_write_json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::path::PathBuf;

/// Confirmation phrase on the final status line when the column set conforms.
pub const COLUMNS_OK_PHRASE: &str = "All expected columns are present.";

const STATUS_PREFIX: &str = "Validation status: ";

/// Text fields checked by [`Validator::run_all`].
pub const TEXT_FIELDS: &[&str] = &[
    "title",
    "company_name",
    "job_location",
    "job_summary",
    "job_description",
];

/// Offending row indices kept per check in the report.
const MAX_SAMPLE_ROWS: usize = 20;

/// Outcome of the column conformance check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ValidationStatus {
    #[serde(rename = "conformant")]
    Pass,
    #[serde(rename = "non_conformant")]
    Fail { reasons: Vec<String> },
}

impl ValidationStatus {
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }

    /// Human-readable status text; the pass phrase is the final line on success.
    pub fn render(&self) -> String {
        let mut text = String::from(STATUS_PREFIX);
        match self {
            Self::Pass => text.push_str(COLUMNS_OK_PHRASE),
            Self::Fail { reasons } => {
                for reason in reasons {
                    text.push_str(reason);
                    text.push('\n');
                }
            }
        }
        text
    }
}

/// Which content rule a [`FieldReport`] describes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldCheck {
    Date,
    Text,
    OptionalText,
    Reference { prefix: String },
    List,
}

/// Issues found by one check on one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldReport {
    pub field: String,
    pub check: FieldCheck,
    /// The column was absent, so nothing was checked.
    pub column_missing: bool,
    pub checked_rows: usize,
    pub invalid_count: usize,
    /// First offending row indices (0-based).
    pub sample_rows: Vec<usize>,
    /// Values coerced to null by lenient parsing.
    pub coercion_failures: usize,
}

impl FieldReport {
    fn new(field: &str, check: FieldCheck) -> Self {
        Self {
            field: field.to_string(),
            check,
            column_missing: false,
            checked_rows: 0,
            invalid_count: 0,
            sample_rows: Vec::new(),
            coercion_failures: 0,
        }
    }

    fn missing(field: &str, check: FieldCheck) -> Self {
        tracing::warn!(field, "Column not present, skipping check");
        Self {
            column_missing: true,
            ..Self::new(field, check)
        }
    }

    fn flag(&mut self, row: usize) {
        self.invalid_count += 1;
        if self.sample_rows.len() < MAX_SAMPLE_ROWS {
            self.sample_rows.push(row);
        }
    }

    /// Present and without offending rows.
    pub fn is_clean(&self) -> bool {
        !self.column_missing && self.invalid_count == 0
    }
}

/// Structured result of a validation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub run_id: String,
    pub source: PathBuf,
    pub rows_loaded: usize,
    pub rows_after_dedup: usize,
    pub duplicates_removed: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_status: Option<ValidationStatus>,
    pub fields: Vec<FieldReport>,
    pub generated_at: DateTime<Utc>,
}

impl ValidationReport {
    pub fn field(&self, field: &str, check: &FieldCheck) -> Option<&FieldReport> {
        self.fields
            .iter()
            .find(|r| r.field == field && &r.check == check)
    }
}

/// Validates one raw dataset and writes the gate status for the next stage.
pub struct Validator {
    config: DataValidationConfig,
    schema: SchemaDefinition,
    dataset: Dataset,
    report: ValidationReport,
}

impl Validator {
    /// Read the raw CSV named by `config.unzip_data_dir`.
    pub fn new(config: DataValidationConfig, schema: SchemaDefinition) -> Result<Self, MlError> {
        let dataset = source::read_csv(&config.unzip_data_dir).inspect_err(|e| {
            tracing::error!(path = %config.unzip_data_dir.display(), error = %e, "Error reading data file");
        })?;
        Ok(Self::from_dataset(config, schema, dataset))
    }

    pub fn from_dataset(
        config: DataValidationConfig,
        schema: SchemaDefinition,
        dataset: Dataset,
    ) -> Self {
        let report = ValidationReport {
            run_id: uuid::Uuid::new_v4().to_string(),
            source: config.unzip_data_dir.clone(),
            rows_loaded: dataset.row_count(),
            rows_after_dedup: dataset.row_count(),
            duplicates_removed: 0,
            column_status: None,
            fields: Vec::new(),
            generated_at: Utc::now(),
        };
        Self {
            config,
            schema,
            dataset,
            report,
        }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn report(&self) -> &ValidationReport {
        &self.report
    }

    pub fn into_dataset(self) -> Dataset {
        self.dataset
    }

    /// Compare the dataset's column set with the schema and write the status.
    ///
    /// Missing and extra columns are reported independently. The text status
    /// and the typed JSON status are both written; a write failure is the
    /// only error this returns.
    pub fn validate_columns(&mut self) -> Result<ValidationStatus, MlError> {
        let actual: HashSet<&str> = self.dataset.columns().iter().map(String::as_str).collect();
        let expected = self.schema.expected_columns();

        let mut missing: Vec<&str> = expected
            .iter()
            .copied()
            .filter(|c| !actual.contains(c))
            .collect();
        let mut extra: Vec<&str> = actual
            .iter()
            .copied()
            .filter(|c| !expected.contains(c))
            .collect();
        missing.sort_unstable();
        extra.sort_unstable();

        let mut reasons = Vec::new();
        if !missing.is_empty() {
            let msg = format!("Missing columns: {}", missing.join(", "));
            tracing::warn!("{msg}");
            reasons.push(msg);
        }
        if !extra.is_empty() {
            let msg = format!("Extra columns found: {}", extra.join(", "));
            tracing::warn!("{msg}");
            reasons.push(msg);
        }

        let status = if reasons.is_empty() {
            tracing::info!("All expected columns are present in the dataset");
            ValidationStatus::Pass
        } else {
            ValidationStatus::Fail { reasons }
        };

        self.write_status(&status)?;
        self.report.column_status = Some(status.clone());
        Ok(status)
    }

    fn write_status(&self, status: &ValidationStatus) -> Result<(), MlError> {
        atomic_write(&self.config.status_file, status.render().as_bytes()).inspect_err(|e| {
            tracing::error!(path = %self.config.status_file.display(), error = %e, "Error writing status file");
        })?;

        let gate = GateStatus::new(
            &self.report.run_id,
            &self.schema,
            &self.config.unzip_data_dir,
            status.clone(),
        );
        atomic_write_json(&self.config.status_json_file, &gate)?;
        tracing::debug!(path = %self.config.status_file.display(), "Wrote validation status");
        Ok(())
    }

    /// Parse a date/time column, coercing unparsable values to null.
    ///
    /// Every non-null value is tried strictly first; if any fails, the column
    /// is re-parsed leniently and each row that ends up null is logged. The
    /// column is left holding canonical date/time strings or nulls.
    pub fn validate_date_field(&mut self, field: &str) -> FieldReport {
        let Some(idx) = self.dataset.column_index(field) else {
            return self.record(FieldReport::missing(field, FieldCheck::Date));
        };
        let values: Vec<&Value> = self.dataset.rows().iter().map(|r| &r[idx]).collect();

        let mut report = FieldReport::new(field, FieldCheck::Date);
        report.checked_rows = values.len();
        let parsed: Vec<Option<chrono::NaiveDateTime>> =
            values.iter().map(|v| dates::parse_cell(v)).collect();

        let strict_ok = values
            .iter()
            .zip(&parsed)
            .all(|(v, p)| v.is_null() || p.is_some());
        if !strict_ok {
            tracing::warn!(field, "Strict date parsing failed, coercing invalid values to null");
            report.coercion_failures = values
                .iter()
                .zip(&parsed)
                .filter(|(v, p)| !v.is_null() && p.is_none())
                .count();
        }

        for (row, p) in parsed.iter().enumerate() {
            if p.is_none() {
                tracing::warn!(field, row, "Invalid or missing date");
                report.flag(row);
            }
        }

        let rendered: Vec<Value> = parsed
            .into_iter()
            .map(|p| {
                p.map(|dt| Value::String(dates::format_datetime(&dt)))
                    .unwrap_or(Value::Null)
            })
            .collect();
        if let Err(e) = self.dataset.set_column(field, rendered) {
            tracing::error!(field, error = %e, "Failed to store parsed dates");
        }

        self.record(report)
    }

    /// Flag rows whose value is not a string, for each field.
    pub fn validate_text_fields(&mut self, fields: &[&str]) -> Vec<FieldReport> {
        fields
            .iter()
            .map(|field| self.check_text(field, FieldCheck::Text, false))
            .collect()
    }

    /// Like [`validate_text_fields`](Self::validate_text_fields) but nulls are allowed.
    pub fn validate_optional_text_field(&mut self, field: &str) -> FieldReport {
        self.check_text(field, FieldCheck::OptionalText, true)
    }

    fn check_text(&mut self, field: &str, check: FieldCheck, allow_null: bool) -> FieldReport {
        let Some(idx) = self.dataset.column_index(field) else {
            return self.record(FieldReport::missing(field, check));
        };
        let values: Vec<&Value> = self.dataset.rows().iter().map(|r| &r[idx]).collect();

        let mut report = FieldReport::new(field, check);
        for (row, value) in values.iter().enumerate() {
            if allow_null && value.is_null() {
                continue;
            }
            report.checked_rows += 1;
            if !value.is_string() {
                tracing::warn!(field, row, actual = type_name(value), "Non-string value");
                report.flag(row);
            }
        }
        if report.invalid_count > 0 {
            tracing::warn!(field, count = report.invalid_count, "Invalid text values found");
        }
        self.record(report)
    }

    /// Flag rows whose value does not start with `prefix`.
    pub fn validate_reference_field(&mut self, field: &str, prefix: &str) -> FieldReport {
        let check = FieldCheck::Reference {
            prefix: prefix.to_string(),
        };
        let Some(idx) = self.dataset.column_index(field) else {
            return self.record(FieldReport::missing(field, check));
        };
        let values: Vec<&Value> = self.dataset.rows().iter().map(|r| &r[idx]).collect();

        let mut report = FieldReport::new(field, check);
        report.checked_rows = values.len();
        for (row, value) in values.iter().enumerate() {
            let ok = value.as_str().is_some_and(|s| s.starts_with(prefix));
            if !ok {
                tracing::warn!(field, row, prefix, "Value does not start with expected prefix");
                report.flag(row);
            }
        }
        self.record(report)
    }

    /// Flag rows whose value is not a serialized list of strings.
    pub fn validate_list_field(&mut self, field: &str) -> FieldReport {
        let Some(idx) = self.dataset.column_index(field) else {
            return self.record(FieldReport::missing(field, FieldCheck::List));
        };
        let values: Vec<&Value> = self.dataset.rows().iter().map(|r| &r[idx]).collect();

        let mut report = FieldReport::new(field, FieldCheck::List);
        report.checked_rows = values.len();
        for (row, value) in values.iter().enumerate() {
            let ok = value.as_str().and_then(parse_string_list).is_some();
            if !ok {
                tracing::warn!(field, row, "Value is not a list of strings");
                report.flag(row);
            }
        }
        self.record(report)
    }

    /// Drop rows whose `key_field` repeats an earlier row; returns rows removed.
    pub fn deduplicate(&mut self, key_field: &str) -> usize {
        let Some(idx) = self.dataset.column_index(key_field) else {
            tracing::warn!(field = key_field, "Column not present, skipping de-duplication");
            return 0;
        };

        let mut seen: HashSet<Option<String>> = HashSet::new();
        let removed = self
            .dataset
            .retain_rows(|_, row| seen.insert(cell_text(&row[idx])));

        if removed > 0 {
            tracing::warn!(field = key_field, removed, "Removed duplicate rows");
        } else {
            tracing::info!(field = key_field, "No duplicate rows found");
        }
        self.report.duplicates_removed += removed;
        self.report.rows_after_dedup = self.dataset.row_count();
        removed
    }

    /// Write the (de-duplicated) dataset to `validated_data_file`.
    pub fn persist_validated(&self) -> Result<PathBuf, MlError> {
        let path = self.config.validated_data_file.clone();
        source::write_csv(&self.dataset, &path)?;
        tracing::info!(path = %path.display(), rows = self.dataset.row_count(), "Saved validated dataset");
        Ok(path)
    }

    /// Write the structured report to `report_file`.
    pub fn persist_report(&self) -> Result<PathBuf, MlError> {
        atomic_write_json(&self.config.report_file, &self.report)?;
        Ok(self.config.report_file.clone())
    }

    /// Run every check in order, then persist the validated data and report.
    ///
    /// Date and list checks run on the columns the schema declares with
    /// those types.
    pub fn run_all(&mut self) -> Result<ValidationReport, MlError> {
        tracing::info!("Executing column validation");
        self.validate_columns()?;

        for field in self.schema.columns_of_type(ColumnType::DateTime) {
            tracing::info!(field = %field, "Executing date validation");
            self.validate_date_field(&field);
        }

        tracing::info!("Executing text fields validation");
        self.validate_text_fields(TEXT_FIELDS);

        tracing::info!("Executing job link validation");
        self.validate_reference_field("job_link", "http");

        tracing::info!("Executing job type validation");
        self.validate_optional_text_field("job_type");

        for field in self.schema.columns_of_type(ColumnType::List) {
            tracing::info!(field = %field, "Executing list validation");
            self.validate_list_field(&field);
        }

        tracing::info!("Executing duplicate entries handling");
        self.deduplicate("job_link");

        self.report.generated_at = Utc::now();
        self.persist_validated()?;
        self.persist_report()?;
        let flagged = self.report.fields.iter().filter(|r| !r.is_clean()).count();
        tracing::info!(
            checks = self.report.fields.len(),
            flagged,
            "All validations completed"
        );
        Ok(self.report.clone())
    }

    fn record(&mut self, report: FieldReport) -> FieldReport {
        self.report
            .fields
            .retain(|r| !(r.field == report.field && r.check == report.check));
        self.report.fields.push(report.clone());
        report
    }
}

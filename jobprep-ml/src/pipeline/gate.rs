//! Gate between validation and transformation.
//!
//! The validator writes two artifacts: a human-readable `status.txt` whose
//! last line carries the pass phrase, and a typed `status.json` with the
//! schema hash it checked. The transformation stage opens only when the
//! status passes for the schema it is about to use.

use crate::data::schema::SchemaDefinition;
use crate::data::validate::{COLUMNS_OK_PHRASE, ValidationStatus};
use crate::error::MlError;
use chrono::{DateTime, Utc};
use jobprep_core::persistence::load_json;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Typed, persisted result of the column conformance check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateStatus {
    pub run_id: String,
    pub schema_hash: String,
    pub source: PathBuf,
    pub checked_at: DateTime<Utc>,
    #[serde(flatten)]
    pub outcome: ValidationStatus,
}

impl GateStatus {
    pub fn new(
        run_id: &str,
        schema: &SchemaDefinition,
        source: &Path,
        outcome: ValidationStatus,
    ) -> Self {
        Self {
            run_id: run_id.to_string(),
            schema_hash: schema.schema_hash(),
            source: source.to_path_buf(),
            checked_at: Utc::now(),
            outcome,
        }
    }
}

/// Whether a text status passes: its final line contains the pass phrase.
pub fn text_status_passes(text: &str) -> bool {
    text.split('\n')
        .next_back()
        .is_some_and(|line| line.contains(COLUMNS_OK_PHRASE))
}

/// Open the gate or explain why it stays closed.
///
/// Prefers the typed status; falls back to the text status when no JSON
/// status exists (e.g. one written by an older validator).
pub fn check_gate(
    status_json: &Path,
    status_text: &Path,
    schema: &SchemaDefinition,
) -> Result<(), MlError> {
    if let Some(gate) = load_json::<GateStatus>(status_json)? {
        return match gate.outcome {
            ValidationStatus::Fail { reasons } => Err(MlError::gate(format!(
                "Data schema is not valid: {}. Please check validation status in {}",
                reasons.join("; "),
                status_text.display()
            ))),
            ValidationStatus::Pass if gate.schema_hash != schema.schema_hash() => {
                Err(MlError::gate(format!(
                    "Schema changed since validation run {}; re-run validation",
                    gate.run_id
                )))
            }
            ValidationStatus::Pass => {
                tracing::info!(run_id = %gate.run_id, "Validation gate open");
                Ok(())
            }
        };
    }

    let text = std::fs::read_to_string(status_text).map_err(|e| {
        MlError::not_found(format!(
            "validation status {}: {e}",
            status_text.display()
        ))
    })?;
    if text_status_passes(&text) {
        tracing::info!(path = %status_text.display(), "Validation gate open (text status)");
        Ok(())
    } else {
        Err(MlError::gate(format!(
            "Data schema is not valid, all columns are not present. Please check validation status in {}",
            status_text.display()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobprep_core::persistence::{atomic_write, atomic_write_json};
    use tempfile::TempDir;

    fn paths(dir: &TempDir) -> (PathBuf, PathBuf) {
        (dir.path().join("status.json"), dir.path().join("status.txt"))
    }

    #[test]
    fn test_text_status_passes_on_last_line_only() {
        assert!(text_status_passes(
            "Validation status: All expected columns are present."
        ));
        assert!(!text_status_passes(
            "Validation status: Missing columns: job_type\n"
        ));
        assert!(!text_status_passes(
            "All expected columns are present.\nExtra columns found: x"
        ));
    }

    #[test]
    fn test_gate_open_on_matching_pass() {
        let dir = TempDir::new().unwrap();
        let (json, text) = paths(&dir);
        let schema = SchemaDefinition::job_postings();
        let gate = GateStatus::new("r1", &schema, Path::new("raw.csv"), ValidationStatus::Pass);
        atomic_write_json(&json, &gate).unwrap();
        assert!(check_gate(&json, &text, &schema).is_ok());
    }

    #[test]
    fn test_gate_closed_on_fail() {
        let dir = TempDir::new().unwrap();
        let (json, text) = paths(&dir);
        let schema = SchemaDefinition::job_postings();
        let gate = GateStatus::new(
            "r1",
            &schema,
            Path::new("raw.csv"),
            ValidationStatus::Fail {
                reasons: vec!["Missing columns: job_type".into()],
            },
        );
        atomic_write_json(&json, &gate).unwrap();
        let err = check_gate(&json, &text, &schema).unwrap_err();
        assert!(matches!(err, MlError::Gate(_)));
        assert!(err.to_string().contains("Missing columns: job_type"));
    }

    #[test]
    fn test_gate_closed_on_schema_change() {
        let dir = TempDir::new().unwrap();
        let (json, text) = paths(&dir);
        let schema = SchemaDefinition::job_postings();
        let gate = GateStatus::new("r1", &schema, Path::new("raw.csv"), ValidationStatus::Pass);
        atomic_write_json(&json, &gate).unwrap();

        let mut changed = schema.clone();
        changed.target_column = "job_type".into();
        assert!(check_gate(&json, &text, &changed).is_err());
    }

    #[test]
    fn test_gate_falls_back_to_text() {
        let dir = TempDir::new().unwrap();
        let (json, text) = paths(&dir);
        let schema = SchemaDefinition::job_postings();
        atomic_write(
            &text,
            b"Validation status: All expected columns are present.",
        )
        .unwrap();
        assert!(check_gate(&json, &text, &schema).is_ok());

        atomic_write(&text, b"Validation status: Missing columns: job_type\n").unwrap();
        assert!(check_gate(&json, &text, &schema).is_err());
    }

    #[test]
    fn test_gate_missing_artifacts() {
        let dir = TempDir::new().unwrap();
        let (json, text) = paths(&dir);
        let err = check_gate(&json, &text, &SchemaDefinition::job_postings()).unwrap_err();
        assert!(matches!(err, MlError::NotFound(_)));
    }

    #[test]
    fn test_gate_status_json_shape() {
        let schema = SchemaDefinition::job_postings();
        let gate = GateStatus::new("r1", &schema, Path::new("raw.csv"), ValidationStatus::Pass);
        let value = serde_json::to_value(&gate).unwrap();
        assert_eq!(value["status"], "conformant");
        assert_eq!(value["schema_hash"], schema.schema_hash());
    }
}

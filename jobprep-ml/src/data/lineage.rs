//! Hash-chained lineage of the steps applied to a dataset.

use crate::data::transform::TransformRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Full lineage record for a transformed dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataLineage {
    pub run_id: String,
    pub source_location: String,
    pub source_rows: usize,
    pub transforms_applied: Vec<TransformRecord>,
    pub created_at: DateTime<Utc>,
    pub hash_chain: Vec<String>,
}

impl DataLineage {
    pub fn new(run_id: &str, source_location: &str, source_rows: usize) -> Self {
        let initial_hash = compute_hash(&format!("{run_id}:{source_location}:{source_rows}"));
        Self {
            run_id: run_id.to_string(),
            source_location: source_location.to_string(),
            source_rows,
            transforms_applied: Vec::new(),
            created_at: Utc::now(),
            hash_chain: vec![initial_hash],
        }
    }

    /// Add a transform record and extend the hash chain.
    pub fn add_transform(&mut self, record: TransformRecord) {
        let prev_hash = self.hash_chain.last().cloned().unwrap_or_default();
        let new_hash = compute_hash(&format!("{prev_hash}:{}", record_digest(&record)));
        self.hash_chain.push(new_hash);
        self.transforms_applied.push(record);
    }

    /// Verify the integrity of the hash chain.
    pub fn verify_integrity(&self) -> bool {
        let expected_initial = compute_hash(&format!(
            "{}:{}:{}",
            self.run_id, self.source_location, self.source_rows
        ));
        if self.hash_chain.first() != Some(&expected_initial) {
            return false;
        }
        if self.hash_chain.len() != self.transforms_applied.len() + 1 {
            return false;
        }

        self.transforms_applied
            .iter()
            .enumerate()
            .all(|(i, record)| {
                let expected =
                    compute_hash(&format!("{}:{}", self.hash_chain[i], record_digest(record)));
                self.hash_chain[i + 1] == expected
            })
    }

    pub fn last_record(&self) -> Option<&TransformRecord> {
        self.transforms_applied.last()
    }
}

fn record_digest(record: &TransformRecord) -> String {
    let step_json = serde_json::to_string(&record.step).unwrap_or_default();
    format!(
        "{step_json}:{}:{}:{}",
        record.rows_before, record.rows_after, record.coercion_failures
    )
}

fn compute_hash(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::transform::TransformStep;

    #[test]
    fn test_lineage_creation() {
        let lineage = DataLineage::new("run-1", "validated_data.csv", 100);
        assert_eq!(lineage.hash_chain.len(), 1);
        assert!(lineage.verify_integrity());
    }

    #[test]
    fn test_lineage_with_transforms() {
        let mut lineage = DataLineage::new("run-1", "validated_data.csv", 100);
        lineage.add_transform(TransformRecord::new(
            TransformStep::DecomposeDatetime {
                field: "date_of_job_post".into(),
            },
            100,
            100,
            16,
        ));
        assert_eq!(lineage.hash_chain.len(), 2);
        assert!(lineage.verify_integrity());
    }

    #[test]
    fn test_tampered_row_count_detected() {
        let mut lineage = DataLineage::new("run-1", "validated_data.csv", 100);
        lineage.add_transform(TransformRecord::new(
            TransformStep::DropIncompleteRows {
                policy: jobprep_core::DropPolicy::AnyNull,
            },
            100,
            90,
            20,
        ));
        lineage.transforms_applied[0].rows_after = 95;
        assert!(!lineage.verify_integrity());
    }
}

//! Label encoding with a persisted code table.

use crate::data::dataset::{Dataset, cell_text};
use crate::error::MlError;
use jobprep_core::UnseenValuePolicy;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Code written for unseen values under [`UnseenValuePolicy::Sentinel`].
pub const UNSEEN_CODE: i64 = -1;

/// Maps each distinct value of one field to a dense integer code.
///
/// Codes follow the sorted order of the values seen at fit time, starting at 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoricalEncoder {
    pub field: String,
    pub mapping: BTreeMap<String, i64>,
}

impl CategoricalEncoder {
    /// Fit on the non-null values of `field`.
    pub fn fit(dataset: &Dataset, field: &str) -> Result<Self, MlError> {
        let values = dataset
            .column(field)
            .ok_or_else(|| MlError::encoder(format!("column '{field}' not found")))?;
        let distinct: BTreeSet<String> = values.into_iter().filter_map(cell_text).collect();
        let mapping = distinct
            .into_iter()
            .enumerate()
            .map(|(code, value)| (value, code as i64))
            .collect();
        Ok(Self {
            field: field.to_string(),
            mapping,
        })
    }

    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }

    /// Code for one cell, and whether the value was unseen at fit time.
    pub fn transform(&self, value: &Value, policy: UnseenValuePolicy) -> (Value, bool) {
        let Some(text) = cell_text(value) else {
            return (Value::Null, false);
        };
        match self.mapping.get(&text) {
            Some(&code) => (Value::from(code), false),
            None => match policy {
                UnseenValuePolicy::Sentinel => (Value::from(UNSEEN_CODE), true),
                UnseenValuePolicy::Null => (Value::Null, true),
            },
        }
    }

    /// Replace the field's values with their codes; returns the unseen count.
    pub fn encode_column(
        &self,
        dataset: &mut Dataset,
        policy: UnseenValuePolicy,
    ) -> Result<usize, MlError> {
        let mut unseen = 0;
        dataset.map_column(&self.field, |value| {
            let (code, was_unseen) = self.transform(value, policy);
            if was_unseen {
                unseen += 1;
            }
            code
        })?;
        if unseen > 0 {
            tracing::warn!(field = %self.field, unseen, ?policy, "Unseen categorical values");
        }
        Ok(unseen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn jobs() -> Dataset {
        Dataset::new(
            vec!["job_type".into()],
            vec![
                vec![json!("Onsite")],
                vec![json!("Hybrid")],
                vec![Value::Null],
                vec![json!("Remote")],
                vec![json!("Hybrid")],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_codes_follow_sorted_values() {
        let encoder = CategoricalEncoder::fit(&jobs(), "job_type").unwrap();
        assert_eq!(encoder.len(), 3);
        assert_eq!(encoder.mapping["Hybrid"], 0);
        assert_eq!(encoder.mapping["Onsite"], 1);
        assert_eq!(encoder.mapping["Remote"], 2);
    }

    #[test]
    fn test_encode_keeps_nulls() {
        let mut ds = jobs();
        let encoder = CategoricalEncoder::fit(&ds, "job_type").unwrap();
        let unseen = encoder
            .encode_column(&mut ds, UnseenValuePolicy::Sentinel)
            .unwrap();
        assert_eq!(unseen, 0);
        let codes: Vec<Value> = ds.column("job_type").unwrap().into_iter().cloned().collect();
        assert_eq!(
            codes,
            vec![json!(1), json!(0), Value::Null, json!(2), json!(0)]
        );
    }

    #[test]
    fn test_unseen_policies() {
        let encoder = CategoricalEncoder::fit(&jobs(), "job_type").unwrap();
        let contract = json!("Contract");
        assert_eq!(
            encoder.transform(&contract, UnseenValuePolicy::Sentinel),
            (json!(UNSEEN_CODE), true)
        );
        assert_eq!(
            encoder.transform(&contract, UnseenValuePolicy::Null),
            (Value::Null, true)
        );
    }

    #[test]
    fn test_fit_missing_column() {
        assert!(matches!(
            CategoricalEncoder::fit(&jobs(), "title"),
            Err(MlError::Encoder(_))
        ));
    }
}

//! Property-based tests for validation and feature engineering.

use proptest::prelude::*;

use chrono::NaiveDate;
use jobprep_core::DataValidationConfig;
use jobprep_ml::data::dates::format_datetime;
use jobprep_ml::data::schema::{ColumnType, SchemaDefinition};
use jobprep_ml::data::split::{split_sizes, train_test_split};
use jobprep_ml::features::datetime::{decompose_column, derived_column_names};
use jobprep_ml::features::{SkillVocabulary, normalize_skill_list};
use jobprep_ml::{Dataset, Validator};
use serde_json::{Value, json};
use std::collections::{BTreeSet, HashSet};
use tempfile::TempDir;

fn keyed(keys: &[u8]) -> Dataset {
    Dataset::new(
        vec!["job_link".into()],
        keys.iter().map(|k| vec![json!(format!("http://{k}"))]).collect(),
    )
    .unwrap()
}

fn validator_for(dir: &TempDir, dataset: Dataset, schema: SchemaDefinition) -> Validator {
    let root = dir.path().to_path_buf();
    let config = DataValidationConfig {
        unzip_data_dir: root.join("raw.csv"),
        status_file: root.join("status.txt"),
        status_json_file: root.join("status.json"),
        validated_data_file: root.join("validated.csv"),
        report_file: root.join("report.json"),
        schema_file: None,
        root_dir: root,
    };
    Validator::from_dataset(config, schema, dataset)
}

// --- De-duplication properties ---

proptest! {
    #[test]
    fn test_dedupe_leaves_distinct_keys_and_is_idempotent(keys in prop::collection::vec(0u8..20, 0..60)) {
        let dir = TempDir::new().unwrap();
        let mut v = validator_for(&dir, keyed(&keys), SchemaDefinition::job_postings());
        let distinct: HashSet<u8> = keys.iter().copied().collect();

        let removed = v.deduplicate("job_link");
        prop_assert_eq!(removed, keys.len() - distinct.len());
        prop_assert_eq!(v.dataset().row_count(), distinct.len());
        prop_assert_eq!(v.deduplicate("job_link"), 0);
    }
}

// --- Column conformance properties ---

proptest! {
    #[test]
    fn test_columns_pass_iff_sets_equal(mask in prop::collection::vec(any::<bool>(), 3), extra in any::<bool>()) {
        let schema = SchemaDefinition {
            columns: [("a", ColumnType::String), ("b", ColumnType::Integer), ("y", ColumnType::Float)]
                .into_iter()
                .map(|(n, t)| (n.to_string(), t))
                .collect(),
            target_column: "y".into(),
        };
        let mut columns: Vec<String> = ["a", "b", "y"]
            .iter()
            .zip(&mask)
            .filter(|(_, keep)| **keep)
            .map(|(c, _)| c.to_string())
            .collect();
        if extra {
            columns.push("extra".into());
        }
        let expected_pass = mask.iter().all(|k| *k) && !extra;

        let dir = TempDir::new().unwrap();
        let mut v = validator_for(&dir, Dataset::new(columns, vec![]).unwrap(), schema);
        prop_assert_eq!(v.validate_columns().unwrap().is_pass(), expected_pass);
    }
}

// --- Skill normalization properties ---

proptest! {
    #[test]
    fn test_normalize_never_panics_and_yields_clean_tokens(raw in ".{0,80}") {
        for token in normalize_skill_list(&raw) {
            prop_assert!(!token.is_empty());
            prop_assert!(token.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_one_hot_row_sums_match_distinct_skills(
        rows in prop::collection::vec(prop::collection::vec("[A-Za-z0-9 +!.]{0,8}", 0..5), 1..15)
    ) {
        let literals: Vec<Vec<Value>> = rows
            .iter()
            .map(|items| {
                let quoted: Vec<String> = items.iter().map(|s| format!("'{s}'")).collect();
                vec![json!(format!("[{}]", quoted.join(", ")))]
            })
            .collect();
        let mut ds = Dataset::new(vec!["job_qualifications".into()], literals.clone()).unwrap();
        let vocab = SkillVocabulary::fit(&ds, "job_qualifications").unwrap();
        vocab.one_hot(&mut ds, "job_qualifications").unwrap();

        let names = vocab.column_names();
        prop_assert_eq!(ds.columns(), names.as_slice());
        prop_assert!(names.iter().all(|n| n.starts_with("qual_")));

        for (i, row) in literals.iter().enumerate() {
            let distinct: BTreeSet<String> =
                normalize_skill_list(row[0].as_str().unwrap()).into_iter().collect();
            let sum: i64 = names.iter().map(|n| ds.get(i, n).and_then(Value::as_i64).unwrap()).sum();
            prop_assert_eq!(sum as usize, distinct.len());
        }
    }
}

// --- Date/time and split properties ---

proptest! {
    #[test]
    fn test_datetime_decomposition_round_trips(
        y in 1970i32..2100, m in 1u32..=12, d in 1u32..=28,
        h in 0u32..24, min in 0u32..60, s in 0u32..60,
    ) {
        let dt = NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, min, s).unwrap();
        let mut ds = Dataset::new(
            vec!["date_of_job_post".into()],
            vec![vec![json!(format_datetime(&dt))]],
        )
        .unwrap();
        decompose_column(&mut ds, "date_of_job_post").unwrap();

        let parts: Vec<i64> = derived_column_names("date_of_job_post")
            .iter()
            .map(|c| ds.get(0, c).and_then(Value::as_i64).unwrap())
            .collect();
        prop_assert_eq!(
            parts,
            vec![i64::from(y), i64::from(m), i64::from(d), i64::from(h), i64::from(min), i64::from(s)]
        );
    }

    #[test]
    fn test_split_partitions_rows(n in 0usize..200, fraction in 0.05f64..0.95, seed in any::<u64>()) {
        let ds = Dataset::new(vec!["id".into()], (0..n).map(|i| vec![json!(i)]).collect()).unwrap();
        let (train, test) = train_test_split(&ds, fraction, seed).unwrap();
        prop_assert_eq!((train.row_count(), test.row_count()), split_sizes(n, fraction));

        let ids: HashSet<u64> = train.rows().iter().chain(test.rows()).map(|r| r[0].as_u64().unwrap()).collect();
        prop_assert_eq!(ids.len(), n);
    }
}

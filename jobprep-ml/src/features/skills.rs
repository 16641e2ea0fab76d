//! Skill normalization and the one-hot skill vocabulary.

use crate::data::dataset::Dataset;
use crate::data::literal::parse_string_list;
use crate::error::MlError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::{BTreeSet, HashSet};

/// Prefix of every one-hot skill column.
pub const COLUMN_PREFIX: &str = "qual_";

const VOCABULARY_VERSION: u32 = 1;

/// Lowercase, trim and keep only ASCII letters and digits.
pub fn normalize_skill(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}

/// Decode a serialized list of skills and normalize each item.
///
/// Malformed input, non-list values and lists with non-string items all yield
/// an empty list. Items that normalize to nothing are discarded; duplicates
/// are kept.
pub fn normalize_skill_list(raw: &str) -> Vec<String> {
    parse_string_list(raw)
        .unwrap_or_default()
        .iter()
        .map(|item| normalize_skill(item))
        .filter(|token| !token.is_empty())
        .collect()
}

fn cell_skills(value: &Value) -> Vec<String> {
    value.as_str().map(normalize_skill_list).unwrap_or_default()
}

/// Ordered set of skill tokens, one output column per token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillVocabulary {
    pub version: u32,
    /// SHA-256 of the token list; checked when the vocabulary is loaded.
    pub fingerprint: String,
    pub tokens: Vec<String>,
}

impl SkillVocabulary {
    pub fn from_tokens(tokens: BTreeSet<String>) -> Self {
        let tokens: Vec<String> = tokens.into_iter().collect();
        Self {
            version: VOCABULARY_VERSION,
            fingerprint: fingerprint(&tokens),
            tokens,
        }
    }

    /// Collect the sorted distinct tokens of `field`.
    pub fn fit(dataset: &Dataset, field: &str) -> Result<Self, MlError> {
        let values = dataset
            .column(field)
            .ok_or_else(|| MlError::encoder(format!("column '{field}' not found")))?;
        let tokens: BTreeSet<String> = values.into_iter().flat_map(cell_skills).collect();
        Ok(Self::from_tokens(tokens))
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Whether the fingerprint still matches the tokens.
    pub fn verify(&self) -> bool {
        self.fingerprint == fingerprint(&self.tokens)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.tokens
            .iter()
            .map(|t| format!("{COLUMN_PREFIX}{t}"))
            .collect()
    }

    /// Replace `field` with one 0/1 column per vocabulary token.
    ///
    /// Tokens outside the vocabulary add no columns. Returns the number of
    /// rows that had at least one such unseen token.
    pub fn one_hot(&self, dataset: &mut Dataset, field: &str) -> Result<usize, MlError> {
        let values = dataset
            .column(field)
            .ok_or_else(|| MlError::encoder(format!("column '{field}' not found")))?;
        let row_skills: Vec<HashSet<String>> = values
            .into_iter()
            .map(|v| cell_skills(v).into_iter().collect())
            .collect();

        let known: HashSet<&str> = self.tokens.iter().map(String::as_str).collect();
        let rows_with_unseen = row_skills
            .iter()
            .filter(|skills| skills.iter().any(|s| !known.contains(s.as_str())))
            .count();

        for (token, name) in self.tokens.iter().zip(self.column_names()) {
            let column = row_skills
                .iter()
                .map(|skills| Value::from(i64::from(skills.contains(token))))
                .collect();
            dataset.set_column(&name, column)?;
        }
        dataset.drop_column(field);

        if rows_with_unseen > 0 {
            tracing::debug!(field, rows_with_unseen, "Skills outside the vocabulary ignored");
        }
        Ok(rows_with_unseen)
    }
}

fn fingerprint(tokens: &[String]) -> String {
    let mut hasher = Sha256::new();
    for token in tokens {
        hasher.update(token.as_bytes());
        hasher.update(b"\n");
    }
    format!("{:x}", hasher.finalize())
}

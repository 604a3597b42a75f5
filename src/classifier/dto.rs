use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::conditions::{CONDITIONS, DEFAULT_THRESHOLD};

#[derive(Debug, Deserialize)]
pub struct ClassifyRequest {
    /// Either a filesystem path or a vague reference like "image 1".
    pub image: String,
    #[serde(default = "default_threshold")]
    pub threshold: f32,
}

fn default_threshold() -> f32 {
    DEFAULT_THRESHOLD
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionScore {
    pub probability: f32,
    pub label: String,
}

/// Per-condition scores keyed by condition name.
pub type ClassificationResult = BTreeMap<String, ConditionScore>;

#[derive(Debug, Serialize)]
pub struct ClassifyResponse {
    pub analyzed_file: String,
    pub results: ClassificationResult,
}

#[derive(Debug, Serialize)]
pub struct LoadResponse {
    pub message: String,
}

/// Zips the fixed-order condition names with raw sigmoid outputs, labeling
/// each "Y" when the probability clears the threshold.
pub fn label_scores(probs: &[f32], threshold: f32) -> ClassificationResult {
    CONDITIONS
        .iter()
        .zip(probs)
        .map(|(name, &p)| {
            (
                name.to_string(),
                ConditionScore {
                    probability: p,
                    label: if p >= threshold { "Y" } else { "N" }.to_string(),
                },
            )
        })
        .collect()
}

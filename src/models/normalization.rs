use serde::{Deserialize, Serialize};

/// How an alias was resolved. Precedence is fixed: raw beats normalized beats unresolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NormStrategy {
    #[serde(rename = "exact_alias_raw")]
    ExactRaw,
    #[serde(rename = "exact_normalized_alias")]
    ExactNormalized,
    #[serde(rename = "unresolved")]
    Unresolved,
}

impl NormStrategy {
    /// Text stored in the evidence table.
    pub fn as_str(&self) -> &'static str {
        match self {
            NormStrategy::ExactRaw => "exact_alias_raw",
            NormStrategy::ExactNormalized => "exact_normalized_alias",
            NormStrategy::Unresolved => "unresolved",
        }
    }

    pub fn score(&self) -> f64 {
        match self {
            NormStrategy::Unresolved => 0.0,
            _ => 1.0,
        }
    }
}

/// Outcome of resolving one free-text alias. Always present, even when nothing matched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizationResult {
    pub input_raw: String,
    pub normalized_input: String,
    pub item_id: Option<String>,
    pub strategy: NormStrategy,
    pub score: f64,
    pub confidence_note: Option<String>,
}

impl NormalizationResult {
    pub fn resolved(
        input_raw: &str,
        normalized_input: String,
        item_id: String,
        strategy: NormStrategy,
    ) -> Self {
        Self {
            input_raw: input_raw.to_string(),
            normalized_input,
            item_id: Some(item_id),
            strategy,
            score: strategy.score(),
            confidence_note: None,
        }
    }

    pub fn unresolved(input_raw: &str, normalized_input: String) -> Self {
        Self {
            input_raw: input_raw.to_string(),
            normalized_input,
            item_id: None,
            strategy: NormStrategy::Unresolved,
            score: 0.0,
            confidence_note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.confidence_note = Some(note.into());
        self
    }

    pub fn is_resolved(&self) -> bool {
        self.item_id.is_some()
    }
}

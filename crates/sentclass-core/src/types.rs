//! Result types exchanged between the segmenter, the classifier and callers.
//!
//! JSON field names match the wire DTOs consumed by downstream services
//! (`predict`, `score`, `sent_index`, `group_index`, `sent_preds`).

use serde::{Deserialize, Serialize};

/// Classification of one input text: the predicted label and its score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub predict: String,
    pub score: f32,
}

impl ClassificationResult {
    pub fn new(predict: impl Into<String>, score: f32) -> Self {
        Self {
            predict: predict.into(),
            score,
        }
    }
}

/// One sentence produced by the segmentation backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentenceUnit {
    pub text: String,
    /// Position of the sentence within its document.
    #[serde(rename = "sent_index")]
    pub sentence_index: i64,
    /// Index of the owning document in the caller's input.
    pub group_index: i64,
}

/// A sentence together with its classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentenceClassification {
    pub index: i64,
    pub text: String,
    pub predict: String,
    pub score: f32,
}

impl SentenceClassification {
    pub fn from_parts(unit: &SentenceUnit, result: &ClassificationResult) -> Self {
        Self {
            index: unit.sentence_index,
            text: unit.text.clone(),
            predict: result.predict.clone(),
            score: result.score,
        }
    }
}

/// Per-document result: sentence predictions in the order they were processed.
///
/// The list is not sorted by [`SentenceClassification::index`]; use
/// [`DocumentResult::sort_by_index`] when document order is required.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentResult {
    #[serde(rename = "sent_preds")]
    pub sentence_predictions: Vec<SentenceClassification>,
}

impl DocumentResult {
    pub fn is_empty(&self) -> bool {
        self.sentence_predictions.is_empty()
    }

    /// Stable sort of the predictions by sentence index.
    pub fn sort_by_index(&mut self) {
        self.sentence_predictions.sort_by_key(|s| s.index);
    }
}

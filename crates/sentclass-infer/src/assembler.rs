//! Pairs decoded labels with their scores.

use sentclass_core::{ClassificationResult, ClassifyError};

/// Zip `predicts[i]` with `scores[i]` into one result per input text.
///
/// No sorting or deduplication; output order is input order.
pub fn assemble(
    predicts: Vec<String>,
    scores: Vec<f32>,
) -> Result<Vec<ClassificationResult>, ClassifyError> {
    if predicts.len() != scores.len() {
        return Err(ClassifyError::LengthMismatch {
            what: "predict/score",
            left: predicts.len(),
            right: scores.len(),
        });
    }

    Ok(predicts
        .into_iter()
        .zip(scores)
        .map(|(predict, score)| ClassificationResult { predict, score })
        .collect())
}

//! Reassembles per-sentence classifications into per-document results.
//!
//! Units and results are correlated by position only: `results[i]` must be
//! the classification of `units[i].text`. Callers preserve that by
//! classifying sentence texts in unit order.

use sentclass_core::{
    ClassificationResult, ClassifyError, DocumentResult, SentenceClassification, SentenceUnit,
};

/// Build one [`DocumentResult`] per input document.
///
/// All `document_count` documents are present in the output, in input
/// order, even those with no sentences. Within a document, predictions are
/// appended in unit order and not re-sorted by sentence index.
///
/// Fails without partial output if `units` and `results` differ in length
/// or any unit's group index falls outside `0..document_count`.
pub fn group(
    document_count: usize,
    units: &[SentenceUnit],
    results: &[ClassificationResult],
) -> Result<Vec<DocumentResult>, ClassifyError> {
    if units.len() != results.len() {
        return Err(ClassifyError::LengthMismatch {
            what: "sentence/result",
            left: units.len(),
            right: results.len(),
        });
    }

    let mut documents = vec![DocumentResult::default(); document_count];
    for (position, (unit, result)) in units.iter().zip(results).enumerate() {
        let slot = match usize::try_from(unit.group_index) {
            Ok(i) if i < document_count => &mut documents[i],
            _ => {
                return Err(ClassifyError::GroupIndexOutOfRange {
                    position,
                    group_index: unit.group_index,
                    document_count,
                });
            }
        };
        slot.sentence_predictions
            .push(SentenceClassification::from_parts(unit, result));
    }

    Ok(documents)
}

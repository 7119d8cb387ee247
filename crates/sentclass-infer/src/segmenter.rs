//! Sentence segmentation served by a model on the inference server.

use async_trait::async_trait;
use sentclass_core::{ClassifyError, ModelRef, SegmenterIo, SentenceUnit};
use tracing::debug;

use crate::backend::{InferRequest, InferenceInvoker, SentenceSegmenter};
use crate::codec::{decode_i64_output, decode_strings_output, encode_input};

/// [`SentenceSegmenter`] that sends documents to a segmentation model and
/// decodes its `text` / `sent_index` / `group_index` outputs.
pub struct TensorSegmenter<I> {
    invoker: I,
    model: ModelRef,
    io: SegmenterIo,
}

impl<I: InferenceInvoker> TensorSegmenter<I> {
    pub fn new(invoker: I, model: ModelRef, io: SegmenterIo) -> Self {
        Self { invoker, model, io }
    }
}

#[async_trait]
impl<I: InferenceInvoker> SentenceSegmenter for TensorSegmenter<I> {
    async fn segment(&self, documents: &[String]) -> Result<Vec<SentenceUnit>, ClassifyError> {
        if documents.is_empty() {
            return Ok(vec![]);
        }

        let input = encode_input(&self.io.input_name, &self.io.input_datatype, documents)?;
        let outputs = self
            .invoker
            .infer(InferRequest {
                model: self.model.clone(),
                input,
                outputs: self.io.output_names(),
            })
            .await?;

        let texts = decode_strings_output(&outputs, &self.io.text_output)?;
        let sent_indices = decode_i64_output(&outputs, &self.io.sent_index_output)?;
        let group_indices = decode_i64_output(&outputs, &self.io.group_index_output)?;

        if texts.len() != sent_indices.len() {
            return Err(ClassifyError::LengthMismatch {
                what: "sentence text/sent_index",
                left: texts.len(),
                right: sent_indices.len(),
            });
        }
        if texts.len() != group_indices.len() {
            return Err(ClassifyError::LengthMismatch {
                what: "sentence text/group_index",
                left: texts.len(),
                right: group_indices.len(),
            });
        }

        debug!(
            documents = documents.len(),
            sentences = texts.len(),
            "segmented documents"
        );
        Ok(texts
            .into_iter()
            .zip(sent_indices)
            .zip(group_indices)
            .map(|((text, sentence_index), group_index)| SentenceUnit {
                text,
                sentence_index,
                group_index,
            })
            .collect())
    }
}

//! Capabilities the pipeline consumes from the outside world.

use async_trait::async_trait;
use sentclass_core::{ClassifyError, ModelRef, SentenceUnit};

use crate::codec::{EncodedTensor, RawOutput};

/// A single inference call against one model.
#[derive(Debug, Clone)]
pub struct InferRequest {
    pub model: ModelRef,
    pub input: EncodedTensor,
    /// Output tensors to return, by name.
    pub outputs: Vec<String>,
}

/// Runs a model on an encoded input and returns its raw outputs.
///
/// Transport errors and timeouts surface as [`ClassifyError::Transport`].
#[async_trait]
pub trait InferenceInvoker: Send + Sync {
    async fn infer(&self, request: InferRequest) -> Result<Vec<RawOutput>, ClassifyError>;
}

/// Server liveness and readiness probes.
#[async_trait]
pub trait Readiness: Send + Sync {
    async fn live(&self) -> Result<bool, ClassifyError>;
    async fn ready(&self) -> Result<bool, ClassifyError>;
}

/// Splits documents into sentences tagged with their owning document.
#[async_trait]
pub trait SentenceSegmenter: Send + Sync {
    async fn segment(&self, documents: &[String]) -> Result<Vec<SentenceUnit>, ClassifyError>;
}

//! Inference pipeline: encode texts into Triton tensors, decode responses,
//! and regroup per-sentence predictions by document.

pub mod assembler;
pub mod backend;
pub mod codec;
pub mod grouper;
pub mod segmenter;
pub mod service;

pub use assembler::assemble;
pub use backend::{InferRequest, InferenceInvoker, Readiness, SentenceSegmenter};
pub use codec::{EncodedTensor, RawOutput, decode_predictions, encode_strings};
pub use grouper::group;
pub use segmenter::TensorSegmenter;
pub use service::{ClassifierService, DEFAULT_MAX_CONCURRENT_BATCHES, ServiceOptions};

pub mod error;
pub mod io;
pub mod types;

pub use error::ClassifyError;
pub use io::{IoConfig, ModelIo, ModelRef, SegmenterIo};
pub use types::{ClassificationResult, DocumentResult, SentenceClassification, SentenceUnit};

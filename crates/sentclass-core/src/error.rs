use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("text {index} is {len} bytes, which does not fit a 32-bit length prefix")]
    EncodingOverflow { index: usize, len: usize },

    #[error("output '{output}' is truncated: needed {needed} bytes, {available} remaining")]
    TruncatedBuffer {
        output: String,
        needed: usize,
        available: usize,
    },

    #[error("output '{0}' missing from inference response")]
    MissingOutput(String),

    #[error("{what} length mismatch: {left} vs {right}")]
    LengthMismatch {
        what: &'static str,
        left: usize,
        right: usize,
    },

    #[error(
        "sentence {position} has group index {group_index}, but only {document_count} documents were supplied"
    )]
    GroupIndexOutOfRange {
        position: usize,
        group_index: i64,
        document_count: usize,
    },

    #[error("output '{output}' has unusable shape {shape:?}")]
    InvalidShape { output: String, shape: Vec<i64> },

    #[error("output '{output}' element {index} is not valid UTF-8")]
    InvalidUtf8 { output: String, index: usize },

    #[error("output '{output}' has datatype {actual}, expected {expected}")]
    UnexpectedDatatype {
        output: String,
        expected: &'static str,
        actual: String,
    },

    #[error("inference server is not ready")]
    NotReady,

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("server rejected request: {0}")]
    Rejected(String),
}

impl ClassifyError {
    /// True when the backend was unreachable or not ready, as opposed to
    /// rejecting the request or answering with a malformed response. Only
    /// these are worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::NotReady)
    }
}

//! Model I/O configuration: which model to call and how its tensors are named.
//!
//! Defaults match the Triton text classification and sentence splitting
//! models this client was built against; override them per deployment with
//! a JSON file instead of changing code.

use serde::{Deserialize, Serialize};

/// Triton datatype for variable-length string tensors.
pub const BYTES: &str = "BYTES";
pub const FP32: &str = "FP32";
pub const INT64: &str = "INT64";

/// A model on the inference server. An empty version lets the server pick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelRef {
    pub name: String,
    #[serde(default)]
    pub version: String,
}

impl ModelRef {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

/// Tensor names for the classification model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelIo {
    pub input_name: String,
    pub input_datatype: String,
    pub predict_output: String,
    pub score_output: String,
}

impl Default for ModelIo {
    fn default() -> Self {
        Self {
            input_name: "text".into(),
            input_datatype: BYTES.into(),
            predict_output: "predict".into(),
            score_output: "score".into(),
        }
    }
}

impl ModelIo {
    pub fn output_names(&self) -> Vec<String> {
        vec![self.predict_output.clone(), self.score_output.clone()]
    }
}

/// Tensor names for the sentence segmentation model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmenterIo {
    pub input_name: String,
    pub input_datatype: String,
    pub text_output: String,
    pub sent_index_output: String,
    pub group_index_output: String,
}

impl Default for SegmenterIo {
    fn default() -> Self {
        Self {
            input_name: "text".into(),
            input_datatype: BYTES.into(),
            text_output: "sent_text".into(),
            sent_index_output: "sent_index".into(),
            group_index_output: "group_index".into(),
        }
    }
}

impl SegmenterIo {
    pub fn output_names(&self) -> Vec<String> {
        vec![
            self.text_output.clone(),
            self.sent_index_output.clone(),
            self.group_index_output.clone(),
        ]
    }
}

/// Combined I/O configuration, as read from `--io-config`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IoConfig {
    pub model: ModelIo,
    pub segmenter: SegmenterIo,
}

impl IoConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

//! Configuration types for ONNX sentence classifiers.

use serde::{Deserialize, Serialize};

use super::activation::ProbabilityActivation;
use crate::artefact::ModelArtefact;

/// Configuration for an ONNX sentence classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OnnxClassifierConfig {
    /// Model artefact (ONNX graph) to load.
    pub model: ModelArtefact,
    /// Tokeniser artefact consumed by `tokenizers`.
    pub tokenizer: ModelArtefact,
    /// Ordered input names as defined in the ONNX graph.
    pub input_names: Vec<String>,
    /// Ordered output names to query after inference.
    pub output_names: Vec<String>,
    /// Maximum token count accepted by the model. Inputs are padded and truncated to this size.
    pub max_sequence_length: usize,
    /// Token inserted when padding shorter sequences.
    #[serde(default = "default_pad_token")]
    pub pad_token: String,
    /// Identifier of the padding token.
    #[serde(default)]
    pub pad_id: u32,
    /// Number of classes in the model output. Must match the taxonomy size.
    pub num_classes: usize,
    /// Mapping from raw outputs to probabilities.
    pub activation: ProbabilityActivation,
}

fn default_pad_token() -> String {
    "[PAD]".to_owned()
}

use std::path::PathBuf;

use thiserror::Error;

use crate::artefact::ArtefactError;

/// Errors produced by the shared ONNX classifier implementation.
#[derive(Debug, Error)]
pub enum OnnxClassifierError {
    #[error(transparent)]
    Artefact(#[from] ArtefactError),
    #[error("failed to load tokenizer from {path}: {source}")]
    LoadTokenizer {
        path: PathBuf,
        #[source]
        source: tokenizers::Error,
    },
    #[error("failed to configure tokenizer truncation: {0}")]
    ConfigureTruncation(#[source] tokenizers::Error),
    #[error("failed to construct ONNX session builder: {0}")]
    CreateSessionBuilder(#[source] ort::Error),
    #[error("failed to create ONNX session: {0}")]
    CreateSession(#[source] ort::Error),
    #[error("classifier requires at least {expected} input names but found {actual}")]
    InsufficientInputNames { expected: usize, actual: usize },
    #[error("classifier requires at least one output name")]
    MissingOutputNames,
    #[error("classifier requires max_sequence_length > 0")]
    ZeroSequenceLength,
    #[error("classifier requires num_classes > 0")]
    ZeroClassCount,
    #[error("tokenizer produced sequence of length {actual} but expected {expected}")]
    SequenceLength { expected: usize, actual: usize },
    #[error("failed to encode text: {0}")]
    Encode(#[source] tokenizers::Error),
    #[error("failed to convert encoded text into tensor: {0}")]
    EncodeTensor(#[source] ort::Error),
    #[error("session mutex was poisoned by a previous panic")]
    SessionPoisoned,
    #[error("failed to run inference: {0}")]
    Inference(#[source] ort::Error),
    #[error("ONNX output \"{name}\" missing from session results")]
    OutputMissing { name: String },
    #[error("ONNX output \"{name}\" has {actual} values but expected {expected}")]
    UnexpectedOutputCount {
        name: String,
        expected: usize,
        actual: usize,
    },
    #[error("model output {index} is not a finite number")]
    NonFiniteOutput { index: usize },
}

/// Errors returned by [`TopicClassifierOnnx`](super::TopicClassifierOnnx).
#[derive(Debug, Error)]
pub enum TopicClassifierOnnxError {
    #[error(transparent)]
    Classifier(#[from] OnnxClassifierError),
}

/// Errors returned by [`SentimentClassifierOnnx`](super::SentimentClassifierOnnx).
#[derive(Debug, Error)]
pub enum SentimentClassifierOnnxError {
    #[error(transparent)]
    Classifier(#[from] OnnxClassifierError),
}

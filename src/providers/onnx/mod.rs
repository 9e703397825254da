//! ONNX-backed sentence classifiers for topics and sentiment with artefact
//! verification.
//!
//! The two classifiers together form the production first-stage scorer via
//! [`onnx_scorer`].
mod activation;
mod classifier;
mod config;
mod errors;

pub use activation::ProbabilityActivation;
pub use config::OnnxClassifierConfig;
pub use errors::{OnnxClassifierError, SentimentClassifierOnnxError, TopicClassifierOnnxError};

use crate::providers::{ClassifierPair, TextProcessor};
use classifier::OnnxTextClassifier;

/// Topic classifier using an ONNX graph with one output per topic.
///
/// Returns independent per-topic probabilities for a single sentence.
#[derive(Debug)]
pub struct TopicClassifierOnnx {
    inner: OnnxTextClassifier,
}

impl TopicClassifierOnnx {
    /// Builds a topic classifier from disk artefacts.
    ///
    /// # Errors
    ///
    /// Returns [`TopicClassifierOnnxError`] when artefact verification or ONNX initialisation fails.
    ///
    /// # Examples
    /// ```no_run
    /// use review_topics::ModelArtefact;
    /// use review_topics::providers::onnx::{OnnxClassifierConfig, ProbabilityActivation, TopicClassifierOnnx, TopicClassifierOnnxError};
    ///
    /// # fn main() -> Result<(), TopicClassifierOnnxError> {
    /// let config = OnnxClassifierConfig {
    ///     model: ModelArtefact {
    ///         path: std::path::PathBuf::from("/models/topic_classifier.onnx"),
    ///         sha256: "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef".into(),
    ///     },
    ///     tokenizer: ModelArtefact {
    ///         path: std::path::PathBuf::from("/models/tokenizer.json"),
    ///         sha256: "fedcba9876543210fedcba9876543210fedcba9876543210fedcba9876543210".into(),
    ///     },
    ///     input_names: vec!["input_ids".into(), "attention_mask".into()],
    ///     output_names: vec!["logits".into()],
    ///     max_sequence_length: 128,
    ///     pad_token: "[PAD]".into(),
    ///     pad_id: 0,
    ///     num_classes: 18,
    ///     activation: ProbabilityActivation::Sigmoid,
    /// };
    /// let classifier = TopicClassifierOnnx::new(config)?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(config: OnnxClassifierConfig) -> Result<Self, TopicClassifierOnnxError> {
        OnnxTextClassifier::new(config)
            .map(|inner| Self { inner })
            .map_err(TopicClassifierOnnxError::Classifier)
    }
}

impl TextProcessor for TopicClassifierOnnx {
    type Output = Box<[f32]>;
    type Error = TopicClassifierOnnxError;

    fn process(&self, input: &str) -> Result<Self::Output, Self::Error> {
        self.inner
            .predict(input)
            .map(Vec::into_boxed_slice)
            .map_err(TopicClassifierOnnxError::Classifier)
    }
}

/// Sentiment classifier using an ONNX graph with one output per sentiment
/// class.
///
/// Returns a probability distribution over sentiment classes for a single
/// sentence.
#[derive(Debug)]
pub struct SentimentClassifierOnnx {
    inner: OnnxTextClassifier,
}

impl SentimentClassifierOnnx {
    /// Builds a sentiment classifier from disk artefacts.
    ///
    /// # Errors
    ///
    /// Returns [`SentimentClassifierOnnxError`] when artefact verification or ONNX initialisation fails.
    pub fn new(config: OnnxClassifierConfig) -> Result<Self, SentimentClassifierOnnxError> {
        OnnxTextClassifier::new(config)
            .map(|inner| Self { inner })
            .map_err(SentimentClassifierOnnxError::Classifier)
    }
}

impl TextProcessor for SentimentClassifierOnnx {
    type Output = Box<[f32]>;
    type Error = SentimentClassifierOnnxError;

    fn process(&self, input: &str) -> Result<Self::Output, Self::Error> {
        self.inner
            .predict(input)
            .map(Vec::into_boxed_slice)
            .map_err(SentimentClassifierOnnxError::Classifier)
    }
}

/// The production first-stage scorer.
pub type OnnxScorer = ClassifierPair<TopicClassifierOnnx, SentimentClassifierOnnx>;

/// Errors raised while building [`OnnxScorer`].
#[derive(Debug, thiserror::Error)]
pub enum OnnxScorerError {
    #[error(transparent)]
    Topic(#[from] TopicClassifierOnnxError),
    #[error(transparent)]
    Sentiment(#[from] SentimentClassifierOnnxError),
}

/// Loads both classifiers and pairs them into a sentence scorer.
///
/// # Errors
///
/// Returns [`OnnxScorerError`] when either classifier fails to load.
pub fn onnx_scorer(
    topic: OnnxClassifierConfig,
    sentiment: OnnxClassifierConfig,
) -> Result<OnnxScorer, OnnxScorerError> {
    let topic = TopicClassifierOnnx::new(topic)?;
    let sentiment = SentimentClassifierOnnx::new(sentiment)?;
    Ok(ClassifierPair::new(topic, sentiment))
}

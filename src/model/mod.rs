//! Review-level topic aggregation over fixed-length feature sequences.
//!
//! [`TopicAggregator`] is the seam the predictor calls; [`ReviewCnn`] is the
//! trained convolutional implementation.

mod cnn;

pub use cnn::ReviewCnn;

use std::path::PathBuf;

use thiserror::Error;

use crate::{artefact::ArtefactError, features::FeatureSequence};

/// Errors raised while loading or running an aggregator.
#[derive(Debug, Error)]
pub enum AggregatorError {
    #[error(transparent)]
    Artefact(#[from] ArtefactError),
    #[error("unsupported weight format for {path}; expected .safetensors, .pth or .pt")]
    UnsupportedFormat { path: PathBuf },
    #[error("failed to load aggregator weights: {0}")]
    Load(#[source] candle_core::Error),
    #[error("feature sequence has {actual} features per sentence but the model expects {expected}")]
    FeatureDim { expected: usize, actual: usize },
    #[error(transparent)]
    Tensor(#[from] candle_core::Error),
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),
}

/// Review-level outputs of a topic aggregator.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicScores {
    /// Independent activation in `[0, 1]` for each topic, 0-based.
    pub activations: Vec<f32>,
    /// For each topic, a distribution over sentiment classes. Not consumed by
    /// the label decision.
    pub topic_sentiments: Vec<Vec<f32>>,
}

/// Turns a fixed-length feature sequence into review-level topic scores.
pub trait TopicAggregator {
    /// Topic count the aggregator was trained for.
    fn num_categories(&self) -> usize;

    /// Sentiment count the aggregator was trained for.
    fn num_sentiments(&self) -> usize;

    /// Score one review.
    ///
    /// # Errors
    ///
    /// Returns an error if the feature width does not match the model or the
    /// forward pass fails.
    fn aggregate(&self, features: &FeatureSequence) -> Result<TopicScores, AggregatorError>;
}

//! Two-stage topic and sentiment inference for customer reviews.
//!
//! Reviews are split into sentences, scored by first-stage sentence
//! classifiers, aggregated into review-level topics by a convolutional
//! sequence model, and given a sentiment by averaging sentence sentiment.
//! Re-exports the main public types and traits.

pub mod api;
pub mod artefact;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod features;
#[cfg(all(feature = "cli", feature = "onnx"))]
pub mod manifest;
pub mod model;
pub mod predictor;
pub mod providers;
pub mod segmenter;
pub mod sentiment;
pub mod taxonomy;

pub use api::{PredictionRecord, PredictionsResponse, ReviewRequest, handle_request};
pub use artefact::{ArtefactError, ModelArtefact};
#[cfg(feature = "cli")]
pub use cli::ReviewsArgs;
pub use config::{AggregatorConfig, BatchPolicy, ConfigError, PipelineConfig, SentimentWindow};
pub use features::{FeatureSequence, SequenceFeatureBuilder};
pub use model::{AggregatorError, ReviewCnn, TopicAggregator, TopicScores};
pub use predictor::{BatchError, PredictError, Prediction, Review, ReviewPredictor};
pub use providers::{SentenceProbabilities, SentenceScorer, TextProcessor};
pub use segmenter::SentenceSegmenter;
pub use sentiment::{NEUTRAL_SENTIMENT, SentimentAggregator};
pub use taxonomy::{Taxonomies, Taxonomy, TaxonomyError};

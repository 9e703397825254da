//! Per-review and batch prediction.
//!
//! [`ReviewPredictor`] owns the frozen first-stage scorer and topic aggregator
//! and runs the full pipeline for each review: segmentation, first-stage
//! scoring, feature construction, aggregation, and the topic and sentiment
//! decision rules. It holds no mutable state, so batches run in parallel with
//! `rayon` while preserving input order.

use std::error::Error as StdError;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{ConfigError, PipelineConfig, validate_threshold};
use crate::features::SequenceFeatureBuilder;
use crate::model::{AggregatorError, TopicAggregator, TopicScores};
use crate::providers::{ScorerShapeError, SentenceScorer};
use crate::segmenter::SentenceSegmenter;
use crate::sentiment::{NEUTRAL_SENTIMENT, SentimentAggregator, select_topics};

/// A review submitted for prediction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: i64,
    pub text: String,
}

impl Review {
    #[must_use]
    pub fn new(id: i64, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
        }
    }
}

/// Predicted labels for one review.
///
/// Topic labels are 1-based, ascending, and unique. The sentiment label is
/// 1-based and always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prediction {
    pub id: i64,
    pub topics: Vec<usize>,
    pub sentiment: usize,
}

/// Errors raised while predicting a single review.
#[derive(Debug, Error)]
pub enum PredictError {
    #[error(transparent)]
    InvalidThreshold(#[from] ConfigError),
    #[error("first-stage scorer failed: {0}")]
    Scorer(#[source] Box<dyn StdError + Send + Sync>),
    #[error("first-stage scorer broke its output contract: {0}")]
    Shape(#[from] ScorerShapeError),
    #[error(transparent)]
    Aggregator(#[from] AggregatorError),
}

/// A failing review that aborted a batch.
#[derive(Debug, Error)]
#[error("review {id} at position {index} failed: {source}")]
pub struct BatchError {
    pub index: usize,
    pub id: i64,
    #[source]
    pub source: PredictError,
}

/// Runs the two-stage pipeline over reviews.
#[derive(Debug)]
pub struct ReviewPredictor<S, A> {
    segmenter: SentenceSegmenter,
    scorer: S,
    aggregator: A,
    features: SequenceFeatureBuilder,
    config: PipelineConfig,
}

impl<S: SentenceScorer, A: TopicAggregator> ReviewPredictor<S, A> {
    /// Build a predictor from a scorer, an aggregator, and the pipeline
    /// configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the configuration is invalid or the
    /// aggregator was trained for a different number of topic or sentiment
    /// classes than configured.
    pub fn new(scorer: S, aggregator: A, config: PipelineConfig) -> Result<Self, ConfigError> {
        let config = config.validate()?;
        check_shape("topic classes", config.num_categories, aggregator.num_categories())?;
        check_shape("sentiment classes", config.num_sentiments, aggregator.num_sentiments())?;
        Ok(Self {
            segmenter: SentenceSegmenter::new(),
            scorer,
            aggregator,
            features: SequenceFeatureBuilder::new(config.max_seq_len),
            config,
        })
    }

    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Predict topics and sentiment for one review.
    ///
    /// A review without sentences skips both models and yields no topics and
    /// the neutral sentiment.
    ///
    /// # Errors
    ///
    /// Returns [`PredictError`] if `threshold` is invalid, the scorer fails or
    /// returns misshapen matrices, or the aggregator fails.
    pub fn predict_review(
        &self,
        review: &Review,
        threshold: f32,
    ) -> Result<Prediction, PredictError> {
        let threshold = validate_threshold(threshold)?;
        let sentences = self.segmenter.split(&review.text);
        tracing::debug!(id = review.id, sentences = sentences.len(), "segmented review");
        if sentences.is_empty() {
            return Ok(Prediction {
                id: review.id,
                topics: Vec::new(),
                sentiment: NEUTRAL_SENTIMENT,
            });
        }
        if sentences.len() > self.config.max_seq_len {
            tracing::warn!(
                id = review.id,
                sentences = sentences.len(),
                max_seq_len = self.config.max_seq_len,
                "review exceeds max_seq_len; trailing sentences are not aggregated"
            );
        }

        let scored = self
            .scorer
            .score(&sentences)
            .map_err(|e| PredictError::Scorer(Box::new(e)))?;
        scored.validate(
            sentences.len(),
            self.config.num_categories,
            self.config.num_sentiments,
        )?;

        let features = self
            .features
            .build_with_dim(&scored, self.config.feature_dim());
        let TopicScores { activations, .. } = self.aggregator.aggregate(&features)?;
        let limit = self
            .config
            .sentiment_window
            .limit(scored.len(), self.config.max_seq_len);

        Ok(Prediction {
            id: review.id,
            topics: select_topics(&activations, threshold),
            sentiment: SentimentAggregator.label(&scored.sentiments, limit),
        })
    }
}

impl<S, A> ReviewPredictor<S, A>
where
    S: SentenceScorer + Sync,
    A: TopicAggregator + Sync,
{
    /// Predict every review independently, returning one result per review in
    /// input order.
    #[must_use]
    pub fn predict_batch(
        &self,
        reviews: &[Review],
        threshold: f32,
    ) -> Vec<Result<Prediction, PredictError>> {
        tracing::debug!(reviews = reviews.len(), "predicting batch");
        reviews
            .par_iter()
            .map(|review| self.predict_review(review, threshold))
            .collect()
    }

    /// Predict every review, failing on the first review (by position) that
    /// cannot be predicted.
    ///
    /// # Errors
    ///
    /// Returns a [`BatchError`] carrying the failing review's position and
    /// identifier.
    pub fn try_predict_batch(
        &self,
        reviews: &[Review],
        threshold: f32,
    ) -> Result<Vec<Prediction>, BatchError> {
        self.predict_batch(reviews, threshold)
            .into_iter()
            .zip(reviews)
            .enumerate()
            .map(|(index, (result, review))| {
                result.map_err(|source| BatchError {
                    index,
                    id: review.id,
                    source,
                })
            })
            .collect()
    }
}

fn check_shape(what: &'static str, expected: usize, actual: usize) -> Result<(), ConfigError> {
    if expected == actual {
        Ok(())
    } else {
        Err(ConfigError::ShapeMismatch {
            component: "topic aggregator",
            what,
            expected,
            actual,
        })
    }
}

//! Pipeline and aggregator configuration with serialisation and validation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default activation threshold for including a topic.
pub const DEFAULT_THRESHOLD: f32 = 0.5;
/// Default number of sentences the aggregator sees.
pub const DEFAULT_MAX_SEQ_LEN: usize = 50;
/// Number of topic classes in the trained taxonomy.
pub const DEFAULT_NUM_CATEGORIES: usize = 18;
/// Number of sentiment classes (negative, neutral, positive).
pub const DEFAULT_NUM_SENTIMENTS: usize = 3;

/// Errors raised by configuration validation.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("threshold must be a finite value in [0, 1], got {0}")]
    Threshold(f32),
    #[error("max_seq_len must be greater than 0")]
    ZeroSequenceLength,
    #[error("{0} must be greater than 0")]
    ZeroDimension(&'static str),
    #[error("dropout must be in [0, 1), got {0}")]
    Dropout(f32),
    #[error("{component} was built for {actual} {what} but the pipeline expects {expected}")]
    ShapeMismatch {
        component: &'static str,
        what: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// Which sentences contribute to the review-level sentiment average.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentimentWindow {
    /// Average the first `min(N, max_seq_len)` sentences, the same sentences
    /// the topic aggregator sees.
    #[default]
    Truncated,
    /// Average every extracted sentence, even those past `max_seq_len`.
    AllSentences,
}

impl SentimentWindow {
    /// Number of leading sentences to average out of `sentences`.
    #[must_use]
    pub fn limit(self, sentences: usize, max_seq_len: usize) -> usize {
        match self {
            Self::Truncated => sentences.min(max_seq_len),
            Self::AllSentences => sentences,
        }
    }
}

/// How a batch reacts when one review fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchPolicy {
    /// Keep going and report each failure next to its review.
    #[default]
    PerItem,
    /// Abort the whole batch on the first failure.
    FailFast,
}

/// Runtime settings shared by every review prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Topics whose activation strictly exceeds this value are predicted.
    pub threshold: f32,
    /// Fixed sentence count of the feature sequence.
    pub max_seq_len: usize,
    /// Size of the topic taxonomy.
    pub num_categories: usize,
    /// Size of the sentiment taxonomy.
    pub num_sentiments: usize,
    pub sentiment_window: SentimentWindow,
    pub batch_policy: BatchPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            max_seq_len: DEFAULT_MAX_SEQ_LEN,
            num_categories: DEFAULT_NUM_CATEGORIES,
            num_sentiments: DEFAULT_NUM_SENTIMENTS,
            sentiment_window: SentimentWindow::default(),
            batch_policy: BatchPolicy::default(),
        }
    }
}

impl PipelineConfig {
    /// Ensure the configuration values are within acceptable bounds.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for an out-of-range threshold or a zero
    /// sequence length or class count.
    #[must_use = "Validation should not be ignored"]
    pub fn validate(self) -> Result<Self, ConfigError> {
        validate_threshold(self.threshold)?;
        if self.max_seq_len == 0 {
            return Err(ConfigError::ZeroSequenceLength);
        }
        non_zero("num_categories", self.num_categories)?;
        non_zero("num_sentiments", self.num_sentiments)?;
        Ok(self)
    }

    /// Width of one feature row: topic probabilities followed by sentiment
    /// probabilities.
    #[must_use]
    pub fn feature_dim(&self) -> usize {
        self.num_categories + self.num_sentiments
    }
}

/// Check that a topic threshold is usable.
///
/// # Errors
///
/// Returns [`ConfigError::Threshold`] for values outside `[0, 1]` or
/// non-finite values.
pub fn validate_threshold(threshold: f32) -> Result<f32, ConfigError> {
    if threshold.is_finite() && (0.0..=1.0).contains(&threshold) {
        Ok(threshold)
    } else {
        Err(ConfigError::Threshold(threshold))
    }
}

/// Trained shape of the convolutional topic aggregator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AggregatorConfig {
    pub num_categories: usize,
    pub num_sentiments: usize,
    /// Width of the hidden layer in both output heads.
    pub hidden_dim: usize,
    /// Output channels of the sequence convolution.
    pub num_filters: usize,
    /// Convolution window in sentences; padding is `kernel_size / 2` on each side.
    pub kernel_size: usize,
    /// Dropout probability used during training. Inference ignores it.
    pub dropout: f32,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            num_categories: DEFAULT_NUM_CATEGORIES,
            num_sentiments: DEFAULT_NUM_SENTIMENTS,
            hidden_dim: 128,
            num_filters: 64,
            kernel_size: 3,
            dropout: 0.3,
        }
    }
}

impl AggregatorConfig {
    /// Ensure every dimension is non-zero and dropout is a probability.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming the offending field.
    #[must_use = "Validation should not be ignored"]
    pub fn validate(self) -> Result<Self, ConfigError> {
        non_zero("num_categories", self.num_categories)?;
        non_zero("num_sentiments", self.num_sentiments)?;
        non_zero("hidden_dim", self.hidden_dim)?;
        non_zero("num_filters", self.num_filters)?;
        non_zero("kernel_size", self.kernel_size)?;
        if !(self.dropout.is_finite() && (0.0..1.0).contains(&self.dropout)) {
            return Err(ConfigError::Dropout(self.dropout));
        }
        Ok(self)
    }

    #[must_use]
    pub fn input_dim(&self) -> usize {
        self.num_categories + self.num_sentiments
    }
}

fn non_zero(field: &'static str, value: usize) -> Result<(), ConfigError> {
    if value == 0 {
        Err(ConfigError::ZeroDimension(field))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn deserialise_partial_pipeline_config() {
        let json = r#"{"threshold":0.7,"sentiment_window":"all_sentences"}"#;
        #[expect(clippy::expect_used, reason = "test should fail loudly")]
        let cfg: PipelineConfig = serde_json::from_str(json).expect("deserialise PipelineConfig");
        assert_eq!(
            cfg,
            PipelineConfig {
                threshold: 0.7,
                sentiment_window: SentimentWindow::AllSentences,
                ..PipelineConfig::default()
            }
        );
    }

    #[rstest]
    fn serialise_batch_policy() {
        #[expect(clippy::expect_used, reason = "test should fail loudly")]
        let json = serde_json::to_string(&BatchPolicy::FailFast).expect("serialise BatchPolicy");
        assert_eq!(json, r#""fail_fast""#);
    }

    #[rstest]
    fn deserialise_unknown_field() {
        let json = r#"{"threshold":0.5,"window":3}"#;
        let cfg: Result<PipelineConfig, _> = serde_json::from_str(json);
        assert!(cfg.is_err());
    }

    #[rstest]
    #[case(-0.1)]
    #[case(1.5)]
    #[case(f32::NAN)]
    #[case(f32::INFINITY)]
    fn validate_rejects_threshold(#[case] threshold: f32) {
        let cfg = PipelineConfig {
            threshold,
            ..PipelineConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::Threshold(_))));
    }

    #[rstest]
    fn validate_rejects_zero_sequence_length() {
        let cfg = PipelineConfig {
            max_seq_len: 0,
            ..PipelineConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroSequenceLength));
    }

    #[rstest]
    #[case(SentimentWindow::Truncated, 70, 50, 50)]
    #[case(SentimentWindow::Truncated, 7, 50, 7)]
    #[case(SentimentWindow::AllSentences, 70, 50, 70)]
    fn sentiment_window_limits(
        #[case] window: SentimentWindow,
        #[case] sentences: usize,
        #[case] max_seq_len: usize,
        #[case] expected: usize,
    ) {
        assert_eq!(window.limit(sentences, max_seq_len), expected);
    }

    #[rstest]
    fn validate_aggregator_defaults() {
        let cfg = AggregatorConfig::default();
        assert_eq!(cfg.input_dim(), 21);
        assert!(cfg.validate().is_ok());
    }

    #[rstest]
    fn validate_rejects_zero_kernel() {
        let cfg = AggregatorConfig {
            kernel_size: 0,
            ..AggregatorConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroDimension("kernel_size")));
    }
}

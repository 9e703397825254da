//! Deterministic test doubles for the review pipeline.
#![allow(dead_code, reason = "each integration test uses a subset of the helpers")]

use std::convert::Infallible;

use review_topics::{
    AggregatorError, FeatureSequence, PipelineConfig, SentenceProbabilities, SentenceScorer,
    TopicAggregator, TopicScores,
};
use thiserror::Error;

/// Keyword stems marking topics 1, 2 and 3.
pub const TOPIC_KEYWORDS: &[&str] = &["доставк", "цен", "качеств"];
pub const TOPIC_LABELS: &[&str] = &["Доставка", "Цена", "Качество"];

#[expect(clippy::float_arithmetic, reason = "tolerance comparison")]
#[must_use]
pub fn approx_eq(a: f32, b: f32, tol: f32) -> bool {
    (a - b).abs() < tol
}

/// Pipeline settings matching the three-topic doubles below.
#[must_use]
pub fn small_config(max_seq_len: usize) -> PipelineConfig {
    PipelineConfig {
        max_seq_len,
        num_categories: TOPIC_KEYWORDS.len(),
        num_sentiments: 3,
        ..PipelineConfig::default()
    }
}

#[derive(Debug, Error)]
#[error("cannot score sentence `{0}`")]
pub struct ScoringFailed(pub String);

/// Scores topics by keyword and sentiment by a few polar stems.
///
/// Any sentence containing "сбой" fails to score.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeywordScorer;

impl SentenceScorer for KeywordScorer {
    type Error = ScoringFailed;

    fn score(&self, sentences: &[String]) -> Result<SentenceProbabilities, Self::Error> {
        let mut scored = SentenceProbabilities::default();
        for sentence in sentences {
            let lower = sentence.to_lowercase();
            if lower.contains("сбой") {
                return Err(ScoringFailed(sentence.clone()));
            }
            scored.topics.push(
                TOPIC_KEYWORDS
                    .iter()
                    .map(|keyword| if lower.contains(keyword) { 0.9 } else { 0.1 })
                    .collect(),
            );
            scored.sentiments.push(sentiment_row(&lower));
        }
        Ok(scored)
    }
}

fn sentiment_row(lower: &str) -> Vec<f32> {
    if lower.contains("плох") || lower.contains("ужас") {
        vec![0.8, 0.15, 0.05]
    } else if lower.contains("хорош") || lower.contains("отлич") {
        vec![0.05, 0.15, 0.8]
    } else {
        vec![0.2, 0.6, 0.2]
    }
}

/// Returns the same rows for every sentence.
#[derive(Debug, Clone)]
pub struct ConstantScorer {
    pub topics: Vec<f32>,
    pub sentiments: Vec<f32>,
}

impl SentenceScorer for ConstantScorer {
    type Error = Infallible;

    fn score(&self, sentences: &[String]) -> Result<SentenceProbabilities, Self::Error> {
        Ok(SentenceProbabilities {
            topics: vec![self.topics.clone(); sentences.len()],
            sentiments: vec![self.sentiments.clone(); sentences.len()],
        })
    }
}

/// Drops the last sentence's rows.
#[derive(Debug, Default, Clone, Copy)]
pub struct MisshapenScorer;

impl SentenceScorer for MisshapenScorer {
    type Error = Infallible;

    fn score(&self, sentences: &[String]) -> Result<SentenceProbabilities, Self::Error> {
        let rows = sentences.len().saturating_sub(1);
        Ok(SentenceProbabilities {
            topics: vec![vec![0.5; TOPIC_KEYWORDS.len()]; rows],
            sentiments: vec![vec![0.0, 1.0, 0.0]; rows],
        })
    }
}

/// Panics when called; proves a code path never reaches the scorer.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnreachableScorer;

impl SentenceScorer for UnreachableScorer {
    type Error = Infallible;

    fn score(&self, sentences: &[String]) -> Result<SentenceProbabilities, Self::Error> {
        panic!("scorer called with {} sentences", sentences.len());
    }
}

/// Topic activation is the largest topic probability at any position.
#[derive(Debug, Clone, Copy)]
pub struct MaxPoolAggregator {
    pub num_categories: usize,
    pub num_sentiments: usize,
}

impl Default for MaxPoolAggregator {
    fn default() -> Self {
        Self {
            num_categories: TOPIC_KEYWORDS.len(),
            num_sentiments: 3,
        }
    }
}

impl TopicAggregator for MaxPoolAggregator {
    fn num_categories(&self) -> usize {
        self.num_categories
    }

    fn num_sentiments(&self) -> usize {
        self.num_sentiments
    }

    fn aggregate(&self, features: &FeatureSequence) -> Result<TopicScores, AggregatorError> {
        let mut activations = vec![0.0_f32; self.num_categories];
        for position in 0..features.len() {
            if let Some(row) = features.row(position) {
                for (activation, value) in activations.iter_mut().zip(row) {
                    *activation = activation.max(*value);
                }
            }
        }
        Ok(TopicScores {
            activations,
            topic_sentiments: uniform_sentiments(self.num_categories, self.num_sentiments),
        })
    }
}

/// Always reports the same activations.
#[derive(Debug, Clone)]
pub struct FixedAggregator {
    pub activations: Vec<f32>,
    pub num_sentiments: usize,
}

impl FixedAggregator {
    #[must_use]
    pub fn new(activations: Vec<f32>) -> Self {
        Self {
            activations,
            num_sentiments: 3,
        }
    }
}

impl TopicAggregator for FixedAggregator {
    fn num_categories(&self) -> usize {
        self.activations.len()
    }

    fn num_sentiments(&self) -> usize {
        self.num_sentiments
    }

    fn aggregate(&self, _features: &FeatureSequence) -> Result<TopicScores, AggregatorError> {
        Ok(TopicScores {
            activations: self.activations.clone(),
            topic_sentiments: uniform_sentiments(self.activations.len(), self.num_sentiments),
        })
    }
}

fn uniform_sentiments(categories: usize, sentiments: usize) -> Vec<Vec<f32>> {
    #[expect(clippy::cast_precision_loss, reason = "class counts are tiny")]
    #[expect(clippy::float_arithmetic, reason = "uniform distribution")]
    let share = 1.0 / sentiments as f32;
    vec![vec![share; sentiments]; categories]
}

//! First-stage scoring interfaces.
//!
//! Defines the `TextProcessor` trait implemented by single-sentence
//! classifiers and the `SentenceScorer` trait the review pipeline calls to
//! turn a list of sentences into row-aligned topic and sentiment probability
//! matrices.

#[cfg(feature = "onnx")]
pub mod onnx;

mod pair;

pub use pair::{ClassifierPair, ClassifierPairError};

use thiserror::Error;

/// Processes text to produce a structured, thread-safe output.
///
/// Sentence classifiers implement this trait with `Output = Box<[f32]>`, one
/// probability per class.
pub trait TextProcessor {
    /// Structured result returned by the processor.
    type Output: Send + Sync + 'static;
    /// Error type returned when processing fails.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Process the supplied text.
    ///
    /// # Errors
    ///
    /// Returns an error if processing fails.
    fn process(&self, input: &str) -> Result<Self::Output, Self::Error>;
}

/// Row-aligned probability matrices for a list of sentences.
///
/// Row `i` of both matrices belongs to sentence `i` of the scored input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SentenceProbabilities {
    /// `N x C` independent topic probabilities.
    pub topics: Vec<Vec<f32>>,
    /// `N x S` sentiment distributions.
    pub sentiments: Vec<Vec<f32>>,
}

/// Violations of the scorer's output contract.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScorerShapeError {
    #[error("scorer returned {actual} {matrix} rows for {expected} sentences")]
    RowCount {
        matrix: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("{matrix} row {row} has {actual} columns but expected {expected}")]
    RowWidth {
        matrix: &'static str,
        row: usize,
        expected: usize,
        actual: usize,
    },
}

impl SentenceProbabilities {
    /// Number of scored sentences.
    #[must_use]
    pub fn len(&self) -> usize {
        self.topics.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    /// Check that both matrices have one row per sentence and the configured
    /// number of columns.
    ///
    /// # Errors
    ///
    /// Returns [`ScorerShapeError`] describing the first violation found.
    pub fn validate(
        &self,
        sentences: usize,
        num_categories: usize,
        num_sentiments: usize,
    ) -> Result<(), ScorerShapeError> {
        check_matrix("topic", &self.topics, sentences, num_categories)?;
        check_matrix("sentiment", &self.sentiments, sentences, num_sentiments)
    }
}

fn check_matrix(
    matrix: &'static str,
    rows: &[Vec<f32>],
    expected_rows: usize,
    width: usize,
) -> Result<(), ScorerShapeError> {
    if rows.len() != expected_rows {
        return Err(ScorerShapeError::RowCount {
            matrix,
            expected: expected_rows,
            actual: rows.len(),
        });
    }
    match rows.iter().position(|row| row.len() != width) {
        Some(row) => Err(ScorerShapeError::RowWidth {
            matrix,
            row,
            expected: width,
            actual: rows.get(row).map_or(0, Vec::len),
        }),
        None => Ok(()),
    }
}

/// Scores an ordered list of sentences with the first-stage classifiers.
///
/// Implementations must return exactly one row per sentence, in input order.
/// An empty input yields empty matrices.
pub trait SentenceScorer {
    /// Error type returned when scoring fails.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Score every sentence.
    ///
    /// # Errors
    ///
    /// Returns an error if any sentence cannot be scored.
    fn score(&self, sentences: &[String]) -> Result<SentenceProbabilities, Self::Error>;
}

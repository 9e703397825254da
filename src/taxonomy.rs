//! Human-readable labels for topic and sentiment classes.
//!
//! Taxonomies are built once at startup and only read afterwards. Lookups use
//! the 1-based labels produced by the predictor.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when building or resolving taxonomies.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TaxonomyError {
    #[error("topic label {label} is outside the taxonomy of {size} topics")]
    UnknownTopic { label: usize, size: usize },
    #[error("sentiment label {label} is outside the taxonomy of {size} sentiments")]
    UnknownSentiment { label: usize, size: usize },
    #[error("{kind} taxonomy has {actual} labels but the model predicts {expected} classes")]
    SizeMismatch {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// Ordered class names; entry `i` names class `i + 1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Taxonomy {
    labels: Vec<String>,
}

impl Taxonomy {
    #[must_use]
    pub fn new(labels: Vec<String>) -> Self {
        Self { labels }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Name of the 1-based class `label`, if it exists.
    #[must_use]
    pub fn get(&self, label: usize) -> Option<&str> {
        label
            .checked_sub(1)
            .and_then(|index| self.labels.get(index))
            .map(String::as_str)
    }

    /// The default three-class sentiment taxonomy.
    ///
    /// # Examples
    ///
    /// ```
    /// use review_topics::taxonomy::Taxonomy;
    ///
    /// let sentiments = Taxonomy::default_sentiments();
    /// assert_eq!(sentiments.get(2), Some("нейтрально"));
    /// assert_eq!(sentiments.get(0), None);
    /// ```
    #[must_use]
    pub fn default_sentiments() -> Self {
        Self::new(
            ["отрицательно", "нейтрально", "положительно"]
                .into_iter()
                .map(str::to_owned)
                .collect(),
        )
    }
}

impl<S: Into<String>> FromIterator<S> for Taxonomy {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(Into::into).collect())
    }
}

/// Topic and sentiment taxonomies used to resolve predictions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Taxonomies {
    pub topics: Taxonomy,
    #[serde(default = "Taxonomy::default_sentiments")]
    pub sentiments: Taxonomy,
}

impl Taxonomies {
    /// Pair a topic taxonomy with the default sentiment taxonomy.
    #[must_use]
    pub fn with_topics(topics: Taxonomy) -> Self {
        Self {
            topics,
            sentiments: Taxonomy::default_sentiments(),
        }
    }

    /// Check both taxonomies against the model's class counts.
    ///
    /// # Errors
    ///
    /// Returns [`TaxonomyError::SizeMismatch`] naming the first taxonomy whose
    /// size differs.
    pub fn validate(
        &self,
        num_categories: usize,
        num_sentiments: usize,
    ) -> Result<(), TaxonomyError> {
        check_size("topic", &self.topics, num_categories)?;
        check_size("sentiment", &self.sentiments, num_sentiments)
    }

    /// Resolve 1-based topic labels to names, preserving order.
    ///
    /// # Errors
    ///
    /// Returns [`TaxonomyError::UnknownTopic`] for the first label outside the
    /// taxonomy.
    pub fn topic_names(&self, labels: &[usize]) -> Result<Vec<String>, TaxonomyError> {
        labels
            .iter()
            .map(|&label| {
                self.topics
                    .get(label)
                    .map(str::to_owned)
                    .ok_or(TaxonomyError::UnknownTopic {
                        label,
                        size: self.topics.len(),
                    })
            })
            .collect()
    }

    /// Resolve a 1-based sentiment label to its name.
    ///
    /// # Errors
    ///
    /// Returns [`TaxonomyError::UnknownSentiment`] if the label is outside the
    /// taxonomy.
    pub fn sentiment_name(&self, label: usize) -> Result<&str, TaxonomyError> {
        self.sentiments
            .get(label)
            .ok_or(TaxonomyError::UnknownSentiment {
                label,
                size: self.sentiments.len(),
            })
    }
}

fn check_size(
    kind: &'static str,
    taxonomy: &Taxonomy,
    expected: usize,
) -> Result<(), TaxonomyError> {
    if taxonomy.len() == expected {
        Ok(())
    } else {
        Err(TaxonomyError::SizeMismatch {
            kind,
            expected,
            actual: taxonomy.len(),
        })
    }
}

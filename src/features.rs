//! Fixed-length feature sequences built from first-stage probabilities.
//!
//! Each row concatenates one sentence's topic probabilities with its sentiment
//! probabilities. Sequences shorter than `max_seq_len` are zero-padded at the
//! end; longer sequences keep only their first `max_seq_len` sentences.

use crate::providers::SentenceProbabilities;

/// Row-major `max_seq_len x feature_dim` input for the topic aggregator.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSequence {
    values: Vec<f32>,
    max_seq_len: usize,
    feature_dim: usize,
    real_len: usize,
}

impl FeatureSequence {
    /// Number of positions, always equal to the configured `max_seq_len`.
    #[must_use]
    pub fn len(&self) -> usize {
        self.max_seq_len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.max_seq_len == 0
    }

    #[must_use]
    pub fn feature_dim(&self) -> usize {
        self.feature_dim
    }

    /// Number of positions holding real sentences; the rest are padding.
    #[must_use]
    pub fn real_len(&self) -> usize {
        self.real_len
    }

    /// Flat row-major values.
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    /// The feature row at `position`, if it exists.
    #[must_use]
    pub fn row(&self, position: usize) -> Option<&[f32]> {
        let start = position.checked_mul(self.feature_dim)?;
        (position < self.max_seq_len).then(|| &self.values[start..start + self.feature_dim])
    }
}

/// Builds [`FeatureSequence`]s of a fixed length.
///
/// # Examples
///
/// ```
/// use review_topics::SequenceFeatureBuilder;
/// use review_topics::providers::SentenceProbabilities;
///
/// let builder = SequenceFeatureBuilder::new(4);
/// let scored = SentenceProbabilities {
///     topics: vec![vec![0.9, 0.1]],
///     sentiments: vec![vec![0.2, 0.3, 0.5]],
/// };
/// let features = builder.build(&scored);
/// assert_eq!(features.len(), 4);
/// assert_eq!(features.row(0), Some(&[0.9, 0.1, 0.2, 0.3, 0.5][..]));
/// assert_eq!(features.row(3), Some(&[0.0; 5][..]));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SequenceFeatureBuilder {
    max_seq_len: usize,
}

impl SequenceFeatureBuilder {
    #[must_use]
    pub fn new(max_seq_len: usize) -> Self {
        Self { max_seq_len }
    }

    /// Concatenate, pad, and truncate the scored sentences.
    ///
    /// The row width is taken from the first sentence; callers validate the
    /// matrices with [`SentenceProbabilities::validate`] beforehand so every
    /// row shares it.
    #[must_use]
    pub fn build(&self, scored: &SentenceProbabilities) -> FeatureSequence {
        let feature_dim = match (scored.topics.first(), scored.sentiments.first()) {
            (Some(topics), Some(sentiments)) => topics.len() + sentiments.len(),
            _ => 0,
        };
        self.build_with_dim(scored, feature_dim)
    }

    /// Like [`build`](Self::build) with an explicit row width, so an empty
    /// review still yields a correctly shaped all-zero sequence.
    #[must_use]
    pub fn build_with_dim(
        &self,
        scored: &SentenceProbabilities,
        feature_dim: usize,
    ) -> FeatureSequence {
        let real_len = scored.len().min(self.max_seq_len);
        let mut values = Vec::with_capacity(self.max_seq_len * feature_dim);
        for (topics, sentiments) in scored
            .topics
            .iter()
            .zip(&scored.sentiments)
            .take(real_len)
        {
            values.extend_from_slice(topics);
            values.extend_from_slice(sentiments);
        }
        values.resize(self.max_seq_len * feature_dim, 0.0);
        if scored.len() > self.max_seq_len {
            tracing::debug!(
                sentences = scored.len(),
                max_seq_len = self.max_seq_len,
                "truncated feature sequence"
            );
        }
        FeatureSequence {
            values,
            max_seq_len: self.max_seq_len,
            feature_dim,
            real_len,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn scored(rows: usize) -> SentenceProbabilities {
        #[expect(clippy::cast_precision_loss, reason = "row indices are tiny")]
        let value = |row: usize| row as f32 + 1.0;
        SentenceProbabilities {
            topics: (0..rows).map(|row| vec![value(row), 0.0]).collect(),
            sentiments: (0..rows).map(|row| vec![0.0, value(row)]).collect(),
        }
    }

    #[rstest]
    #[case(0, 3, 0)]
    #[case(2, 3, 2)]
    #[case(3, 3, 3)]
    #[case(5, 3, 3)]
    fn sequence_has_fixed_length(
        #[case] rows: usize,
        #[case] max_seq_len: usize,
        #[case] real_len: usize,
    ) {
        let features = SequenceFeatureBuilder::new(max_seq_len).build_with_dim(&scored(rows), 4);
        assert_eq!(features.len(), max_seq_len);
        assert_eq!(features.as_slice().len(), max_seq_len * 4);
        assert_eq!(features.real_len(), real_len);
    }

    #[test]
    fn pads_with_zero_rows() {
        let features = SequenceFeatureBuilder::new(3).build(&scored(1));
        assert_eq!(features.row(0), Some(&[1.0, 0.0, 0.0, 1.0][..]));
        assert_eq!(features.row(1), Some(&[0.0; 4][..]));
        assert_eq!(features.row(2), Some(&[0.0; 4][..]));
        assert_eq!(features.row(3), None);
    }

    #[test]
    fn truncation_keeps_leading_sentences() {
        let features = SequenceFeatureBuilder::new(2).build(&scored(4));
        assert_eq!(features.row(0), Some(&[1.0, 0.0, 0.0, 1.0][..]));
        assert_eq!(features.row(1), Some(&[2.0, 0.0, 0.0, 2.0][..]));
    }
}

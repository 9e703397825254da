//! Review-level label decisions.
//!
//! Topics are chosen by thresholding aggregator activations. Sentiment is the
//! arg-max of the first-stage sentiment probabilities averaged over real
//! sentences only; padding rows never take part. Labels are 1-based.

/// Sentiment label returned when a review has no sentences.
pub const NEUTRAL_SENTIMENT: usize = 2;

/// 1-based topic labels whose activation strictly exceeds `threshold`, in
/// ascending order.
///
/// # Examples
///
/// ```
/// use review_topics::sentiment::select_topics;
///
/// assert_eq!(select_topics(&[0.7, 0.5, 0.2, 0.51], 0.5), vec![1, 4]);
/// ```
#[must_use]
pub fn select_topics(activations: &[f32], threshold: f32) -> Vec<usize> {
    activations
        .iter()
        .enumerate()
        .filter(|(_, activation)| **activation > threshold)
        .map(|(index, _)| index + 1)
        .collect()
}

/// Averages sentence-level sentiment distributions into one label.
#[derive(Debug, Clone, Copy, Default)]
pub struct SentimentAggregator;

impl SentimentAggregator {
    /// Mean of the first `limit` rows, or `None` when there are none.
    #[must_use]
    pub fn average(&self, rows: &[Vec<f32>], limit: usize) -> Option<Vec<f32>> {
        let rows = rows.get(..limit.min(rows.len()))?;
        let width = rows.first()?.len();
        let mut sums = vec![0.0_f64; width];
        for row in rows {
            for (sum, value) in sums.iter_mut().zip(row) {
                #[expect(clippy::float_arithmetic, reason = "accumulating probabilities")]
                {
                    *sum += f64::from(*value);
                }
            }
        }
        #[expect(clippy::cast_precision_loss, reason = "sentence counts fit in f64")]
        let count = rows.len() as f64;
        #[expect(
            clippy::float_arithmetic,
            clippy::cast_possible_truncation,
            reason = "mean is accumulated in f64 then narrowed to f32"
        )]
        Some(sums.into_iter().map(|sum| (sum / count) as f32).collect())
    }

    /// 1-based arg-max label of the averaged first `limit` rows.
    ///
    /// Ties resolve to the lowest class. With no rows the neutral label is
    /// returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use review_topics::sentiment::{SentimentAggregator, NEUTRAL_SENTIMENT};
    ///
    /// let rows = vec![vec![0.1, 0.2, 0.7], vec![0.6, 0.3, 0.1]];
    /// assert_eq!(SentimentAggregator.label(&rows, 2), 3);
    /// assert_eq!(SentimentAggregator.label(&rows, 1), 3);
    /// assert_eq!(SentimentAggregator.label(&[], 5), NEUTRAL_SENTIMENT);
    /// ```
    #[must_use]
    pub fn label(&self, rows: &[Vec<f32>], limit: usize) -> usize {
        self.average(rows, limit)
            .and_then(|mean| arg_max(&mean))
            .map_or(NEUTRAL_SENTIMENT, |index| index + 1)
    }
}

/// Index of the largest value; the first one wins ties.
fn arg_max(values: &[f32]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f32)>, (index, value)| match best {
            Some((_, best_value)) if *value <= best_value => best,
            _ => Some((index, *value)),
        })
        .map(|(index, _)| index)
}

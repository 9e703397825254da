//! Request and response records exchanged with callers.
//!
//! A [`ReviewRequest`] carries `{id, text}` records; the matching
//! [`PredictionsResponse`] carries `{id, topics, sentiments}` records with
//! labels resolved through the taxonomies. Identifiers are the caller's own,
//! never recomputed from batch position.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::BatchPolicy;
use crate::model::TopicAggregator;
use crate::predictor::{BatchError, PredictError, Prediction, Review, ReviewPredictor};
use crate::providers::SentenceScorer;
use crate::taxonomy::{Taxonomies, TaxonomyError};

/// Reviews submitted in one request.
///
/// # Examples
///
/// ```
/// use review_topics::api::ReviewRequest;
///
/// let request: ReviewRequest =
///     serde_json::from_str(r#"{"data":[{"id":7,"text":"Всё отлично."}]}"#).unwrap();
/// assert_eq!(request.data[0].id, 7);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRequest {
    pub data: Vec<Review>,
}

/// One resolved prediction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub id: i64,
    pub topics: Vec<String>,
    pub sentiments: String,
}

impl PredictionRecord {
    /// Resolve a prediction's labels to names.
    ///
    /// # Errors
    ///
    /// Returns a [`TaxonomyError`] if a label is outside its taxonomy.
    pub fn resolve(
        prediction: &Prediction,
        taxonomies: &Taxonomies,
    ) -> Result<Self, TaxonomyError> {
        Ok(Self {
            id: prediction.id,
            topics: taxonomies.topic_names(&prediction.topics)?,
            sentiments: taxonomies.sentiment_name(prediction.sentiment)?.to_owned(),
        })
    }
}

/// A review that could not be predicted under [`BatchPolicy::PerItem`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedReview {
    /// Position of the review in the request.
    pub index: usize,
    pub id: i64,
    pub error: String,
}

/// Predictions for a request, in request order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionsResponse {
    pub predictions: Vec<PredictionRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<FailedReview>,
}

/// Errors that abort a whole request.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error(transparent)]
    Batch(#[from] BatchError),
    #[error("cannot resolve labels for review {id} at position {index}: {source}")]
    Taxonomy {
        index: usize,
        id: i64,
        #[source]
        source: TaxonomyError,
    },
}

/// Predict every review in `request` using the predictor's configured
/// threshold and batch policy.
///
/// With [`BatchPolicy::PerItem`] failing reviews are reported in
/// [`PredictionsResponse::failures`]; with [`BatchPolicy::FailFast`] the first
/// failure aborts the request. Label resolution failures always abort, since
/// they indicate a taxonomy that does not match the model.
///
/// # Errors
///
/// Returns a [`RequestError`] as described above.
pub fn handle_request<S, A>(
    predictor: &ReviewPredictor<S, A>,
    request: &ReviewRequest,
    taxonomies: &Taxonomies,
) -> Result<PredictionsResponse, RequestError>
where
    S: SentenceScorer + Sync,
    A: TopicAggregator + Sync,
{
    let config = predictor.config();
    let results: Vec<Result<Prediction, PredictError>> = match config.batch_policy {
        BatchPolicy::FailFast => predictor
            .try_predict_batch(&request.data, config.threshold)?
            .into_iter()
            .map(Ok)
            .collect(),
        BatchPolicy::PerItem => predictor.predict_batch(&request.data, config.threshold),
    };

    let mut response = PredictionsResponse::default();
    for (index, (result, review)) in results.into_iter().zip(&request.data).enumerate() {
        match result {
            Ok(prediction) => {
                let record = PredictionRecord::resolve(&prediction, taxonomies).map_err(
                    |source| RequestError::Taxonomy {
                        index,
                        id: review.id,
                        source,
                    },
                )?;
                response.predictions.push(record);
            }
            Err(error) => {
                tracing::warn!(index, id = review.id, %error, "review prediction failed");
                response.failures.push(FailedReview {
                    index,
                    id: review.id,
                    error: error.to_string(),
                });
            }
        }
    }
    Ok(response)
}

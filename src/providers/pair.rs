//! Adapter that turns two sentence classifiers into a [`SentenceScorer`].

use std::error::Error as StdError;

use thiserror::Error;

use super::{SentenceProbabilities, SentenceScorer, TextProcessor};

/// Errors returned by [`ClassifierPair`].
#[derive(Debug, Error)]
pub enum ClassifierPairError {
    #[error("topic classifier failed on sentence {index}: {source}")]
    Topic {
        index: usize,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
    #[error("sentiment classifier failed on sentence {index}: {source}")]
    Sentiment {
        index: usize,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

/// Topic and sentiment classifiers scored side by side.
///
/// Each sentence is passed to both classifiers; their outputs form row `i` of
/// the topic and sentiment matrices respectively.
///
/// # Examples
///
/// ```
/// use review_topics::providers::{ClassifierPair, SentenceScorer, TextProcessor};
/// use std::convert::Infallible;
///
/// struct Constant(Vec<f32>);
///
/// impl TextProcessor for Constant {
///     type Output = Box<[f32]>;
///     type Error = Infallible;
///
///     fn process(&self, _input: &str) -> Result<Self::Output, Self::Error> {
///         Ok(self.0.clone().into_boxed_slice())
///     }
/// }
///
/// let scorer = ClassifierPair::new(Constant(vec![0.9, 0.1]), Constant(vec![0.0, 0.0, 1.0]));
/// let scored = scorer.score(&["Отлично.".to_owned()]).unwrap();
/// assert_eq!(scored.topics, vec![vec![0.9, 0.1]]);
/// assert_eq!(scored.sentiments, vec![vec![0.0, 0.0, 1.0]]);
/// ```
#[derive(Debug, Clone)]
pub struct ClassifierPair<T, S> {
    topic: T,
    sentiment: S,
}

impl<T, S> ClassifierPair<T, S> {
    #[must_use]
    pub fn new(topic: T, sentiment: S) -> Self {
        Self { topic, sentiment }
    }
}

impl<T, S> SentenceScorer for ClassifierPair<T, S>
where
    T: TextProcessor<Output = Box<[f32]>>,
    S: TextProcessor<Output = Box<[f32]>>,
{
    type Error = ClassifierPairError;

    fn score(&self, sentences: &[String]) -> Result<SentenceProbabilities, Self::Error> {
        let mut scored = SentenceProbabilities {
            topics: Vec::with_capacity(sentences.len()),
            sentiments: Vec::with_capacity(sentences.len()),
        };
        for (index, sentence) in sentences.iter().enumerate() {
            let topics = self
                .topic
                .process(sentence)
                .map_err(|source| ClassifierPairError::Topic {
                    index,
                    source: Box::new(source),
                })?;
            let sentiments =
                self.sentiment
                    .process(sentence)
                    .map_err(|source| ClassifierPairError::Sentiment {
                        index,
                        source: Box::new(source),
                    })?;
            scored.topics.push(topics.into_vec());
            scored.sentiments.push(sentiments.into_vec());
        }
        Ok(scored)
    }
}

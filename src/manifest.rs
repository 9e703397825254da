//! TOML manifest describing the deployed models.
//!
//! The manifest names every model artefact with its SHA-256 digest, the
//! aggregator's trained shape, the pipeline settings, and the taxonomies.
//! Relative artefact paths are resolved against the manifest's directory.
//!
//! ```toml
//! [topic_classifier]
//! model = { path = "topic.onnx", sha256 = "..." }
//! tokenizer = { path = "tokenizer.json", sha256 = "..." }
//! input_names = ["input_ids", "attention_mask"]
//! output_names = ["probabilities"]
//! max_sequence_length = 128
//! num_classes = 18
//! activation = "identity"
//!
//! [sentiment_classifier]
//! # same fields as topic_classifier
//!
//! [aggregator]
//! weights = { path = "aggregator.safetensors", sha256 = "..." }
//!
//! [pipeline]
//! threshold = 0.5
//!
//! [taxonomies]
//! topics = ["Доставка", "Цена", "..."]
//! ```

use std::path::{Path, PathBuf};

use candle_core::Device;
use figment::{
    Figment,
    providers::{Format, Toml},
};
use serde::Deserialize;
use thiserror::Error;

use crate::artefact::ModelArtefact;
use crate::config::{AggregatorConfig, ConfigError, PipelineConfig};
use crate::model::{AggregatorError, ReviewCnn};
use crate::predictor::ReviewPredictor;
use crate::providers::onnx::{OnnxClassifierConfig, OnnxScorer, OnnxScorerError, onnx_scorer};
use crate::taxonomy::{Taxonomies, TaxonomyError};

/// Predictor assembled from a [`ModelManifest`].
pub type ManifestPredictor = ReviewPredictor<OnnxScorer, ReviewCnn>;

/// Errors raised while reading a manifest or loading its models.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read model manifest {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid model manifest {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: Box<figment::Error>,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Taxonomy(#[from] TaxonomyError),
    #[error(transparent)]
    Scorer(#[from] OnnxScorerError),
    #[error(transparent)]
    Aggregator(#[from] AggregatorError),
}

/// Aggregator weights and the shape they were trained with.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AggregatorManifest {
    pub weights: ModelArtefact,
    #[serde(default)]
    pub config: AggregatorConfig,
}

/// Everything needed to build a production predictor.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelManifest {
    pub topic_classifier: OnnxClassifierConfig,
    pub sentiment_classifier: OnnxClassifierConfig,
    pub aggregator: AggregatorManifest,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    pub taxonomies: Taxonomies,
}

impl ModelManifest {
    /// Read a manifest from `path`, resolving relative artefact paths against
    /// its directory.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Read`] if the file cannot be read and
    /// [`ManifestError::Parse`] if it is not a valid manifest.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut manifest: Self = Figment::new()
            .merge(Toml::string(&contents))
            .extract()
            .map_err(|source| ManifestError::Parse {
                path: path.to_path_buf(),
                source: Box::new(source),
            })?;
        if let Some(base) = path.parent() {
            manifest.rebase(base);
        }
        Ok(manifest)
    }

    fn rebase(&mut self, base: &Path) {
        for artefact in [
            &mut self.topic_classifier.model,
            &mut self.topic_classifier.tokenizer,
            &mut self.sentiment_classifier.model,
            &mut self.sentiment_classifier.tokenizer,
            &mut self.aggregator.weights,
        ] {
            if artefact.path.is_relative() {
                artefact.path = base.join(&artefact.path);
            }
        }
    }

    /// Check that every component agrees on the topic and sentiment counts.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError`] for an invalid pipeline configuration, a
    /// classifier or taxonomy sized differently from the pipeline.
    pub fn validate(&self) -> Result<(), ManifestError> {
        let pipeline = self.pipeline.clone().validate()?;
        for (component, expected, actual) in [
            (
                "topic classifier",
                pipeline.num_categories,
                self.topic_classifier.num_classes,
            ),
            (
                "sentiment classifier",
                pipeline.num_sentiments,
                self.sentiment_classifier.num_classes,
            ),
        ] {
            if expected != actual {
                return Err(ConfigError::ShapeMismatch {
                    component,
                    what: "classes",
                    expected,
                    actual,
                }
                .into());
            }
        }
        self.taxonomies
            .validate(pipeline.num_categories, pipeline.num_sentiments)?;
        Ok(())
    }

    /// Verify and load every model, returning the predictor and the
    /// taxonomies used to resolve its labels.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError`] if validation fails or any model cannot be
    /// verified or loaded.
    pub fn build(self) -> Result<(ManifestPredictor, Taxonomies), ManifestError> {
        self.validate()?;
        let scorer = onnx_scorer(self.topic_classifier, self.sentiment_classifier)?;
        let aggregator = ReviewCnn::from_artefact(
            &self.aggregator.weights,
            self.aggregator.config,
            &Device::Cpu,
        )?;
        let predictor = ReviewPredictor::new(scorer, aggregator, self.pipeline)?;
        Ok((predictor, self.taxonomies))
    }
}

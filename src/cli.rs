//! CLI argument types and layered configuration for the `review-topics`
//! binary. Loads from CLI args, environment (prefix `REVIEWS_`), and optional
//! config files.

use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use ortho_config::OrthoError;
use serde::Deserialize;
use std::path::PathBuf;

use crate::config::PipelineConfig;

/// Command-line arguments for the `review-topics` binary.
///
/// Values are loaded from command line arguments, environment variables
/// (prefixed with `REVIEWS_`), and an optional configuration file. Unset
/// pipeline overrides fall back to the model manifest.
///
/// # Examples
///
/// Parse flags directly:
/// ```
/// use review_topics::cli::ReviewsArgs;
/// use ortho_config::OrthoConfig;
///
/// let args = ReviewsArgs::load_from_iter(["review-topics", "--threshold", "0.7"])
///     .expect("load args from CLI iterator");
/// assert_eq!(args.threshold, Some(0.7));
/// ```
///
/// Load from a configuration file:
/// ```
/// use review_topics::cli::ReviewsArgs;
/// use ortho_config::OrthoConfig;
/// use std::io::Write;
/// use tempfile::NamedTempFile;
///
/// let mut file = NamedTempFile::new().expect("create temp file");
/// writeln!(file, "pretty = true").expect("write config");
/// let path = file.path().to_str().expect("path str");
/// let args = ReviewsArgs::load_from_iter(["review-topics", "--config-path", path])
///     .expect("load args from config path");
/// assert_eq!(args.pretty, Some(true));
/// ```
#[derive(Debug, Deserialize, ortho_config::OrthoConfig)]
#[ortho_config(prefix = "REVIEWS")]
pub struct ReviewsArgs {
    /// Model manifest (TOML) naming every artefact.
    pub manifest: Option<PathBuf>,

    /// `ReviewRequest` JSON file; standard input when absent.
    pub input: Option<PathBuf>,

    /// Override the manifest's topic threshold.
    pub threshold: Option<f32>,

    /// Override the manifest's feature sequence length.
    pub max_seq_len: Option<usize>,

    /// Pretty-print the JSON response. Unset means compact output.
    pub pretty: Option<bool>,

    /// Optional path to a configuration file.
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl ReviewsArgs {
    /// Apply the pipeline overrides to `config`.
    #[must_use]
    pub fn apply(&self, config: PipelineConfig) -> PipelineConfig {
        PipelineConfig {
            threshold: self.threshold.unwrap_or(config.threshold),
            max_seq_len: self.max_seq_len.unwrap_or(config.max_seq_len),
            ..config
        }
    }

    /// Load configuration solely from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an [`OrthoError`] if any variable cannot be parsed.
    pub fn load_from_env() -> Result<Self, OrthoError> {
        Figment::new()
            .merge(Env::prefixed("REVIEWS_"))
            .extract()
            .map_err(Into::into)
    }

    /// Load configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an [`OrthoError`] if the file cannot be read or parsed.
    pub fn load_from_config(path: &str) -> Result<Self, OrthoError> {
        Figment::new()
            .merge(Toml::file(path))
            .extract()
            .map_err(Into::into)
    }

    /// Load configuration from environment variables and a file path.
    ///
    /// # Errors
    ///
    /// Returns an [`OrthoError`] if either source contains invalid values.
    pub fn load_from_env_and_config(path: &str) -> Result<Self, OrthoError> {
        Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("REVIEWS_"))
            .extract()
            .map_err(Into::into)
    }
}

//! Convolutional topic aggregator.
//!
//! ```text
//! features [1, L, C+S] -> transpose -> [1, C+S, L]
//! Conv1d(C+S -> F, k, pad k/2) -> BatchNorm1d(F) -> ReLU -> Dropout
//! mean over L ++ max over L                 -> [1, 2F]
//! category head:  Linear(2F -> H) -> ReLU -> Dropout -> Linear(H -> C) -> sigmoid
//! sentiment head: Linear(2F -> H) -> ReLU -> Dropout -> Linear(H -> C*S)
//!                 -> reshape [1, C, S] -> softmax over S
//! ```
//!
//! Parameter names follow the trained state dict: `conv1d.0.*` for the
//! convolution, `conv1d.1.*` for batch normalisation, and `<head>.0.*` /
//! `<head>.3.*` for the two linear layers of each head.

use std::collections::HashMap;

use candle_core::{D, DType, Device, Tensor};
use candle_nn::{
    BatchNorm, BatchNormConfig, Conv1d, Conv1dConfig, Dropout, Linear, Module, ModuleT, VarBuilder,
};

use super::{AggregatorError, TopicAggregator, TopicScores};
use crate::{
    artefact::{ArtefactError, ModelArtefact},
    config::AggregatorConfig,
    features::FeatureSequence,
};

/// Two-layer feed-forward head.
#[derive(Debug)]
struct Head {
    hidden: Linear,
    output: Linear,
}

impl Head {
    fn load(
        vb: &VarBuilder,
        input_dim: usize,
        hidden_dim: usize,
        output_dim: usize,
    ) -> candle_core::Result<Self> {
        Ok(Self {
            hidden: candle_nn::linear(input_dim, hidden_dim, vb.pp("0"))?,
            output: candle_nn::linear(hidden_dim, output_dim, vb.pp("3"))?,
        })
    }

    fn forward(&self, pooled: &Tensor, dropout: &Dropout) -> candle_core::Result<Tensor> {
        let hidden = self.hidden.forward(pooled)?.relu()?;
        let hidden = dropout.forward_t(&hidden, false)?;
        self.output.forward(&hidden)
    }
}

/// Frozen convolutional aggregator over per-sentence probability features.
#[derive(Debug)]
pub struct ReviewCnn {
    conv: Conv1d,
    norm: BatchNorm,
    dropout: Dropout,
    category_head: Head,
    sentiment_head: Head,
    config: AggregatorConfig,
    device: Device,
}

impl ReviewCnn {
    /// Builds the model from a variable store.
    ///
    /// Every tensor must exist with exactly the shape implied by `config`;
    /// a model trained for a different topic or sentiment count is rejected
    /// here rather than at inference time.
    ///
    /// # Errors
    ///
    /// Returns [`AggregatorError::Config`] for an invalid configuration and
    /// [`AggregatorError::Load`] for missing or mis-shaped tensors.
    pub fn load(vb: &VarBuilder, config: AggregatorConfig) -> Result<Self, AggregatorError> {
        let config = config.validate()?;
        let pooled_dim = config.num_filters * 2;
        let conv_config = Conv1dConfig {
            padding: config.kernel_size / 2,
            ..Conv1dConfig::default()
        };
        let conv_vb = vb.pp("conv1d");

        let conv = candle_nn::conv1d(
            config.input_dim(),
            config.num_filters,
            config.kernel_size,
            conv_config,
            conv_vb.pp("0"),
        )
        .map_err(AggregatorError::Load)?;
        let norm = candle_nn::batch_norm(
            config.num_filters,
            BatchNormConfig::default(),
            conv_vb.pp("1"),
        )
        .map_err(AggregatorError::Load)?;
        let category_head = Head::load(
            &vb.pp("category_head"),
            pooled_dim,
            config.hidden_dim,
            config.num_categories,
        )
        .map_err(AggregatorError::Load)?;
        let sentiment_head = Head::load(
            &vb.pp("sentiment_head"),
            pooled_dim,
            config.hidden_dim,
            config.num_categories * config.num_sentiments,
        )
        .map_err(AggregatorError::Load)?;

        tracing::info!(
            categories = config.num_categories,
            sentiments = config.num_sentiments,
            filters = config.num_filters,
            "loaded topic aggregator"
        );

        Ok(Self {
            conv,
            norm,
            dropout: Dropout::new(config.dropout),
            category_head,
            sentiment_head,
            device: vb.device().clone(),
            config,
        })
    }

    /// Builds the model from named in-memory tensors on the CPU.
    ///
    /// # Errors
    ///
    /// See [`ReviewCnn::load`].
    pub fn from_tensors(
        tensors: HashMap<String, Tensor>,
        config: AggregatorConfig,
    ) -> Result<Self, AggregatorError> {
        let vb = VarBuilder::from_tensors(tensors, DType::F32, &Device::Cpu);
        Self::load(&vb, config)
    }

    /// Verifies and loads weights from a `.safetensors` or PyTorch `.pth`/`.pt`
    /// file. Safetensors files are read into memory rather than mapped.
    ///
    /// # Errors
    ///
    /// Returns [`AggregatorError::Artefact`] when the checksum does not match,
    /// [`AggregatorError::UnsupportedFormat`] for unknown extensions, and the
    /// errors of [`ReviewCnn::load`].
    pub fn from_artefact(
        weights: &ModelArtefact,
        config: AggregatorConfig,
        device: &Device,
    ) -> Result<Self, AggregatorError> {
        weights.verify()?;
        let extension = weights
            .path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        let vb = match extension.as_deref() {
            Some("safetensors") => {
                let bytes = std::fs::read(&weights.path).map_err(|source| ArtefactError::Io {
                    path: weights.path.clone(),
                    source,
                })?;
                VarBuilder::from_buffered_safetensors(bytes, DType::F32, device)
            }
            Some("pth" | "pt") => VarBuilder::from_pth(&weights.path, DType::F32, device),
            _ => {
                return Err(AggregatorError::UnsupportedFormat {
                    path: weights.path.clone(),
                });
            }
        }
        .map_err(AggregatorError::Load)?;
        Self::load(&vb, config)
    }

    #[must_use]
    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    fn forward(&self, features: &FeatureSequence) -> candle_core::Result<(Tensor, Tensor)> {
        let input = Tensor::from_slice(
            features.as_slice(),
            (1, features.len(), features.feature_dim()),
            &self.device,
        )?
        .transpose(1, 2)?
        .contiguous()?;

        let hidden = self.conv.forward(&input)?;
        let hidden = self.norm.forward_t(&hidden, false)?.relu()?;
        let hidden = self.dropout.forward_t(&hidden, false)?;

        let avg_pool = hidden.mean(D::Minus1)?;
        let max_pool = hidden.max(D::Minus1)?;
        let pooled = Tensor::cat(&[&avg_pool, &max_pool], 1)?;

        let categories =
            candle_nn::ops::sigmoid(&self.category_head.forward(&pooled, &self.dropout)?)?;
        let sentiment_logits = self
            .sentiment_head
            .forward(&pooled, &self.dropout)?
            .reshape((1, self.config.num_categories, self.config.num_sentiments))?;
        let sentiments = candle_nn::ops::softmax_last_dim(&sentiment_logits)?;
        Ok((categories, sentiments))
    }
}

impl TopicAggregator for ReviewCnn {
    fn num_categories(&self) -> usize {
        self.config.num_categories
    }

    fn num_sentiments(&self) -> usize {
        self.config.num_sentiments
    }

    fn aggregate(&self, features: &FeatureSequence) -> Result<TopicScores, AggregatorError> {
        if features.feature_dim() != self.config.input_dim() {
            return Err(AggregatorError::FeatureDim {
                expected: self.config.input_dim(),
                actual: features.feature_dim(),
            });
        }
        let (categories, sentiments) = self.forward(features)?;
        Ok(TopicScores {
            activations: categories.squeeze(0)?.to_vec1::<f32>()?,
            topic_sentiments: sentiments.squeeze(0)?.to_vec2::<f32>()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::SequenceFeatureBuilder;
    use crate::providers::SentenceProbabilities;
    use rstest::rstest;

    fn small_config() -> AggregatorConfig {
        AggregatorConfig {
            num_categories: 2,
            num_sentiments: 3,
            hidden_dim: 4,
            num_filters: 3,
            kernel_size: 3,
            dropout: 0.3,
        }
    }

    fn constant(value: f32, shape: &[usize]) -> Tensor {
        Tensor::full(value, shape, &Device::Cpu).unwrap_or_else(|e| panic!("tensor: {e}"))
    }

    /// Zero weights everywhere, identity batch norm, and the given output biases.
    fn weights(
        config: &AggregatorConfig,
        category_bias: f32,
        sentiment_bias: f32,
    ) -> HashMap<String, Tensor> {
        let input = config.input_dim();
        let filters = config.num_filters;
        let hidden = config.hidden_dim;
        let outputs = config.num_categories * config.num_sentiments;
        let entries = [
            ("conv1d.0.weight", constant(0.0, &[filters, input, config.kernel_size])),
            ("conv1d.0.bias", constant(0.0, &[filters])),
            ("conv1d.1.weight", constant(1.0, &[filters])),
            ("conv1d.1.bias", constant(0.0, &[filters])),
            ("conv1d.1.running_mean", constant(0.0, &[filters])),
            ("conv1d.1.running_var", constant(1.0, &[filters])),
            ("category_head.0.weight", constant(0.0, &[hidden, filters * 2])),
            ("category_head.0.bias", constant(0.0, &[hidden])),
            ("category_head.3.weight", constant(0.0, &[config.num_categories, hidden])),
            ("category_head.3.bias", constant(category_bias, &[config.num_categories])),
            ("sentiment_head.0.weight", constant(0.0, &[hidden, filters * 2])),
            ("sentiment_head.0.bias", constant(0.0, &[hidden])),
            ("sentiment_head.3.weight", constant(0.0, &[outputs, hidden])),
            ("sentiment_head.3.bias", constant(sentiment_bias, &[outputs])),
        ];
        entries
            .into_iter()
            .map(|(name, tensor)| (name.to_owned(), tensor))
            .collect()
    }

    fn features(max_seq_len: usize) -> FeatureSequence {
        let scored = SentenceProbabilities {
            topics: vec![vec![0.8, 0.1]],
            sentiments: vec![vec![0.1, 0.1, 0.8]],
        };
        SequenceFeatureBuilder::new(max_seq_len).build(&scored)
    }

    #[test]
    #[expect(clippy::float_arithmetic, reason = "tolerance comparison")]
    fn zero_weights_yield_half_activation_and_uniform_sentiment() {
        let config = small_config();
        let model = ReviewCnn::from_tensors(weights(&config, 0.0, 0.0), config)
            .unwrap_or_else(|e| panic!("load: {e}"));
        let scores = model
            .aggregate(&features(5))
            .unwrap_or_else(|e| panic!("aggregate: {e}"));
        assert_eq!(scores.activations, vec![0.5, 0.5]);
        assert_eq!(scores.topic_sentiments.len(), 2);
        for row in &scores.topic_sentiments {
            assert_eq!(row.len(), 3);
            assert!(row.iter().all(|p| (p - 1.0 / 3.0).abs() < 1e-6));
        }
    }

    #[test]
    fn activations_stay_in_unit_interval() {
        let config = small_config();
        let model = ReviewCnn::from_tensors(weights(&config, 40.0, 2.0), config)
            .unwrap_or_else(|e| panic!("load: {e}"));
        let scores = model
            .aggregate(&features(1))
            .unwrap_or_else(|e| panic!("aggregate: {e}"));
        assert!(scores.activations.iter().all(|a| (0.0..=1.0).contains(a)));
        assert!(scores.activations.iter().all(|a| *a > 0.99));
    }

    fn tensor(values: &[f32], shape: &[usize]) -> Tensor {
        Tensor::from_slice(values, shape, &Device::Cpu).unwrap_or_else(|e| panic!("tensor: {e}"))
    }

    #[expect(clippy::float_arithmetic, reason = "reference logistic")]
    fn logistic(x: f32) -> f32 {
        1.0 / (1.0 + (-x).exp())
    }

    /// One topic, one sentiment, one filter, and a one-unit hidden layer.
    ///
    /// The convolution reads only the topic channel through kernel position
    /// `tap`. Batch norm shifts by a running mean of 0.1 and scales by 2. The
    /// category head's hidden unit weighs the pooled `[avg, max]` vector with
    /// `pool_weights`.
    fn single_filter_weights(tap: usize, pool_weights: [f32; 2]) -> HashMap<String, Tensor> {
        let mut kernel = [0.0_f32; 6];
        kernel[tap] = 1.0;
        let entries = [
            ("conv1d.0.weight", tensor(&kernel, &[1, 2, 3])),
            ("conv1d.0.bias", tensor(&[0.0], &[1])),
            ("conv1d.1.weight", tensor(&[2.0], &[1])),
            ("conv1d.1.bias", tensor(&[0.0], &[1])),
            ("conv1d.1.running_mean", tensor(&[0.1], &[1])),
            ("conv1d.1.running_var", tensor(&[1.0], &[1])),
            ("category_head.0.weight", tensor(&pool_weights, &[1, 2])),
            ("category_head.0.bias", tensor(&[0.0], &[1])),
            ("category_head.3.weight", tensor(&[1.0], &[1, 1])),
            ("category_head.3.bias", tensor(&[0.0], &[1])),
            ("sentiment_head.0.weight", tensor(&[0.0, 0.0], &[1, 2])),
            ("sentiment_head.0.bias", tensor(&[0.0], &[1])),
            ("sentiment_head.3.weight", tensor(&[0.0], &[1, 1])),
            ("sentiment_head.3.bias", tensor(&[0.0], &[1])),
        ];
        entries
            .into_iter()
            .map(|(name, tensor)| (name.to_owned(), tensor))
            .collect()
    }

    // Only the first of three positions holds a sentence with topic 0.6. With
    // padding 1, the centre and left taps see it (conv [0.6, 0, 0] or
    // [0, 0.6, 0]); batch norm maps 0.6 to 1.0 and 0 to -0.2, ReLU clips the
    // latter, so avg = 1/3 and max = 1. The right tap never sees it.
    #[rstest]
    #[case::centre_tap_average(1, [1.0, 0.0], logistic(3.0_f32.recip()))]
    #[case::centre_tap_max(1, [0.0, 1.0], logistic(1.0))]
    #[case::left_tap_max(0, [0.0, 1.0], logistic(1.0))]
    #[case::right_tap_max(2, [0.0, 1.0], 0.5)]
    #[expect(clippy::float_arithmetic, reason = "tolerance comparison")]
    fn forward_pass_matches_hand_computation(
        #[case] tap: usize,
        #[case] pool_weights: [f32; 2],
        #[case] expected: f32,
    ) {
        let config = AggregatorConfig {
            num_categories: 1,
            num_sentiments: 1,
            hidden_dim: 1,
            num_filters: 1,
            kernel_size: 3,
            dropout: 0.3,
        };
        let model = ReviewCnn::from_tensors(single_filter_weights(tap, pool_weights), config)
            .unwrap_or_else(|e| panic!("load: {e}"));
        let scored = SentenceProbabilities {
            topics: vec![vec![0.6]],
            sentiments: vec![vec![1.0]],
        };
        let scores = model
            .aggregate(&SequenceFeatureBuilder::new(3).build(&scored))
            .unwrap_or_else(|e| panic!("aggregate: {e}"));
        assert_eq!(scores.activations.len(), 1);
        assert!(
            (scores.activations[0] - expected).abs() < 1e-4,
            "activation {} != {expected}",
            scores.activations[0]
        );
        assert_eq!(scores.topic_sentiments, vec![vec![1.0]]);
    }

    #[test]
    fn loads_verified_safetensors_file() {
        let config = small_config();
        let tensors = weights(&config, 40.0, 0.0);
        let file = tempfile::Builder::new()
            .suffix(".safetensors")
            .tempfile()
            .unwrap_or_else(|e| panic!("create temp file: {e}"));
        candle_core::safetensors::save(&tensors, file.path())
            .unwrap_or_else(|e| panic!("save: {e}"));
        let artefact = ModelArtefact {
            path: file.path().to_path_buf(),
            sha256: crate::artefact::compute_sha256(file.path())
                .unwrap_or_else(|e| panic!("hash: {e}")),
        };
        let model = ReviewCnn::from_artefact(&artefact, config, &Device::Cpu)
            .unwrap_or_else(|e| panic!("load: {e}"));
        let scores = model
            .aggregate(&features(2))
            .unwrap_or_else(|e| panic!("aggregate: {e}"));
        assert!(scores.activations.iter().all(|a| *a > 0.99));
    }

    #[test]
    fn rejects_weights_for_other_taxonomy() {
        let trained = small_config();
        let tensors = weights(&trained, 0.0, 0.0);
        let expected = AggregatorConfig {
            num_categories: 3,
            ..trained
        };
        assert!(matches!(
            ReviewCnn::from_tensors(tensors, expected),
            Err(AggregatorError::Load(_))
        ));
    }

    #[test]
    fn rejects_missing_tensor() {
        let config = small_config();
        let mut tensors = weights(&config, 0.0, 0.0);
        tensors.remove("conv1d.1.running_var");
        assert!(matches!(
            ReviewCnn::from_tensors(tensors, config),
            Err(AggregatorError::Load(_))
        ));
    }

    #[test]
    fn rejects_feature_width_mismatch() {
        let config = small_config();
        let model = ReviewCnn::from_tensors(weights(&config, 0.0, 0.0), config)
            .unwrap_or_else(|e| panic!("load: {e}"));
        let narrow =
            SequenceFeatureBuilder::new(4).build_with_dim(&SentenceProbabilities::default(), 3);
        assert!(matches!(
            model.aggregate(&narrow),
            Err(AggregatorError::FeatureDim { expected: 5, actual: 3 })
        ));
    }

    #[test]
    fn rejects_unknown_weight_extension() {
        let file = tempfile::Builder::new()
            .suffix(".bin")
            .tempfile()
            .unwrap_or_else(|e| panic!("create temp file: {e}"));
        let artefact = ModelArtefact {
            path: file.path().to_path_buf(),
            sha256: crate::artefact::compute_sha256(file.path())
                .unwrap_or_else(|e| panic!("hash: {e}")),
        };
        assert!(matches!(
            ReviewCnn::from_artefact(&artefact, small_config(), &Device::Cpu),
            Err(AggregatorError::UnsupportedFormat { .. })
        ));
    }
}

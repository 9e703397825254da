use serde::{Deserialize, Serialize};

use super::errors::OnnxClassifierError;

/// Mapping from raw model outputs to class probabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbabilityActivation {
    /// Outputs are already probabilities (for example exported gradient-boosted
    /// classifiers).
    Identity,
    /// Independent per-class logistic activation, for multi-label topics.
    Sigmoid,
    /// Normalise logits into a single distribution, for sentiment.
    Softmax,
}

impl ProbabilityActivation {
    /// Applies the activation to one row of outputs.
    ///
    /// # Errors
    ///
    /// Returns `NonFiniteOutput` when any output is `NaN` or infinite.
    pub fn apply(self, outputs: &[f32]) -> Result<Vec<f32>, OnnxClassifierError> {
        if let Some(index) = outputs.iter().position(|value| !value.is_finite()) {
            return Err(OnnxClassifierError::NonFiniteOutput { index });
        }
        Ok(match self {
            Self::Identity => outputs.to_vec(),
            Self::Sigmoid => outputs.iter().map(|value| logistic(*value)).collect(),
            Self::Softmax => softmax(outputs),
        })
    }
}

#[expect(clippy::float_arithmetic, reason = "sigmoid requires float operations")]
fn logistic(value: f32) -> f32 {
    1.0 / (1.0 + (-value).exp())
}

#[expect(clippy::float_arithmetic, reason = "softmax requires float operations")]
fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|value| (value - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|value| value / sum).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logistic_is_monotonic() {
        assert!(logistic(-5.0) < logistic(0.0));
        assert!(logistic(0.0) < logistic(5.0));
    }

    #[test]
    #[expect(clippy::float_arithmetic, reason = "tolerance comparison")]
    fn softmax_sums_to_one() {
        let probabilities = ProbabilityActivation::Softmax
            .apply(&[1.0, 2.0, 3.0])
            .unwrap_or_else(|e| panic!("{e}"));
        let sum: f32 = probabilities.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
        assert!(probabilities[2] > probabilities[1]);
    }

    #[test]
    fn rejects_non_finite_outputs() {
        let result = ProbabilityActivation::Identity.apply(&[0.5, f32::NAN]);
        assert!(matches!(
            result,
            Err(OnnxClassifierError::NonFiniteOutput { index: 1 })
        ));
    }
}

use burn::prelude::*;
use burn::tensor::Distribution;

/// Dropout parameterized by the probability of *keeping* each activation.
///
/// Survivors are scaled by `1 / keep_prob` so the expected activation is unchanged.
/// A keep probability of `1.0` returns the input untouched.
#[derive(Module, Clone, Debug, Default)]
pub struct KeepDropout;

impl KeepDropout {
    pub fn new() -> Self {
        Self
    }

    /// # Shapes
    ///   - Input `[..., any]`
    ///   - Output `[..., any]`
    pub fn forward<B: Backend, const D: usize>(
        &self,
        input: Tensor<B, D>,
        keep_prob: f64,
    ) -> Tensor<B, D> {
        assert!(
            keep_prob > 0.0 && keep_prob <= 1.0,
            "keep probability must be in (0, 1], got {keep_prob}"
        );
        if keep_prob >= 1.0 {
            return input;
        }

        let mask = input.random_like(Distribution::Bernoulli(keep_prob));
        (input * mask).div_scalar(keep_prob)
    }
}

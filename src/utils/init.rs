use burn::module::Param;
use burn::prelude::*;
use burn::tensor::{Distribution, ElementConversion};

/// Samples further than this many standard deviations from the mean are redrawn.
pub const TRUNCATION_STDDEVS: f64 = 2.0;

const MAX_RESAMPLE_ROUNDS: usize = 64;

/// How a trainable tensor gets its initial values.
#[derive(Config, Debug, PartialEq)]
pub enum ParamInit {
    /// Zero-mean normal distribution, redrawing every sample that falls outside
    /// [`TRUNCATION_STDDEVS`] standard deviations.
    TruncatedNormal { stddev: f64 },
    /// Every element set to `value`.
    Constant { value: f64 },
}

impl ParamInit {
    /// Default initializer for weights (kernels and matrices).
    pub fn weight() -> Self {
        Self::TruncatedNormal { stddev: 0.1 }
    }

    /// Default initializer for biases.
    pub fn bias() -> Self {
        Self::Constant { value: 0.1 }
    }

    pub fn init<B: Backend, const D: usize, S: Into<Shape>>(
        &self,
        shape: S,
        device: &B::Device,
    ) -> Param<Tensor<B, D>> {
        let tensor = match self {
            Self::TruncatedNormal { stddev } => truncated_normal(shape, *stddev, device),
            Self::Constant { value } => Tensor::full(shape, *value, device),
        };
        Param::from_tensor(tensor)
    }
}

/// Draws a zero-mean truncated normal tensor.
///
/// Out-of-range samples are redrawn from the full normal distribution until none remain.
/// The loop is bounded; whatever is still out of range after it is clamped to the bound.
pub fn truncated_normal<B: Backend, const D: usize, S: Into<Shape>>(
    shape: S,
    stddev: f64,
    device: &B::Device,
) -> Tensor<B, D> {
    let shape = shape.into();
    let bound = TRUNCATION_STDDEVS * stddev;
    let distribution = Distribution::Normal(0.0, stddev);

    let mut samples = Tensor::<B, D>::random(shape.clone(), distribution, device);
    for _ in 0..MAX_RESAMPLE_ROUNDS {
        let outside = samples.clone().abs().greater_elem(bound);
        let n_outside: i64 = outside.clone().int().sum().into_scalar().elem();
        if n_outside == 0 {
            return samples;
        }
        let fresh = Tensor::random(shape.clone(), distribution, device);
        samples = samples.mask_where(outside, fresh);
    }
    samples.clamp(-bound, bound)
}

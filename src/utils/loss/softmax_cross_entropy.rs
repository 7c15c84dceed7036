use burn::module::Module;
use burn::prelude::*;
use burn::tensor::activation::log_softmax;

/// Calculate the softmax cross-entropy between logits and one-hot (or soft) labels.
#[derive(Module, Clone, Debug)]
pub struct SoftmaxCrossEntropyLoss;

impl Default for SoftmaxCrossEntropyLoss {
    fn default() -> Self {
        Self::new()
    }
}

impl SoftmaxCrossEntropyLoss {
    /// Create the criterion.
    pub fn new() -> Self {
        Self
    }

    /// Mean of the per-example losses over the batch.
    ///
    /// # Shapes
    ///
    /// - logits: `[batch_size, num_classes]`
    /// - labels: `[batch_size, num_classes]`
    /// - output: `[1]`
    pub fn forward<B: Backend>(&self, logits: Tensor<B, 2>, labels: Tensor<B, 2>) -> Tensor<B, 1> {
        self.forward_no_reduction(logits, labels).mean()
    }

    /// Per-example loss `-Σ_c labels[c] · log_softmax(logits)[c]`.
    ///
    /// # Shapes
    ///
    /// - output: `[batch_size]`
    pub fn forward_no_reduction<B: Backend>(
        &self,
        logits: Tensor<B, 2>,
        labels: Tensor<B, 2>,
    ) -> Tensor<B, 1> {
        let [batch_size, num_classes] = logits.dims();
        assert_eq!(
            [batch_size, num_classes],
            labels.dims(),
            "logits and labels must have the same shape"
        );

        let log_probs = log_softmax(logits, 1);
        (labels * log_probs)
            .sum_dim(1)
            .neg()
            .reshape([batch_size])
    }
}

use burn::prelude::*;
use burn::tensor::ElementConversion;

/// Number of rows whose highest logit sits at the labelled class.
///
/// # Shapes
///   - logits: [batch_size, num_classes]
///   - labels: [batch_size, num_classes], one-hot
pub fn correct_count<B: Backend>(logits: Tensor<B, 2>, labels: Tensor<B, 2>) -> usize {
    assert_eq!(
        logits.dims(),
        labels.dims(),
        "logits and labels must have the same shape"
    );
    let predicted = logits.argmax(1);
    let expected = labels.argmax(1);
    let correct: i64 = predicted.equal(expected).int().sum().into_scalar().elem();
    correct as usize
}

/// Fraction of correctly classified rows. An empty batch has accuracy 0.
pub fn accuracy<B: Backend>(logits: Tensor<B, 2>, labels: Tensor<B, 2>) -> f32 {
    let [batch_size, _] = logits.dims();
    if batch_size == 0 {
        return 0.0;
    }
    correct_count(logits, labels) as f32 / batch_size as f32
}

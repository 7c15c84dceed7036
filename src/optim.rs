use crate::deepnn::DeepNn;
use burn::optim::{Adam, AdamConfig, adaptor::OptimizerAdaptor};
use burn::tensor::backend::AutodiffBackend;

/// Adam wrapped for the digit classifier.
pub type DeepNnOptimizer<AutoB> = OptimizerAdaptor<Adam, DeepNn<AutoB>, AutoB>;

/// Adam with the classic hyper-parameters (beta1 = 0.9, beta2 = 0.999, epsilon = 1e-8).
///
/// The learning rate is passed at each step, see
/// [`TrainingConfig::learning_rate`](crate::training::TrainingConfig::learning_rate).
pub fn optimizer_config() -> AdamConfig {
    AdamConfig::new()
        .with_beta_1(0.9)
        .with_beta_2(0.999)
        .with_epsilon(1e-8)
}

pub fn init_optimizer<AutoB: AutodiffBackend>(config: &AdamConfig) -> DeepNnOptimizer<AutoB> {
    config.init::<AutoB, DeepNn<AutoB>>()
}

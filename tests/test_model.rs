// Model assembly: logits shape, parameter initialization, construction-time shape checks.

use burn::prelude::*;
use burn::tensor::Distribution;
use mnist_deepnn::backend::{MainBackend, MainDevice};
use mnist_deepnn::deepnn::{DeepNn, DeepNnConfig, ShapeError};
use mnist_deepnn::utils::init::{ParamInit, TRUNCATION_STDDEVS, truncated_normal};

type B = MainBackend;

fn to_vec<const D: usize>(tensor: Tensor<B, D>) -> Vec<f32> {
    tensor.into_data().to_vec::<f32>().unwrap()
}

#[test]
fn logits_have_one_row_per_image_and_ten_columns() {
    let device = B::main_device();
    let model: DeepNn<B> = DeepNnConfig::new().init(&device).unwrap();

    for batch_size in [1, 3, 7] {
        let images =
            Tensor::<B, 2>::random([batch_size, 784], Distribution::Uniform(0.0, 1.0), &device);
        let logits = model.forward(images, 1.0);
        assert_eq!(logits.dims(), [batch_size, 10]);
    }
}

#[test]
fn evaluation_forward_is_deterministic() {
    let device = B::main_device();
    let model: DeepNn<B> = DeepNnConfig::new()
        .with_hidden_size(32)
        .init(&device)
        .unwrap();
    let images = Tensor::<B, 2>::random([2, 784], Distribution::Uniform(0.0, 1.0), &device);

    let a = to_vec(model.forward(images.clone(), 1.0));
    let b = to_vec(model.forward(images, 1.0));
    assert_eq!(a, b);
}

#[test]
fn default_architecture_parameter_shapes() {
    let device = B::main_device();
    let model: DeepNn<B> = DeepNnConfig::new().init(&device).unwrap();
    assert_eq!(model.conv1.weight.dims(), [32, 1, 5, 5]);
    assert_eq!(model.conv2.weight.dims(), [64, 32, 5, 5]);
    assert_eq!(model.fc1.weight.dims(), [3136, 1024]);
    assert_eq!(model.fc2.weight.dims(), [1024, 10]);
    assert!(model.fc1.relu);
    assert!(!model.fc2.relu);

    let expected = (32 * 25 + 32) + (64 * 32 * 25 + 64) + (3136 * 1024 + 1024) + (1024 * 10 + 10);
    assert_eq!(model.num_params(), expected);
}

#[test]
fn biases_start_at_a_tenth_and_weights_are_truncated() {
    let device = B::main_device();
    let model: DeepNn<B> = DeepNnConfig::new()
        .with_hidden_size(64)
        .init(&device)
        .unwrap();

    for bias in [
        to_vec(model.conv1.bias.val()),
        to_vec(model.conv2.bias.val()),
        to_vec(model.fc1.bias.val()),
        to_vec(model.fc2.bias.val()),
    ] {
        assert!(bias.iter().all(|&b| (b - 0.1).abs() < 1e-7));
    }

    let bound = (TRUNCATION_STDDEVS * 0.1) as f32 + 1e-6;
    let weights = to_vec(model.conv2.weight.val());
    assert!(weights.iter().all(|w| w.abs() <= bound));
    assert!(weights.iter().any(|&w| w != weights[0]));
}

#[test]
fn truncated_normal_statistics() {
    let device = B::main_device();
    let samples = to_vec(truncated_normal::<B, 1, _>([20_000], 1.0, &device));
    assert!(samples.iter().all(|s| s.abs() <= 2.0));

    let n = samples.len() as f32;
    let mean = samples.iter().sum::<f32>() / n;
    let var = samples.iter().map(|s| (s - mean).powi(2)).sum::<f32>() / n;
    assert!(mean.abs() < 0.05, "mean {mean}");
    // a normal truncated at two standard deviations has a standard deviation of ~0.88
    assert!((var.sqrt() - 0.88).abs() < 0.05, "stddev {}", var.sqrt());
}

#[test]
fn constant_initializer_fills_every_element() {
    let device = B::main_device();
    let param = ParamInit::Constant { value: 0.25 }.init::<B, 2, _>([3, 4], &device);
    assert_eq!(to_vec(param.val()), vec![0.25; 12]);
}

#[test]
fn wrong_flattened_size_fails_at_construction() {
    let device = B::main_device();
    let err = DeepNnConfig::new()
        .with_image_height(32)
        .with_image_width(32)
        .init::<B>(&device)
        .unwrap_err();
    assert!(
        matches!(
            err,
            ShapeError::Features {
                layer: "fc1",
                expected: 3136,
                got: 4096,
                ..
            }
        ),
        "{err}"
    );
}

#[test]
fn odd_feature_map_fails_at_construction() {
    let device = B::main_device();
    let err = DeepNnConfig::new()
        .with_image_height(30)
        .with_image_width(30)
        .init::<B>(&device)
        .unwrap_err();
    assert!(
        matches!(err, ShapeError::OddPoolInput { layer: "pool2", height: 15, width: 15 }),
        "{err}"
    );
}

#[test]
fn consistent_custom_architecture_builds() {
    let device = B::main_device();
    let model: DeepNn<B> = DeepNnConfig::new()
        .with_conv1_channels(4)
        .with_conv2_channels(8)
        .with_flattened_size(7 * 7 * 8)
        .with_hidden_size(16)
        .init(&device)
        .unwrap();
    let images = Tensor::<B, 2>::zeros([2, 784], &device);
    assert_eq!(model.forward(images, 0.5).dims(), [2, 10]);
}

#[test]
#[should_panic(expected = "expected flattened")]
fn forward_rejects_wrong_image_width() {
    let device = B::main_device();
    let model: DeepNn<B> = DeepNnConfig::new()
        .with_hidden_size(16)
        .init(&device)
        .unwrap();
    let _ = model.forward(Tensor::<B, 2>::zeros([2, 100], &device), 1.0);
}

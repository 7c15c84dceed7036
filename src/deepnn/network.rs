use crate::deepnn::conv::{Conv2dRelu, Conv2dReluConfig};
use crate::deepnn::dropout::KeepDropout;
use crate::deepnn::linear::{FullyConnected, FullyConnectedConfig};
use crate::deepnn::pool::MaxPool2x2;
use crate::deepnn::shape::{ActivationShape, ShapeError};
use crate::utils::init::ParamInit;
use burn::prelude::*;

/// Architecture of the digit classifier.
///
/// The defaults describe the classic MNIST network:
/// conv(5x5, 1→32) → pool → conv(5x5, 32→64) → pool → fc(3136→1024) → dropout → fc(1024→10).
#[derive(Config, Debug)]
pub struct DeepNnConfig {
    #[config(default = 28)]
    pub image_height: usize,
    #[config(default = 28)]
    pub image_width: usize,
    #[config(default = 1)]
    pub image_channels: usize,

    #[config(default = 5)]
    pub kernel_size: usize,
    #[config(default = 32)]
    pub conv1_channels: usize,
    #[config(default = 64)]
    pub conv2_channels: usize,

    /// Input size declared for the first fully-connected layer.
    ///
    /// Must match what the convolutional stack actually produces (7 * 7 * 64 for 28x28 images),
    /// otherwise [`DeepNnConfig::init`] fails.
    #[config(default = 3136)]
    pub flattened_size: usize,
    #[config(default = 1024)]
    pub hidden_size: usize,
    #[config(default = 10)]
    pub num_classes: usize,

    #[config(default = "ParamInit::weight()")]
    pub weight_init: ParamInit,
    #[config(default = "ParamInit::bias()")]
    pub bias_init: ParamInit,
}

impl DeepNnConfig {
    /// Length of a flattened input image.
    pub fn input_size(&self) -> usize {
        self.image_channels * self.image_height * self.image_width
    }

    /// Builds the network layer by layer, checking every connection.
    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<DeepNn<B>, ShapeError> {
        let input = ActivationShape::spatial(
            self.image_channels,
            self.image_height,
            self.image_width,
        );

        let conv1 = Conv2dReluConfig::new(self.image_channels, self.conv1_channels)
            .with_kernel_size(self.kernel_size)
            .with_weight_init(self.weight_init.clone())
            .with_bias_init(self.bias_init.clone())
            .build("conv1", input, device)?;
        let pool1 = MaxPool2x2::build("pool1", conv1.output)?;

        let conv2 = Conv2dReluConfig::new(self.conv1_channels, self.conv2_channels)
            .with_kernel_size(self.kernel_size)
            .with_weight_init(self.weight_init.clone())
            .with_bias_init(self.bias_init.clone())
            .build("conv2", pool1.output, device)?;
        let pool2 = MaxPool2x2::build("pool2", conv2.output)?;

        let fc1 = FullyConnectedConfig::new(self.flattened_size, self.hidden_size)
            .with_weight_init(self.weight_init.clone())
            .with_bias_init(self.bias_init.clone())
            .build("fc1", pool2.output, device)?;

        let fc2 = FullyConnectedConfig::new(self.hidden_size, self.num_classes)
            .with_relu(false)
            .with_weight_init(self.weight_init.clone())
            .with_bias_init(self.bias_init.clone())
            .build("fc2", fc1.output, device)?;
        debug_assert_eq!(ActivationShape::flat(self.num_classes), fc2.output);

        Ok(DeepNn {
            conv1: conv1.layer,
            pool1: pool1.layer,
            conv2: conv2.layer,
            pool2: pool2.layer,
            fc1: fc1.layer,
            dropout: KeepDropout::new(),
            fc2: fc2.layer,
            image_channels: self.image_channels,
            image_height: self.image_height,
            image_width: self.image_width,
        })
    }
}

#[derive(Module, Debug)]
pub struct DeepNn<B: Backend> {
    pub conv1: Conv2dRelu<B>,
    pub pool1: MaxPool2x2,
    pub conv2: Conv2dRelu<B>,
    pub pool2: MaxPool2x2,
    pub fc1: FullyConnected<B>,
    pub dropout: KeepDropout,
    pub fc2: FullyConnected<B>,
    image_channels: usize,
    image_height: usize,
    image_width: usize,
}

impl<B: Backend> DeepNn<B> {
    /// Computes class logits for a batch of flattened images.
    ///
    /// `keep_prob` is the dropout keep probability applied after the first
    /// fully-connected layer; use `1.0` for evaluation.
    ///
    /// # Shapes
    ///   - Input [batch, image_channels * image_height * image_width]
    ///   - Output [batch, num_classes]
    pub fn forward(&self, images: Tensor<B, 2>, keep_prob: f64) -> Tensor<B, 2> {
        let [batch, input_size] = images.dims();
        let [c, h, w] = [self.image_channels, self.image_height, self.image_width];
        assert_eq!(
            c * h * w,
            input_size,
            "expected flattened {c}x{h}x{w} images"
        );

        let x = images.reshape([batch, c, h, w]);
        let x = self.pool1.forward(self.conv1.forward(x));
        let x = self.pool2.forward(self.conv2.forward(x));

        let [_, c2, h2, w2] = x.dims();
        let x = x.reshape([batch, c2 * h2 * w2]);
        let x = self.fc1.forward(x);
        let x = self.dropout.forward(x, keep_prob);
        let logits = self.fc2.forward(x);

        let [_, num_classes] = self.fc2.weight.dims();
        debug_assert_eq!([batch, num_classes], logits.dims());
        logits
    }
}

use crate::deepnn::shape::{ActivationShape, Built, ShapeError};
use crate::utils::init::ParamInit;
use burn::module::Param;
use burn::prelude::*;
use burn::tensor::activation::relu;
use burn::tensor::module::conv2d;
use burn::tensor::ops::ConvOptions;

/// Configuration of a [`Conv2dRelu`] layer.
#[derive(Config, Debug)]
pub struct Conv2dReluConfig {
    pub in_channels: usize,
    pub out_channels: usize,
    /// Square kernel side. Must be odd so that "same" padding is symmetric.
    #[config(default = 5)]
    pub kernel_size: usize,
    #[config(default = "ParamInit::weight()")]
    pub weight_init: ParamInit,
    #[config(default = "ParamInit::bias()")]
    pub bias_init: ParamInit,
}

impl Conv2dReluConfig {
    /// Checks `input` against this layer and allocates its parameters.
    ///
    /// The output keeps the input's spatial size (stride 1, same padding).
    pub fn build<B: Backend>(
        &self,
        name: &'static str,
        input: ActivationShape,
        device: &B::Device,
    ) -> Result<Built<Conv2dRelu<B>>, ShapeError> {
        let ActivationShape::Spatial {
            channels,
            height,
            width,
        } = input
        else {
            return Err(ShapeError::NotSpatial {
                layer: name,
                got: input,
            });
        };
        if self.out_channels == 0 || self.kernel_size == 0 {
            return Err(ShapeError::Empty { layer: name });
        }
        if self.kernel_size % 2 == 0 {
            return Err(ShapeError::EvenKernel {
                layer: name,
                kernel_size: self.kernel_size,
            });
        }
        if channels != self.in_channels {
            return Err(ShapeError::Channels {
                layer: name,
                expected: self.in_channels,
                got: channels,
            });
        }

        let k = self.kernel_size;
        let layer = Conv2dRelu {
            weight: self
                .weight_init
                .init([self.out_channels, self.in_channels, k, k], device),
            bias: self.bias_init.init([self.out_channels], device),
        };
        Ok(Built {
            layer,
            output: ActivationShape::spatial(self.out_channels, height, width),
        })
    }
}

/// 2d convolution (stride 1, same padding) followed by a per-channel bias and ReLU.
#[derive(Module, Debug)]
pub struct Conv2dRelu<B: Backend> {
    /// Dims: [out_channels, in_channels, kernel_size, kernel_size].
    pub weight: Param<Tensor<B, 4>>,

    /// Dims: [out_channels].
    pub bias: Param<Tensor<B, 1>>,
}

impl<B: Backend> Conv2dRelu<B> {
    /// # Shapes
    ///   - Input [batch, in_channels, height, width]
    ///   - Output [batch, out_channels, height, width]
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let [batch, in_channels, height, width] = x.dims();
        let [out_channels, expected_in, kernel_size, _] = self.weight.dims();
        assert_eq!(
            expected_in, in_channels,
            "conv2d expects {expected_in} input channels"
        );

        let padding = kernel_size / 2;
        let options = ConvOptions::new([1, 1], [padding, padding], [1, 1], 1);
        let x = conv2d(x, self.weight.val(), Some(self.bias.val()), options);
        debug_assert_eq!([batch, out_channels, height, width], x.dims());

        relu(x)
    }
}

use crate::deepnn::shape::{ActivationShape, Built, ShapeError};
use burn::nn::pool::{MaxPool2d, MaxPool2dConfig};
use burn::prelude::*;

/// 2x2 max-pooling with stride 2, halving both spatial dimensions.
#[derive(Module, Clone, Debug)]
pub struct MaxPool2x2 {
    pool: MaxPool2d,
}

impl Default for MaxPool2x2 {
    fn default() -> Self {
        Self::new()
    }
}

impl MaxPool2x2 {
    pub fn new() -> Self {
        Self {
            pool: MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init(),
        }
    }

    /// Checks that `input` is a feature map with even sides.
    pub fn build(name: &'static str, input: ActivationShape) -> Result<Built<Self>, ShapeError> {
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
        if height == 0 || width == 0 {
            return Err(ShapeError::Empty { layer: name });
        }
        if height % 2 != 0 || width % 2 != 0 {
            return Err(ShapeError::OddPoolInput {
                layer: name,
                height,
                width,
            });
        }
        Ok(Built {
            layer: Self::new(),
            output: ActivationShape::spatial(channels, height / 2, width / 2),
        })
    }

    /// # Shapes
    ///   - Input [batch, channels, height, width]
    ///   - Output [batch, channels, height / 2, width / 2]
    pub fn forward<B: Backend>(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let [batch, channels, height, width] = x.dims();
        let x = self.pool.forward(x);
        debug_assert_eq!([batch, channels, height / 2, width / 2], x.dims());
        x
    }
}

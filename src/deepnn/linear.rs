use crate::deepnn::shape::{ActivationShape, Built, ShapeError};
use crate::utils::init::ParamInit;
use burn::module::Param;
use burn::prelude::*;
use burn::tensor::activation::relu;

/// Configuration of a [`FullyConnected`] layer.
#[derive(Config, Debug)]
pub struct FullyConnectedConfig {
    /// Size of the flattened input.
    pub d_input: usize,
    pub d_output: usize,
    /// Whether a ReLU follows the affine map.
    #[config(default = true)]
    pub relu: bool,
    #[config(default = "ParamInit::weight()")]
    pub weight_init: ParamInit,
    #[config(default = "ParamInit::bias()")]
    pub bias_init: ParamInit,
}

impl FullyConnectedConfig {
    /// Checks that `input` flattens to `d_input` values and allocates the parameters.
    pub fn build<B: Backend>(
        &self,
        name: &'static str,
        input: ActivationShape,
        device: &B::Device,
    ) -> Result<Built<FullyConnected<B>>, ShapeError> {
        if self.d_input == 0 || self.d_output == 0 {
            return Err(ShapeError::Empty { layer: name });
        }
        let features = input.num_elements();
        if features != self.d_input {
            return Err(ShapeError::Features {
                layer: name,
                expected: self.d_input,
                got: features,
                from: input,
            });
        }

        let layer = FullyConnected {
            weight: self.weight_init.init([self.d_input, self.d_output], device),
            bias: self.bias_init.init([self.d_output], device),
            relu: self.relu,
        };
        Ok(Built {
            layer,
            output: ActivationShape::flat(self.d_output),
        })
    }
}

/// Affine map `x·W + b`, optionally followed by ReLU.
#[derive(Module, Debug)]
pub struct FullyConnected<B: Backend> {
    /// Dims: [d_input, d_output].
    pub weight: Param<Tensor<B, 2>>,

    /// Dims: [d_output].
    pub bias: Param<Tensor<B, 1>>,

    pub relu: bool,
}

impl<B: Backend> FullyConnected<B> {
    /// # Shapes
    ///   - Input [batch, d_input]
    ///   - Output [batch, d_output]
    pub fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        let [batch, d_input] = x.dims();
        let [expected_input, d_output] = self.weight.dims();
        assert_eq!(
            expected_input, d_input,
            "fully-connected layer expects {expected_input} input features"
        );

        let x = x.matmul(self.weight.val()) + self.bias.val().unsqueeze();
        debug_assert_eq!([batch, d_output], x.dims());

        if self.relu { relu(x) } else { x }
    }
}

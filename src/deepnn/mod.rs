pub mod conv;
pub mod dropout;
pub mod linear;
pub mod network;
pub mod pool;
pub mod shape;

pub use conv::{Conv2dRelu, Conv2dReluConfig};
pub use dropout::KeepDropout;
pub use linear::{FullyConnected, FullyConnectedConfig};
pub use network::{DeepNn, DeepNnConfig};
pub use pool::MaxPool2x2;
pub use shape::{ActivationShape, Built, ShapeError};

/// Shape of a single example's activation, excluding the batch dimension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActivationShape {
    /// A feature vector.
    Flat { features: usize },
    /// A feature map in channels-first order.
    Spatial {
        channels: usize,
        height: usize,
        width: usize,
    },
}

impl ActivationShape {
    pub fn spatial(channels: usize, height: usize, width: usize) -> Self {
        Self::Spatial {
            channels,
            height,
            width,
        }
    }

    pub fn flat(features: usize) -> Self {
        Self::Flat { features }
    }

    /// Number of values once flattened into a vector.
    pub fn num_elements(&self) -> usize {
        match *self {
            Self::Flat { features } => features,
            Self::Spatial {
                channels,
                height,
                width,
            } => channels * height * width,
        }
    }
}

impl std::fmt::Display for ActivationShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Flat { features } => write!(f, "[{features}]"),
            Self::Spatial {
                channels,
                height,
                width,
            } => write!(f, "[{channels}, {height}, {width}]"),
        }
    }
}

/// A freshly built layer together with the shape it produces.
#[derive(Debug)]
pub struct Built<L> {
    pub layer: L,
    pub output: ActivationShape,
}

/// Inconsistency between consecutive layers, detected while the model is built.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShapeError {
    #[error("{layer}: expected a spatial input, got {got}")]
    NotSpatial {
        layer: &'static str,
        got: ActivationShape,
    },

    #[error("{layer}: expected {expected} input channels, got {got}")]
    Channels {
        layer: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("{layer}: expected {expected} input features, got {got} (from {from})")]
    Features {
        layer: &'static str,
        expected: usize,
        got: usize,
        from: ActivationShape,
    },

    #[error("{layer}: cannot halve the odd spatial size {height}x{width}")]
    OddPoolInput {
        layer: &'static str,
        height: usize,
        width: usize,
    },

    #[error("{layer}: kernel size {kernel_size} must be odd for same padding")]
    EvenKernel {
        layer: &'static str,
        kernel_size: usize,
    },

    #[error("{layer}: size must be non-zero")]
    Empty { layer: &'static str },
}

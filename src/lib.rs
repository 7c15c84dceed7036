pub mod backend;
pub mod cli;
pub mod deepnn;
pub mod error;
pub mod graph;
pub mod mnist;
pub mod optim;
pub mod summary;
pub mod training;
pub mod utils;

pub use error::{Error, Result};

pub mod prelude {
    pub use crate::deepnn::*;
    pub use crate::graph::{load_graph, save_graph};
    pub use crate::mnist::dataset::{MnistBatch, MnistBatcher, MnistDataset, MnistItem};
    pub use crate::training::{TrainingConfig, TrainingPaths, TrainingState, evaluate, train};
    pub use crate::utils::loss::SoftmaxCrossEntropyLoss;
    pub use crate::utils::metrics::{accuracy, correct_count};
}

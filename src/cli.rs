use crate::error::{Error, Result};
use crate::graph::GRAPH_FILE_NAME;
use crate::training::{TrainingConfig, TrainingPaths};
use burn::prelude::*;
use std::ffi::OsString;
use std::path::PathBuf;

pub const HELP: &str = "\
MNIST Deep Convolutional Classifier

Trains a two-layer convolutional network on MNIST, evaluating it on the test split
every --testStep steps, then exports the trained graph.

USAGE:
    mnist-deepnn [OPTIONS]

BEHAVIOR OVERVIEW
- The MNIST IDX files (raw or .gz) are read from --mnistDataDir; missing ones are downloaded there.
- Scalar summaries (loss, accuracy) are appended to <logDir>/summaries.jsonl, and the training and
  model configs are saved next to them.
- When --config is given, the training config is loaded from that file first and the flags below
  override its values.
- The trained graph is written to --graphPath, with its architecture in the same path with a
  .json extension.

FLAGS:
    -h, --help                  Show this help message and exit

OPTIONS:
    --mnistDataDir <DIR>        MNIST data directory [default: /tmp/tensorflow/mnist/input_data]
    --logDir <DIR>              Training progress data directory [default: /tmp/tensorflow_logs/deepnet]
    --batchSize <N>             Training batch size [default: 50]
    --maxSteps <N>              Number of training steps (mini-batches) [default: 10000]
    --maxEpochs <N>             Deprecated alias of --maxSteps; the value counts steps, not epochs
    --testStep <N>              Evaluate the test split every N steps [default: 100]
    --evalBatchSize <N>         Test items per evaluation forward pass [default: 1000]
    --validationSize <N>        Training items held out as a validation split [default: 5000]
    --learningRate <F>          Adam learning rate [default: 0.001]
    --numWorkers <N>            Data loading threads [default: 2]
    --seed <N>                  Random seed [default: 0]
    --graphPath <PATH>          Where to write the trained graph [default: mnist_dnn.pb]
    --config <PATH>             Load the training config from this JSON file

BACKENDS:
    Chosen at build time with cargo features: ndarray (default), tch-cpu, tch-gpu, wgpu, cuda.
    Enabling another backend overrides ndarray, e.g. `cargo run --release --features cuda`.

ENVIRONMENT:
    RUST_LOG                    Log filter, e.g. `info` (default) or `mnist_deepnn=debug`
";

pub const DEFAULT_DATA_DIR: &str = "/tmp/tensorflow/mnist/input_data";
pub const DEFAULT_LOG_DIR: &str = "/tmp/tensorflow_logs/deepnet";

#[derive(Debug, Default)]
pub struct AppArgs {
    pub help: bool,
    pub mnist_data_dir: PathBuf,
    pub log_dir: PathBuf,
    pub graph_path: PathBuf,
    pub config: Option<PathBuf>,
    pub batch_size: Option<usize>,
    pub max_steps: Option<usize>,
    /// Value given through the deprecated `--maxEpochs` flag.
    pub max_epochs: Option<usize>,
    pub test_step: Option<usize>,
    pub eval_batch_size: Option<usize>,
    pub validation_size: Option<usize>,
    pub learning_rate: Option<f64>,
    pub num_workers: Option<usize>,
    pub seed: Option<u64>,
    /// Arguments nobody asked for; they are reported and otherwise ignored.
    pub unused: Vec<OsString>,
}

impl AppArgs {
    pub fn parse() -> Result<Self, pico_args::Error> {
        Self::from_pargs(pico_args::Arguments::from_env())
    }

    pub fn from_vec(args: Vec<OsString>) -> Result<Self, pico_args::Error> {
        Self::from_pargs(pico_args::Arguments::from_vec(args))
    }

    fn from_pargs(mut pargs: pico_args::Arguments) -> Result<Self, pico_args::Error> {
        // Help has a higher priority and should be handled separately.
        if pargs.contains(["-h", "--help"]) {
            return Ok(Self {
                help: true,
                ..Default::default()
            });
        }

        let args = AppArgs {
            help: false,
            mnist_data_dir: pargs
                .opt_value_from_os_str("--mnistDataDir", parse_path)?
                .unwrap_or_else(|| DEFAULT_DATA_DIR.into()),
            log_dir: pargs
                .opt_value_from_os_str("--logDir", parse_path)?
                .unwrap_or_else(|| DEFAULT_LOG_DIR.into()),
            graph_path: pargs
                .opt_value_from_os_str("--graphPath", parse_path)?
                .unwrap_or_else(|| GRAPH_FILE_NAME.into()),
            config: pargs.opt_value_from_os_str("--config", parse_path)?,
            batch_size: pargs.opt_value_from_str("--batchSize")?,
            max_steps: pargs.opt_value_from_str("--maxSteps")?,
            max_epochs: pargs.opt_value_from_str("--maxEpochs")?,
            test_step: pargs.opt_value_from_str("--testStep")?,
            eval_batch_size: pargs.opt_value_from_str("--evalBatchSize")?,
            validation_size: pargs.opt_value_from_str("--validationSize")?,
            learning_rate: pargs.opt_value_from_str("--learningRate")?,
            num_workers: pargs.opt_value_from_str("--numWorkers")?,
            seed: pargs.opt_value_from_str("--seed")?,
            unused: vec![],
        };

        Ok(AppArgs {
            unused: pargs.finish(),
            ..args
        })
    }

    /// Builds the training config: the `--config` file (or the defaults), then the flags.
    pub fn training_config(&self) -> Result<TrainingConfig> {
        let mut config = match &self.config {
            Some(path) => {
                tracing::info!("Loading training config from {path:?}");
                TrainingConfig::load(path).map_err(|source| Error::Config {
                    path: path.clone(),
                    source,
                })?
            }
            None => TrainingConfig::new(),
        };

        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }
        if let Some(max_steps) = self.max_steps() {
            config.max_steps = max_steps;
        }
        if let Some(test_step) = self.test_step {
            config.test_step = test_step;
        }
        if let Some(eval_batch_size) = self.eval_batch_size {
            config.eval_batch_size = eval_batch_size;
        }
        if let Some(validation_size) = self.validation_size {
            config.validation_size = validation_size;
        }
        if let Some(learning_rate) = self.learning_rate {
            config.learning_rate = learning_rate;
        }
        if let Some(num_workers) = self.num_workers {
            config.num_workers = num_workers;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        Ok(config)
    }

    /// Number of training steps requested, `--maxSteps` taking precedence over `--maxEpochs`.
    pub fn max_steps(&self) -> Option<usize> {
        match (self.max_steps, self.max_epochs) {
            (Some(max_steps), _) => Some(max_steps),
            (None, Some(max_epochs)) => {
                tracing::warn!(
                    "--maxEpochs counts training steps, not epochs; prefer --maxSteps {max_epochs}"
                );
                Some(max_epochs)
            }
            (None, None) => None,
        }
    }

    pub fn paths(&self) -> TrainingPaths {
        TrainingPaths {
            data_dir: self.mnist_data_dir.clone(),
            log_dir: self.log_dir.clone(),
            graph_path: self.graph_path.clone(),
        }
    }
}

fn parse_path(s: &std::ffi::OsStr) -> Result<std::path::PathBuf, &'static str> {
    Ok(s.into())
}

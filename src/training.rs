use crate::deepnn::{DeepNn, DeepNnConfig};
use crate::error::{Error, Result};
use crate::graph::save_graph;
use crate::mnist::dataset::{DatasetError, MnistBatch, MnistBatcher, MnistDataset, MnistSplit};
use crate::optim::{DeepNnOptimizer, init_optimizer, optimizer_config};
use crate::summary::SummaryWriter;
use crate::utils::loss::SoftmaxCrossEntropyLoss;
use crate::utils::metrics::{accuracy, correct_count};
use burn::data::dataloader::{DataLoader, DataLoaderBuilder};
use burn::data::dataset::Dataset;
use burn::module::AutodiffModule;
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::prelude::*;
use burn::tensor::ElementConversion;
use burn::tensor::backend::AutodiffBackend;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const TRAINING_CONFIG_NAME: &str = "training_config.json";
pub const MODEL_CONFIG_NAME: &str = "model_config.json";

#[derive(Config, Debug)]
pub struct TrainingConfig {
    #[config(default = "optimizer_config()")]
    pub optimizer: AdamConfig,
    #[config(default = 50)]
    pub batch_size: usize,
    /// Number of optimizer updates (mini-batch steps) before training stops.
    #[config(default = 10000)]
    pub max_steps: usize,
    /// The test split is evaluated whenever `step % test_step == 0`. Zero disables it.
    #[config(default = 100)]
    pub test_step: usize,
    /// Evaluation runs over the whole test split in chunks of this size.
    #[config(default = 1000)]
    pub eval_batch_size: usize,
    /// Leading training items held out of the training split.
    #[config(default = 5000)]
    pub validation_size: usize,
    #[config(default = 1e-3)]
    pub learning_rate: f64,
    /// Dropout keep probability while training.
    #[config(default = 0.5)]
    pub train_keep_prob: f64,
    #[config(default = 2)]
    pub num_workers: usize,
    #[config(default = 0)]
    pub seed: u64,
}

/// Files and directories a training run reads and writes.
#[derive(Debug, Clone)]
pub struct TrainingPaths {
    /// Directory holding (or receiving) the MNIST IDX files.
    pub data_dir: PathBuf,
    /// Directory receiving the summary log and the configs.
    pub log_dir: PathBuf,
    /// Where the trained graph is exported.
    pub graph_path: PathBuf,
}

/// Everything that changes from one training step to the next.
pub struct TrainingState<AutoB: AutodiffBackend> {
    pub model: DeepNn<AutoB>,
    pub optim: DeepNnOptimizer<AutoB>,
    /// Optimizer updates applied so far.
    pub step: usize,
    /// Completed passes over the training split.
    pub epoch: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutput {
    pub loss: f32,
    pub accuracy: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvalOutput {
    pub loss: f32,
    pub accuracy: f32,
    pub num_items: usize,
}

#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub steps: usize,
    pub epochs: usize,
    pub final_eval: EvalOutput,
    pub graph_path: PathBuf,
}

impl TrainingConfig {
    /// Rejects settings that cannot describe a training run.
    pub fn validate(&self) -> Result<()> {
        let invalid = |field, reason: &str| {
            Err(Error::InvalidConfig {
                field,
                reason: reason.to_owned(),
            })
        };
        if self.batch_size == 0 {
            return invalid("batch_size", "must be at least 1");
        }
        if self.eval_batch_size == 0 {
            return invalid("eval_batch_size", "must be at least 1");
        }
        if !(self.train_keep_prob > 0.0 && self.train_keep_prob <= 1.0) {
            return invalid(
                "train_keep_prob",
                &format!("must be in (0, 1], got {}", self.train_keep_prob),
            );
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return invalid(
                "learning_rate",
                &format!("must be positive, got {}", self.learning_rate),
            );
        }
        Ok(())
    }
}

impl<AutoB: AutodiffBackend> TrainingState<AutoB> {
    pub fn new(model: DeepNn<AutoB>, optim: DeepNnOptimizer<AutoB>) -> Self {
        Self {
            model,
            optim,
            step: 0,
            epoch: 0,
        }
    }

    /// Runs one forward/backward pass on `batch` and applies a single optimizer update.
    pub fn train_step(self, batch: MnistBatch<AutoB>, config: &TrainingConfig) -> (Self, StepOutput) {
        let Self {
            model,
            mut optim,
            step,
            epoch,
        } = self;

        let logits = model.forward(batch.images, config.train_keep_prob);
        let loss = SoftmaxCrossEntropyLoss::new().forward(logits.clone(), batch.labels.clone());
        let output = StepOutput {
            loss: loss.clone().into_scalar().elem(),
            accuracy: accuracy(logits.detach(), batch.labels),
        };

        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &model);
        let model = optim.step(config.learning_rate, model, grads);

        let state = Self {
            model,
            optim,
            step: step + 1,
            epoch,
        };
        (state, output)
    }
}

pub type Dataloader<B> = Arc<dyn DataLoader<B, MnistBatch<B>> + 'static>;

/// Shuffled training batches of `config.batch_size`, built on `device`.
pub fn train_dataloader<B: Backend>(
    config: &TrainingConfig,
    dataset: MnistDataset,
    device: &B::Device,
) -> Dataloader<B> {
    DataLoaderBuilder::new(MnistBatcher::default())
        .batch_size(config.batch_size)
        .shuffle(config.seed)
        .num_workers(config.num_workers)
        .set_device(device.clone())
        .build(dataset)
}

/// Evaluation batches of `config.eval_batch_size` in file order, built on `device`.
pub fn eval_dataloader<B: Backend>(
    config: &TrainingConfig,
    dataset: MnistDataset,
    device: &B::Device,
) -> Dataloader<B> {
    DataLoaderBuilder::new(MnistBatcher::default())
        .batch_size(config.eval_batch_size)
        .num_workers(config.num_workers)
        .set_device(device.clone())
        .build(dataset)
}

/// Runs the model with dropout disabled over every batch of `dataloader`.
///
/// Loss and accuracy are aggregated per item, so the result does not depend on
/// how the split was chunked.
pub fn evaluate<B: Backend>(model: &DeepNn<B>, dataloader: &Dataloader<B>) -> EvalOutput {
    let loss_fn = SoftmaxCrossEntropyLoss::new();
    let mut loss_sum = 0f64;
    let mut correct = 0usize;
    let mut num_items = 0usize;

    for batch in dataloader.iter() {
        let batch_size = batch.len();
        let logits = model.forward(batch.images, 1.0);
        let loss: f32 = loss_fn
            .forward(logits.clone(), batch.labels.clone())
            .into_scalar()
            .elem();
        loss_sum += loss as f64 * batch_size as f64;
        correct += correct_count(logits, batch.labels);
        num_items += batch_size;
    }

    let denominator = num_items.max(1) as f64;
    EvalOutput {
        loss: (loss_sum / denominator) as f32,
        accuracy: (correct as f64 / denominator) as f32,
        num_items,
    }
}

fn record_eval(summaries: &mut SummaryWriter, step: usize, eval: &EvalOutput) -> Result<()> {
    summaries.add_scalar("loss", eval.loss, step)?;
    summaries.add_scalar("accuracy", eval.accuracy, step)
}

fn save_config(config: &impl Config, path: &Path) -> Result<()> {
    tracing::debug!("Saving config into {path:?}");
    config.save(path).map_err(|e| Error::io(path, e))
}

/// Trains the classifier for `config.max_steps` steps and exports the result.
///
/// The test split is evaluated every `config.test_step` steps (starting with the untrained
/// model at step 0) and once more after the last step.
pub fn train<AutoB: AutodiffBackend>(
    config: &TrainingConfig,
    model_config: &DeepNnConfig,
    paths: &TrainingPaths,
    device: &AutoB::Device,
) -> Result<TrainingReport> {
    config.validate()?;
    AutoB::seed(device, config.seed);

    let mut summaries = SummaryWriter::create(&paths.log_dir)?;
    save_config(config, &paths.log_dir.join(TRAINING_CONFIG_NAME))?;
    save_config(model_config, &paths.log_dir.join(MODEL_CONFIG_NAME))?;

    let dataset_train = MnistDataset::train(&paths.data_dir, config.validation_size)?;
    let dataset_test = MnistDataset::test(&paths.data_dir)?;
    tracing::info!(
        "MNIST: {} training items, {} test items",
        dataset_train.len(),
        dataset_test.len(),
    );

    let dataloader_train = train_dataloader::<AutoB>(config, dataset_train, device);
    // Autodiff backends share their device type with the inner backend.
    let dataloader_test = eval_dataloader::<AutoB::InnerBackend>(config, dataset_test, device);
    if dataloader_train.num_items() == 0 {
        return Err(DatasetError::EmptySplit {
            split: MnistSplit::Train,
        }
        .into());
    }

    let model: DeepNn<AutoB> = model_config.init(device)?;
    tracing::info!("Initialized model with {} parameters", model.num_params());
    let optim = init_optimizer::<AutoB>(&config.optimizer);
    let mut state = TrainingState::new(model, optim);

    tracing::info!("Starting training for {} steps", config.max_steps);
    'training: loop {
        for batch in dataloader_train.iter() {
            if state.step >= config.max_steps {
                break 'training;
            }

            if config.test_step > 0 && state.step % config.test_step == 0 {
                let eval = evaluate(&state.model.valid(), &dataloader_test);
                record_eval(&mut summaries, state.step, &eval)?;
                tracing::info!(
                    "step {}, test accuracy {:.4}, test loss {:.4}",
                    state.step,
                    eval.accuracy,
                    eval.loss
                );
            }

            let (next_state, output) = state.train_step(batch, config);
            state = next_state;
            tracing::debug!(
                step = state.step,
                epoch = state.epoch,
                loss = output.loss,
                accuracy = output.accuracy,
                "training step"
            );
        }
        state.epoch += 1;
        tracing::debug!(epoch = state.epoch, "finished a pass over the training split");
    }

    let model = state.model.valid();
    let final_eval = evaluate(&model, &dataloader_test);
    record_eval(&mut summaries, state.step, &final_eval)?;
    tracing::info!(
        "Training finished after {} steps: test accuracy {:.4}, test loss {:.4}",
        state.step,
        final_eval.accuracy,
        final_eval.loss
    );

    save_graph(&paths.graph_path, model_config, &model)?;

    Ok(TrainingReport {
        steps: state.step,
        epochs: state.epoch,
        final_eval,
        graph_path: paths.graph_path.clone(),
    })
}

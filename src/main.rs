use anyhow::Context;
use burn::tensor::backend::AutodiffBackend;
use mnist_deepnn::backend::{BACKEND_NAME, MainAutoBackend, MainDevice};
use mnist_deepnn::cli::{AppArgs, HELP};
use mnist_deepnn::deepnn::DeepNnConfig;
use mnist_deepnn::training;
use tracing_subscriber::EnvFilter;

pub fn launch<AutoB: AutodiffBackend + MainDevice>(app_args: &AppArgs) -> anyhow::Result<()> {
    let training_config = app_args
        .training_config()
        .context("failed to build the training config")?;
    let model_config = DeepNnConfig::new();
    let paths = app_args.paths();
    tracing::info!("MNIST data directory: {:?}", paths.data_dir);
    tracing::info!("Log directory: {:?}", paths.log_dir);

    let device = AutoB::main_device();
    tracing::info!("Training on the {BACKEND_NAME} backend, device {device:?}");
    let report = training::train::<AutoB>(&training_config, &model_config, &paths, &device)
        .context("training failed")?;

    tracing::info!(
        "Done: {} steps over {} full epochs, final test accuracy {:.4}, graph at {:?}",
        report.steps,
        report.epochs,
        report.final_eval.accuracy,
        report.graph_path
    );
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let app_args = AppArgs::parse().context("failed to parse the command line")?;
    if app_args.help {
        println!("{HELP}");
        return Ok(());
    }
    for arg in &app_args.unused {
        tracing::warn!("ignoring unknown argument {arg:?}");
    }

    launch::<MainAutoBackend>(&app_args)
}

// Command-line parsing and how flags override the training config.

use burn::prelude::*;
use mnist_deepnn::cli::{AppArgs, DEFAULT_DATA_DIR, DEFAULT_LOG_DIR};
use mnist_deepnn::graph::GRAPH_FILE_NAME;
use mnist_deepnn::training::TrainingConfig;
use std::ffi::OsString;
use std::path::PathBuf;

fn args(list: &[&str]) -> AppArgs {
    AppArgs::from_vec(list.iter().map(OsString::from).collect()).unwrap()
}

#[test]
fn defaults() {
    let app_args = args(&[]);
    assert!(!app_args.help);
    assert_eq!(app_args.mnist_data_dir, PathBuf::from(DEFAULT_DATA_DIR));
    assert_eq!(app_args.log_dir, PathBuf::from(DEFAULT_LOG_DIR));
    assert_eq!(app_args.graph_path, PathBuf::from(GRAPH_FILE_NAME));

    let config = app_args.training_config().unwrap();
    assert_eq!(config.batch_size, 50);
    assert_eq!(config.max_steps, 10000);
    assert_eq!(config.test_step, 100);
    assert_eq!(config.learning_rate, 1e-3);
    assert_eq!(config.train_keep_prob, 0.5);
}

#[test]
fn flags_override_defaults() {
    let app_args = args(&[
        "--mnistDataDir",
        "/data/mnist",
        "--logDir",
        "/logs",
        "--batchSize",
        "32",
        "--maxSteps",
        "7",
        "--testStep",
        "3",
        "--seed",
        "9",
    ]);
    assert_eq!(app_args.paths().data_dir, PathBuf::from("/data/mnist"));
    assert_eq!(app_args.paths().log_dir, PathBuf::from("/logs"));

    let config = app_args.training_config().unwrap();
    assert_eq!(config.batch_size, 32);
    assert_eq!(config.max_steps, 7);
    assert_eq!(config.test_step, 3);
    assert_eq!(config.seed, 9);
}

#[test]
fn max_epochs_is_an_alias_for_max_steps() {
    let config = args(&["--maxEpochs", "20"]).training_config().unwrap();
    assert_eq!(config.max_steps, 20);

    let config = args(&["--maxEpochs", "20", "--maxSteps", "5"])
        .training_config()
        .unwrap();
    assert_eq!(config.max_steps, 5);
}

#[test]
fn help_and_unknown_arguments() {
    assert!(args(&["--help"]).help);
    assert!(args(&["-h", "--batchSize", "nope"]).help);

    let app_args = args(&["--fancy", "--batchSize", "8"]);
    assert_eq!(app_args.unused, vec![OsString::from("--fancy")]);
    assert_eq!(app_args.batch_size, Some(8));
}

#[test]
fn malformed_numbers_are_errors() {
    let result = AppArgs::from_vec(vec!["--batchSize".into(), "many".into()]);
    assert!(result.is_err());
}

#[test]
fn config_file_is_loaded_then_overridden() {
    let dir = temp_dir::TempDir::new().unwrap();
    let path = dir.path().join("training.json");
    TrainingConfig::new()
        .with_batch_size(16)
        .with_test_step(10)
        .save(&path)
        .unwrap();

    let config = args(&["--config", path.to_str().unwrap(), "--testStep", "4"])
        .training_config()
        .unwrap();
    assert_eq!(config.batch_size, 16);
    assert_eq!(config.test_step, 4);

    let missing = args(&["--config", "/nonexistent/training.json"]).training_config();
    assert!(matches!(missing, Err(mnist_deepnn::Error::Config { .. })));
}

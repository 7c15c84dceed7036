use crate::deepnn::{DeepNn, DeepNnConfig};
use crate::error::{Error, Result};
use burn::prelude::*;
use burn::record::{BinBytesRecorder, FullPrecisionSettings, Recorder};
use std::path::{Path, PathBuf};

/// Default name of the exported graph, written to the working directory.
pub const GRAPH_FILE_NAME: &str = "mnist_dnn.pb";

type GraphRecorder = BinBytesRecorder<FullPrecisionSettings>;

/// Where the architecture config of a graph file is stored: same path, `json` extension.
pub fn config_path(graph_path: &Path) -> PathBuf {
    graph_path.with_extension("json")
}

/// Writes the model parameters to `path` and its architecture next to it.
pub fn save_graph<B: Backend>(path: &Path, config: &DeepNnConfig, model: &DeepNn<B>) -> Result<()> {
    let bytes = GraphRecorder::default()
        .record(model.clone().into_record(), ())
        .map_err(|source| Error::Record {
            path: path.to_path_buf(),
            source,
        })?;
    std::fs::write(path, bytes).map_err(|e| Error::io(path, e))?;

    let config_path = config_path(path);
    config
        .save(&config_path)
        .map_err(|e| Error::io(&config_path, e))?;

    tracing::info!("Saved graph to {path:?} (architecture in {config_path:?})");
    Ok(())
}

/// Rebuilds a model written by [`save_graph`].
pub fn load_graph<B: Backend>(path: &Path, device: &B::Device) -> Result<(DeepNnConfig, DeepNn<B>)> {
    let config_path = config_path(path);
    let config = DeepNnConfig::load(&config_path).map_err(|source| Error::Config {
        path: config_path.clone(),
        source,
    })?;

    let bytes = std::fs::read(path).map_err(|e| Error::io(path, e))?;
    let record = GraphRecorder::default()
        .load(bytes, device)
        .map_err(|source| Error::Record {
            path: path.to_path_buf(),
            source,
        })?;

    let model = config.init::<B>(device)?.load_record(record);
    tracing::info!("Loaded graph from {path:?}");
    Ok((config, model))
}

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

pub const SUMMARY_FILE_NAME: &str = "summaries.jsonl";

/// One scalar measurement taken at a training step.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ScalarSummary {
    pub step: usize,
    pub tag: String,
    pub value: f32,
}

/// Appends scalar summaries to `<log_dir>/summaries.jsonl`, one JSON object per line.
///
/// Every record is flushed immediately so the log can be followed while training runs.
pub struct SummaryWriter {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl SummaryWriter {
    /// Creates the log directory if needed and starts a fresh summary file.
    pub fn create(log_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(log_dir).map_err(|e| Error::io(log_dir, e))?;
        let path = log_dir.join(SUMMARY_FILE_NAME);
        let file = File::create(&path).map_err(|e| Error::io(&path, e))?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn add_scalar(&mut self, tag: &str, value: f32, step: usize) -> Result<()> {
        let record = ScalarSummary {
            step,
            tag: tag.to_owned(),
            value,
        };
        serde_json::to_writer(&mut self.writer, &record)?;
        self.writer
            .write_all(b"\n")
            .and_then(|()| self.writer.flush())
            .map_err(|e| Error::io(&self.path, e))
    }
}

/// Reads back every record of a summary file.
pub fn read_summaries(path: &Path) -> Result<Vec<ScalarSummary>> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let mut summaries = vec![];
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|e| Error::io(path, e))?;
        if line.trim().is_empty() {
            continue;
        }
        summaries.push(serde_json::from_str(&line)?);
    }
    Ok(summaries)
}

use std::io;
use std::path::{Path, PathBuf};

use scout_core::{Batch, Record};
use serde::{Deserialize, Serialize};

use crate::persist::append_line;

#[derive(Debug, thiserror::Error)]
pub enum DeadLetterError {
    #[error("dead-letter io error: {0}")]
    Io(#[from] io::Error),
    #[error("dead-letter encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// One batch the store refused, as written to the dead-letter log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadLetterEntry {
    pub group_label: String,
    pub error: String,
    pub records: Vec<Record>,
}

/// JSON-lines file collecting batches that could not be persisted, so they
/// can be replayed instead of being lost.
#[derive(Debug, Clone)]
pub struct DeadLetterLog {
    path: PathBuf,
}

impl DeadLetterLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, batch: &Batch, error: &str) -> Result<(), DeadLetterError> {
        let entry = DeadLetterEntry {
            group_label: batch.group_label.clone(),
            error: error.to_string(),
            records: batch.records.clone(),
        };
        let line = serde_json::to_string(&entry)?;
        append_line(&self.path, &line)?;
        Ok(())
    }

    /// Read back every entry, e.g. for replay.
    pub fn entries(&self) -> Result<Vec<DeadLetterEntry>, DeadLetterError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        text.lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(DeadLetterError::from))
            .collect()
    }
}

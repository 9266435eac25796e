use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use engine_logging::engine_info;
use serde::{Deserialize, Serialize};

use crate::persist::write_atomically;
use crate::ProgressError;

/// Durable home of the resumption cursor.
pub trait ProgressStore: Send + Sync {
    /// Index of the next Query to process; 0 when nothing was saved yet.
    fn load_cursor(&self) -> Result<usize, ProgressError>;

    /// Persist the cursor. Returns only once the value is on stable storage.
    fn save_cursor(&self, cursor: usize) -> Result<(), ProgressError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct PersistedCursor {
    next_query: usize,
}

/// Cursor kept in a small RON file.
#[derive(Debug, Clone)]
pub struct FileProgressStore {
    path: PathBuf,
}

impl FileProgressStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ProgressStore for FileProgressStore {
    fn load_cursor(&self) -> Result<usize, ProgressError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(err) => return Err(err.into()),
        };
        let persisted: PersistedCursor = ron::from_str(&content)
            .map_err(|err| ProgressError::Corrupt(format!("{}: {err}", self.path.display())))?;
        engine_info!(
            "loaded resumption cursor {} from {:?}",
            persisted.next_query,
            self.path
        );
        Ok(persisted.next_query)
    }

    fn save_cursor(&self, cursor: usize) -> Result<(), ProgressError> {
        let pretty = ron::ser::PrettyConfig::new();
        let content = ron::ser::to_string_pretty(&PersistedCursor { next_query: cursor }, pretty)
            .map_err(|err| ProgressError::Encode(err.to_string()))?;
        write_atomically(&self.path, content.as_bytes())?;
        Ok(())
    }
}

/// Process-local cursor, lost on exit.
#[derive(Debug, Default)]
pub struct MemoryProgressStore {
    cursor: AtomicUsize,
}

impl MemoryProgressStore {
    pub fn new(cursor: usize) -> Self {
        Self {
            cursor: AtomicUsize::new(cursor),
        }
    }
}

impl ProgressStore for MemoryProgressStore {
    fn load_cursor(&self) -> Result<usize, ProgressError> {
        Ok(self.cursor.load(Ordering::SeqCst))
    }

    fn save_cursor(&self, cursor: usize) -> Result<(), ProgressError> {
        self.cursor.store(cursor, Ordering::SeqCst);
        Ok(())
    }
}

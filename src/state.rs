use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::data::loader::load_file;
use crate::data::model::MovieTable;
use crate::error::LoadError;

// ---------------------------------------------------------------------------
// Shared dataset handle
// ---------------------------------------------------------------------------

/// Process-wide handle on the prepared table.
///
/// Readers take an `Arc` snapshot and never see a table change under them.
/// A reload prepares the new table off to the side and swaps the pointer
/// and its source path together under one write lock.
#[derive(Debug)]
pub struct DatasetHandle {
    current: RwLock<Loaded>,
}

/// The current table and the file it came from, if any.
#[derive(Debug)]
struct Loaded {
    table: Arc<MovieTable>,
    source: Option<PathBuf>,
}

impl DatasetHandle {
    pub fn new(table: MovieTable) -> Self {
        Self::with_source(table, None)
    }

    fn with_source(table: MovieTable, source: Option<PathBuf>) -> Self {
        Self {
            current: RwLock::new(Loaded {
                table: Arc::new(table),
                source,
            }),
        }
    }

    /// Load and prepare a file, then wrap it.
    pub fn open(path: &Path) -> Result<Self, LoadError> {
        let table = load_file(path)?;
        Ok(Self::with_source(table, Some(path.to_path_buf())))
    }

    /// The current table. Cheap; holds no lock after returning.
    pub fn snapshot(&self) -> Arc<MovieTable> {
        Arc::clone(&self.current.read().table)
    }

    pub fn source(&self) -> Option<PathBuf> {
        self.current.read().source.clone()
    }

    /// Re-read `path` and swap it in. On error the current table stays.
    pub fn reload(&self, path: &Path) -> Result<usize, LoadError> {
        let table = load_file(path)?;
        let n = table.len();
        *self.current.write() = Loaded {
            table: Arc::new(table),
            source: Some(path.to_path_buf()),
        };
        log::info!("Reloaded {n} movies from {}", path.display());
        Ok(n)
    }
}

use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Load errors – fatal problems with the dataset file as a whole
// ---------------------------------------------------------------------------

/// Errors raised while reading and preparing a dataset file.
///
/// Individual malformed cells never produce one of these; the offending row
/// is dropped instead. These cover the file as a whole.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("unsupported file extension: .{0}")]
    UnsupportedExtension(String),

    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parquet: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// A column the movie schema cannot do without.
    #[error("dataset is missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("JSON row {row} is not an object")]
    NotAnObject { row: usize },

    #[error("expected a top-level JSON array of records")]
    NotAnArray,

    /// Reload asked for without a path, and the table was not read from a file.
    #[error("no dataset file to reload")]
    NoSource,
}

// ---------------------------------------------------------------------------
// Query errors – reported back to the caller, never internal faults
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// Lookup by an id that no record carries.
    #[error("movie not found: {id}")]
    NotFound { id: String },

    #[error("limit must be a positive integer")]
    InvalidLimit,

    #[error("limit {requested} exceeds the maximum of {max}")]
    LimitTooLarge { requested: usize, max: usize },
}

impl QueryError {
    /// Whether this is the "not found" condition rather than a bad request.
    pub fn is_not_found(&self) -> bool {
        matches!(self, QueryError::NotFound { .. })
    }
}

use std::path::PathBuf;

/// Default page size for movie lists.
pub const DEFAULT_LIMIT: usize = 50;
/// Largest page a caller may request.
pub const MAX_LIMIT: usize = 5000;

/// Settings for the query service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Dataset file loaded at startup.
    pub dataset_path: PathBuf,
    pub default_limit: usize,
    pub max_limit: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from("data/imdb.csv"),
            default_limit: DEFAULT_LIMIT,
            max_limit: MAX_LIMIT,
        }
    }
}

impl ServiceConfig {
    /// Keep the limits consistent: both positive, default within the cap.
    pub fn normalized(mut self) -> Self {
        self.max_limit = self.max_limit.max(1);
        self.default_limit = self.default_limit.clamp(1, self.max_limit);
        self
    }
}

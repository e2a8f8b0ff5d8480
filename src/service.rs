use std::path::Path;
use std::sync::Arc;

use crate::analytics::{
    analytics_summary, find_record, list_records, AnalyticsSummary, MovieList, SortKey,
};
use crate::config::ServiceConfig;
use crate::data::filter::{filter, FilterParams};
use crate::data::model::MovieRecord;
use crate::error::{LoadError, QueryError};
use crate::state::DatasetHandle;

// ---------------------------------------------------------------------------
// Query service
// ---------------------------------------------------------------------------

/// The three read-only query operations over the shared dataset.
///
/// Every call takes its own snapshot and filtered view, so concurrent
/// callers share nothing mutable.
#[derive(Debug, Clone)]
pub struct Service {
    dataset: Arc<DatasetHandle>,
    config: ServiceConfig,
}

impl Service {
    pub fn new(dataset: Arc<DatasetHandle>, config: ServiceConfig) -> Self {
        Self {
            dataset,
            config: config.normalized(),
        }
    }

    /// Load the configured dataset and build a service around it.
    pub fn open(config: ServiceConfig) -> Result<Self, LoadError> {
        let dataset = DatasetHandle::open(&config.dataset_path)?;
        Ok(Self::new(Arc::new(dataset), config))
    }

    /// KPIs and chart aggregates for the filtered movies.
    pub fn analytics(&self, params: &FilterParams) -> AnalyticsSummary {
        let table = self.dataset.snapshot();
        let view = filter(&table, params);
        log::debug!("analytics: {} of {} movies match {params:?}", view.len(), table.len());
        analytics_summary(&view)
    }

    /// Sorted, truncated movie list. `sort` falls back to
    /// `outlier_score_desc` when unknown; `limit` defaults from config.
    pub fn movies(
        &self,
        params: &FilterParams,
        sort: Option<&str>,
        limit: Option<usize>,
    ) -> Result<MovieList, QueryError> {
        let limit = self.check_limit(limit)?;
        let sort = sort.map_or_else(SortKey::default, SortKey::from_name);

        let table = self.dataset.snapshot();
        let view = filter(&table, params);
        log::debug!(
            "movies: {} of {} match, sort {}, limit {limit}",
            view.len(),
            table.len(),
            sort.as_str()
        );
        Ok(list_records(&view, sort, limit))
    }

    /// A single movie by id.
    pub fn movie(&self, id: &str) -> Result<MovieRecord, QueryError> {
        find_record(&self.dataset.snapshot(), id)
    }

    /// Re-read a dataset file and swap it in for subsequent queries.
    /// Without a path, the file the current table came from is read again.
    pub fn reload(&self, path: Option<&Path>) -> Result<usize, LoadError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => self.dataset.source().ok_or(LoadError::NoSource)?,
        };
        self.dataset.reload(&path)
    }

    fn check_limit(&self, limit: Option<usize>) -> Result<usize, QueryError> {
        match limit {
            None => Ok(self.config.default_limit),
            Some(0) => Err(QueryError::InvalidLimit),
            Some(n) if n > self.config.max_limit => Err(QueryError::LimitTooLarge {
                requested: n,
                max: self.config.max_limit,
            }),
            Some(n) => Ok(n),
        }
    }
}

//! Filtered, sorted and aggregated views over a static movie dataset.
//!
//! A dataset file is read and prepared once ([`data::loader`],
//! [`data::prepare`]), held behind a [`state::DatasetHandle`], and queried
//! read-only through [`service::Service`]: KPI summaries, chart aggregates,
//! sorted movie lists and single-movie lookups.

pub mod analytics;
pub mod config;
pub mod data;
pub mod error;
pub mod export;
pub mod service;
pub mod state;

pub use analytics::{AnalyticsSummary, ChartData, Kpis, MovieList, SortKey};
pub use config::ServiceConfig;
pub use data::filter::FilterParams;
pub use data::model::{CellValue, MovieRecord, MovieTable};
pub use error::{LoadError, QueryError};
pub use service::Service;

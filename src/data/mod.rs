/// Data layer: core types, loading, preparation and filtering.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → RawTable
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ prepare   │  clean, dedup, derive outlier columns → MovieTable
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  apply request predicates → MovieView
///   └──────────┘
/// ```

pub mod filter;
pub mod loader;
pub mod model;
pub mod prepare;

//! Transformation stages of the preparation jobs.
//!
//! - **normalize**: raw headers to canonical `[a-z0-9_]` names, with an
//!   explicit collision policy, plus the versioned column rename table
//! - **merge**: sequential left joins on the country key
//! - **coerce**: declared-type conversion with a per-cell failure audit
//! - **timeseries**: yearly snapshots pivoted to a country-by-year matrix
//! - **subset**: alias, year, region, ranking and highlight filtering
//! - **stats**: correlation and trendline summaries
//!
//! Every function takes its inputs by reference and returns a new frame, so
//! each stage of a job has its own named output.
//!
//! # Example
//!
//! ```ignore
//! use shd_model::{CollisionPolicy, OverlapPolicy};
//! use shd_transform::{SourceFrame, coerce_columns, merge_left, normalize_table};
//!
//! let (codes, _) = normalize_table(&codes_raw, CollisionPolicy::Error)?;
//! let (whr, _) = normalize_table(&whr_raw, CollisionPolicy::Error)?;
//! let (merged, merge_report) = merge_left(
//!     &SourceFrame::new("codes", codes),
//!     &[SourceFrame::new("whr", whr)],
//!     "country",
//!     OverlapPolicy::Suffix,
//! )?;
//! let (global, coercion_report) = coerce_columns(&merged, &schema)?;
//! ```

mod coerce;
mod error;
mod merge;
mod normalize;
mod stats;
mod subset;
mod timeseries;

// Error type
pub use error::{Result, TransformError};

// Column normalization
pub use normalize::{
    ColumnCollision, ColumnRename, NormalizationReport, apply_column_renames, normalize_column_name,
    normalize_columns, normalize_table,
};

// Merging
pub use merge::{JoinStep, MergeReport, OverlapResolution, SourceFrame, merge_left};

// Type coercion
pub use coerce::{
    CoercedValue, coerce_columns, coerce_currency, coerce_float, coerce_integer, coerce_value,
};

// Time series
pub use timeseries::{Snapshot, build_time_series};

// Subsets
pub use subset::{
    Highlight, Ranking, SubsetReport, SubsetSpec, add_highlight, apply_aliases, export_subset,
    filter_region, filter_year, rank_rows, resolve_year,
};

// Statistics
pub use stats::{
    ALL_GROUPS, CorrelationSummary, INCOME_GROUPS, IndicatorSummary, Trendline, correlate,
    indicator_summary, ols, pearson,
};

//! Pipeline module - parameterized dashboard builders
//! One builder per dataset family; loading failures abort a build, while
//! per-metric failures are isolated as recorded faults.

mod brands;
mod historical;
mod state;

pub use brands::CategoryDashboard;
pub use historical::{HistoricalDashboard, IndicatorGrowth, YearGrowth};
pub use state::{MetricFamily, StateDashboard};

use crate::analysis::RankingError;
use crate::data::{LoaderError, NormalizerError, SchemaError};
use crate::metrics::DeriveError;
use polars::prelude::PolarsError;
use thiserror::Error;

/// Fixed dataset file names, resolved against the data directory.
pub const STATE_DATASET: &str = "State-Level_Consolidated_Dataset.csv";
pub const HISTORICAL_DATASET: &str = "Historical_Consolidated_Dataset.csv";
pub const CARD_BRAND_DATASET: &str = "Card_Brand_Analysis.csv";
pub const CATEGORY_DATASET: &str = "Category_Transaction_Totals.csv";

/// How many entries the ranked summaries keep at each end.
pub const RANKED_N: usize = 3;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Loader(#[from] LoaderError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Normalizer(#[from] NormalizerError),
    #[error(transparent)]
    Derive(#[from] DeriveError),
    #[error(transparent)]
    Ranking(#[from] RankingError),
    #[error(transparent)]
    Polars(#[from] PolarsError),
}

/// A metric that failed in isolation; sibling metrics keep working.
#[derive(Debug, Clone)]
pub struct MetricFault {
    pub metric: String,
    pub message: String,
}

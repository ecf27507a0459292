//! Category Dashboard Pipeline
//! Card-brand and spending-category aggregates: amounts, year-over-year
//! growth, and growth-ranked lists. Both datasets share this builder.

use crate::analysis::{RankEntry, Ranker};
use crate::data::schema::{self, category};
use crate::data::{DataLoader, Normalizer};
use crate::metrics::{growth, MetricDeriver};
use crate::pipeline::{PipelineError, RANKED_N};
use polars::prelude::*;
use std::path::Path;
use tracing::info;

/// Normalized category aggregates with growth summaries.
#[derive(Debug, Clone)]
pub struct CategoryDashboard {
    /// Table with the derived `Crecimiento` column appended.
    pub table: DataFrame,
    pub total_amount: f64,
    pub prior_total: f64,
    /// Overall growth; undefined when the prior total is zero.
    pub total_growth: Option<f64>,
    /// Rows with undefined growth never appear here.
    pub top_growth: Vec<RankEntry>,
    pub bottom_growth: Vec<RankEntry>,
}

impl CategoryDashboard {
    /// Card-brand analysis dataset.
    pub fn build_brands(path: &Path) -> Result<Self, PipelineError> {
        Self::build(path, category::BRAND_TABLE, category::BRAND_KEY)
    }

    /// Spending-category transaction totals.
    pub fn build_categories(path: &Path) -> Result<Self, PipelineError> {
        Self::build(path, category::CATEGORY_TABLE, category::CATEGORY_KEY)
    }

    fn build(path: &Path, table_name: &str, key_column: &str) -> Result<Self, PipelineError> {
        let raw = DataLoader::load_csv(path)?;
        schema::validate_columns(
            &raw,
            table_name,
            &[key_column, category::AMOUNT, category::PRIOR_AMOUNT],
        )?;

        // Amounts are often exported as thousands-grouped text.
        let coerced = DataLoader::coerce_locale_numeric(
            raw.as_ref().clone(),
            &[category::AMOUNT.to_string(), category::PRIOR_AMOUNT.to_string()],
        )?;
        let mut table = Normalizer::normalize(&coerced, table_name, key_column, &[])?;

        let growth_column = growth::growth_percentage(&table, table_name)?;
        table.with_column(growth_column)?;

        let amounts = MetricDeriver::numeric_values(&table, table_name, category::AMOUNT)?;
        let priors = MetricDeriver::numeric_values(&table, table_name, category::PRIOR_AMOUNT)?;
        let total_amount: f64 = amounts.iter().flatten().sum();
        let prior_total: f64 = priors.iter().flatten().sum();
        let total_growth = growth::total_growth(total_amount, prior_total);

        let top_growth =
            Ranker::top_n(&table, table_name, key_column, category::GROWTH, RANKED_N)?;
        let bottom_growth =
            Ranker::bottom_n(&table, table_name, key_column, category::GROWTH, RANKED_N)?;

        info!(
            table = table_name,
            rows = table.height(),
            "built category dashboard"
        );
        Ok(Self {
            table,
            total_amount,
            prior_total,
            total_growth,
            top_growth,
            bottom_growth,
        })
    }
}

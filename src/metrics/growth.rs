//! Year-over-year growth for category aggregates (card brands, spending
//! categories). Growth is only defined when the prior-year amount is present
//! and nonzero; everything else gets a null marker and falls out of ranked
//! output.

use crate::data::schema::category;
use crate::metrics::{DeriveError, MetricDeriver};
use polars::prelude::*;

/// `(current - prior) / prior * 100` per row.
pub fn growth_percentage(df: &DataFrame, table: &str) -> Result<Column, DeriveError> {
    let current = MetricDeriver::numeric_values(df, table, category::AMOUNT)?;
    let prior = MetricDeriver::numeric_values(df, table, category::PRIOR_AMOUNT)?;

    let values: Vec<Option<f64>> = current
        .iter()
        .zip(&prior)
        .map(|(current, prior)| match (current, prior) {
            (Some(c), Some(p)) if *p != 0.0 => Some((c - p) / p * 100.0),
            _ => None,
        })
        .collect();
    Ok(Column::new(category::GROWTH.into(), values))
}

/// Scalar year-over-year growth between two totals, same preconditions.
pub fn total_growth(current: f64, prior: f64) -> Option<f64> {
    if prior == 0.0 {
        return None;
    }
    Some((current - prior) / prior * 100.0)
}

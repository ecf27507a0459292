//! Ranking Module
//! Stable top-N / bottom-N of row keys by a derived metric.

use crate::metrics::{DeriveError, MetricDeriver};
use polars::prelude::*;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RankingError {
    #[error(transparent)]
    Derive(#[from] DeriveError),
    #[error(transparent)]
    Polars(#[from] PolarsError),
}

/// One ranked row: key plus its metric value.
#[derive(Debug, Clone, PartialEq)]
pub struct RankEntry {
    pub key: String,
    pub value: f64,
}

/// Ranks rows of a normalized table by a metric column. Rows with an
/// undefined metric are skipped; ties keep original row order.
pub struct Ranker;

impl Ranker {
    pub fn top_n(
        df: &DataFrame,
        table: &str,
        key_column: &str,
        metric_column: &str,
        n: usize,
    ) -> Result<Vec<RankEntry>, RankingError> {
        let mut entries = Self::entries(df, table, key_column, metric_column)?;
        entries.sort_by(|a, b| b.value.partial_cmp(&a.value).unwrap_or(std::cmp::Ordering::Equal));
        entries.truncate(n);
        Ok(entries)
    }

    pub fn bottom_n(
        df: &DataFrame,
        table: &str,
        key_column: &str,
        metric_column: &str,
        n: usize,
    ) -> Result<Vec<RankEntry>, RankingError> {
        let mut entries = Self::entries(df, table, key_column, metric_column)?;
        entries.sort_by(|a, b| a.value.partial_cmp(&b.value).unwrap_or(std::cmp::Ordering::Equal));
        entries.truncate(n);
        Ok(entries)
    }

    fn entries(
        df: &DataFrame,
        table: &str,
        key_column: &str,
        metric_column: &str,
    ) -> Result<Vec<RankEntry>, RankingError> {
        let key_str = df
            .column(key_column)
            .map_err(|_| DeriveError::SchemaMismatch {
                table: table.to_string(),
                column: key_column.to_string(),
            })?
            .cast(&DataType::String)?;
        let keys = key_str.str()?;
        let values = MetricDeriver::numeric_values(df, table, metric_column)?;

        Ok(keys
            .into_iter()
            .zip(values)
            .filter_map(|(key, value)| {
                Some(RankEntry {
                    key: key?.to_string(),
                    value: value?,
                })
            })
            .collect())
    }
}

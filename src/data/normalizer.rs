//! Data Normalizer Module
//! Promotes the identity column to a unique row key, strips sentinel rows,
//! and imputes configured columns with their median.

use polars::prelude::*;
use std::collections::HashSet;
use thiserror::Error;
use tracing::debug;

/// Placeholder key used by CNBV exports for unclassified rows.
pub const SENTINEL_KEY: &str = "Sin identificar";

#[derive(Error, Debug)]
pub enum NormalizerError {
    #[error("schema mismatch: column '{column}' missing from {table}")]
    SchemaMismatch { table: String, column: String },
    #[error("null key in column '{0}'")]
    NullKey(String),
    #[error("duplicate key '{key}' in column '{column}'")]
    DuplicateKey { column: String, key: String },
    #[error(transparent)]
    Polars(#[from] PolarsError),
}

/// Handles row-key promotion, sentinel filtering and median imputation.
pub struct Normalizer;

impl Normalizer {
    /// Full normalization pass: sentinel rows removed first, key uniqueness
    /// enforced, then each configured column imputed. Running this twice
    /// yields the same table as running it once.
    pub fn normalize(
        df: &DataFrame,
        table: &str,
        key_column: &str,
        impute_columns: &[&str],
    ) -> Result<DataFrame, NormalizerError> {
        let mut df = Self::drop_sentinel_rows(df, table, key_column)?;
        Self::check_keys(&df, key_column)?;
        for column in impute_columns {
            df = Self::impute_median(df, table, column)?;
        }
        Ok(df)
    }

    /// Remove rows whose key is the sentinel value, whatever its casing or
    /// surrounding whitespace in the raw file.
    pub fn drop_sentinel_rows(
        df: &DataFrame,
        table: &str,
        key_column: &str,
    ) -> Result<DataFrame, NormalizerError> {
        let key = df
            .column(key_column)
            .map_err(|_| NormalizerError::SchemaMismatch {
                table: table.to_string(),
                column: key_column.to_string(),
            })?;
        let key_str = key.cast(&DataType::String)?;
        let key_ca = key_str.str()?;

        let mask: Vec<bool> = key_ca
            .into_iter()
            .map(|opt| match opt {
                Some(value) => !value.trim().eq_ignore_ascii_case(SENTINEL_KEY),
                None => true,
            })
            .collect();
        let dropped = mask.iter().filter(|keep| !*keep).count();
        if dropped > 0 {
            debug!(table, dropped, "removed sentinel rows");
        }

        let mask = BooleanChunked::new("sentinel_mask".into(), mask);
        Ok(df.filter(&mask)?)
    }

    /// Keys must be non-null and unique once sentinel rows are gone.
    fn check_keys(df: &DataFrame, key_column: &str) -> Result<(), NormalizerError> {
        let key_str = df.column(key_column)?.cast(&DataType::String)?;
        let key_ca = key_str.str()?;

        let mut seen = HashSet::new();
        for opt in key_ca.into_iter() {
            let key = opt.ok_or_else(|| NormalizerError::NullKey(key_column.to_string()))?;
            if !seen.insert(key.trim().to_string()) {
                return Err(NormalizerError::DuplicateKey {
                    column: key_column.to_string(),
                    key: key.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Replace missing values in `column` with the median of its non-missing
    /// values. NaN counts as missing.
    pub fn impute_median(
        mut df: DataFrame,
        table: &str,
        column: &str,
    ) -> Result<DataFrame, NormalizerError> {
        let col = df
            .column(column)
            .map_err(|_| NormalizerError::SchemaMismatch {
                table: table.to_string(),
                column: column.to_string(),
            })?;
        let cast = col.cast(&DataType::Float64)?;
        let ca = cast.f64()?;

        let present: Vec<f64> = ca.into_iter().flatten().filter(|v| !v.is_nan()).collect();
        let Some(median) = Self::median(&present) else {
            // Nothing to impute from; leave the column untouched.
            return Ok(df);
        };

        if present.len() == ca.len() {
            return Ok(df);
        }

        let filled: Vec<Option<f64>> = ca
            .into_iter()
            .map(|opt| match opt {
                Some(v) if !v.is_nan() => Some(v),
                _ => Some(median),
            })
            .collect();
        df.with_column(Column::new(column.into(), filled))?;
        Ok(df)
    }

    /// Median of a sample: midpoint of the two central elements for even
    /// counts.
    pub fn median(values: &[f64]) -> Option<f64> {
        let n = values.len();
        if n == 0 {
            return None;
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        Some(if n % 2 == 0 {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        } else {
            sorted[n / 2]
        })
    }
}

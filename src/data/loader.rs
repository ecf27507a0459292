//! CSV Data Loader Module
//! Reads CNBV spreadsheet exports into Polars tables: trims headers, parses
//! locale-formatted numeric text, and memoizes each file behind an
//! initialize-once cache.

use once_cell::sync::{Lazy, OnceCell};
use polars::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("data unavailable: {path}: {reason}")]
    DataUnavailable { path: PathBuf, reason: String },
}

impl LoaderError {
    fn unavailable(path: &Path, reason: impl Into<String>) -> Self {
        Self::DataUnavailable {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }
}

/// One cell per distinct path; the cell is populated at most once and the
/// table is never touched again after that.
static TABLE_CACHE: Lazy<Mutex<HashMap<PathBuf, Arc<OnceCell<Arc<DataFrame>>>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Handles CSV file loading with Polars.
pub struct DataLoader;

impl DataLoader {
    /// Load a CSV file, memoized by path. Repeated calls with the same path
    /// return the same table without re-reading disk.
    pub fn load_csv(file_path: &Path) -> Result<Arc<DataFrame>, LoaderError> {
        let cell = {
            let mut cache = TABLE_CACHE
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            cache.entry(file_path.to_path_buf()).or_default().clone()
        };

        cell.get_or_try_init(|| Self::read_csv(file_path).map(Arc::new))
            .cloned()
    }

    fn read_csv(file_path: &Path) -> Result<DataFrame, LoaderError> {
        if !file_path.is_file() {
            return Err(LoaderError::unavailable(file_path, "file not found"));
        }

        let df = LazyCsvReader::new(file_path)
            .with_infer_schema_length(Some(10000))
            .with_ignore_errors(true)
            .finish()
            .and_then(|lf| lf.collect())
            .map_err(|e| LoaderError::unavailable(file_path, e.to_string()))?;

        if df.height() == 0 {
            return Err(LoaderError::unavailable(file_path, "no parseable rows"));
        }

        let mut df = Self::trim_headers(df)
            .map_err(|e| LoaderError::unavailable(file_path, e.to_string()))?;

        // Percentage-like columns arrive as text with decimal commas.
        let percentage_columns: Vec<String> = df
            .get_column_names()
            .iter()
            .filter(|name| name.starts_with('%'))
            .map(|name| name.to_string())
            .collect();
        df = Self::coerce_locale_numeric(df, &percentage_columns)
            .map_err(|e| LoaderError::unavailable(file_path, e.to_string()))?;

        info!(
            path = %file_path.display(),
            rows = df.height(),
            columns = df.width(),
            "loaded table"
        );
        Ok(df)
    }

    /// Strip surrounding whitespace from every column header.
    fn trim_headers(mut df: DataFrame) -> PolarsResult<DataFrame> {
        let renames: Vec<(String, String)> = df
            .get_column_names()
            .iter()
            .filter(|name| name.as_str() != name.trim())
            .map(|name| (name.to_string(), name.trim().to_string()))
            .collect();

        for (old, new) in renames {
            df.rename(&old, new.into())?;
        }
        Ok(df)
    }

    /// Coerce the named columns to `Float64`, parsing locale-formatted text
    /// (decimal commas, thousands separators) where the column is textual.
    /// Columns that are already numeric pass through a plain cast.
    pub fn coerce_locale_numeric(
        mut df: DataFrame,
        columns: &[String],
    ) -> PolarsResult<DataFrame> {
        for name in columns {
            let column = df.column(name.as_str())?;

            let parsed = if column.dtype() == &DataType::String {
                let ca = column.str()?;
                let values: Vec<Option<f64>> = ca
                    .into_iter()
                    .map(|opt| opt.and_then(parse_locale_number))
                    .collect();
                Column::new(name.as_str().into(), values)
            } else {
                column.cast(&DataType::Float64)?
            };

            df.with_column(parsed)?;
        }
        Ok(df)
    }
}

/// Parse a number rendered as text by a spreadsheet locale.
///
/// `"12,5"` is a decimal comma, `"1,234,567"` a thousands-grouped integer,
/// `"1.234,56"` the European mix of both.
pub fn parse_locale_number(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    let normalized = if s.contains(',') && s.contains('.') {
        // "1.234,56": periods group thousands, the comma is the decimal mark
        s.replace('.', "").replace(',', ".")
    } else if is_thousands_grouped(s) {
        s.replace(',', "")
    } else {
        s.replace(',', ".")
    };

    normalized.parse::<f64>().ok()
}

/// "1,234,567" style: 1-3 leading digits, then comma-separated groups of 3.
fn is_thousands_grouped(s: &str) -> bool {
    let body = s.strip_prefix('-').unwrap_or(s);
    let groups: Vec<&str> = body.split(',').collect();
    groups.len() >= 2
        && !groups[0].is_empty()
        && groups[0].len() <= 3
        && groups[0].chars().all(|c| c.is_ascii_digit())
        && groups[1..]
            .iter()
            .all(|g| g.len() == 3 && g.chars().all(|c| c.is_ascii_digit()))
}

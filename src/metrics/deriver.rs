//! Metric Deriver Module
//! Pure per-row derivations over the normalized state table. Undefined
//! results are nulls in the output column, never NaN.

use crate::data::schema::{derived, state};
use polars::prelude::*;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeriveError {
    #[error("schema mismatch: column '{column}' missing from {table}")]
    SchemaMismatch { table: String, column: String },
    #[error(transparent)]
    Polars(#[from] PolarsError),
}

/// Fixed denominator inherited from the source dashboard: mobile penetration
/// divides by 10,000 rather than by each state's adult population.
pub const MOBILE_PENETRATION_DENOMINATOR: f64 = 10_000.0;

/// Scale factor folding account/credit count sums into the composite index.
const INDEX_COUNT_SCALE: f64 = 1_000.0;

/// Computes derived metric columns from a normalized table.
pub struct MetricDeriver;

impl MetricDeriver {
    /// `Poblacion_adulta / Poblacion * 100`; undefined where the total
    /// population is missing or zero.
    pub fn adult_population_share(df: &DataFrame) -> Result<Column, DeriveError> {
        let adults = Self::numeric_values(df, state::TABLE, state::ADULT_POPULATION)?;
        let totals = Self::numeric_values(df, state::TABLE, state::POPULATION)?;

        let values: Vec<Option<f64>> = adults
            .iter()
            .zip(&totals)
            .map(|(adult, total)| match (adult, total) {
                (Some(a), Some(t)) if *t > 0.0 => Some(a / t * 100.0),
                _ => None,
            })
            .collect();
        Ok(Column::new(derived::ADULT_POPULATION_SHARE.into(), values))
    }

    /// `Contratos_celular_10mil_adultos / 10000`, the fixed-denominator rate
    /// kept for output compatibility.
    pub fn mobile_banking_penetration(df: &DataFrame) -> Result<Column, DeriveError> {
        let contracts = Self::numeric_values(df, state::TABLE, state::MOBILE_CONTRACTS)?;

        let values: Vec<Option<f64>> = contracts
            .iter()
            .map(|opt| opt.map(|v| v / MOBILE_PENETRATION_DENOMINATOR))
            .collect();
        Ok(Column::new(derived::MOBILE_BANKING_PENETRATION.into(), values))
    }

    /// Sum of the four institution-type branch rates. A missing cell counts
    /// as zero; a missing column is a schema fault.
    pub fn total_branches(df: &DataFrame) -> Result<Column, DeriveError> {
        let mut totals = vec![0.0_f64; df.height()];
        for column in state::INSTITUTION_COLUMNS {
            let values = Self::numeric_values(df, state::TABLE, column)?;
            for (total, value) in totals.iter_mut().zip(values) {
                *total += value.unwrap_or(0.0);
            }
        }
        Ok(Column::new(derived::TOTAL_BRANCHES.into(), totals))
    }

    /// Account-tier shares of each row's account total, in percent.
    pub fn account_mix_percentage(df: &DataFrame) -> Result<DataFrame, DeriveError> {
        Self::mix_percentage(df, &state::ACCOUNT_COLUMNS)
    }

    /// Credit-product shares of each row's credit total, in percent.
    pub fn credit_mix_percentage(df: &DataFrame) -> Result<DataFrame, DeriveError> {
        Self::mix_percentage(df, &state::CREDIT_COLUMNS)
    }

    /// Percentage-of-total distribution across `columns`, keyed by state.
    /// Rows whose sum is zero get null markers for every share so a zero
    /// denominator never turns into NaN downstream.
    fn mix_percentage(df: &DataFrame, columns: &[&str]) -> Result<DataFrame, DeriveError> {
        let key = df
            .column(state::KEY)
            .map_err(|_| DeriveError::SchemaMismatch {
                table: state::TABLE.to_string(),
                column: state::KEY.to_string(),
            })?
            .clone();

        let per_column: Vec<Vec<Option<f64>>> = columns
            .iter()
            .map(|column| Self::numeric_values(df, state::TABLE, *column))
            .collect::<Result<_, _>>()?;

        let row_sums: Vec<f64> = (0..df.height())
            .map(|row| {
                per_column
                    .iter()
                    .map(|values| values[row].unwrap_or(0.0))
                    .sum()
            })
            .collect();

        let mut out = vec![key];
        for (column, values) in columns.iter().zip(&per_column) {
            let shares: Vec<Option<f64>> = values
                .iter()
                .zip(&row_sums)
                .map(|(value, sum)| match value {
                    Some(v) if *sum > 0.0 => Some(v / sum * 100.0),
                    _ => None,
                })
                .collect();
            out.push(Column::new(format!("%_{column}").into(), shares));
        }
        Ok(DataFrame::new(out)?)
    }

    /// Composite Financial Inclusion Index: unweighted blend of the three
    /// infrastructure rates with the scaled account and credit count sums.
    /// Undefined where any infrastructure rate is missing.
    pub fn financial_inclusion_index(df: &DataFrame) -> Result<Column, DeriveError> {
        let branches = Self::numeric_values(df, state::TABLE, state::COMMERCIAL_BRANCHES)?;
        let atms = Self::numeric_values(df, state::TABLE, state::ATMS)?;
        let agents = Self::numeric_values(df, state::TABLE, state::AGENTS)?;
        let account_sums = Self::row_sums(df, &state::ACCOUNT_COLUMNS)?;
        let credit_sums = Self::row_sums(df, &state::CREDIT_COLUMNS)?;

        let values: Vec<Option<f64>> = (0..df.height())
            .map(|row| match (branches[row], atms[row], agents[row]) {
                (Some(b), Some(atm), Some(agent)) => Some(
                    (b + atm
                        + agent
                        + account_sums[row] / INDEX_COUNT_SCALE
                        + credit_sums[row] / INDEX_COUNT_SCALE)
                        / 5.0,
                ),
                _ => None,
            })
            .collect();
        Ok(Column::new(derived::FI_INDEX.into(), values))
    }

    /// Row-wise sum across `columns`, missing cells counting as zero.
    fn row_sums(df: &DataFrame, columns: &[&str]) -> Result<Vec<f64>, DeriveError> {
        let per_column: Vec<Vec<Option<f64>>> = columns
            .iter()
            .map(|column| Self::numeric_values(df, state::TABLE, *column))
            .collect::<Result<_, _>>()?;

        Ok((0..df.height())
            .map(|row| {
                per_column
                    .iter()
                    .map(|values| values[row].unwrap_or(0.0))
                    .sum()
            })
            .collect())
    }

    /// Fetch a column as `Option<f64>` per row, with NaN treated as missing.
    pub fn numeric_values(
        df: &DataFrame,
        table: &str,
        column: &str,
    ) -> Result<Vec<Option<f64>>, DeriveError> {
        let col = df.column(column).map_err(|_| DeriveError::SchemaMismatch {
            table: table.to_string(),
            column: column.to_string(),
        })?;
        let cast = col.cast(&DataType::Float64)?;
        let ca = cast.f64()?;
        Ok(ca.into_iter().map(|v| v.filter(|x| !x.is_nan())).collect())
    }
}

//! Historical Dashboard Pipeline
//! Year/quarter series for banking and EACP entities, reduced to a
//! one-row-per-year cadence with year-over-year growth.

use crate::data::schema::{self, historical};
use crate::data::DataLoader;
use crate::metrics::{growth, MetricDeriver};
use crate::pipeline::PipelineError;
use polars::prelude::*;
use std::path::Path;
use tracing::info;

/// One retained year of an indicator series.
#[derive(Debug, Clone)]
pub struct YearGrowth {
    pub year: i64,
    pub total: f64,
    /// Growth vs the previous retained year; undefined for the first year
    /// or a zero prior.
    pub growth: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct IndicatorGrowth {
    pub indicator: String,
    pub series: Vec<YearGrowth>,
}

/// Cadence-filtered historical table plus per-indicator growth series.
#[derive(Debug, Clone)]
pub struct HistoricalDashboard {
    pub table: DataFrame,
    pub yoy: Vec<IndicatorGrowth>,
}

impl HistoricalDashboard {
    pub fn build(path: &Path) -> Result<Self, PipelineError> {
        let raw = DataLoader::load_csv(path)?;
        schema::validate_columns(&raw, historical::TABLE, &historical::required_columns())?;

        let table = Self::filter_cadence(&raw)?;
        let yoy = Self::year_over_year(&table)?;

        info!(
            years = table.height(),
            indicators = yoy.len(),
            "built historical dashboard"
        );
        Ok(Self { table, yoy })
    }

    /// Keep one quarter per year: the second quarter for the latest year in
    /// the data, the fourth quarter for all earlier years. Sorted by year.
    pub fn filter_cadence(df: &DataFrame) -> Result<DataFrame, PipelineError> {
        let years_col = df.column(historical::YEAR)?.cast(&DataType::Int64)?;
        let years = years_col.i64()?;
        let quarters_col = df.column(historical::QUARTER)?.cast(&DataType::Int64)?;
        let quarters = quarters_col.i64()?;

        let Some(latest) = years.into_iter().flatten().max() else {
            return Ok(df.clear());
        };

        let mask: Vec<bool> = years
            .into_iter()
            .zip(quarters)
            .map(|(year, quarter)| match (year, quarter) {
                (Some(y), Some(q)) if y == latest => q == 2,
                (Some(_), Some(q)) => q == 4,
                _ => false,
            })
            .collect();

        let filtered = df.filter(&BooleanChunked::new("cadence".into(), mask))?;
        Ok(filtered.sort([historical::YEAR], SortMultipleOptions::default())?)
    }

    /// Growth of each indicator between consecutive retained years.
    fn year_over_year(df: &DataFrame) -> Result<Vec<IndicatorGrowth>, PipelineError> {
        let years_col = df.column(historical::YEAR)?.cast(&DataType::Int64)?;
        let years: Vec<Option<i64>> = years_col.i64()?.into_iter().collect();

        let mut out = Vec::with_capacity(historical::INDICATOR_COLUMNS.len());
        for indicator in historical::INDICATOR_COLUMNS {
            let values = MetricDeriver::numeric_values(df, historical::TABLE, indicator)?;

            let mut series = Vec::new();
            let mut prior: Option<f64> = None;
            for (year, value) in years.iter().zip(&values) {
                let (Some(year), Some(value)) = (year, value) else {
                    continue;
                };
                series.push(YearGrowth {
                    year: *year,
                    total: *value,
                    growth: prior.and_then(|p| growth::total_growth(*value, p)),
                });
                prior = Some(*value);
            }
            out.push(IndicatorGrowth {
                indicator: indicator.to_string(),
                series,
            });
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history() -> DataFrame {
        let mut columns = vec![
            Column::new(
                historical::YEAR.into(),
                vec![2022_i64, 2022, 2023, 2023, 2024, 2024],
            ),
            Column::new(historical::QUARTER.into(), vec![2_i64, 4, 2, 4, 1, 2]),
        ];
        for indicator in historical::INDICATOR_COLUMNS {
            columns.push(Column::new(
                indicator.into(),
                vec![1.0_f64, 100.0, 2.0, 110.0, 3.0, 121.0],
            ));
        }
        DataFrame::new(columns).unwrap()
    }

    #[test]
    fn cadence_keeps_q4_before_latest_year_and_q2_within_it() {
        let table = HistoricalDashboard::filter_cadence(&history()).unwrap();
        assert_eq!(table.height(), 3);

        let years: Vec<i64> = table
            .column(historical::YEAR)
            .unwrap()
            .i64()
            .unwrap()
            .into_iter()
            .flatten()
            .collect();
        let quarters: Vec<i64> = table
            .column(historical::QUARTER)
            .unwrap()
            .i64()
            .unwrap()
            .into_iter()
            .flatten()
            .collect();
        assert_eq!(years, vec![2022, 2023, 2024]);
        assert_eq!(quarters, vec![4, 4, 2]);
    }

    #[test]
    fn growth_runs_between_retained_years() {
        let table = HistoricalDashboard::filter_cadence(&history()).unwrap();
        let yoy = HistoricalDashboard::year_over_year(&table).unwrap();

        let first = &yoy[0];
        assert_eq!(first.series.len(), 3);
        assert_eq!(first.series[0].growth, None);
        let growth_2023 = first.series[1].growth.unwrap();
        assert!((growth_2023 - 10.0).abs() < 1e-9);
        let growth_2024 = first.series[2].growth.unwrap();
        assert!((growth_2024 - 10.0).abs() < 1e-9);
    }
}

//! State-Level Dashboard Pipeline
//! Loads the consolidated state dataset, normalizes it, derives every metric
//! family, and packages rankings and correlations for the presentation
//! layer.

use crate::analysis::{Correlator, IndicatorCorrelation, RankEntry, Ranker};
use crate::config::{DashboardConfig, IndicatorGroup};
use crate::data::schema::{self, derived, state};
use crate::data::{DataLoader, Normalizer};
use crate::metrics::{DeriveError, MetricDeriver};
use crate::pipeline::{MetricFault, PipelineError, RANKED_N};
use polars::prelude::*;
use std::path::Path;
use tracing::{info, warn};

/// A labeled metric-family table: `Estado` plus one column per indicator,
/// renamed to its display label.
#[derive(Debug, Clone)]
pub struct MetricFamily {
    pub key: String,
    pub title: String,
    pub table: DataFrame,
}

/// Everything the presentation layer needs for the state-level dashboard.
#[derive(Debug, Clone)]
pub struct StateDashboard {
    /// Normalized table with the derived metric columns appended.
    pub table: DataFrame,
    /// Labeled absolute-value tables, one per configured indicator group.
    pub families: Vec<MetricFamily>,
    /// Account-tier percentage-of-total distribution.
    pub account_mix: Option<DataFrame>,
    /// Credit-product percentage-of-total distribution.
    pub credit_mix: Option<DataFrame>,
    /// Indicator-vs-index correlations.
    pub correlations: Vec<IndicatorCorrelation>,
    pub top_inclusion: Vec<RankEntry>,
    pub bottom_inclusion: Vec<RankEntry>,
    /// Metrics that failed in isolation.
    pub faults: Vec<MetricFault>,
}

impl StateDashboard {
    pub fn build(path: &Path, config: &DashboardConfig) -> Result<Self, PipelineError> {
        let raw = DataLoader::load_csv(path)?;
        schema::validate_columns(&raw, state::TABLE, &state::required_columns())?;

        let normalized =
            Normalizer::normalize(&raw, state::TABLE, state::KEY, &state::IMPUTED_COLUMNS)?;

        let mut faults = Vec::new();
        let mut table = normalized.clone();

        let derivations: [(&str, fn(&DataFrame) -> Result<Column, DeriveError>); 4] = [
            (
                derived::ADULT_POPULATION_SHARE,
                MetricDeriver::adult_population_share,
            ),
            (
                derived::MOBILE_BANKING_PENETRATION,
                MetricDeriver::mobile_banking_penetration,
            ),
            (derived::TOTAL_BRANCHES, MetricDeriver::total_branches),
            (derived::FI_INDEX, MetricDeriver::financial_inclusion_index),
        ];
        for (metric, derive) in derivations {
            match derive(&normalized) {
                Ok(column) => {
                    table.with_column(column)?;
                }
                Err(e) => {
                    warn!(metric, error = %e, "metric derivation failed");
                    faults.push(MetricFault {
                        metric: metric.to_string(),
                        message: e.to_string(),
                    });
                }
            }
        }

        let account_mix =
            Self::isolated(MetricDeriver::account_mix_percentage(&normalized), "account_mix", &mut faults);
        let credit_mix =
            Self::isolated(MetricDeriver::credit_mix_percentage(&normalized), "credit_mix", &mut faults);

        let families = config
            .groups
            .iter()
            .filter_map(|group| Self::family_table(&table, group, &mut faults))
            .collect::<Vec<_>>();

        let has_index = table.column(derived::FI_INDEX).is_ok();
        let correlations = if has_index {
            let indicators: Vec<(String, String)> = config
                .correlation_indicators
                .iter()
                .map(|i| (i.column.clone(), i.label.clone()))
                .collect();
            let results = Correlator::correlate_indicators(
                &table,
                state::TABLE,
                &indicators,
                derived::FI_INDEX,
            )?;
            for result in &results {
                if let Some(message) = &result.fault {
                    warn!(indicator = %result.indicator, error = %message, "correlation skipped");
                    faults.push(MetricFault {
                        metric: result.indicator.clone(),
                        message: message.clone(),
                    });
                }
            }
            results
        } else {
            Vec::new()
        };

        let (top_inclusion, bottom_inclusion) = if has_index {
            (
                Ranker::top_n(&table, state::TABLE, state::KEY, derived::FI_INDEX, RANKED_N)?,
                Ranker::bottom_n(&table, state::TABLE, state::KEY, derived::FI_INDEX, RANKED_N)?,
            )
        } else {
            (Vec::new(), Vec::new())
        };

        info!(
            rows = table.height(),
            families = families.len(),
            faults = faults.len(),
            "built state dashboard"
        );

        Ok(Self {
            table,
            families,
            account_mix,
            credit_mix,
            correlations,
            top_inclusion,
            bottom_inclusion,
            faults,
        })
    }

    fn isolated(
        result: Result<DataFrame, DeriveError>,
        metric: &str,
        faults: &mut Vec<MetricFault>,
    ) -> Option<DataFrame> {
        match result {
            Ok(df) => Some(df),
            Err(e) => {
                warn!(metric, error = %e, "metric derivation failed");
                faults.push(MetricFault {
                    metric: metric.to_string(),
                    message: e.to_string(),
                });
                None
            }
        }
    }

    /// `Estado` plus the group's columns renamed to display labels. A column
    /// missing from the table is recorded as a fault and skipped.
    fn family_table(
        table: &DataFrame,
        group: &IndicatorGroup,
        faults: &mut Vec<MetricFault>,
    ) -> Option<MetricFamily> {
        let mut columns = vec![table.column(state::KEY).ok()?.clone()];
        for indicator in &group.indicators {
            match table.column(&indicator.column) {
                Ok(column) => {
                    let mut column = column.clone();
                    column.rename(indicator.label.as_str().into());
                    columns.push(column);
                }
                Err(_) => {
                    warn!(column = %indicator.column, group = %group.key, "family column missing");
                    faults.push(MetricFault {
                        metric: indicator.column.clone(),
                        message: format!(
                            "schema mismatch: column '{}' missing from {}",
                            indicator.column,
                            state::TABLE
                        ),
                    });
                }
            }
        }

        if columns.len() == 1 {
            return None;
        }
        DataFrame::new(columns).ok().map(|table| MetricFamily {
            key: group.key.clone(),
            title: group.title.clone(),
            table,
        })
    }
}

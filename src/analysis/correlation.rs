//! Correlation Module
//! Pearson correlation between raw indicators and the composite index, with
//! a two-tailed significance test.

use crate::metrics::{DeriveError, MetricDeriver};
use polars::prelude::*;
use rayon::prelude::*;
use statrs::distribution::{ContinuousCDF, StudentsT};

/// Significance threshold for the correlation t-test
pub const SIGNIFICANCE_THRESHOLD: f64 = 0.05;

/// A defined Pearson correlation over n paired observations.
#[derive(Debug, Clone)]
pub struct Correlation {
    pub r: f64,
    pub n: usize,
    pub p_value: Option<f64>,
    pub is_significant: bool,
}

impl Correlation {
    /// Value rounded to 2 decimal places for display.
    pub fn display_r(&self) -> f64 {
        (self.r * 100.0).round() / 100.0
    }
}

/// Correlation of one configured indicator against the index column.
/// `correlation` is `None` when the metric is undefined for this data;
/// `fault` records an isolated per-indicator schema failure.
#[derive(Debug, Clone)]
pub struct IndicatorCorrelation {
    pub indicator: String,
    pub label: String,
    pub correlation: Option<Correlation>,
    pub fault: Option<String>,
}

/// Computes Pearson correlations over pairwise non-null observations.
pub struct Correlator;

impl Correlator {
    /// Pearson r over rows where both series are present. Undefined (`None`)
    /// when fewer than 2 paired observations exist or either variance is
    /// zero.
    pub fn pearson(xs: &[Option<f64>], ys: &[Option<f64>]) -> Option<Correlation> {
        let pairs: Vec<(f64, f64)> = xs
            .iter()
            .zip(ys)
            .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
            .collect();

        let n = pairs.len();
        if n < 2 {
            return None;
        }

        let nf = n as f64;
        let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / nf;
        let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / nf;

        let mut cov = 0.0;
        let mut var_x = 0.0;
        let mut var_y = 0.0;
        for (x, y) in &pairs {
            let dx = x - mean_x;
            let dy = y - mean_y;
            cov += dx * dy;
            var_x += dx * dx;
            var_y += dy * dy;
        }

        if var_x == 0.0 || var_y == 0.0 {
            return None;
        }

        let r = cov / (var_x.sqrt() * var_y.sqrt());
        let (p_value, is_significant) = Self::significance(r, n);

        Some(Correlation {
            r,
            n,
            p_value,
            is_significant,
        })
    }

    /// Two-tailed p-value of r under Student's t with n-2 degrees of
    /// freedom.
    fn significance(r: f64, n: usize) -> (Option<f64>, bool) {
        if n < 3 {
            return (None, false);
        }

        let df = (n - 2) as f64;
        let denom = 1.0 - r * r;
        if denom <= f64::EPSILON {
            // perfectly collinear series
            return (Some(0.0), true);
        }

        let t = r * (df / denom).sqrt();
        match StudentsT::new(0.0, 1.0, df) {
            Ok(dist) => {
                let p_value = 2.0 * (1.0 - dist.cdf(t.abs()));
                (Some(p_value), p_value <= SIGNIFICANCE_THRESHOLD)
            }
            Err(_) => (None, false),
        }
    }

    /// Pearson correlation between two named columns.
    pub fn pearson_columns(
        df: &DataFrame,
        table: &str,
        x_column: &str,
        y_column: &str,
    ) -> Result<Option<Correlation>, DeriveError> {
        let xs = MetricDeriver::numeric_values(df, table, x_column)?;
        let ys = MetricDeriver::numeric_values(df, table, y_column)?;
        Ok(Self::pearson(&xs, &ys))
    }

    /// Correlate every configured indicator against `index_column` in
    /// parallel. A missing indicator column becomes an isolated fault entry
    /// instead of aborting its siblings.
    pub fn correlate_indicators(
        df: &DataFrame,
        table: &str,
        indicators: &[(String, String)],
        index_column: &str,
    ) -> Result<Vec<IndicatorCorrelation>, DeriveError> {
        let index_values = MetricDeriver::numeric_values(df, table, index_column)?;

        Ok(indicators
            .par_iter()
            .map(|(column, label)| {
                match MetricDeriver::numeric_values(df, table, column) {
                    Ok(values) => IndicatorCorrelation {
                        indicator: column.clone(),
                        label: label.clone(),
                        correlation: Self::pearson(&values, &index_values),
                        fault: None,
                    },
                    Err(e) => IndicatorCorrelation {
                        indicator: column.clone(),
                        label: label.clone(),
                        correlation: None,
                        fault: Some(e.to_string()),
                    },
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opt(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().copied().map(Some).collect()
    }

    #[test]
    fn identical_series_correlate_perfectly() {
        let xs = opt(&[1.0, 2.0, 3.0, 4.0]);
        let corr = Correlator::pearson(&xs, &xs).unwrap();
        assert!((corr.r - 1.0).abs() < 1e-12);
        assert_eq!(corr.display_r(), 1.0);
        assert!(corr.is_significant);
    }

    #[test]
    fn correlation_is_symmetric() {
        let xs = opt(&[1.0, 2.0, 3.0, 5.0, 8.0]);
        let ys = opt(&[2.0, 1.0, 4.0, 4.0, 9.0]);
        let ab = Correlator::pearson(&xs, &ys).unwrap();
        let ba = Correlator::pearson(&ys, &xs).unwrap();
        assert_eq!(ab.r, ba.r);
        assert!(ab.r > -1.0 - 1e-12 && ab.r < 1.0 + 1e-12);
    }

    #[test]
    fn undefined_below_two_observations() {
        let xs = vec![Some(1.0), None, Some(3.0)];
        let ys = vec![Some(2.0), Some(5.0), None];
        // only one complete pair
        assert!(Correlator::pearson(&xs, &ys).is_none());
    }

    #[test]
    fn undefined_for_zero_variance() {
        let xs = opt(&[4.0, 4.0, 4.0]);
        let ys = opt(&[1.0, 2.0, 3.0]);
        assert!(Correlator::pearson(&xs, &ys).is_none());
    }

    #[test]
    fn anticorrelated_series_round_to_minus_one() {
        let xs = opt(&[1.0, 2.0, 3.0]);
        let ys = opt(&[3.0, 2.0, 1.0]);
        let corr = Correlator::pearson(&xs, &ys).unwrap();
        assert_eq!(corr.display_r(), -1.0);
    }

    #[test]
    fn missing_indicator_column_is_an_isolated_fault() {
        let df = DataFrame::new(vec![
            Column::new("FI_Index".into(), vec![1.0_f64, 2.0, 3.0]),
            Column::new("Cajeros".into(), vec![2.0_f64, 4.0, 6.0]),
        ])
        .unwrap();

        let indicators = vec![
            ("Cajeros".to_string(), "ATMs".to_string()),
            ("TPV".to_string(), "POS".to_string()),
        ];
        let results =
            Correlator::correlate_indicators(&df, "t", &indicators, "FI_Index").unwrap();

        assert_eq!(results.len(), 2);
        let atm = results.iter().find(|r| r.indicator == "Cajeros").unwrap();
        assert!(atm.fault.is_none());
        assert!((atm.correlation.as_ref().unwrap().r - 1.0).abs() < 1e-12);

        let pos = results.iter().find(|r| r.indicator == "TPV").unwrap();
        assert!(pos.fault.is_some());
        assert!(pos.correlation.is_none());
    }
}

//! Analysis module - ranking and correlation

mod correlation;
mod ranking;

pub use correlation::{
    Correlation, Correlator, IndicatorCorrelation, SIGNIFICANCE_THRESHOLD,
};
pub use ranking::{RankEntry, Ranker, RankingError};

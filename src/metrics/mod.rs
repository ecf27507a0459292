//! Metrics module - derived indicators and growth rates

mod deriver;
pub mod growth;

pub use deriver::{DeriveError, MetricDeriver, MOBILE_PENETRATION_DENOMINATOR};

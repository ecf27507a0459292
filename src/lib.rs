//! finclusion - Financial inclusion analytics pipeline
//!
//! Turns raw CNBV spreadsheet exports into normalized tables, derived
//! metrics, a composite Financial Inclusion Index, correlations and
//! rankings. Chart rendering is left to the consumer.

pub mod analysis;
pub mod config;
pub mod data;
pub mod metrics;
pub mod pipeline;

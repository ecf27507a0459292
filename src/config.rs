//! Dashboard Configuration
//! Declarative indicator groups: raw column id, display label, selection key
//! and color. Changing this mapping never changes derivation semantics.

use crate::data::schema::state;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),
}

/// One selectable indicator: raw column, display label, chart color.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Indicator {
    pub column: String,
    pub label: String,
    pub color: String,
}

impl Indicator {
    fn new(column: &str, label: &str, color: &str) -> Self {
        Self {
            column: column.to_string(),
            label: label.to_string(),
            color: color.to_string(),
        }
    }
}

/// A family of indicators shown together (stacked or selectable).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorGroup {
    pub key: String,
    pub title: String,
    pub indicators: Vec<Indicator>,
}

/// Full per-dashboard configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    pub groups: Vec<IndicatorGroup>,
    /// Indicators correlated against the composite index.
    pub correlation_indicators: Vec<Indicator>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self::builtin()
    }
}

impl DashboardConfig {
    /// Compiled-in defaults mirroring the published dashboards.
    pub fn builtin() -> Self {
        let groups = vec![
            IndicatorGroup {
                key: "infrastructure".to_string(),
                title: "Banking infrastructure availability".to_string(),
                indicators: vec![
                    Indicator::new(
                        state::COMMERCIAL_BRANCHES,
                        "Commercial bank branches",
                        "#1f77b4",
                    ),
                    Indicator::new(state::ATMS, "ATMs", "#2ca02c"),
                    Indicator::new(state::AGENTS, "Banking agents (corresponsales)", "#d62728"),
                ],
            },
            IndicatorGroup {
                key: "accounts".to_string(),
                title: "Account ownership by type".to_string(),
                indicators: vec![
                    Indicator::new(state::ACCOUNT_COLUMNS[0], "Cuentas nivel 1", "#1f77b4"),
                    Indicator::new(state::ACCOUNT_COLUMNS[1], "Cuentas nivel 2", "#ff7f0e"),
                    Indicator::new(state::ACCOUNT_COLUMNS[2], "Cuentas nivel 3", "#2ca02c"),
                    Indicator::new(
                        state::ACCOUNT_COLUMNS[3],
                        "Cuentas transaccionales tradicionales",
                        "#d62728",
                    ),
                ],
            },
            IndicatorGroup {
                key: "credits".to_string(),
                title: "Credit product penetration".to_string(),
                indicators: vec![
                    Indicator::new(state::CREDIT_COLUMNS[0], "Mortgage (Hipotecarios)", "#1f77b4"),
                    Indicator::new(state::CREDIT_COLUMNS[1], "Personal (Personales)", "#ff7f0e"),
                    Indicator::new(state::CREDIT_COLUMNS[2], "Salary (Nómina)", "#2ca02c"),
                    Indicator::new(
                        state::CREDIT_COLUMNS[3],
                        "Automotive (Automotriz)",
                        "#d62728",
                    ),
                    Indicator::new(state::CREDIT_COLUMNS[4], "ABCD", "#9467bd"),
                ],
            },
            IndicatorGroup {
                key: "institutions".to_string(),
                title: "Comparison of financial institutions".to_string(),
                indicators: vec![
                    Indicator::new(state::COMMERCIAL_BRANCHES, "Commercial banks", "#1f77b4"),
                    Indicator::new(state::DEVELOPMENT_BRANCHES, "Development banks", "#ff7f0e"),
                    Indicator::new(state::COOPERATIVE_BRANCHES, "Cooperatives", "#2ca02c"),
                    Indicator::new(
                        state::MICROFINANCE_BRANCHES,
                        "Microfinance institutions",
                        "#d62728",
                    ),
                ],
            },
        ];

        let correlation_indicators = vec![
            Indicator::new(state::POS_TERMINALS, "POS", "#1f77b4"),
            Indicator::new(state::COMMERCIAL_BRANCHES, "Commercial bank branches", "#ff7f0e"),
            Indicator::new(state::ATMS, "ATMs", "#2ca02c"),
            Indicator::new(state::AGENTS, "Banking agents", "#d62728"),
            Indicator::new(state::MOBILE_CONTRACTS, "Mobile banking contracts", "#9467bd"),
        ];

        Self {
            groups,
            correlation_indicators,
        }
    }

    /// Load a configuration override from a JSON file.
    pub fn from_json(path: &Path) -> Result<Self, ConfigError> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Display label for a raw column, if any group maps it.
    pub fn label_for(&self, column: &str) -> Option<&str> {
        self.groups
            .iter()
            .flat_map(|group| group.indicators.iter())
            .chain(self.correlation_indicators.iter())
            .find(|indicator| indicator.column == column)
            .map(|indicator| indicator.label.as_str())
    }
}

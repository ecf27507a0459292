//! finclusion - Financial Inclusion Analytics
//!
//! Headless runner: builds every dashboard found in the data directory and
//! prints its summaries.

use anyhow::{Context, Result};
use clap::Parser;
use finclusion::analysis::IndicatorCorrelation;
use finclusion::config::DashboardConfig;
use finclusion::pipeline::{
    CategoryDashboard, HistoricalDashboard, PipelineError, StateDashboard,
    CARD_BRAND_DATASET, CATEGORY_DATASET, HISTORICAL_DATASET, STATE_DATASET,
};
use std::path::{Path, PathBuf};
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Financial inclusion analytics for CNBV datasets")]
struct Args {
    /// Directory holding the CNBV CSV exports
    #[arg(long, default_value = "./data")]
    data_dir: PathBuf,

    /// Optional JSON override for the indicator groups
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => DashboardConfig::from_json(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => DashboardConfig::builtin(),
    };

    // The state dashboard is the primary view; without it there is nothing
    // to show.
    let state_path = args.data_dir.join(STATE_DATASET);
    let dashboard = StateDashboard::build(&state_path, &config)
        .with_context(|| format!("building state dashboard from {}", state_path.display()))?;
    print_state_summary(&dashboard);

    // The remaining views degrade independently.
    let historical_path = args.data_dir.join(HISTORICAL_DATASET);
    match HistoricalDashboard::build(&historical_path) {
        Ok(historical) => print_historical_summary(&historical),
        Err(e) => warn!(error = %e, "historical view unavailable"),
    }

    let category_builds: [(&str, fn(&Path) -> Result<CategoryDashboard, PipelineError>); 2] = [
        (CARD_BRAND_DATASET, CategoryDashboard::build_brands),
        (CATEGORY_DATASET, CategoryDashboard::build_categories),
    ];
    for (name, build) in category_builds {
        let path = args.data_dir.join(name);
        match build(&path) {
            Ok(categories) => print_category_summary(name, &categories),
            Err(e) => warn!(dataset = name, error = %e, "category view unavailable"),
        }
    }

    Ok(())
}

fn print_state_summary(dashboard: &StateDashboard) {
    println!("Financial Inclusion Analysis - Mexico");
    println!(
        "  states: {}, metric families: {}",
        dashboard.table.height(),
        dashboard.families.len()
    );

    println!("  Top states by inclusion index:");
    for entry in &dashboard.top_inclusion {
        println!("    {:<20} {:.2}", entry.key, entry.value);
    }
    println!("  Bottom states by inclusion index:");
    for entry in &dashboard.bottom_inclusion {
        println!("    {:<20} {:.2}", entry.key, entry.value);
    }

    println!("  Correlation with inclusion index:");
    for correlation in &dashboard.correlations {
        println!("    {:<26} {}", correlation.label, format_correlation(correlation));
    }

    for fault in &dashboard.faults {
        println!("  [unavailable] {}: {}", fault.metric, fault.message);
    }
}

fn format_correlation(result: &IndicatorCorrelation) -> String {
    if result.fault.is_some() {
        return "unavailable".to_string();
    }
    match &result.correlation {
        Some(corr) => {
            let marker = if corr.is_significant { " *" } else { "" };
            format!("{:.2}{marker} (n={})", corr.display_r(), corr.n)
        }
        None => "undefined".to_string(),
    }
}

fn print_historical_summary(dashboard: &HistoricalDashboard) {
    println!("Historical series ({} years retained)", dashboard.table.height());
    for indicator in &dashboard.yoy {
        let latest = indicator.series.last();
        let growth = latest
            .and_then(|year| year.growth)
            .map(|g| format!("{g:+.1}%"))
            .unwrap_or_else(|| "undefined".to_string());
        println!("  {:<28} latest YoY growth: {growth}", indicator.indicator);
    }
}

fn print_category_summary(name: &str, dashboard: &CategoryDashboard) {
    let growth = dashboard
        .total_growth
        .map(|g| format!("{g:+.1}%"))
        .unwrap_or_else(|| "undefined".to_string());
    println!(
        "{name}: {} rows, total {:.0} ({growth} YoY)",
        dashboard.table.height(),
        dashboard.total_amount
    );
    for entry in &dashboard.top_growth {
        println!("  fastest growing: {:<20} {:+.1}%", entry.key, entry.value);
    }
}

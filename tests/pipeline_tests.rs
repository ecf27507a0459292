//! End-to-end dashboard builds over sample CSV fixtures.

use finclusion::config::DashboardConfig;
use finclusion::data::schema::{derived, historical, state};
use finclusion::pipeline::{
    CategoryDashboard, HistoricalDashboard, PipelineError, StateDashboard,
};
use polars::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const STATE_CSV: &str = "\
Estado,Poblacion,Poblacion_adulta,Superficie_km2,\
Sucursales_banca_comercial_10mil_adultos,Sucursales_banca_desarrollo_10mil_adultos,\
Sucursales_cooperativas_10mil_adultos,Sucursales_microfinancieras_10mil_adultos,\
Cajeros_10mil_adultos,Corresponsales_10mil_adultos,Contratos_celular_10mil_adultos,\
Cuentas_Nivel1_10mil_adultos_Banca,Cuentas_Nivel2_10mil_adultos_Banca,\
Cuentas_Nivel3_10mil_adultos_Banca,Cuentas_cuentas_transaccionales_tradicionales_10mil_adultos_Banca,\
Creditos_hipotecarios_10mil_adultos_Banca,Creditos_personales_10mil_adultos_Banca,\
Creditos_nomina_10mil_adultos_Banca,Creditos_automotrices_10mil_adultos_Banca,\
Creditos_ABCD_10mil_adultos_Banca
Norte,100,50,10,10,0,0,0,20,5,5000,3000,0,0,0,2000,0,0,0,0
Centro,200,150,20,4,2,1,0,10,2,10000,1000,1000,1000,1000,1000,0,0,0,0
Sur,0,0,30,1,0,0,0,2,1,2000,0,0,0,0,0,0,0,0,0
Bajio,50,25,,2,1,0,0,4,2,1000,100,100,100,700,0,0,0,0,0
Sin identificar,10,5,5,1,1,1,1,1,1,100,10,10,10,10,10,10,10,10,10
";

const HISTORICAL_CSV: &str = "\
Anio,Trimestre,Sucursales_Banca,Sucursales_EACP,Cajeros_Banca,Cajeros_EACP,\
Corresponsales_Banca,Corresponsales_EACP,Contratos_celular_Banca
2022,2,90,9,45,4,20,2,900
2022,4,100,10,50,5,25,3,1000
2023,2,105,11,52,5,26,3,1050
2023,4,110,12,55,6,28,3,1100
2024,1,112,12,56,6,29,3,1120
2024,2,121,13,60,7,30,4,1210
";

const BRANDS_CSV: &str = "\
Marca,Monto,Monto_anterior
Visa,120,100
Mastercard,80,0
Amex,50,
Sin identificar,10,5
Carnet,90,100
";

const CATEGORIES_CSV: &str = "\
Categoria,Monto,Monto_anterior
Restaurantes,220,200
Gasolina,115,100
Sin identificar,5,5
";

fn write_fixture(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

fn column_value(df: &DataFrame, column: &str, row: usize) -> Option<f64> {
    df.column(column).unwrap().f64().unwrap().get(row)
}

#[test]
fn state_dashboard_end_to_end() {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(&dir, "state.csv", STATE_CSV);
    let dashboard = StateDashboard::build(&path, &DashboardConfig::builtin()).unwrap();
    let table = &dashboard.table;

    // sentinel row removed
    assert_eq!(table.height(), 4);
    let keys = table.column(state::KEY).unwrap().str().unwrap().clone();
    assert!(keys.into_iter().all(|k| k.unwrap() != "Sin identificar"));

    // adult share: 50%, 75%, undefined for zero population
    assert_eq!(column_value(table, derived::ADULT_POPULATION_SHARE, 0), Some(50.0));
    assert_eq!(column_value(table, derived::ADULT_POPULATION_SHARE, 1), Some(75.0));
    assert_eq!(column_value(table, derived::ADULT_POPULATION_SHARE, 2), None);

    // Bajio's missing area imputed with the median of [10, 20, 30]
    assert_eq!(column_value(table, state::AREA_KM2, 3), Some(20.0));

    // branch rates 4+2+1+0
    assert_eq!(column_value(table, derived::TOTAL_BRANCHES, 1), Some(7.0));

    // composite index: (10 + 20 + 5 + 3000/1000 + 2000/1000) / 5
    assert_eq!(column_value(table, derived::FI_INDEX, 0), Some(8.0));

    // mobile penetration uses the fixed denominator
    assert_eq!(
        column_value(table, derived::MOBILE_BANKING_PENETRATION, 1),
        Some(1.0)
    );

    // account mix sums to 100 where defined, null markers on zero rows
    let mix = dashboard.account_mix.as_ref().unwrap();
    let centro: f64 = state::ACCOUNT_COLUMNS
        .iter()
        .map(|column| {
            mix.column(&format!("%_{column}"))
                .unwrap()
                .f64()
                .unwrap()
                .get(1)
                .unwrap()
        })
        .sum();
    assert!((centro - 100.0).abs() < 1e-9);
    for column in state::ACCOUNT_COLUMNS {
        assert_eq!(
            mix.column(&format!("%_{column}")).unwrap().f64().unwrap().get(2),
            None
        );
    }

    // rankings
    let top: Vec<&str> = dashboard.top_inclusion.iter().map(|e| e.key.as_str()).collect();
    let bottom: Vec<&str> = dashboard
        .bottom_inclusion
        .iter()
        .map(|e| e.key.as_str())
        .collect();
    assert_eq!(top, vec!["Norte", "Centro", "Bajio"]);
    assert_eq!(bottom, vec!["Sur", "Bajio", "Centro"]);

    // the fixture has no TPV column: that correlation is an isolated fault,
    // the other four still compute
    assert_eq!(dashboard.correlations.len(), 5);
    let tpv = dashboard
        .correlations
        .iter()
        .find(|c| c.indicator == state::POS_TERMINALS)
        .unwrap();
    assert!(tpv.fault.is_some());
    let defined = dashboard
        .correlations
        .iter()
        .filter(|c| c.correlation.is_some())
        .count();
    assert_eq!(defined, 4);
    assert!(dashboard.faults.iter().any(|f| f.metric == state::POS_TERMINALS));

    // every configured family materialized with labeled columns
    assert_eq!(dashboard.families.len(), 4);
    let infrastructure = &dashboard.families[0];
    assert!(infrastructure.table.column("ATMs").is_ok());
}

#[test]
fn state_dashboard_correlations_are_symmetric_and_bounded() {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(&dir, "state.csv", STATE_CSV);
    let dashboard = StateDashboard::build(&path, &DashboardConfig::builtin()).unwrap();

    use finclusion::analysis::Correlator;
    for result in dashboard.correlations.iter().filter(|c| c.fault.is_none()) {
        let forward = Correlator::pearson_columns(
            &dashboard.table,
            state::TABLE,
            &result.indicator,
            derived::FI_INDEX,
        )
        .unwrap()
        .unwrap();
        let backward = Correlator::pearson_columns(
            &dashboard.table,
            state::TABLE,
            derived::FI_INDEX,
            &result.indicator,
        )
        .unwrap()
        .unwrap();
        assert_eq!(forward.r, backward.r);
        assert!(forward.display_r() >= -1.0 && forward.display_r() <= 1.0);
    }
}

#[test]
fn missing_state_file_aborts_the_build() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nope.csv");
    let err = StateDashboard::build(&path, &DashboardConfig::builtin()).unwrap_err();
    assert!(matches!(err, PipelineError::Loader(_)));
}

#[test]
fn historical_dashboard_keeps_one_quarter_per_year() {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(&dir, "history.csv", HISTORICAL_CSV);
    let dashboard = HistoricalDashboard::build(&path).unwrap();

    let quarters: Vec<i64> = dashboard
        .table
        .column(historical::QUARTER)
        .unwrap()
        .cast(&DataType::Int64)
        .unwrap()
        .i64()
        .unwrap()
        .into_iter()
        .flatten()
        .collect();
    assert_eq!(quarters, vec![4, 4, 2]);

    let branches = dashboard
        .yoy
        .iter()
        .find(|g| g.indicator == historical::BANK_BRANCHES)
        .unwrap();
    assert_eq!(branches.series[0].growth, None);
    assert!((branches.series[1].growth.unwrap() - 10.0).abs() < 1e-9);
    assert!((branches.series[2].growth.unwrap() - 10.0).abs() < 1e-9);
}

#[test]
fn brand_growth_excludes_undefined_priors() {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(&dir, "brands.csv", BRANDS_CSV);
    let dashboard = CategoryDashboard::build_brands(&path).unwrap();

    // zero-prior and missing-prior brands drop out of ranked growth
    let top: Vec<&str> = dashboard.top_growth.iter().map(|e| e.key.as_str()).collect();
    assert_eq!(top, vec!["Visa", "Carnet"]);
    assert!((dashboard.top_growth[0].value - 20.0).abs() < 1e-9);

    let bottom: Vec<&str> = dashboard
        .bottom_growth
        .iter()
        .map(|e| e.key.as_str())
        .collect();
    assert_eq!(bottom, vec!["Carnet", "Visa"]);

    // totals skip missing amounts; sentinel row is gone
    assert_eq!(dashboard.table.height(), 4);
    assert!((dashboard.total_amount - 340.0).abs() < 1e-9);
    assert!((dashboard.prior_total - 200.0).abs() < 1e-9);
    assert!((dashboard.total_growth.unwrap() - 70.0).abs() < 1e-9);
}

#[test]
fn category_dashboard_builds_from_transaction_totals() {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(&dir, "categories.csv", CATEGORIES_CSV);
    let dashboard = CategoryDashboard::build_categories(&path).unwrap();

    assert_eq!(dashboard.table.height(), 2);
    assert!((dashboard.total_amount - 335.0).abs() < 1e-9);
    let top: Vec<&str> = dashboard.top_growth.iter().map(|e| e.key.as_str()).collect();
    assert_eq!(top, vec!["Gasolina", "Restaurantes"]);
}

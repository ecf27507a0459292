//! Dataset Schemas
//! Named column sets for each CNBV dataset family, validated at load time.

use polars::prelude::*;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("schema mismatch: column '{column}' missing from {table}")]
    SchemaMismatch { table: String, column: String },
}

/// State-level consolidated dataset columns.
pub mod state {
    pub const TABLE: &str = "state-level dataset";

    pub const KEY: &str = "Estado";
    pub const POPULATION: &str = "Poblacion";
    pub const ADULT_POPULATION: &str = "Poblacion_adulta";
    pub const AREA_KM2: &str = "Superficie_km2";

    pub const COMMERCIAL_BRANCHES: &str = "Sucursales_banca_comercial_10mil_adultos";
    pub const DEVELOPMENT_BRANCHES: &str = "Sucursales_banca_desarrollo_10mil_adultos";
    pub const COOPERATIVE_BRANCHES: &str = "Sucursales_cooperativas_10mil_adultos";
    pub const MICROFINANCE_BRANCHES: &str = "Sucursales_microfinancieras_10mil_adultos";

    pub const ATMS: &str = "Cajeros_10mil_adultos";
    pub const AGENTS: &str = "Corresponsales_10mil_adultos";
    pub const POS_TERMINALS: &str = "TPV_10mil_adultos";
    pub const MOBILE_CONTRACTS: &str = "Contratos_celular_10mil_adultos";

    pub const INSTITUTION_COLUMNS: [&str; 4] = [
        COMMERCIAL_BRANCHES,
        DEVELOPMENT_BRANCHES,
        COOPERATIVE_BRANCHES,
        MICROFINANCE_BRANCHES,
    ];

    pub const ACCOUNT_COLUMNS: [&str; 4] = [
        "Cuentas_Nivel1_10mil_adultos_Banca",
        "Cuentas_Nivel2_10mil_adultos_Banca",
        "Cuentas_Nivel3_10mil_adultos_Banca",
        "Cuentas_cuentas_transaccionales_tradicionales_10mil_adultos_Banca",
    ];

    pub const CREDIT_COLUMNS: [&str; 5] = [
        "Creditos_hipotecarios_10mil_adultos_Banca",
        "Creditos_personales_10mil_adultos_Banca",
        "Creditos_nomina_10mil_adultos_Banca",
        "Creditos_automotrices_10mil_adultos_Banca",
        "Creditos_ABCD_10mil_adultos_Banca",
    ];

    /// Columns imputed with their median when values are missing.
    pub const IMPUTED_COLUMNS: [&str; 2] = [AREA_KM2, POPULATION];

    /// Columns that must be present before derivation starts.
    pub fn required_columns() -> Vec<&'static str> {
        let mut cols = vec![
            KEY,
            POPULATION,
            ADULT_POPULATION,
            AREA_KM2,
            ATMS,
            AGENTS,
            MOBILE_CONTRACTS,
        ];
        cols.extend(INSTITUTION_COLUMNS);
        cols.extend(ACCOUNT_COLUMNS);
        cols.extend(CREDIT_COLUMNS);
        cols
    }
}

/// Derived column names, kept identical to the original outputs so the
/// presentation layer sees the same identifiers.
pub mod derived {
    pub const ADULT_POPULATION_SHARE: &str = "Adult_Population_Percentage";
    pub const MOBILE_BANKING_PENETRATION: &str = "Mobile_Banking_Penetration";
    pub const TOTAL_BRANCHES: &str = "Total_Branches";
    pub const FI_INDEX: &str = "FI_Index";
}

/// Historical (year/quarter) dataset columns. Commercial banking and EACP
/// entities carry parallel indicator families.
pub mod historical {
    pub const TABLE: &str = "historical dataset";

    pub const YEAR: &str = "Anio";
    pub const QUARTER: &str = "Trimestre";

    pub const BANK_BRANCHES: &str = "Sucursales_Banca";
    pub const EACP_BRANCHES: &str = "Sucursales_EACP";
    pub const BANK_ATMS: &str = "Cajeros_Banca";
    pub const EACP_ATMS: &str = "Cajeros_EACP";
    pub const BANK_AGENTS: &str = "Corresponsales_Banca";
    pub const EACP_AGENTS: &str = "Corresponsales_EACP";
    pub const MOBILE_CONTRACTS: &str = "Contratos_celular_Banca";

    pub const INDICATOR_COLUMNS: [&str; 7] = [
        BANK_BRANCHES,
        EACP_BRANCHES,
        BANK_ATMS,
        EACP_ATMS,
        BANK_AGENTS,
        EACP_AGENTS,
        MOBILE_CONTRACTS,
    ];

    pub fn required_columns() -> Vec<&'static str> {
        let mut cols = vec![YEAR, QUARTER];
        cols.extend(INDICATOR_COLUMNS);
        cols
    }
}

/// Category aggregate datasets (card brands, spending categories).
pub mod category {
    pub const BRAND_TABLE: &str = "card-brand dataset";
    pub const CATEGORY_TABLE: &str = "category dataset";

    pub const BRAND_KEY: &str = "Marca";
    pub const CATEGORY_KEY: &str = "Categoria";
    pub const AMOUNT: &str = "Monto";
    pub const PRIOR_AMOUNT: &str = "Monto_anterior";
    pub const GROWTH: &str = "Crecimiento";
}

/// Check that every required column exists, failing on the first drift.
pub fn validate_columns(df: &DataFrame, table: &str, required: &[&str]) -> Result<(), SchemaError> {
    for column in required {
        if df.column(column).is_err() {
            return Err(SchemaError::SchemaMismatch {
                table: table.to_string(),
                column: (*column).to_string(),
            });
        }
    }
    Ok(())
}

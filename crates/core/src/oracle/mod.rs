pub mod error;
pub mod formula;
pub mod http;
pub mod projection;
pub mod trend;

use crate::config::Settings;
use crate::domain::unit::{FlatModel, FlatType, Town, UnitCandidate};
use anyhow::ensure;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// What the valuation oracle needs to know about a unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitDescription {
    pub town: Town,
    pub flat_type: FlatType,
    pub flat_model: FlatModel,
    pub floor_area_sqm: f64,
    pub floor_level: u8,
    pub lease_commence_year: i32,
}

impl UnitDescription {
    /// Bounds accepted at the public boundary. Inventory segments are not held to these.
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.floor_area_sqm.is_finite() && (20.0..=300.0).contains(&self.floor_area_sqm),
            "floor_area_sqm must be within 20..=300 (got {})",
            self.floor_area_sqm
        );
        ensure!(
            (1..=50).contains(&self.floor_level),
            "floor_level must be within 1..=50 (got {})",
            self.floor_level
        );
        ensure!(
            (1960..=2025).contains(&self.lease_commence_year),
            "lease_commence_year must be within 1960..=2025 (got {})",
            self.lease_commence_year
        );
        Ok(())
    }
}

impl From<&UnitCandidate> for UnitDescription {
    fn from(c: &UnitCandidate) -> Self {
        Self {
            town: c.town,
            flat_type: c.flat_type,
            flat_model: c.flat_model,
            floor_area_sqm: c.representative_floor_area(),
            floor_level: c.storey_range.floor_level(),
            lease_commence_year: c.lease_commence_year,
        }
    }
}

/// One oracle answer for one year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Valuation {
    pub predicted_price: f64,
    #[serde(default)]
    pub base_price: Option<f64>,
    #[serde(default)]
    pub trend_multiplier: Option<f64>,
    #[serde(default)]
    pub remaining_lease: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OracleKind {
    Formula,
    Http,
}

impl fmt::Display for OracleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OracleKind::Formula => "formula",
            OracleKind::Http => "http",
        })
    }
}

#[async_trait::async_trait]
pub trait ValuationOracle: Send + Sync {
    fn kind(&self) -> OracleKind;

    async fn predict(&self, unit: &UnitDescription, year: i32) -> anyhow::Result<Valuation>;

    /// One valuation per year, in the order given.
    async fn predict_years(
        &self,
        unit: &UnitDescription,
        years: &[i32],
    ) -> anyhow::Result<Vec<Valuation>> {
        let mut out = Vec::with_capacity(years.len());
        for &year in years {
            out.push(self.predict(unit, year).await?);
        }
        Ok(out)
    }
}

/// `ORACLE_BASE_URL` selects the remote model service; otherwise the closed-form formula is
/// used, driven by the trend table when one is configured.
pub fn oracle_from_settings(
    settings: &Settings,
    trend: Option<trend::TrendTable>,
) -> anyhow::Result<Arc<dyn ValuationOracle>> {
    if settings.oracle_base_url.is_some() {
        let oracle = http::HttpValuationOracle::from_settings(settings)?;
        tracing::info!(base_url = %oracle.base_url(), "using http valuation oracle");
        return Ok(Arc::new(oracle));
    }

    let oracle = match trend {
        Some(table) => {
            tracing::info!(years = table.len(), "using formula valuation oracle with trend table");
            formula::FormulaOracle::with_trend(table)
        }
        None => {
            tracing::info!("using formula valuation oracle");
            formula::FormulaOracle::new()
        }
    };
    Ok(Arc::new(oracle))
}

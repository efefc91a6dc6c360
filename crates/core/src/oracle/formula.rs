//! Closed-form valuation:
//! `base(type) x town x model x area/95 x storey x lease x year`, rounded to the nearest 1000.

use crate::domain::recommendation::round_to_thousand;
use crate::domain::unit::{remaining_lease_years, FlatModel, FlatType};
use crate::oracle::trend::TrendTable;
use crate::oracle::{OracleKind, UnitDescription, Valuation, ValuationOracle};
use crate::time::horizon::BASE_YEAR;
use anyhow::ensure;

pub const REFERENCE_FLOOR_AREA_SQM: f64 = 95.0;
pub const REFERENCE_FLOOR_LEVEL: f64 = 7.0;
pub const STOREY_PREMIUM_PER_FLOOR: f64 = 0.015;
pub const ANNUAL_APPRECIATION: f64 = 1.035;

/// 2025 market baseline per flat type.
pub const fn base_price(flat_type: FlatType) -> f64 {
    match flat_type {
        FlatType::TwoRoom => 320_000.0,
        FlatType::ThreeRoom => 420_000.0,
        FlatType::FourRoom => 550_000.0,
        FlatType::FiveRoom => 680_000.0,
        FlatType::Executive => 780_000.0,
        FlatType::MultiGeneration => 550_000.0,
    }
}

pub const fn model_multiplier(model: FlatModel) -> f64 {
    match model {
        FlatModel::Dbss => 1.12,
        FlatModel::PremiumApartment => 1.08,
        FlatModel::PremiumApartmentLoft => 1.15,
        FlatModel::Maisonette => 1.05,
        FlatModel::ModelA => 1.02,
        FlatModel::Improved => 1.00,
        FlatModel::NewGeneration => 0.98,
        FlatModel::Standard => 0.95,
        FlatModel::Simplified => 0.92,
        FlatModel::Apartment => 1.00,
        FlatModel::ModelA2 => 1.00,
        FlatModel::ThreeGen => 1.10,
    }
}

pub fn storey_multiplier(floor_level: u8) -> f64 {
    1.0 + (f64::from(floor_level) - REFERENCE_FLOOR_LEVEL) * STOREY_PREMIUM_PER_FLOOR
}

/// Piecewise lease decay: flat above 70 years, then two linear segments.
pub fn lease_multiplier(remaining_years: u32) -> f64 {
    let r = f64::from(remaining_years);
    if r >= 70.0 {
        1.0
    } else if r >= 50.0 {
        0.85 + (r - 50.0) * 0.0075
    } else {
        0.60 + r / 50.0 * 0.25
    }
}

#[derive(Debug, Clone, Default)]
pub struct FormulaOracle {
    trend: Option<TrendTable>,
}

impl FormulaOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_trend(trend: TrendTable) -> Self {
        Self { trend: Some(trend) }
    }

    pub fn year_multiplier(&self, year: i32) -> f64 {
        match &self.trend {
            Some(table) => table.multiplier(year),
            None => ANNUAL_APPRECIATION.powi(year - BASE_YEAR),
        }
    }

    pub fn estimate(&self, unit: &UnitDescription, year: i32) -> anyhow::Result<Valuation> {
        ensure!(
            unit.floor_area_sqm.is_finite() && unit.floor_area_sqm > 0.0,
            "floor area must be positive (got {})",
            unit.floor_area_sqm
        );

        let remaining = remaining_lease_years(unit.lease_commence_year, year);
        let before_trend = base_price(unit.flat_type)
            * unit.town.profile().price_multiplier
            * model_multiplier(unit.flat_model)
            * (unit.floor_area_sqm / REFERENCE_FLOOR_AREA_SQM)
            * storey_multiplier(unit.floor_level)
            * lease_multiplier(remaining);
        let year_multiplier = self.year_multiplier(year);
        let predicted_price = round_to_thousand(before_trend * year_multiplier);
        ensure!(
            predicted_price >= 0.0,
            "formula produced a negative price for {year}"
        );

        Ok(Valuation {
            predicted_price,
            base_price: Some(round_to_thousand(before_trend)),
            trend_multiplier: Some(year_multiplier),
            remaining_lease: Some(remaining),
        })
    }
}

#[async_trait::async_trait]
impl ValuationOracle for FormulaOracle {
    fn kind(&self) -> OracleKind {
        OracleKind::Formula
    }

    async fn predict(&self, unit: &UnitDescription, year: i32) -> anyhow::Result<Valuation> {
        self.estimate(unit, year)
    }
}

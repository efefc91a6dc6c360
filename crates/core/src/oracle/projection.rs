use crate::domain::recommendation::PriceProjection;
use crate::oracle::{UnitDescription, Valuation, ValuationOracle};
use crate::time::horizon::TARGET_YEARS;
use anyhow::{ensure, Context};

pub fn validate_years(years: &[i32]) -> anyhow::Result<()> {
    ensure!(!years.is_empty(), "at least one projection year is required");
    ensure!(
        years.windows(2).all(|w| w[0] < w[1]),
        "projection years must be strictly increasing (got {years:?})"
    );
    for year in years {
        ensure!(
            TARGET_YEARS.contains(year),
            "projection year {year} is outside {}..={}",
            TARGET_YEARS.start(),
            TARGET_YEARS.end()
        );
    }
    Ok(())
}

pub fn projection_from(
    unit: &UnitDescription,
    year: i32,
    valuation: &Valuation,
) -> anyhow::Result<PriceProjection> {
    PriceProjection::around(
        year,
        valuation.predicted_price,
        unit.lease_commence_year,
        valuation.trend_multiplier,
    )
}

/// Percent change against the previous entry, rounded to two decimals.
pub fn fill_yoy_changes(projections: &mut [PriceProjection]) {
    let mut previous: Option<f64> = None;
    for p in projections.iter_mut() {
        p.yoy_change_pct = previous
            .filter(|prev| *prev > 0.0)
            .map(|prev| ((p.base_price - prev) / prev * 100.0 * 100.0).round() / 100.0);
        previous = Some(p.base_price);
    }
}

/// Price trajectory of one unit across `years`.
pub async fn project(
    oracle: &dyn ValuationOracle,
    unit: &UnitDescription,
    years: &[i32],
) -> anyhow::Result<Vec<PriceProjection>> {
    validate_years(years)?;

    let valuations = oracle
        .predict_years(unit, years)
        .await
        .with_context(|| format!("valuation failed for {} {}", unit.town, unit.flat_type))?;
    ensure!(
        valuations.len() == years.len(),
        "oracle returned {} valuations for {} years",
        valuations.len(),
        years.len()
    );

    let mut out = years
        .iter()
        .zip(&valuations)
        .map(|(&year, v)| projection_from(unit, year, v))
        .collect::<anyhow::Result<Vec<_>>>()?;
    fill_yoy_changes(&mut out);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::unit::{FlatModel, FlatType, Town};
    use crate::oracle::formula::FormulaOracle;

    fn unit() -> UnitDescription {
        UnitDescription {
            town: Town::Tampines,
            flat_type: FlatType::FourRoom,
            flat_model: FlatModel::ModelA,
            floor_area_sqm: 95.0,
            floor_level: 7,
            lease_commence_year: 2000,
        }
    }

    #[test]
    fn years_must_be_increasing_and_in_window() {
        assert!(validate_years(&[2025, 2026, 2030]).is_ok());
        assert!(validate_years(&[]).is_err());
        assert!(validate_years(&[2026, 2026]).is_err());
        assert!(validate_years(&[2027, 2026]).is_err());
        assert!(validate_years(&[2024, 2025]).is_err());
    }

    #[tokio::test]
    async fn trajectory_carries_yoy_and_lease_decay() {
        let oracle = FormulaOracle::new();
        let out = project(&oracle, &unit(), &[2025, 2026, 2027]).await.unwrap();

        assert_eq!(out.len(), 3);
        assert_eq!(out[0].yoy_change_pct, None);
        let yoy = out[1].yoy_change_pct.unwrap();
        assert!(yoy > 3.0 && yoy < 4.0, "got {yoy}");
        for pair in out.windows(2) {
            assert!(pair[0].remaining_lease_years >= pair[1].remaining_lease_years);
            assert!(pair[0].base_price <= pair[1].base_price);
        }
        for p in &out {
            assert!(p.lower_bound <= p.base_price && p.base_price <= p.upper_bound);
        }
    }

    #[tokio::test]
    async fn invalid_years_never_reach_the_oracle() {
        let err = project(&FormulaOracle::new(), &unit(), &[2030, 2029])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("strictly increasing"));
    }
}

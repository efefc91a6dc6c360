use anyhow::{ensure, Context};
use chrono::{DateTime, Datelike, Utc};
use std::ops::RangeInclusive;

/// Years the valuation models are calibrated for.
pub const TARGET_YEARS: RangeInclusive<i32> = 2025..=2030;

/// Market baseline year of the closed-form valuation.
pub const BASE_YEAR: i32 = 2025;

/// Resolve the projection target year. Without an explicit year, next calendar year is used,
/// clamped into the calibrated window.
pub fn resolve_target_year(
    target_year_arg: Option<&str>,
    now_utc: DateTime<Utc>,
) -> anyhow::Result<i32> {
    let year = match target_year_arg {
        Some(s) => s
            .trim()
            .parse::<i32>()
            .with_context(|| format!("target year must be an integer (got {s:?})"))?,
        None => {
            let next = now_utc.year() + 1;
            next.clamp(*TARGET_YEARS.start(), *TARGET_YEARS.end())
        }
    };

    ensure!(
        TARGET_YEARS.contains(&year),
        "target year must be within {}..={} (got {year})",
        TARGET_YEARS.start(),
        TARGET_YEARS.end()
    );
    Ok(year)
}

/// Every calibrated year from `from` onwards.
pub fn trajectory_years(from: i32) -> Vec<i32> {
    (from.max(*TARGET_YEARS.start())..=*TARGET_YEARS.end()).collect()
}

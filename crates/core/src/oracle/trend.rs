use crate::config::Settings;
use anyhow::{ensure, Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Year looked up when the requested year is missing from the table.
pub const FALLBACK_YEAR: i32 = 2030;

/// Market trend multiplier per calendar year, e.g. `{"2025": 1.0, "2026": 1.034}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TrendTable {
    by_year: BTreeMap<i32, f64>,
}

impl TrendTable {
    pub fn from_json(text: &str) -> Result<Self> {
        let raw = serde_json::from_str::<BTreeMap<String, f64>>(text)
            .context("trend table must be a JSON object of year -> multiplier")?;

        let mut by_year = BTreeMap::new();
        for (year, multiplier) in raw {
            let parsed = year
                .trim()
                .parse::<i32>()
                .with_context(|| format!("trend table key is not a year: {year:?}"))?;
            ensure!(
                multiplier.is_finite() && multiplier > 0.0,
                "trend multiplier for {parsed} must be positive (got {multiplier})"
            );
            by_year.insert(parsed, multiplier);
        }
        Ok(Self { by_year })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read trend table {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("invalid trend table {}", path.display()))
    }

    pub fn from_settings(settings: &Settings) -> Result<Option<Self>> {
        let Some(path) = settings.trend_multipliers_file.as_deref() else {
            return Ok(None);
        };
        let table = Self::load(Path::new(path))?;
        tracing::info!(path, years = table.len(), "loaded trend multipliers");
        Ok(Some(table))
    }

    pub fn multiplier(&self, year: i32) -> f64 {
        self.by_year
            .get(&year)
            .or_else(|| self.by_year.get(&FALLBACK_YEAR))
            .copied()
            .unwrap_or(1.0)
    }

    pub fn len(&self) -> usize {
        self.by_year.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_year.is_empty()
    }
}

use crate::domain::unit::{remaining_lease_years, CandidateKey, UnitCandidate};
use anyhow::ensure;
use serde::{Deserialize, Serialize};

/// Central estimate widened by this factor on each side.
pub const PRICE_BAND: f64 = 0.06;

/// Valuation of one unit at one year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceProjection {
    pub year: i32,
    /// Central price estimate.
    pub base_price: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub remaining_lease_years: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend_multiplier: Option<f64>,
    /// Percentage change against the previous year of the same trajectory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yoy_change_pct: Option<f64>,
}

impl PriceProjection {
    /// Build a projection around `price` with the standard +/- band, rounded to the nearest 1000.
    pub fn around(
        year: i32,
        price: f64,
        lease_commence_year: i32,
        trend_multiplier: Option<f64>,
    ) -> anyhow::Result<Self> {
        ensure!(
            price.is_finite() && price >= 0.0,
            "price estimate must be a non-negative number (got {price})"
        );

        Ok(Self {
            year,
            base_price: price,
            lower_bound: round_to_thousand(price * (1.0 - PRICE_BAND)).min(price),
            upper_bound: round_to_thousand(price * (1.0 + PRICE_BAND)).max(price),
            remaining_lease_years: remaining_lease_years(lease_commence_year, year),
            trend_multiplier,
            yoy_change_pct: None,
        })
    }
}

pub fn round_to_thousand(value: f64) -> f64 {
    (value / 1000.0).round() * 1000.0
}

/// Subscores in [0, 100].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Subscores {
    pub travel: f64,
    pub value: f64,
    pub budget: f64,
    pub amenity: f64,
    pub space: f64,
    /// Unrounded weighted composite.
    #[serde(rename = "final")]
    pub composite: f64,
}

/// A scored candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub candidate: UnitCandidate,
    pub projection: PriceProjection,
    pub travel_cost: f64,
    pub subscores: Subscores,
    pub match_score: u8,
}

impl Recommendation {
    pub fn key(&self) -> CandidateKey {
        self.candidate.key()
    }

    pub fn predicted_price(&self) -> f64 {
        self.projection.base_price
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Ranked,
    /// Filters left nothing to rank. A valid, empty result.
    NoCandidatesMatched,
}

/// Something that went wrong for a single candidate or destination without failing the request.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Diagnostic {
    pub subject: String,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationSet {
    pub status: MatchStatus,
    pub total_candidates: usize,
    pub recommendations: Vec<Recommendation>,
    pub diagnostics: Vec<Diagnostic>,
}

impl RecommendationSet {
    pub fn no_matches(diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            status: MatchStatus::NoCandidatesMatched,
            total_candidates: 0,
            recommendations: Vec::new(),
            diagnostics,
        }
    }

    pub fn message(&self) -> Option<&'static str> {
        match self.status {
            MatchStatus::Ranked => None,
            MatchStatus::NoCandidatesMatched => {
                Some("No flats match your criteria. Try relaxing some filters.")
            }
        }
    }
}

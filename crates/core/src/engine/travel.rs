use crate::domain::destination::Destination;
use crate::domain::geo::{distance_km, Coordinate};
use crate::domain::recommendation::Diagnostic;

/// Average one-way distance at which the absolute travel scale reaches zero.
pub const MAX_TRAVEL_DISTANCE_KM: f64 = 20.0;

/// Travel subscore when there is nothing to measure.
pub const NEUTRAL_TRAVEL_SCORE: f64 = 50.0;

const SPREAD_EPSILON: f64 = 1e-9;

/// Weighted travel inconvenience of one candidate location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TravelCost {
    /// `sum(distance_km x frequency weight)` over resolved destinations.
    pub weighted_km: f64,
    /// Frequency-weighted mean distance.
    pub mean_km: f64,
}

/// Resolved destinations of one request, with their visit weights.
#[derive(Debug, Clone, Default)]
pub struct DestinationAggregator {
    stops: Vec<(Coordinate, f64)>,
    total_weight: f64,
    diagnostics: Vec<Diagnostic>,
}

impl DestinationAggregator {
    pub fn new(destinations: &[Destination]) -> Self {
        let mut out = Self::default();
        for d in destinations {
            match d.coordinate {
                Some(coordinate) => {
                    out.stops.push((coordinate, d.weight()));
                    out.total_weight += d.weight();
                }
                None => {
                    tracing::warn!(label = %d.label, category = ?d.category, "destination not resolved; skipped");
                    out.diagnostics.push(Diagnostic {
                        subject: format!("destination:{}", d.label),
                        detail: "location could not be resolved; excluded from travel score"
                            .to_string(),
                    });
                }
            }
        }
        out
    }

    /// No resolved destination: every candidate gets the neutral travel score.
    pub fn is_neutral(&self) -> bool {
        self.stops.is_empty() || self.total_weight <= 0.0
    }

    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Zero cost without destinations. `None` when the candidate location is unknown.
    pub fn travel_cost(&self, from: Option<Coordinate>) -> Option<TravelCost> {
        if self.is_neutral() {
            return Some(TravelCost {
                weighted_km: 0.0,
                mean_km: 0.0,
            });
        }
        let from = from?;
        let weighted_km: f64 = self
            .stops
            .iter()
            .map(|(to, weight)| distance_km(from, *to) * weight)
            .sum();
        Some(TravelCost {
            weighted_km,
            mean_km: weighted_km / self.total_weight,
        })
    }

    /// Travel subscores for one request's candidate pool, in input order.
    ///
    /// Min-max over the pool: the cheapest candidate scores 100, the most expensive 0. When the
    /// pool has no spread the absolute scale `100 x (1 - mean_km / 20)` is used instead. A
    /// candidate without a coordinate gets the lowest score of the pool, so it never outranks a
    /// located one on travel.
    pub fn scores(&self, costs: &[Option<TravelCost>]) -> Vec<f64> {
        if self.is_neutral() {
            return vec![NEUTRAL_TRAVEL_SCORE; costs.len()];
        }

        let known = costs.iter().flatten().map(|c| c.weighted_km);
        let min = known.clone().fold(f64::INFINITY, f64::min);
        let max = known.fold(f64::NEG_INFINITY, f64::max);
        let spread = max - min;

        let scored: Vec<Option<f64>> = costs
            .iter()
            .map(|cost| {
                cost.map(|c| {
                    if spread > SPREAD_EPSILON {
                        100.0 * (max - c.weighted_km) / spread
                    } else {
                        100.0 * (1.0 - c.mean_km / MAX_TRAVEL_DISTANCE_KM).max(0.0)
                    }
                })
            })
            .collect();

        let floor = scored.iter().flatten().copied().fold(f64::INFINITY, f64::min);
        let unlocated = if floor.is_finite() { floor } else { 0.0 };
        scored.into_iter().map(|s| s.unwrap_or(unlocated)).collect()
    }
}

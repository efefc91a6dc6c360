//! Subscores, the weighted match score and ranking.
//!
//! All subscores are on a 0-100 scale. The composite uses fixed weights; a missing signal falls
//! back to a neutral value rather than redistributing its weight, except travel: an unlocated
//! unit takes the lowest travel score of its pool.

use crate::domain::criteria::{InclusiveRange, SearchCriteria};
use crate::domain::recommendation::{Diagnostic, PriceProjection, Recommendation, Subscores};
use crate::domain::unit::{AmenityDistances, AmenityKind, UnitCandidate};
use crate::engine::travel::DestinationAggregator;
use std::cmp::Ordering;

pub const TRAVEL_WEIGHT: f64 = 0.35;
pub const VALUE_WEIGHT: f64 = 0.25;
pub const BUDGET_WEIGHT: f64 = 0.20;
pub const AMENITY_WEIGHT: f64 = 0.15;
pub const SPACE_WEIGHT: f64 = 0.05;

/// Neutral value for value/space when the pool gives nothing to compare against.
pub const NEUTRAL_SCORE: f64 = 50.0;

pub const fn amenity_weight(kind: AmenityKind) -> f64 {
    match kind {
        AmenityKind::Mrt => 0.40,
        AmenityKind::School => 0.30,
        AmenityKind::Mall => 0.20,
        AmenityKind::Hawker => 0.10,
    }
}

/// Lower price per sqm scores higher; min-max across the pool.
pub fn value_scores(price_per_sqm: &[f64]) -> Vec<f64> {
    let min = price_per_sqm.iter().copied().fold(f64::INFINITY, f64::min);
    let max = price_per_sqm.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let spread = max - min;

    if price_per_sqm.len() <= 1 || !(spread > 0.0) {
        return vec![NEUTRAL_SCORE; price_per_sqm.len()];
    }
    price_per_sqm
        .iter()
        .map(|p| 100.0 * (max - p) / spread)
        .collect()
}

/// 100 at the budget midpoint, 50 at either edge.
pub fn budget_score(price: f64, budget: &InclusiveRange) -> f64 {
    let width = budget.width();
    if width <= 0.0 {
        return if price == budget.low { 100.0 } else { 0.0 };
    }
    (100.0 - (price - budget.midpoint()).abs() / width * 100.0).clamp(0.0, 100.0)
}

/// `100 x sum(w / (1 + km))` over known categories, capped at 100. Unknown categories add 0.
pub fn amenity_score(distances: &AmenityDistances) -> f64 {
    let raw: f64 = AmenityKind::ALL
        .into_iter()
        .filter_map(|kind| {
            distances
                .get(kind)
                .map(|km| amenity_weight(kind) / (1.0 + km.max(0.0)))
        })
        .sum();
    (raw * 100.0).min(100.0)
}

/// Decays linearly with relative deviation from the requested midpoint, in both directions.
pub fn space_score(floor_area: f64, requested: &InclusiveRange) -> f64 {
    let mid = requested.midpoint();
    if mid <= 0.0 {
        return NEUTRAL_SCORE;
    }
    100.0 * (1.0 - (floor_area - mid).abs() / mid).max(0.0)
}

pub fn composite(travel: f64, value: f64, budget: f64, amenity: f64, space: f64) -> f64 {
    TRAVEL_WEIGHT * travel
        + VALUE_WEIGHT * value
        + BUDGET_WEIGHT * budget
        + AMENITY_WEIGHT * amenity
        + SPACE_WEIGHT * space
}

pub fn match_score(composite: f64) -> u8 {
    if composite.is_nan() {
        return 0;
    }
    composite.round().clamp(0.0, 100.0) as u8
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

/// Score every priced candidate of one request. Output order follows input order.
pub fn score_candidates(
    priced: Vec<(UnitCandidate, PriceProjection)>,
    criteria: &SearchCriteria,
    aggregator: &DestinationAggregator,
) -> (Vec<Recommendation>, Vec<Diagnostic>) {
    let mut diagnostics = Vec::new();

    let costs: Vec<_> = priced
        .iter()
        .map(|(candidate, _)| {
            let cost = aggregator.travel_cost(candidate.coordinate);
            if cost.is_none() {
                diagnostics.push(Diagnostic {
                    subject: candidate.key().to_string(),
                    detail: "no coordinate; lowest travel score in pool".to_string(),
                });
            }
            cost
        })
        .collect();
    let travel = aggregator.scores(&costs);

    let per_sqm: Vec<f64> = priced
        .iter()
        .map(|(candidate, projection)| {
            let area = candidate.representative_floor_area();
            if area > 0.0 {
                projection.base_price / area
            } else {
                f64::INFINITY
            }
        })
        .collect();
    let value = if per_sqm.iter().all(|p| p.is_finite()) {
        value_scores(&per_sqm)
    } else {
        vec![NEUTRAL_SCORE; per_sqm.len()]
    };

    let out = priced
        .into_iter()
        .enumerate()
        .map(|(i, (candidate, projection))| {
            let budget = budget_score(projection.base_price, &criteria.budget);
            let amenity = amenity_score(&candidate.amenities);
            let space = space_score(candidate.representative_floor_area(), &criteria.floor_area);
            let total = composite(travel[i], value[i], budget, amenity, space);

            Recommendation {
                travel_cost: costs[i].map(|c| c.weighted_km).unwrap_or(0.0),
                subscores: Subscores {
                    travel: round1(travel[i]),
                    value: round1(value[i]),
                    budget: round1(budget),
                    amenity: round1(amenity),
                    space: round1(space),
                    composite: total,
                },
                match_score: match_score(total),
                candidate,
                projection,
            }
        })
        .collect();

    (out, diagnostics)
}

/// Highest match score first; ties go to the cheaper unit, then to key order.
pub fn compare(a: &Recommendation, b: &Recommendation) -> Ordering {
    b.match_score
        .cmp(&a.match_score)
        .then_with(|| a.predicted_price().total_cmp(&b.predicted_price()))
        .then_with(|| a.key().cmp(&b.key()))
}

pub fn rank(recommendations: &mut [Recommendation]) {
    recommendations.sort_by(compare);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_sum_to_one() {
        let sum = TRAVEL_WEIGHT + VALUE_WEIGHT + BUDGET_WEIGHT + AMENITY_WEIGHT + SPACE_WEIGHT;
        assert!((sum - 1.0).abs() < 1e-12);
        let amenity: f64 = AmenityKind::ALL.into_iter().map(amenity_weight).sum();
        assert!((amenity - 1.0).abs() < 1e-12);
    }

    #[test]
    fn composite_stays_in_range() {
        assert!((composite(100.0, 100.0, 100.0, 100.0, 100.0) - 100.0).abs() < 1e-9);
        assert_eq!(composite(0.0, 0.0, 0.0, 0.0, 0.0), 0.0);
        assert_eq!(match_score(100.4), 100);
        assert_eq!(match_score(-3.0), 0);
        assert_eq!(match_score(f64::NAN), 0);
        assert_eq!(match_score(72.5), 73);
    }

    #[test]
    fn value_prefers_cheaper_per_sqm() {
        let scores = value_scores(&[6000.0, 5000.0, 7000.0]);
        assert_eq!(scores, vec![50.0, 100.0, 0.0]);
        assert_eq!(value_scores(&[6000.0]), vec![NEUTRAL_SCORE]);
        assert_eq!(value_scores(&[6000.0, 6000.0]), vec![NEUTRAL_SCORE; 2]);
    }

    #[test]
    fn budget_peaks_at_midpoint() {
        let budget = InclusiveRange::new(400_000.0, 700_000.0);
        assert_eq!(budget_score(550_000.0, &budget), 100.0);
        assert_eq!(budget_score(400_000.0, &budget), 50.0);
        assert_eq!(budget_score(700_000.0, &budget), 50.0);
        assert!(budget_score(600_000.0, &budget) > budget_score(650_000.0, &budget));

        let point = InclusiveRange::new(500_000.0, 500_000.0);
        assert_eq!(budget_score(500_000.0, &point), 100.0);
    }

    #[test]
    fn amenity_is_monotone_in_every_category() {
        let base = AmenityDistances {
            mrt: Some(1.0),
            school: Some(1.0),
            mall: Some(1.0),
            hawker: Some(1.0),
        };
        assert!((amenity_score(&base) - 50.0).abs() < 1e-9);

        for kind in AmenityKind::ALL {
            let mut closer = base;
            closer.set(kind, Some(0.5));
            assert!(amenity_score(&closer) > amenity_score(&base), "{kind:?}");
        }

        let at_door = AmenityDistances {
            mrt: Some(0.0),
            school: Some(0.0),
            mall: Some(0.0),
            hawker: Some(0.0),
        };
        assert!((amenity_score(&at_door) - 100.0).abs() < 1e-9);
        assert!(amenity_score(&at_door) <= 100.0);
        assert_eq!(amenity_score(&AmenityDistances::default()), 0.0);
    }

    fn ranked(storey_low: u8, price: f64, score: u8) -> Recommendation {
        use crate::domain::unit::{FlatModel, FlatType, FloorAreaRange, StoreyRange, Town};

        let candidate = UnitCandidate {
            town: Town::Bedok,
            flat_type: FlatType::FourRoom,
            flat_model: FlatModel::ModelA,
            storey_range: StoreyRange::new(storey_low, storey_low + 2).unwrap(),
            floor_area: FloorAreaRange::new(90.0, 100.0).unwrap(),
            lease_commence_year: 1995,
            coordinate: None,
            amenities: AmenityDistances::default(),
        };
        Recommendation {
            candidate,
            projection: PriceProjection::around(2026, price, 1995, None).unwrap(),
            travel_cost: 0.0,
            subscores: Subscores {
                travel: 50.0,
                value: 50.0,
                budget: 50.0,
                amenity: 50.0,
                space: 50.0,
                composite: f64::from(score),
            },
            match_score: score,
        }
    }

    fn storeys(recs: &[Recommendation]) -> Vec<u8> {
        recs.iter().map(|r| r.candidate.storey_range.floor_level()).collect()
    }

    #[test]
    fn higher_score_ranks_first() {
        let mut recs = vec![ranked(4, 500_000.0, 70), ranked(7, 650_000.0, 81)];
        rank(&mut recs);
        assert_eq!(storeys(&recs), vec![7, 4]);
    }

    #[test]
    fn equal_scores_go_to_the_cheaper_unit() {
        let mut recs = vec![
            ranked(4, 620_000.0, 75),
            ranked(7, 540_000.0, 75),
            ranked(10, 580_000.0, 75),
        ];
        rank(&mut recs);
        assert_eq!(storeys(&recs), vec![7, 10, 4]);
    }

    #[test]
    fn equal_score_and_price_fall_back_to_key_order() {
        let mut recs = vec![
            ranked(13, 560_000.0, 75),
            ranked(4, 560_000.0, 75),
            ranked(7, 560_000.0, 75),
        ];
        rank(&mut recs);
        assert_eq!(storeys(&recs), vec![4, 7, 13]);
        assert_eq!(compare(&recs[0], &recs[0]), Ordering::Equal);
    }

    #[test]
    fn space_decays_both_ways() {
        let requested = InclusiveRange::new(70.0, 120.0);
        assert_eq!(space_score(95.0, &requested), 100.0);
        assert!((space_score(114.0, &requested) - 80.0).abs() < 1e-9);
        assert!((space_score(76.0, &requested) - 80.0).abs() < 1e-9);
        assert_eq!(space_score(400.0, &requested), 0.0);
        assert_eq!(
            space_score(50.0, &InclusiveRange::new(0.0, 0.0)),
            NEUTRAL_SCORE
        );
    }
}

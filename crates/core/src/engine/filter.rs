use crate::domain::criteria::SearchCriteria;
use crate::domain::recommendation::PriceProjection;
use crate::domain::unit::{AmenityKind, UnitCandidate};
use std::collections::BTreeMap;

/// First hard constraint a candidate failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Rejection {
    Selection,
    FloorArea,
    Lease,
    /// Known distance above the ceiling.
    AmenityTooFar(AmenityKind),
    /// Ceiling set but distance unknown.
    AmenityUnknown(AmenityKind),
    Budget,
}

/// Counters produced by a filter run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterStats {
    pub passed: usize,
    pub rejected: BTreeMap<Rejection, usize>,
}

impl FilterStats {
    pub fn rejected_total(&self) -> usize {
        self.rejected.values().sum()
    }

    fn record(&mut self, verdict: Result<(), Rejection>) -> bool {
        match verdict {
            Ok(()) => {
                self.passed += 1;
                true
            }
            Err(reason) => {
                *self.rejected.entry(reason).or_default() += 1;
                false
            }
        }
    }
}

/// Hard constraints of a request. Every range is inclusive at both ends.
pub struct FilterStage<'a> {
    criteria: &'a SearchCriteria,
}

impl<'a> FilterStage<'a> {
    pub fn new(criteria: &'a SearchCriteria) -> Self {
        Self { criteria }
    }

    /// Constraints decidable before valuation.
    pub fn check_static(&self, candidate: &UnitCandidate) -> Result<(), Rejection> {
        let c = self.criteria;

        if !c.selection.admits(&candidate.key()) {
            return Err(Rejection::Selection);
        }
        if !candidate.floor_area.overlaps(c.floor_area.low, c.floor_area.high) {
            return Err(Rejection::FloorArea);
        }
        let remaining = f64::from(candidate.remaining_lease_at(c.target_year));
        if !c.lease_range.contains(remaining) {
            return Err(Rejection::Lease);
        }
        for (kind, ceiling) in c.max_distances.iter() {
            match candidate.amenities.get(kind) {
                None => return Err(Rejection::AmenityUnknown(kind)),
                Some(km) if km > ceiling => return Err(Rejection::AmenityTooFar(kind)),
                Some(_) => {}
            }
        }
        Ok(())
    }

    pub fn check_price(&self, projection: &PriceProjection) -> Result<(), Rejection> {
        if self.criteria.budget.contains(projection.base_price) {
            Ok(())
        } else {
            Err(Rejection::Budget)
        }
    }

    /// Every hard constraint at once.
    pub fn check(
        &self,
        candidate: &UnitCandidate,
        projection: &PriceProjection,
    ) -> Result<(), Rejection> {
        self.check_static(candidate)?;
        self.check_price(projection)
    }

    pub fn retain_static(
        &self,
        candidates: Vec<UnitCandidate>,
        stats: &mut FilterStats,
    ) -> Vec<UnitCandidate> {
        candidates
            .into_iter()
            .filter(|c| stats.record(self.check_static(c)))
            .collect()
    }

    pub fn retain_priced(
        &self,
        valued: Vec<(UnitCandidate, PriceProjection)>,
        stats: &mut FilterStats,
    ) -> Vec<(UnitCandidate, PriceProjection)> {
        valued
            .into_iter()
            .filter(|(_, projection)| stats.record(self.check_price(projection)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::criteria::{AmenityCeilings, InclusiveRange, Selection};
    use crate::domain::unit::{
        AmenityDistances, FlatModel, FlatType, FloorAreaRange, StoreyRange, Town,
    };

    fn criteria() -> SearchCriteria {
        SearchCriteria {
            target_year: 2026,
            budget: InclusiveRange::new(400_000.0, 700_000.0),
            selection: Selection::default(),
            floor_area: InclusiveRange::new(70.0, 120.0),
            lease_range: InclusiveRange::new(30.0, 65.0),
            max_distances: AmenityCeilings::default(),
            destinations: Vec::new(),
        }
    }

    // Lease 1990 leaves 63 years in 2026.
    fn candidate() -> UnitCandidate {
        UnitCandidate {
            town: Town::Bedok,
            flat_type: FlatType::FourRoom,
            flat_model: FlatModel::ModelA,
            storey_range: StoreyRange::new(7, 9).unwrap(),
            floor_area: FloorAreaRange { min: 90.0, max: 100.0 },
            lease_commence_year: 1990,
            coordinate: None,
            amenities: AmenityDistances {
                mrt: Some(0.8),
                ..Default::default()
            },
        }
    }

    fn priced(price: f64) -> PriceProjection {
        PriceProjection::around(2026, price, 1990, None).unwrap()
    }

    #[test]
    fn budget_is_inclusive_at_both_ends() {
        let c = criteria();
        let stage = FilterStage::new(&c);
        assert_eq!(stage.check_price(&priced(700_000.0)), Ok(()));
        assert_eq!(stage.check_price(&priced(400_000.0)), Ok(()));
        assert_eq!(stage.check_price(&priced(700_000.01)), Err(Rejection::Budget));
        assert_eq!(stage.check_price(&priced(399_999.99)), Err(Rejection::Budget));
    }

    #[test]
    fn floor_area_passes_on_partial_overlap() {
        let mut c = criteria();
        c.floor_area = InclusiveRange::new(100.0, 130.0);
        let stage = FilterStage::new(&c);
        assert_eq!(stage.check_static(&candidate()), Ok(()));

        c.floor_area = InclusiveRange::new(100.5, 130.0);
        let stage = FilterStage::new(&c);
        assert_eq!(stage.check_static(&candidate()), Err(Rejection::FloorArea));
    }

    #[test]
    fn lease_bounds_are_inclusive() {
        let mut c = criteria();
        c.lease_range = InclusiveRange::new(63.0, 63.0);
        assert_eq!(FilterStage::new(&c).check_static(&candidate()), Ok(()));

        c.lease_range = InclusiveRange::new(64.0, 80.0);
        assert_eq!(
            FilterStage::new(&c).check_static(&candidate()),
            Err(Rejection::Lease)
        );
    }

    #[test]
    fn amenity_ceilings_fail_closed() {
        let mut c = criteria();
        c.max_distances.mrt = Some(0.8);
        assert_eq!(FilterStage::new(&c).check_static(&candidate()), Ok(()));

        c.max_distances.mrt = Some(0.5);
        assert_eq!(
            FilterStage::new(&c).check_static(&candidate()),
            Err(Rejection::AmenityTooFar(AmenityKind::Mrt))
        );

        let mut c = criteria();
        c.max_distances.hawker = Some(5.0);
        assert_eq!(
            FilterStage::new(&c).check_static(&candidate()),
            Err(Rejection::AmenityUnknown(AmenityKind::Hawker))
        );
    }

    #[test]
    fn null_ceiling_never_excludes() {
        let c = criteria();
        let mut far = candidate();
        far.amenities.mrt = Some(50.0);
        let mut unknown = candidate();
        unknown.amenities.mrt = None;
        let stage = FilterStage::new(&c);
        assert_eq!(stage.check_static(&far), Ok(()));
        assert_eq!(stage.check_static(&unknown), Ok(()));
    }

    #[test]
    fn check_combines_every_constraint() {
        let mut c = criteria();
        c.selection.towns.insert(Town::Tampines);
        let stage = FilterStage::new(&c);
        assert_eq!(
            stage.check(&candidate(), &priced(500_000.0)),
            Err(Rejection::Selection)
        );

        let c = criteria();
        let stage = FilterStage::new(&c);
        assert_eq!(stage.check(&candidate(), &priced(500_000.0)), Ok(()));
        assert_eq!(
            stage.check(&candidate(), &priced(900_000.0)),
            Err(Rejection::Budget)
        );
    }

    #[test]
    fn stats_count_each_reason() {
        let mut c = criteria();
        c.max_distances.school = Some(1.0);
        let stage = FilterStage::new(&c);

        let mut with_school = candidate();
        with_school.amenities.school = Some(0.4);
        let mut old = with_school.clone();
        old.lease_commence_year = 1950;

        let mut stats = FilterStats::default();
        let kept = stage.retain_static(vec![candidate(), with_school, old], &mut stats);
        assert_eq!(kept.len(), 1);
        assert_eq!(stats.passed, 1);
        assert_eq!(stats.rejected_total(), 2);
        assert_eq!(stats.rejected[&Rejection::Lease], 1);
        assert_eq!(
            stats.rejected[&Rejection::AmenityUnknown(AmenityKind::School)],
            1
        );
    }
}

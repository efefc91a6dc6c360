use crate::domain::destination::Destination;
use crate::domain::unit::{AmenityKind, CandidateKey, FlatModel, FlatType, StoreyRange, Town};
use crate::time::horizon;
use anyhow::ensure;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Closed interval `[low, high]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InclusiveRange {
    pub low: f64,
    pub high: f64,
}

impl InclusiveRange {
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    pub fn contains(&self, value: f64) -> bool {
        self.low <= value && value <= self.high
    }

    pub fn midpoint(&self) -> f64 {
        (self.low + self.high) / 2.0
    }

    pub fn width(&self) -> f64 {
        self.high - self.low
    }

    fn validate(&self, what: &str) -> anyhow::Result<()> {
        ensure!(
            self.low.is_finite() && self.high.is_finite(),
            "{what} bounds must be finite numbers"
        );
        ensure!(self.low >= 0.0, "{what} lower bound must be non-negative");
        ensure!(
            self.low <= self.high,
            "{what} range is inverted: {} > {}",
            self.low,
            self.high
        );
        Ok(())
    }
}

/// Categorical filters. An empty set admits every value of that dimension.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    pub towns: BTreeSet<Town>,
    pub flat_types: BTreeSet<FlatType>,
    pub flat_models: BTreeSet<FlatModel>,
    pub storey_ranges: BTreeSet<StoreyRange>,
}

impl Selection {
    pub fn admits(&self, key: &CandidateKey) -> bool {
        admits(&self.towns, &key.town)
            && admits(&self.flat_types, &key.flat_type)
            && admits(&self.flat_models, &key.flat_model)
            && admits(&self.storey_ranges, &key.storey_range)
    }
}

fn admits<T: Ord>(set: &BTreeSet<T>, value: &T) -> bool {
    set.is_empty() || set.contains(value)
}

/// Per-category distance ceilings in km. `None` leaves that category unconstrained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AmenityCeilings {
    pub mrt: Option<f64>,
    pub school: Option<f64>,
    pub mall: Option<f64>,
    pub hawker: Option<f64>,
}

impl AmenityCeilings {
    pub fn get(&self, kind: AmenityKind) -> Option<f64> {
        match kind {
            AmenityKind::Mrt => self.mrt,
            AmenityKind::School => self.school,
            AmenityKind::Mall => self.mall,
            AmenityKind::Hawker => self.hawker,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (AmenityKind, f64)> + '_ {
        AmenityKind::ALL
            .into_iter()
            .filter_map(|kind| self.get(kind).map(|ceiling| (kind, ceiling)))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchCriteria {
    pub target_year: i32,
    pub budget: InclusiveRange,
    pub selection: Selection,
    pub floor_area: InclusiveRange,
    pub lease_range: InclusiveRange,
    pub max_distances: AmenityCeilings,
    pub destinations: Vec<Destination>,
}

impl SearchCriteria {
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            horizon::TARGET_YEARS.contains(&self.target_year),
            "target year must be within {}..={} (got {})",
            horizon::TARGET_YEARS.start(),
            horizon::TARGET_YEARS.end(),
            self.target_year
        );
        self.budget.validate("budget")?;
        self.floor_area.validate("floor area")?;
        self.lease_range.validate("lease")?;

        for (kind, ceiling) in self.max_distances.iter() {
            ensure!(
                ceiling.is_finite() && ceiling >= 0.0,
                "max distance for {} must be a non-negative number",
                kind.label()
            );
        }

        for destination in &self.destinations {
            if let Some(coordinate) = destination.coordinate {
                ensure!(
                    coordinate.is_valid(),
                    "destination {:?} has an out-of-range coordinate",
                    destination.label
                );
            }
        }

        Ok(())
    }
}

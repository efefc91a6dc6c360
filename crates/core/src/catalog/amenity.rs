use crate::catalog::types::{AmenitySites, Site};
use crate::domain::geo::{distance_km, Coordinate};
use crate::domain::unit::{AmenityDistances, AmenityKind};

/// Nearest-site lookup per amenity category.
#[derive(Debug, Clone, Default)]
pub struct AmenityIndex {
    mrt: Vec<Coordinate>,
    school: Vec<Coordinate>,
    mall: Vec<Coordinate>,
    hawker: Vec<Coordinate>,
}

impl AmenityIndex {
    pub fn from_sites(sites: &AmenitySites) -> Self {
        fn coords(sites: &[Site]) -> Vec<Coordinate> {
            sites
                .iter()
                .map(|s| Coordinate::new(s.lat, s.lon))
                .filter(Coordinate::is_valid)
                .collect()
        }

        Self {
            mrt: coords(&sites.mrt),
            school: coords(&sites.school),
            mall: coords(&sites.mall),
            hawker: coords(&sites.hawker),
        }
    }

    fn sites(&self, kind: AmenityKind) -> &[Coordinate] {
        match kind {
            AmenityKind::Mrt => &self.mrt,
            AmenityKind::School => &self.school,
            AmenityKind::Mall => &self.mall,
            AmenityKind::Hawker => &self.hawker,
        }
    }

    pub fn is_empty(&self) -> bool {
        AmenityKind::ALL.iter().all(|k| self.sites(*k).is_empty())
    }

    pub fn site_count(&self, kind: AmenityKind) -> usize {
        self.sites(kind).len()
    }

    /// Distance to the closest site of `kind`, or `None` when no site is known.
    pub fn nearest(&self, kind: AmenityKind, from: Coordinate) -> Option<f64> {
        self.sites(kind)
            .iter()
            .map(|site| distance_km(from, *site))
            .min_by(f64::total_cmp)
    }

    pub fn distances_from(&self, from: Coordinate) -> AmenityDistances {
        let mut out = AmenityDistances::default();
        for kind in AmenityKind::ALL {
            out.set(kind, self.nearest(kind, from));
        }
        out
    }
}

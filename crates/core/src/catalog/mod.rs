pub mod amenity;
pub mod http;
pub mod inventory;
pub mod reference;
pub mod types;

use crate::catalog::amenity::AmenityIndex;
use crate::catalog::types::{LocationData, NamedPlace, PoiCategory};
use crate::config::Settings;
use crate::domain::geo::Coordinate;
use crate::domain::recommendation::Diagnostic;
use crate::domain::unit::{FlatModel, FlatType, Town, UnitCandidate};
use anyhow::{Context, Result};
use std::path::Path;

/// Source of known housing segments (town x type x model x storey) with representative
/// coordinates and floor-area/lease figures.
#[async_trait::async_trait]
pub trait InventorySource: Send + Sync {
    fn source_name(&self) -> &'static str;

    /// Fails when the backing store is unreachable or its payload has the wrong shape. Single
    /// unreadable rows are reported in [`SegmentBatch::rejected`] instead.
    async fn fetch_segments(&self) -> Result<SegmentBatch>;
}

/// One inventory fetch.
#[derive(Debug, Clone, Default)]
pub struct SegmentBatch {
    pub segments: Vec<UnitCandidate>,
    /// Rows the source returned that could not be read as segments.
    pub rejected: Vec<Diagnostic>,
}

impl From<Vec<UnitCandidate>> for SegmentBatch {
    fn from(segments: Vec<UnitCandidate>) -> Self {
        Self {
            segments,
            rejected: Vec::new(),
        }
    }
}

/// Read-only reference data: option lists, schools, POIs, work areas and amenity sites.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    locations: LocationData,
    amenities: AmenityIndex,
}

impl Catalog {
    pub fn new(locations: LocationData) -> Self {
        let amenities = AmenityIndex::from_sites(&locations.amenities);
        Self {
            locations,
            amenities,
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        match settings.locations_file.as_deref() {
            Some(path) => Self::load(Path::new(path)),
            None => {
                tracing::info!("LOCATIONS_FILE not set; catalog has no schools, POIs or amenity sites");
                Ok(Self::default())
            }
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read locations file {}", path.display()))?;
        let locations = serde_json::from_str::<LocationData>(&text)
            .with_context(|| format!("invalid locations file {}", path.display()))?;

        tracing::info!(
            path = %path.display(),
            schools = locations.schools.len(),
            poi_categories = locations.pois.len(),
            "loaded locations catalog"
        );
        Ok(Self::new(locations))
    }

    pub fn amenities(&self) -> &AmenityIndex {
        &self.amenities
    }

    pub fn towns(&self) -> Vec<&'static str> {
        let mut out: Vec<_> = Town::ALL.iter().map(|t| t.label()).collect();
        out.sort_unstable();
        out
    }

    pub fn flat_types(&self) -> Vec<&'static str> {
        FlatType::ALL.iter().map(|t| t.label()).collect()
    }

    pub fn flat_models(&self) -> Vec<&'static str> {
        FlatModel::ALL.iter().map(|m| m.label()).collect()
    }

    pub fn schools(&self) -> Vec<NamedPlace> {
        sorted_by_name(self.locations.schools.clone())
    }

    pub fn poi_categories(&self) -> Vec<PoiCategory> {
        let mut out: Vec<_> = self
            .locations
            .pois
            .iter()
            .map(|(value, pois)| PoiCategory {
                value: value.clone(),
                label: reference::poi_category_label(value),
                count: pois.len(),
            })
            .collect();
        out.sort_by(|a, b| a.label.cmp(&b.label));
        out
    }

    pub fn pois(&self, category: &str) -> Vec<NamedPlace> {
        sorted_by_name(
            self.locations
                .pois
                .get(category)
                .cloned()
                .unwrap_or_default(),
        )
    }

    pub fn work_areas(&self) -> Vec<NamedPlace> {
        reference::work_areas()
    }

    fn find_poi(&self, name: &str) -> Option<Coordinate> {
        let wanted = name.trim();
        self.locations
            .pois
            .values()
            .flatten()
            .find(|p| p.name.trim().eq_ignore_ascii_case(wanted))
            .map(NamedPlace::coordinate)
    }

    /// Work area table first, then POIs by name.
    pub fn resolve_workplace(&self, location: &str) -> Option<Coordinate> {
        reference::find_work_area(location)
            .map(|area| area.coordinate())
            .or_else(|| self.find_poi(location))
    }

    pub fn resolve_school(&self, school: &str) -> Option<Coordinate> {
        let wanted = school.trim();
        self.locations
            .schools
            .iter()
            .find(|s| s.name.trim().eq_ignore_ascii_case(wanted))
            .map(NamedPlace::coordinate)
    }

    /// Parents' homes are given as a town or an address containing one.
    pub fn resolve_home(&self, location: &str) -> Option<Coordinate> {
        Town::find_in(location).map(|t| t.profile().center)
    }

    pub fn resolve_other(&self, location: &str) -> Option<Coordinate> {
        self.resolve_workplace(location)
            .or_else(|| self.resolve_home(location))
    }
}

fn sorted_by_name(mut places: Vec<NamedPlace>) -> Vec<NamedPlace> {
    places.sort_by(|a, b| a.name.cmp(&b.name));
    places
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn catalog() -> Catalog {
        let locations: LocationData = serde_json::from_value(json!({
            "schools": [
                {"school_name": "TAMPINES PRIMARY SCHOOL", "latitude": 1.3548, "longitude": 103.9437},
                {"name": "BEDOK GREEN PRIMARY SCHOOL", "lat": 1.3262, "lon": 103.9380}
            ],
            "pois": {
                "gym": [{"name": "ActiveSG Gym Bedok", "lat": 1.3246, "lon": 103.9301}],
                "shopping_mall": [
                    {"name": "Tampines Mall", "lat": 1.3526, "lon": 103.9448},
                    {"name": "Bedok Mall", "lat": 1.3249, "lon": 103.9295}
                ]
            },
            "amenities": {"mrt": [{"lat": 1.3240, "lon": 103.9300}]}
        }))
        .unwrap();
        Catalog::new(locations)
    }

    #[test]
    fn lists_sorted_options() {
        let c = catalog();
        assert_eq!(c.towns().len(), 26);
        assert_eq!(c.towns()[0], "ANG MO KIO");
        assert_eq!(c.schools()[0].name, "BEDOK GREEN PRIMARY SCHOOL");
        assert_eq!(c.pois("shopping_mall")[0].name, "Bedok Mall");
        assert!(c.pois("bakery").is_empty());

        let categories = c.poi_categories();
        assert_eq!(categories[0].label, "Gym / Fitness");
        assert_eq!(categories[1].value, "shopping_mall");
        assert_eq!(categories[1].count, 2);
    }

    #[test]
    fn resolves_destinations_through_the_fallback_chain() {
        let c = catalog();
        assert_eq!(
            c.resolve_workplace("Marina Bay"),
            Some(Coordinate::new(1.2789, 103.8536))
        );
        assert_eq!(
            c.resolve_workplace("tampines mall"),
            Some(Coordinate::new(1.3526, 103.9448))
        );
        assert_eq!(
            c.resolve_school("Tampines Primary School"),
            Some(Coordinate::new(1.3548, 103.9437))
        );
        assert_eq!(
            c.resolve_home("Blk 12 Bedok North"),
            Some(Town::Bedok.profile().center)
        );
        assert_eq!(
            c.resolve_other("Serangoon"),
            Some(Town::Serangoon.profile().center)
        );
        assert_eq!(c.resolve_school("Hogwarts"), None);
        assert_eq!(c.resolve_other("Atlantis"), None);
    }

    #[test]
    fn amenity_index_is_built_from_locations() {
        let c = catalog();
        assert!(!c.amenities().is_empty());
        assert!(Catalog::default().amenities().is_empty());
    }
}

use crate::domain::geo::Coordinate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A named point such as a school, POI or work area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedPlace {
    #[serde(alias = "school_name")]
    pub name: String,
    #[serde(alias = "latitude")]
    pub lat: f64,
    #[serde(alias = "longitude")]
    pub lon: f64,
}

impl NamedPlace {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lon)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Site {
    #[serde(alias = "latitude")]
    pub lat: f64,
    #[serde(alias = "longitude")]
    pub lon: f64,
}

/// Amenity sites per scoring category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AmenitySites {
    #[serde(default)]
    pub mrt: Vec<Site>,
    #[serde(default)]
    pub school: Vec<Site>,
    #[serde(default)]
    pub mall: Vec<Site>,
    #[serde(default)]
    pub hawker: Vec<Site>,
}

/// Contents of the locations file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationData {
    #[serde(default)]
    pub schools: Vec<NamedPlace>,
    #[serde(default)]
    pub pois: BTreeMap<String, Vec<NamedPlace>>,
    #[serde(default)]
    pub amenities: AmenitySites,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoiCategory {
    pub value: String,
    pub label: String,
    pub count: usize,
}

/// Shape returned by a remote inventory service. Rows are decoded one by one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryResponse {
    pub segments: Vec<serde_json::Value>,
}

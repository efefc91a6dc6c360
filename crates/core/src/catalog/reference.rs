//! Built-in reference tables: business districts, POI category labels and a representative
//! inventory used when no inventory source is configured.

use crate::catalog::types::NamedPlace;
use crate::domain::unit::{AmenityDistances, FlatModel, FlatType, StoreyRange, Town, UnitCandidate};

const WORK_AREAS: [(&str, f64, f64); 24] = [
    ("Alexandra", 1.2880, 103.8020),
    ("Bugis", 1.3005, 103.8550),
    ("Buona Vista", 1.3070, 103.7900),
    ("CBD (Raffles Place)", 1.2840, 103.8515),
    ("Changi Business Park", 1.3345, 103.9650),
    ("City Hall", 1.2930, 103.8520),
    ("Dhoby Ghaut", 1.2990, 103.8460),
    ("Harbourfront", 1.2655, 103.8200),
    ("Jurong East", 1.3329, 103.7436),
    ("Jurong Island", 1.2660, 103.6990),
    ("Mapletree Business City", 1.3027, 103.7895),
    ("Marina Bay", 1.2789, 103.8536),
    ("Novena", 1.3204, 103.8438),
    ("One North", 1.2990, 103.7873),
    ("Orchard Road", 1.3050, 103.8320),
    ("Outram", 1.2800, 103.8390),
    ("Paya Lebar", 1.3180, 103.8930),
    ("Science Park", 1.2960, 103.7870),
    ("Shenton Way", 1.2760, 103.8460),
    ("Suntec City", 1.2940, 103.8570),
    ("Tampines", 1.3534, 103.9450),
    ("Tanjong Pagar", 1.2764, 103.8466),
    ("Tuas", 1.3150, 103.6360),
    ("Woodlands", 1.4360, 103.7865),
];

/// Common business districts, sorted by name.
pub fn work_areas() -> Vec<NamedPlace> {
    WORK_AREAS
        .iter()
        .map(|(name, lat, lon)| NamedPlace {
            name: (*name).to_string(),
            lat: *lat,
            lon: *lon,
        })
        .collect()
}

pub fn find_work_area(name: &str) -> Option<NamedPlace> {
    let wanted = name.trim();
    work_areas()
        .into_iter()
        .find(|area| area.name.eq_ignore_ascii_case(wanted))
}

/// Display label for a POI category key, e.g. `shopping_mall` -> "Shopping Mall".
pub fn poi_category_label(category: &str) -> String {
    let known = match category {
        "gym" => Some("Gym / Fitness"),
        "atm" => Some("ATM"),
        "attraction" => Some("Attraction / Tourist Spot"),
        "yoga" => Some("Yoga Studio"),
        "co_working" => Some("Co-working Space"),
        "charging_station" => Some("EV Charging Station"),
        "viewpoint" => Some("Viewpoint / Scenic Spot"),
        _ => None,
    };
    if let Some(label) = known {
        return label.to_string();
    }

    category
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

const REFERENCE_MODELS: [FlatModel; 3] =
    [FlatModel::Improved, FlatModel::ModelA, FlatModel::NewGeneration];

const REFERENCE_STOREYS: [(u8, u8); 4] = [(4, 6), (7, 9), (10, 12), (13, 15)];

/// One representative segment per town x flat type x common model x common storey band, placed
/// at the town centre with the flat type's typical floor area and the town's typical lease year.
pub fn reference_segments() -> Vec<UnitCandidate> {
    let mut out = Vec::with_capacity(
        Town::ALL.len() * FlatType::ALL.len() * REFERENCE_MODELS.len() * REFERENCE_STOREYS.len(),
    );

    for town in Town::ALL {
        let profile = town.profile();
        for flat_type in FlatType::ALL {
            for flat_model in REFERENCE_MODELS {
                for (low, high) in REFERENCE_STOREYS {
                    let Ok(storey_range) = StoreyRange::new(low, high) else {
                        continue;
                    };
                    out.push(UnitCandidate {
                        town,
                        flat_type,
                        flat_model,
                        storey_range,
                        floor_area: flat_type.typical_floor_area(),
                        lease_commence_year: profile.typical_lease_commence_year,
                        coordinate: Some(profile.center),
                        amenities: AmenityDistances::default(),
                    });
                }
            }
        }
    }

    out
}

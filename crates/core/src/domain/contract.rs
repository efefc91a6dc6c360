//! JSON boundary: the form-shaped recommend request, the ranked response, the predict payloads
//! and the failure envelope.

use crate::catalog::Catalog;
use crate::domain::criteria::{AmenityCeilings, InclusiveRange, SearchCriteria, Selection};
use crate::domain::destination::{Destination, DestinationCategory, VisitFrequency};
use crate::domain::geo::Coordinate;
use crate::domain::recommendation::{
    round_to_thousand, Diagnostic, PriceProjection, Recommendation, RecommendationSet, Subscores,
};
use crate::domain::unit::{FlatModel, FlatType, StoreyRange, Town};
use crate::error::RecommendError;
use crate::oracle::{UnitDescription, Valuation};
use anyhow::{bail, ensure, Context};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecommendRequest {
    pub target_year: i32,
    pub budget: Vec<f64>,
    pub towns: Vec<String>,
    pub flat_types: Vec<String>,
    pub flat_models: Vec<String>,
    pub floor_area: Vec<f64>,
    pub storey_ranges: Vec<String>,
    pub lease_range: Vec<f64>,
    pub max_distances: AmenityCeilings,
    pub destinations: WireDestinations,
}

impl Default for RecommendRequest {
    fn default() -> Self {
        Self {
            target_year: 2026,
            budget: vec![400_000.0, 700_000.0],
            towns: Vec::new(),
            flat_types: Vec::new(),
            flat_models: Vec::new(),
            floor_area: vec![70.0, 120.0],
            storey_ranges: Vec::new(),
            lease_range: vec![30.0, 65.0],
            max_distances: AmenityCeilings::default(),
            destinations: WireDestinations::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WireDestinations {
    pub work_locations: Vec<WorkLocation>,
    pub school_locations: Vec<SchoolLocation>,
    pub parents_homes: Vec<ParentHome>,
    pub other_destinations: Vec<OtherDestination>,
}

/// Explicit coordinates, when the client already geocoded the place.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WirePoint {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl WirePoint {
    fn coordinate(&self) -> Option<Coordinate> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some(Coordinate::new(lat, lon)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkLocation {
    pub person: String,
    pub location: String,
    pub frequency: Option<String>,
    #[serde(flatten)]
    pub point: WirePoint,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SchoolLocation {
    pub child: String,
    pub school: String,
    #[serde(flatten)]
    pub point: WirePoint,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParentHome {
    pub parent: String,
    pub location: String,
    pub frequency: Option<String>,
    #[serde(flatten)]
    pub point: WirePoint,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OtherDestination {
    pub name: String,
    pub location: String,
    pub category: Option<String>,
    pub frequency: Option<String>,
    #[serde(flatten)]
    pub point: WirePoint,
}

fn pair(values: &[f64], what: &str) -> anyhow::Result<InclusiveRange> {
    let [low, high] = values else {
        bail!("{what} must be a [low, high] pair (got {} values)", values.len());
    };
    Ok(InclusiveRange::new(*low, *high))
}

fn frequency(raw: Option<&str>, category: DestinationCategory) -> anyhow::Result<VisitFrequency> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(category.default_frequency()),
        Some(label) => {
            VisitFrequency::parse(label).with_context(|| format!("unknown visit frequency {label:?}"))
        }
    }
}

fn or_default<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        fallback
    } else {
        trimmed
    }
}

impl RecommendRequest {
    pub fn validate_and_into_criteria(
        self,
        catalog: &Catalog,
    ) -> Result<SearchCriteria, RecommendError> {
        let criteria = self.into_criteria(catalog).map_err(RecommendError::invalid)?;
        criteria.validate().map_err(RecommendError::invalid)?;
        Ok(criteria)
    }

    fn into_criteria(self, catalog: &Catalog) -> anyhow::Result<SearchCriteria> {
        let mut selection = Selection::default();
        for raw in &self.towns {
            selection
                .towns
                .insert(Town::parse(raw).with_context(|| format!("unknown town {raw:?}"))?);
        }
        for raw in &self.flat_types {
            selection.flat_types.insert(
                FlatType::parse(raw).with_context(|| format!("unknown flat type {raw:?}"))?,
            );
        }
        for raw in &self.flat_models {
            selection.flat_models.insert(
                FlatModel::parse(raw).with_context(|| format!("unknown flat model {raw:?}"))?,
            );
        }
        for raw in &self.storey_ranges {
            selection.storey_ranges.insert(StoreyRange::parse(raw)?);
        }

        Ok(SearchCriteria {
            target_year: self.target_year,
            budget: pair(&self.budget, "budget")?,
            selection,
            floor_area: pair(&self.floor_area, "floorArea")?,
            lease_range: pair(&self.lease_range, "leaseRange")?,
            max_distances: self.max_distances,
            destinations: self.destinations.resolve(catalog)?,
        })
    }
}

impl WireDestinations {
    /// Entries without a location are dropped. Entries whose location cannot be resolved are
    /// kept without a coordinate.
    pub fn resolve(&self, catalog: &Catalog) -> anyhow::Result<Vec<Destination>> {
        let mut out = Vec::new();

        for w in &self.work_locations {
            if w.location.trim().is_empty() {
                continue;
            }
            let category = DestinationCategory::Work;
            out.push(Destination {
                category,
                label: format!("Work ({})", or_default(&w.person, "You")),
                coordinate: w
                    .point
                    .coordinate()
                    .or_else(|| catalog.resolve_workplace(&w.location)),
                frequency: frequency(w.frequency.as_deref(), category)?,
            });
        }

        for s in &self.school_locations {
            if s.school.trim().is_empty() {
                continue;
            }
            let category = DestinationCategory::School;
            out.push(Destination {
                category,
                label: format!("School ({})", or_default(&s.child, "Child")),
                coordinate: s
                    .point
                    .coordinate()
                    .or_else(|| catalog.resolve_school(&s.school)),
                frequency: category.default_frequency(),
            });
        }

        for p in &self.parents_homes {
            if p.location.trim().is_empty() {
                continue;
            }
            let category = DestinationCategory::ParentHome;
            out.push(Destination {
                category,
                label: format!("Parents ({})", or_default(&p.parent, "Parent")),
                coordinate: p
                    .point
                    .coordinate()
                    .or_else(|| catalog.resolve_home(&p.location)),
                frequency: frequency(p.frequency.as_deref(), category)?,
            });
        }

        for o in &self.other_destinations {
            if o.location.trim().is_empty() {
                continue;
            }
            let category = DestinationCategory::Other;
            out.push(Destination {
                category,
                label: or_default(&o.name, &o.location).to_string(),
                coordinate: o
                    .point
                    .coordinate()
                    .or_else(|| catalog.resolve_other(&o.location)),
                frequency: frequency(o.frequency.as_deref(), category)?,
            });
        }

        Ok(out)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceRange {
    pub low: f64,
    pub high: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WireFloorArea {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WireDistances {
    pub mrt: Option<f64>,
    pub school: Option<f64>,
    pub mall: Option<f64>,
    pub hawker: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireRecommendation {
    pub id: String,
    pub town: Town,
    pub flat_type: FlatType,
    pub flat_model: FlatModel,
    pub predicted_price: f64,
    pub price_range: PriceRange,
    pub floor_area: WireFloorArea,
    pub storey_range: StoreyRange,
    pub remaining_lease: u32,
    pub distances: WireDistances,
    pub match_score: u8,
    pub scores: Subscores,
}

fn round1(km: Option<f64>) -> Option<f64> {
    km.map(|v| (v * 10.0).round() / 10.0)
}

impl From<&Recommendation> for WireRecommendation {
    fn from(r: &Recommendation) -> Self {
        let c = &r.candidate;
        let a = &c.amenities;
        Self {
            id: r.key().to_string(),
            town: c.town,
            flat_type: c.flat_type,
            flat_model: c.flat_model,
            predicted_price: round_to_thousand(r.projection.base_price),
            price_range: PriceRange {
                low: r.projection.lower_bound,
                high: r.projection.upper_bound,
            },
            floor_area: WireFloorArea {
                min: c.floor_area.min,
                max: c.floor_area.max,
            },
            storey_range: c.storey_range,
            remaining_lease: r.projection.remaining_lease_years,
            distances: WireDistances {
                mrt: round1(a.mrt),
                school: round1(a.school),
                mall: round1(a.mall),
                hawker: round1(a.hawker),
            },
            match_score: r.match_score,
            scores: r.subscores,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendResponse {
    pub success: bool,
    pub total_candidates: usize,
    pub recommendations: Vec<WireRecommendation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

impl From<&RecommendationSet> for RecommendResponse {
    fn from(set: &RecommendationSet) -> Self {
        Self {
            success: true,
            total_candidates: set.total_candidates,
            recommendations: set.recommendations.iter().map(WireRecommendation::from).collect(),
            message: set.message().map(str::to_string),
            diagnostics: set.diagnostics.clone(),
        }
    }
}

/// `{success: false, error}` returned for every failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl ErrorEnvelope {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            kind: None,
        }
    }
}

impl From<&RecommendError> for ErrorEnvelope {
    fn from(err: &RecommendError) -> Self {
        Self {
            success: false,
            error: err.to_string(),
            kind: Some(err.kind().to_string()),
        }
    }
}

/// Single-year valuation request. Extra address fields such as `block` are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct PredictRequest {
    #[serde(flatten)]
    pub unit: UnitDescription,
    #[serde(default)]
    pub year: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MultiYearPredictRequest {
    #[serde(flatten)]
    pub unit: UnitDescription,
    #[serde(default)]
    pub years: Option<Vec<i32>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictResponse {
    pub success: bool,
    pub year: i32,
    pub predicted_price: f64,
    pub formatted_price: String,
    pub price_range: PriceRange,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend_multiplier: Option<f64>,
    pub remaining_lease: u32,
}

impl PredictResponse {
    pub fn new(valuation: &Valuation, projection: &PriceProjection) -> Self {
        Self {
            success: true,
            year: projection.year,
            predicted_price: projection.base_price,
            formatted_price: format_price(projection.base_price),
            price_range: PriceRange {
                low: projection.lower_bound,
                high: projection.upper_bound,
            },
            base_price: valuation.base_price,
            trend_multiplier: valuation.trend_multiplier,
            remaining_lease: projection.remaining_lease_years,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearPrediction {
    pub year: i32,
    pub predicted_price: f64,
    pub formatted_price: String,
    pub price_range: PriceRange,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend_multiplier: Option<f64>,
    pub remaining_lease: u32,
    pub yoy_change: Option<f64>,
}

impl From<&PriceProjection> for YearPrediction {
    fn from(p: &PriceProjection) -> Self {
        Self {
            year: p.year,
            predicted_price: p.base_price,
            formatted_price: format_price(p.base_price),
            price_range: PriceRange {
                low: p.lower_bound,
                high: p.upper_bound,
            },
            trend_multiplier: p.trend_multiplier,
            remaining_lease: p.remaining_lease_years,
            yoy_change: p.yoy_change_pct,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MultiYearPredictResponse {
    pub success: bool,
    pub predictions: Vec<YearPrediction>,
}

/// `$612,000`
pub fn format_price(price: f64) -> String {
    let whole = price.round().max(0.0) as u64;
    let digits = whole.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    out.push('$');
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Resolve the projection years of a multi-year request.
pub fn requested_years(years: Option<Vec<i32>>, default_from: i32) -> anyhow::Result<Vec<i32>> {
    let years = years.unwrap_or_else(|| crate::time::horizon::trajectory_years(default_from));
    ensure!(!years.is_empty(), "years must not be empty");
    Ok(years)
}

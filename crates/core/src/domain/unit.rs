use crate::domain::geo::Coordinate;
use anyhow::{bail, ensure};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const LEASE_TERM_YEARS: i32 = 99;

/// Remaining years of a 99-year leasehold at `year`, clamped at zero.
pub fn remaining_lease_years(lease_commence_year: i32, year: i32) -> u32 {
    (LEASE_TERM_YEARS - (year - lease_commence_year)).max(0) as u32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Town {
    AngMoKio,
    Bedok,
    Bishan,
    BukitBatok,
    BukitMerah,
    BukitPanjang,
    BukitTimah,
    CentralArea,
    ChoaChuKang,
    Clementi,
    Geylang,
    Hougang,
    JurongEast,
    JurongWest,
    KallangWhampoa,
    MarineParade,
    PasirRis,
    Punggol,
    Queenstown,
    Sembawang,
    Sengkang,
    Serangoon,
    Tampines,
    ToaPayoh,
    Woodlands,
    Yishun,
}

/// Static reference figures for a town.
#[derive(Debug, Clone, Copy)]
pub struct TownProfile {
    pub label: &'static str,
    pub center: Coordinate,
    /// Location premium applied by the closed-form valuation.
    pub price_multiplier: f64,
    pub typical_lease_commence_year: i32,
}

const fn profile(
    label: &'static str,
    lat: f64,
    lon: f64,
    price_multiplier: f64,
    typical_lease_commence_year: i32,
) -> TownProfile {
    TownProfile {
        label,
        center: Coordinate::new(lat, lon),
        price_multiplier,
        typical_lease_commence_year,
    }
}

impl Town {
    pub const ALL: [Town; 26] = [
        Town::AngMoKio,
        Town::Bedok,
        Town::Bishan,
        Town::BukitBatok,
        Town::BukitMerah,
        Town::BukitPanjang,
        Town::BukitTimah,
        Town::CentralArea,
        Town::ChoaChuKang,
        Town::Clementi,
        Town::Geylang,
        Town::Hougang,
        Town::JurongEast,
        Town::JurongWest,
        Town::KallangWhampoa,
        Town::MarineParade,
        Town::PasirRis,
        Town::Punggol,
        Town::Queenstown,
        Town::Sembawang,
        Town::Sengkang,
        Town::Serangoon,
        Town::Tampines,
        Town::ToaPayoh,
        Town::Woodlands,
        Town::Yishun,
    ];

    pub const fn profile(self) -> TownProfile {
        match self {
            Town::AngMoKio => profile("ANG MO KIO", 1.3691, 103.8454, 1.15, 1985),
            Town::Bedok => profile("BEDOK", 1.3236, 103.9273, 1.08, 1988),
            Town::Bishan => profile("BISHAN", 1.3526, 103.8352, 1.35, 1990),
            Town::BukitBatok => profile("BUKIT BATOK", 1.3590, 103.7637, 0.98, 1988),
            Town::BukitMerah => profile("BUKIT MERAH", 1.2819, 103.8239, 1.18, 1980),
            Town::BukitPanjang => profile("BUKIT PANJANG", 1.3774, 103.7719, 0.95, 1995),
            Town::BukitTimah => profile("BUKIT TIMAH", 1.3294, 103.8021, 1.50, 1985),
            Town::CentralArea => profile("CENTRAL AREA", 1.2905, 103.8520, 1.55, 1985),
            Town::ChoaChuKang => profile("CHOA CHU KANG", 1.3840, 103.7470, 0.95, 1998),
            Town::Clementi => profile("CLEMENTI", 1.3162, 103.7649, 1.20, 1985),
            Town::Geylang => profile("GEYLANG", 1.3201, 103.8918, 1.10, 1980),
            Town::Hougang => profile("HOUGANG", 1.3612, 103.8863, 1.02, 1992),
            Town::JurongEast => profile("JURONG EAST", 1.3329, 103.7436, 1.00, 1988),
            Town::JurongWest => profile("JURONG WEST", 1.3404, 103.7090, 0.95, 1992),
            Town::KallangWhampoa => profile("KALLANG/WHAMPOA", 1.3100, 103.8651, 1.25, 1978),
            Town::MarineParade => profile("MARINE PARADE", 1.3020, 103.9072, 1.25, 1980),
            Town::PasirRis => profile("PASIR RIS", 1.3721, 103.9494, 1.00, 1992),
            Town::Punggol => profile("PUNGGOL", 1.3984, 103.9072, 1.02, 2012),
            Town::Queenstown => profile("QUEENSTOWN", 1.2942, 103.7861, 1.40, 1975),
            Town::Sembawang => profile("SEMBAWANG", 1.4491, 103.8185, 0.90, 2002),
            Town::Sengkang => profile("SENGKANG", 1.3868, 103.8914, 0.98, 2005),
            Town::Serangoon => profile("SERANGOON", 1.3554, 103.8679, 1.12, 1988),
            Town::Tampines => profile("TAMPINES", 1.3534, 103.9450, 1.08, 1988),
            Town::ToaPayoh => profile("TOA PAYOH", 1.3343, 103.8563, 1.28, 1975),
            Town::Woodlands => profile("WOODLANDS", 1.4360, 103.7865, 0.92, 1998),
            Town::Yishun => profile("YISHUN", 1.4304, 103.8354, 0.95, 1995),
        }
    }

    pub const fn label(self) -> &'static str {
        self.profile().label
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let wanted = raw.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.label().eq_ignore_ascii_case(wanted))
    }

    /// Loose match used for free-text addresses such as "Blk 123 Tampines St 11".
    pub fn find_in(text: &str) -> Option<Self> {
        let lower = text.trim().to_ascii_lowercase();
        if lower.is_empty() {
            return None;
        }
        Self::ALL.into_iter().find(|t| {
            let label = t.label().to_ascii_lowercase();
            lower.contains(&label) || label.contains(&lower)
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FlatType {
    TwoRoom,
    ThreeRoom,
    FourRoom,
    FiveRoom,
    Executive,
    MultiGeneration,
}

impl FlatType {
    pub const ALL: [FlatType; 6] = [
        FlatType::TwoRoom,
        FlatType::ThreeRoom,
        FlatType::FourRoom,
        FlatType::FiveRoom,
        FlatType::Executive,
        FlatType::MultiGeneration,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            FlatType::TwoRoom => "2 ROOM",
            FlatType::ThreeRoom => "3 ROOM",
            FlatType::FourRoom => "4 ROOM",
            FlatType::FiveRoom => "5 ROOM",
            FlatType::Executive => "EXECUTIVE",
            FlatType::MultiGeneration => "MULTI-GENERATION",
        }
    }

    /// Typical floor area in square meters.
    pub const fn typical_floor_area(self) -> FloorAreaRange {
        let (min, max) = match self {
            FlatType::TwoRoom => (45.0, 50.0),
            FlatType::ThreeRoom => (65.0, 75.0),
            FlatType::FourRoom => (90.0, 100.0),
            FlatType::FiveRoom => (110.0, 120.0),
            FlatType::Executive => (145.0, 155.0),
            FlatType::MultiGeneration => (160.0, 170.0),
        };
        FloorAreaRange { min, max }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let wanted = raw.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.label().eq_ignore_ascii_case(wanted))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FlatModel {
    Improved,
    NewGeneration,
    ModelA,
    Standard,
    Simplified,
    PremiumApartment,
    Maisonette,
    Apartment,
    Dbss,
    ModelA2,
    PremiumApartmentLoft,
    ThreeGen,
}

impl FlatModel {
    pub const ALL: [FlatModel; 12] = [
        FlatModel::Improved,
        FlatModel::NewGeneration,
        FlatModel::ModelA,
        FlatModel::Standard,
        FlatModel::Simplified,
        FlatModel::PremiumApartment,
        FlatModel::Maisonette,
        FlatModel::Apartment,
        FlatModel::Dbss,
        FlatModel::ModelA2,
        FlatModel::PremiumApartmentLoft,
        FlatModel::ThreeGen,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            FlatModel::Improved => "Improved",
            FlatModel::NewGeneration => "New Generation",
            FlatModel::ModelA => "Model A",
            FlatModel::Standard => "Standard",
            FlatModel::Simplified => "Simplified",
            FlatModel::PremiumApartment => "Premium Apartment",
            FlatModel::Maisonette => "Maisonette",
            FlatModel::Apartment => "Apartment",
            FlatModel::Dbss => "DBSS",
            FlatModel::ModelA2 => "Model A2",
            FlatModel::PremiumApartmentLoft => "Premium Apartment Loft",
            FlatModel::ThreeGen => "3Gen",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let wanted = raw.trim();
        Self::ALL
            .into_iter()
            .find(|m| m.label().eq_ignore_ascii_case(wanted))
    }
}

/// Storey bucket such as "07 TO 09". Ordered by its lower floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StoreyRange {
    low: u8,
    high: u8,
}

impl StoreyRange {
    pub fn new(low: u8, high: u8) -> anyhow::Result<Self> {
        ensure!(low > 0, "storey range must start above floor 0");
        ensure!(low <= high, "storey range is inverted: {low} > {high}");
        Ok(Self { low, high })
    }

    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let upper = raw.trim().to_ascii_uppercase();
        let Some((low, high)) = upper.split_once(" TO ") else {
            bail!("storey range must look like \"07 TO 09\" (got {raw:?})");
        };
        let low = low.trim().parse::<u8>()?;
        let high = high.trim().parse::<u8>()?;
        Self::new(low, high)
    }

    /// Numeric floor-level anchor used for valuation.
    pub const fn floor_level(&self) -> u8 {
        self.low
    }

    pub const fn high(&self) -> u8 {
        self.high
    }
}

impl fmt::Display for StoreyRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02} TO {:02}", self.low, self.high)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FloorAreaRange {
    pub min: f64,
    pub max: f64,
}

impl FloorAreaRange {
    pub fn new(min: f64, max: f64) -> anyhow::Result<Self> {
        ensure!(
            min.is_finite() && max.is_finite() && min >= 0.0,
            "floor area must be finite and non-negative"
        );
        ensure!(min <= max, "floor area range is inverted: {min} > {max}");
        Ok(Self { min, max })
    }

    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    /// Non-empty intersection, inclusive at both ends.
    pub fn overlaps(&self, low: f64, high: f64) -> bool {
        self.min <= high && self.max >= low
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmenityKind {
    Mrt,
    School,
    Mall,
    Hawker,
}

impl AmenityKind {
    pub const ALL: [AmenityKind; 4] = [
        AmenityKind::Mrt,
        AmenityKind::School,
        AmenityKind::Mall,
        AmenityKind::Hawker,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            AmenityKind::Mrt => "mrt",
            AmenityKind::School => "school",
            AmenityKind::Mall => "mall",
            AmenityKind::Hawker => "hawker",
        }
    }
}

/// Distance in km to the nearest amenity of each category; `None` when unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AmenityDistances {
    #[serde(default)]
    pub mrt: Option<f64>,
    #[serde(default)]
    pub school: Option<f64>,
    #[serde(default)]
    pub mall: Option<f64>,
    #[serde(default)]
    pub hawker: Option<f64>,
}

impl AmenityDistances {
    pub fn get(&self, kind: AmenityKind) -> Option<f64> {
        match kind {
            AmenityKind::Mrt => self.mrt,
            AmenityKind::School => self.school,
            AmenityKind::Mall => self.mall,
            AmenityKind::Hawker => self.hawker,
        }
    }

    pub fn set(&mut self, kind: AmenityKind, km: Option<f64>) {
        let slot = match kind {
            AmenityKind::Mrt => &mut self.mrt,
            AmenityKind::School => &mut self.school,
            AmenityKind::Mall => &mut self.mall,
            AmenityKind::Hawker => &mut self.hawker,
        };
        *slot = km;
    }

    /// Fill unknown categories from `other`, keeping values already present.
    pub fn or(mut self, other: AmenityDistances) -> Self {
        for kind in AmenityKind::ALL {
            if self.get(kind).is_none() {
                self.set(kind, other.get(kind));
            }
        }
        self
    }
}

/// Dedup and tie-break identity of a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CandidateKey {
    pub town: Town,
    pub flat_type: FlatType,
    pub flat_model: FlatModel,
    pub storey_range: StoreyRange,
}

impl fmt::Display for CandidateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.town.label(),
            self.flat_type.label(),
            self.flat_model.label(),
            self.storey_range
        )
    }
}

/// One housing-unit segment under consideration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitCandidate {
    pub town: Town,
    pub flat_type: FlatType,
    pub flat_model: FlatModel,
    pub storey_range: StoreyRange,
    pub floor_area: FloorAreaRange,
    pub lease_commence_year: i32,
    #[serde(default)]
    pub coordinate: Option<Coordinate>,
    #[serde(default)]
    pub amenities: AmenityDistances,
}

impl UnitCandidate {
    pub fn key(&self) -> CandidateKey {
        CandidateKey {
            town: self.town,
            flat_type: self.flat_type,
            flat_model: self.flat_model,
            storey_range: self.storey_range,
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.floor_area.min <= self.floor_area.max,
            "{}: floor area range is inverted",
            self.key()
        );
        ensure!(
            self.storey_range.floor_level() > 0,
            "{}: storey anchor must be positive",
            self.key()
        );
        if let Some(coordinate) = self.coordinate {
            ensure!(
                coordinate.is_valid(),
                "{}: coordinate out of range",
                self.key()
            );
        }
        Ok(())
    }

    /// Representative floor area used for valuation and space scoring.
    pub fn representative_floor_area(&self) -> f64 {
        self.floor_area.midpoint()
    }

    pub fn remaining_lease_at(&self, year: i32) -> u32 {
        remaining_lease_years(self.lease_commence_year, year)
    }
}

macro_rules! string_conversions {
    ($ty:ty, $what:literal) => {
        impl TryFrom<String> for $ty {
            type Error = String;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                <$ty>::parse(&value).ok_or_else(|| format!("unknown {} {value:?}", $what))
            }
        }

        impl From<$ty> for String {
            fn from(value: $ty) -> Self {
                value.label().to_string()
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

string_conversions!(Town, "town");
string_conversions!(FlatType, "flat type");
string_conversions!(FlatModel, "flat model");

impl TryFrom<String> for StoreyRange {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        StoreyRange::parse(&value).map_err(|e| format!("{e:#}"))
    }
}

impl From<StoreyRange> for String {
    fn from(value: StoreyRange) -> Self {
        value.to_string()
    }
}

use crate::domain::geo::Coordinate;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DestinationCategory {
    Work,
    School,
    ParentHome,
    Other,
}

impl DestinationCategory {
    pub const fn default_frequency(self) -> VisitFrequency {
        match self {
            DestinationCategory::Work | DestinationCategory::School => VisitFrequency::Daily,
            DestinationCategory::ParentHome | DestinationCategory::Other => VisitFrequency::Weekly,
        }
    }
}

/// How often a destination is visited, highest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum VisitFrequency {
    Daily,
    ThreeToFourPerWeek,
    TwoToThreePerWeek,
    OneToTwoPerWeek,
    Weekly,
    TwoToThreePerMonth,
    Monthly,
    Rarely,
}

impl VisitFrequency {
    pub const ORDERED: [VisitFrequency; 8] = [
        VisitFrequency::Daily,
        VisitFrequency::ThreeToFourPerWeek,
        VisitFrequency::TwoToThreePerWeek,
        VisitFrequency::OneToTwoPerWeek,
        VisitFrequency::Weekly,
        VisitFrequency::TwoToThreePerMonth,
        VisitFrequency::Monthly,
        VisitFrequency::Rarely,
    ];

    pub const fn weight(self) -> f64 {
        match self {
            VisitFrequency::Daily => 5.0,
            VisitFrequency::ThreeToFourPerWeek => 3.5,
            VisitFrequency::TwoToThreePerWeek => 2.5,
            VisitFrequency::OneToTwoPerWeek => 1.5,
            VisitFrequency::Weekly => 1.0,
            VisitFrequency::TwoToThreePerMonth => 0.5,
            VisitFrequency::Monthly => 0.25,
            VisitFrequency::Rarely => 0.05,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            VisitFrequency::Daily => "Daily (5x per week)",
            VisitFrequency::ThreeToFourPerWeek => "3-4x per week",
            VisitFrequency::TwoToThreePerWeek => "2-3x per week",
            VisitFrequency::OneToTwoPerWeek => "1-2x per week",
            VisitFrequency::Weekly => "Weekly (1x per week)",
            VisitFrequency::TwoToThreePerMonth => "2-3x per month",
            VisitFrequency::Monthly => "Monthly (1x per month)",
            VisitFrequency::Rarely => "Rarely",
        }
    }

    /// Accepts the form labels and their short aliases. Anything else is rejected.
    pub fn parse(raw: &str) -> Option<Self> {
        let key = raw.trim().to_ascii_lowercase();
        let parsed = match key.as_str() {
            "daily (5x per week)" | "daily (5x/week)" | "daily" => VisitFrequency::Daily,
            "3-4x per week" | "3-4_per_week" => VisitFrequency::ThreeToFourPerWeek,
            "2-3x per week" | "2-3_per_week" => VisitFrequency::TwoToThreePerWeek,
            "1-2x per week" | "1-2_per_week" => VisitFrequency::OneToTwoPerWeek,
            "weekly (1x per week)" | "weekly" => VisitFrequency::Weekly,
            "2-3x per month" | "2-3_per_month" => VisitFrequency::TwoToThreePerMonth,
            "monthly (1x per month)" | "monthly" | "1-2_per_month" => VisitFrequency::Monthly,
            "rarely" => VisitFrequency::Rarely,
            _ => return None,
        };
        Some(parsed)
    }
}

impl fmt::Display for VisitFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl TryFrom<String> for VisitFrequency {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        VisitFrequency::parse(&value).ok_or_else(|| format!("unknown visit frequency {value:?}"))
    }
}

impl From<VisitFrequency> for String {
    fn from(value: VisitFrequency) -> Self {
        value.label().to_string()
    }
}

/// A place the household travels to. `coordinate` is `None` when the location could not be
/// resolved; such destinations are skipped during travel aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Destination {
    pub category: DestinationCategory,
    pub label: String,
    pub coordinate: Option<Coordinate>,
    pub frequency: VisitFrequency,
}

impl Destination {
    pub fn weight(&self) -> f64 {
        self.frequency.weight()
    }
}

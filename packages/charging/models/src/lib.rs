#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Charging infrastructure domain types.
//!
//! Defines the canonical area code, the five ordered power bands every
//! station is classified into, the severity scales used by demand and
//! coverage assessment, and the non-fatal data issues collected while
//! normalizing the raw sources.

pub mod area_code;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

pub use area_code::{AREA_CODE_WIDTH, AreaCode, AreaCodeRange, InvalidAreaCodeError};

/// Charging speed band derived from a station's rated power.
///
/// Bands are half-open intervals with an inclusive lower bound, so a
/// station rated exactly on a boundary belongs to the faster band.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum PowerCategory {
    /// `[0, 11)` kW: home and overnight charging
    Slow,
    /// `[11, 22)` kW: public AC charging
    Normal,
    /// `[22, 50)` kW: public AC/DC charging
    Fast,
    /// `[50, 150)` kW: DC fast charging
    Rapid,
    /// `[150, inf)` kW: ultra-fast DC charging
    UltraRapid,
}

impl PowerCategory {
    /// All bands in ascending power order.
    pub const ALL: [Self; 5] = [
        Self::Slow,
        Self::Normal,
        Self::Fast,
        Self::Rapid,
        Self::UltraRapid,
    ];

    /// Classifies a power rating in kilowatts.
    ///
    /// Returns `None` for negative or non-finite ratings.
    #[must_use]
    pub fn classify(power_kw: f64) -> Option<Self> {
        if !power_kw.is_finite() || power_kw < 0.0 {
            return None;
        }

        Self::ALL
            .iter()
            .rev()
            .find(|category| power_kw >= category.lower_bound_kw())
            .copied()
    }

    /// Inclusive lower bound of the band in kilowatts.
    #[must_use]
    pub const fn lower_bound_kw(self) -> f64 {
        match self {
            Self::Slow => 0.0,
            Self::Normal => 11.0,
            Self::Fast => 22.0,
            Self::Rapid => 50.0,
            Self::UltraRapid => 150.0,
        }
    }

    /// Whether stations in this band count as fast chargers (50 kW and up).
    #[must_use]
    pub const fn is_fast_charger(self) -> bool {
        matches!(self, Self::Rapid | Self::UltraRapid)
    }

    /// Human-readable label including the band's range.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Slow => "Slow (<11 kW)",
            Self::Normal => "Normal (11-22 kW)",
            Self::Fast => "Fast (22-50 kW)",
            Self::Rapid => "Rapid (50-150 kW)",
            Self::UltraRapid => "Ultra-rapid (>=150 kW)",
        }
    }
}

/// Demand priority of an area, in ascending severity.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum PriorityClass {
    /// Adequate coverage
    Low,
    /// Needs attention
    Medium,
    /// Shortage
    High,
    /// Critical shortage
    Critical,
}

impl PriorityClass {
    /// Numeric urgency (0-100) used to order deployment work.
    #[must_use]
    pub const fn urgency_score(self) -> f64 {
        match self {
            Self::Low => 25.0,
            Self::Medium => 50.0,
            Self::High => 75.0,
            Self::Critical => 100.0,
        }
    }
}

/// Infrastructure coverage of an area based on station counts alone.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum CoverageLevel {
    /// No stations at all
    NoCoverage,
    /// A handful of stations
    Poor,
    /// Enough stations for day-to-day use
    Adequate,
    /// Many stations including fast chargers
    Good,
    /// Dense network with several fast chargers
    Excellent,
}

/// Population size class of an area.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum DensityCategory {
    /// Suburban or sparse
    Low,
    /// Moderate density
    Medium,
    /// Dense urban core
    High,
}

/// How a station's owning area was determined.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ResolutionMethod {
    /// The record's own area code column matched a known area.
    DeclaredKey,
    /// The station's coordinates fell inside an area polygon.
    PointInPolygon,
}

/// A charging station attributed to exactly one area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Station {
    /// Station identifier (source id column or `row-<n>`).
    pub id: String,
    /// Repaired latitude, if it parsed.
    pub latitude: Option<f64>,
    /// Repaired longitude, if it parsed.
    pub longitude: Option<f64>,
    /// Rated power in kilowatts, if present and valid.
    pub power_kw: Option<f64>,
    /// Power band; `None` exactly when `power_kw` is `None`.
    pub power_category: Option<PowerCategory>,
    /// Owning area.
    pub area_code: AreaCode,
    /// How `area_code` was determined.
    pub resolution: ResolutionMethod,
}

/// One row of the population table after key normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulationRecord {
    /// Canonical area code.
    pub area_code: AreaCode,
    /// Resident count, if present and valid.
    pub population: Option<u64>,
    /// Reference latitude (display only).
    pub latitude: Option<f64>,
    /// Reference longitude (display only).
    pub longitude: Option<f64>,
}

/// The raw source a data issue was found in.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Dataset {
    /// Charging station registry
    Stations,
    /// Residents per area
    Population,
    /// Area boundary geometries
    Geometry,
}

/// Kind of non-fatal data problem.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum IssueKind {
    /// Boundary text was empty, malformed or not a polygon.
    GeometryParseError,
    /// A value was outside its valid range; the row was dropped.
    RangeValidationError,
    /// A numeric field did not parse; the field became missing.
    NumericParseError,
    /// A station could not be attributed to any area.
    UnresolvableStation,
}

impl IssueKind {
    /// All kinds, in declaration order.
    pub const ALL: [Self; 4] = [
        Self::GeometryParseError,
        Self::RangeValidationError,
        Self::NumericParseError,
        Self::UnresolvableStation,
    ];
}

/// A non-fatal data problem found while normalizing a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataIssue {
    /// What went wrong.
    pub kind: IssueKind,
    /// Which source the row came from.
    pub dataset: Dataset,
    /// Station id or area code the issue belongs to.
    pub entity_id: String,
    /// Free-form description.
    pub detail: String,
}

impl DataIssue {
    /// Creates a new issue.
    #[must_use]
    pub fn new(
        kind: IssueKind,
        dataset: Dataset,
        entity_id: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            dataset,
            entity_id: entity_id.into(),
            detail: detail.into(),
        }
    }
}

impl std::fmt::Display for DataIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {} {}: {}",
            self.dataset, self.kind, self.entity_id, self.detail
        )
    }
}

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Output types of the analysis stages.
//!
//! These are what the presentation layer consumes: one [`AreaMetrics`] row
//! per area, the [`DemandAnalysis`] ranking, and the [`QualityReport`].

use std::collections::BTreeMap;

use evision_charging_models::{
    AreaCode, CoverageLevel, DataIssue, DensityCategory, IssueKind, PowerCategory, PriorityClass,
};
use evision_ingest_models::{MissingRatio, ResidentRowCounts, StationRowCounts};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Station counts per power band.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCounts {
    /// `[0, 11)` kW.
    pub slow: u64,
    /// `[11, 22)` kW.
    pub normal: u64,
    /// `[22, 50)` kW.
    pub fast: u64,
    /// `[50, 150)` kW.
    pub rapid: u64,
    /// `>= 150` kW.
    pub ultra_rapid: u64,
}

impl CategoryCounts {
    /// Counts one station in `category`.
    pub const fn add(&mut self, category: PowerCategory) {
        match category {
            PowerCategory::Slow => self.slow += 1,
            PowerCategory::Normal => self.normal += 1,
            PowerCategory::Fast => self.fast += 1,
            PowerCategory::Rapid => self.rapid += 1,
            PowerCategory::UltraRapid => self.ultra_rapid += 1,
        }
    }

    /// Count for one band.
    #[must_use]
    pub const fn get(&self, category: PowerCategory) -> u64 {
        match category {
            PowerCategory::Slow => self.slow,
            PowerCategory::Normal => self.normal,
            PowerCategory::Fast => self.fast,
            PowerCategory::Rapid => self.rapid,
            PowerCategory::UltraRapid => self.ultra_rapid,
        }
    }

    /// Sum over all bands.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.slow + self.normal + self.fast + self.rapid + self.ultra_rapid
    }
}

/// One row of the per-area metrics table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaMetrics {
    /// Canonical area code.
    pub area_code: AreaCode,
    /// Residents, if known.
    pub population: Option<u64>,
    /// Stations attributed to the area, including those with unknown power.
    pub station_count: u64,
    /// Stations per power band.
    pub category_counts: CategoryCounts,
    /// Stations whose power is unknown.
    pub unknown_power_count: u64,
    /// Summed rated power of stations with known power.
    pub total_capacity_kw: f64,
    /// Mean rated power of stations with known power.
    pub average_power_kw: Option<f64>,
    /// Rapid and ultra-rapid stations.
    pub fast_charger_count: u64,
    /// Coverage assessment from station counts.
    pub coverage_level: CoverageLevel,
    /// Density class, if population is known.
    pub density_category: Option<DensityCategory>,
    /// `population / max(station_count, 1)`, if population is known.
    pub residents_per_station: Option<f64>,
    /// Priority band, if population is known.
    pub priority_class: Option<PriorityClass>,
    /// Reference latitude from the population table.
    pub latitude: Option<f64>,
    /// Reference longitude from the population table.
    pub longitude: Option<f64>,
    /// Boundary, if the geometry table had a valid one.
    pub geometry: Option<geojson::Geometry>,
}

/// An area's place in the demand ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemandScore {
    /// 1-based position.
    pub rank: usize,
    /// Canonical area code.
    pub area_code: AreaCode,
    /// Residents.
    pub population: u64,
    /// Stations attributed to the area.
    pub station_count: u64,
    /// `population / max(station_count, 1)`.
    pub residents_per_station: f64,
    /// Priority band.
    pub priority_class: PriorityClass,
    /// Urgency (0-100) derived from the band.
    pub urgency_score: f64,
    /// Whether the ratio exceeds the expansion threshold.
    pub needs_expansion: bool,
}

/// Ranked demand scores plus the areas that could not be scored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemandAnalysis {
    /// Areas with known population, most underserved first.
    pub ranking: Vec<DemandScore>,
    /// Areas excluded from ranking because population is unknown.
    pub population_unknown: Vec<AreaCode>,
}

/// Distribution summary of one numeric column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryStats {
    /// Number of values.
    pub count: u64,
    /// Arithmetic mean.
    pub mean: f64,
    /// Median.
    pub median: f64,
    /// Sample standard deviation; absent for fewer than two values.
    pub std_dev: Option<f64>,
    /// Smallest value.
    pub min: f64,
    /// Largest value.
    pub max: f64,
    /// 25th percentile.
    pub q1: f64,
    /// 75th percentile.
    pub q3: f64,
    /// `q3 - q1`.
    pub iqr: f64,
}

/// Numeric column checked for outliers.
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
pub enum QualityColumn {
    /// Station rated power.
    PowerKw,
    /// Area population.
    Population,
    /// Stations per area.
    StationCount,
}

/// Which side of the IQR fence a value fell on.
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
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Fence {
    /// Below `q1 - k * iqr`.
    Lower,
    /// Above `q3 + k * iqr`.
    Upper,
}

/// A value outside its column's IQR fence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outlier {
    /// Column the value belongs to.
    pub column: QualityColumn,
    /// Station id or area code.
    pub entity_id: String,
    /// The offending value.
    pub value: f64,
    /// Fence that was breached.
    pub fence: Fence,
    /// Lower fence.
    pub lower_bound: f64,
    /// Upper fence.
    pub upper_bound: f64,
}

/// Strength of the population/station correlation.
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
pub enum CorrelationStrength {
    /// `|r|` below the weak threshold.
    Weak,
    /// Between the weak and strong thresholds.
    Moderate,
    /// `|r|` at or above the strong threshold.
    Strong,
}

/// Pearson correlation between area population and station count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Correlation {
    /// Pearson `r`.
    pub coefficient: f64,
    /// Areas that contributed a pair.
    pub pairs: u64,
    /// Strength label.
    pub strength: CorrelationStrength,
    /// Set when the correlation is weak enough to question the ranking.
    pub weak: bool,
}

/// Row accounting for the geometry table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeometryRowCounts {
    /// Data rows in the file.
    pub read: u64,
    /// Rows that did not produce a boundary.
    pub dropped: u64,
    /// Distinct boundaries kept.
    pub boundaries: u64,
}

/// Descriptive snapshot of data quality for one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityReport {
    /// Rated power of attributed stations with known power.
    pub power_kw: Option<SummaryStats>,
    /// Population of areas with known population.
    pub population: Option<SummaryStats>,
    /// Station count of every area in the joined table.
    pub station_count: Option<SummaryStats>,
    /// IQR outliers across all three columns.
    pub outliers: Vec<Outlier>,
    /// Empty-field ratios measured before repair.
    pub missing_ratios: Vec<MissingRatio>,
    /// Station registry row accounting.
    pub station_rows: StationRowCounts,
    /// Population table row accounting.
    pub resident_rows: ResidentRowCounts,
    /// Geometry table row accounting.
    pub geometry_rows: GeometryRowCounts,
    /// Issues per kind; every kind is present.
    pub issue_counts: BTreeMap<IssueKind, u64>,
    /// Every recorded issue.
    pub issues: Vec<DataIssue>,
    /// Stations excluded from aggregation.
    pub unresolvable_station_ids: Vec<String>,
    /// Population/station correlation; absent with fewer than two pairs or
    /// zero variance.
    pub correlation: Option<Correlation>,
}

impl QualityReport {
    /// Outliers in one column.
    pub fn outliers_in(&self, column: QualityColumn) -> impl Iterator<Item = &Outlier> {
        self.outliers.iter().filter(move |o| o.column == column)
    }

    /// Number of issues of one kind.
    #[must_use]
    pub fn issue_count(&self, kind: IssueKind) -> u64 {
        self.issue_counts.get(&kind).copied().unwrap_or_default()
    }
}

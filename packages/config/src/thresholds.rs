//! Threshold tables for demand, coverage, density, and quality analysis.

use evision_charging_models::{CoverageLevel, DensityCategory, PriorityClass};
use serde::{Deserialize, Serialize};

/// Lower bounds (residents per station) of the upper three priority bands.
///
/// `Low` covers everything below `medium`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriorityThresholds {
    /// Start of `Medium`.
    pub medium: f64,
    /// Start of `High`.
    pub high: f64,
    /// Start of `Critical`.
    pub critical: f64,
}

impl Default for PriorityThresholds {
    fn default() -> Self {
        Self {
            medium: 2000.0,
            high: 5000.0,
            critical: 10_000.0,
        }
    }
}

impl PriorityThresholds {
    /// Maps a residents-per-station ratio onto a priority band.
    #[must_use]
    pub fn classify(&self, residents_per_station: f64) -> PriorityClass {
        if residents_per_station >= self.critical {
            PriorityClass::Critical
        } else if residents_per_station >= self.high {
            PriorityClass::High
        } else if residents_per_station >= self.medium {
            PriorityClass::Medium
        } else {
            PriorityClass::Low
        }
    }

    /// Returns `true` if the bounds are finite, non-negative, and strictly
    /// ascending.
    #[must_use]
    pub fn is_ordered(&self) -> bool {
        [self.medium, self.high, self.critical]
            .iter()
            .all(|v| v.is_finite() && *v >= 0.0)
            && self.medium < self.high
            && self.high < self.critical
    }
}

/// Demand analysis settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemandConfig {
    /// Priority band bounds.
    pub priority_thresholds: PriorityThresholds,
    /// Areas above this many residents per station need new stations.
    pub expansion_ratio: f64,
}

impl Default for DemandConfig {
    fn default() -> Self {
        Self {
            priority_thresholds: PriorityThresholds::default(),
            expansion_ratio: 3000.0,
        }
    }
}

/// Station counts that define the coverage levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoverageThresholds {
    /// Stations needed for `Adequate`.
    pub adequate_stations: u64,
    /// Stations needed for `Good`.
    pub good_stations: u64,
    /// Fast chargers needed for `Good`.
    pub good_fast_chargers: u64,
    /// Stations needed for `Excellent`.
    pub excellent_stations: u64,
    /// Fast chargers needed for `Excellent`.
    pub excellent_fast_chargers: u64,
}

impl Default for CoverageThresholds {
    fn default() -> Self {
        Self {
            adequate_stations: 5,
            good_stations: 10,
            good_fast_chargers: 2,
            excellent_stations: 20,
            excellent_fast_chargers: 5,
        }
    }
}

impl CoverageThresholds {
    /// Assesses coverage from an area's station and fast-charger counts.
    #[must_use]
    pub const fn classify(&self, stations: u64, fast_chargers: u64) -> CoverageLevel {
        if stations == 0 {
            CoverageLevel::NoCoverage
        } else if stations >= self.excellent_stations
            && fast_chargers >= self.excellent_fast_chargers
        {
            CoverageLevel::Excellent
        } else if stations >= self.good_stations && fast_chargers >= self.good_fast_chargers {
            CoverageLevel::Good
        } else if stations >= self.adequate_stations {
            CoverageLevel::Adequate
        } else {
            CoverageLevel::Poor
        }
    }
}

/// Population bounds for the density categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DensityThresholds {
    /// Populations above this are at least `Medium`.
    pub medium_above: u64,
    /// Populations above this are `High`.
    pub high_above: u64,
}

impl Default for DensityThresholds {
    fn default() -> Self {
        Self {
            medium_above: 10_000,
            high_above: 20_000,
        }
    }
}

impl DensityThresholds {
    /// Classifies an area's population.
    #[must_use]
    pub const fn classify(&self, population: u64) -> DensityCategory {
        if population > self.high_above {
            DensityCategory::High
        } else if population > self.medium_above {
            DensityCategory::Medium
        } else {
            DensityCategory::Low
        }
    }
}

/// Quality analysis settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    /// Fence width in IQRs beyond Q1/Q3.
    pub iqr_multiplier: f64,
    /// `|r|` below this is a weak correlation.
    pub weak_correlation: f64,
    /// `|r|` at or above this is a strong correlation.
    pub strong_correlation: f64,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            iqr_multiplier: 1.5,
            weak_correlation: 0.3,
            strong_correlation: 0.7,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_bands_are_monotonic_at_boundaries() {
        let t = PriorityThresholds::default();
        assert_eq!(t.classify(1999.0), PriorityClass::Low);
        assert_eq!(t.classify(2000.0), PriorityClass::Medium);
        assert_eq!(t.classify(4999.0), PriorityClass::Medium);
        assert_eq!(t.classify(5000.0), PriorityClass::High);
        assert_eq!(t.classify(9999.0), PriorityClass::High);
        assert_eq!(t.classify(10_000.0), PriorityClass::Critical);
    }

    #[test]
    fn priority_override_table() {
        let t = PriorityThresholds {
            medium: 10.0,
            high: 20.0,
            critical: 30.0,
        };
        assert_eq!(t.classify(9.9), PriorityClass::Low);
        assert_eq!(t.classify(25.0), PriorityClass::High);
        assert_eq!(t.classify(30.0), PriorityClass::Critical);
    }

    #[test]
    fn detects_unordered_priority_table() {
        assert!(PriorityThresholds::default().is_ordered());
        let t = PriorityThresholds {
            medium: 5000.0,
            high: 2000.0,
            critical: 10_000.0,
        };
        assert!(!t.is_ordered());
        let t = PriorityThresholds {
            medium: -1.0,
            high: 2000.0,
            critical: f64::INFINITY,
        };
        assert!(!t.is_ordered());
    }

    #[test]
    fn coverage_levels() {
        let t = CoverageThresholds::default();
        assert_eq!(t.classify(0, 0), CoverageLevel::NoCoverage);
        assert_eq!(t.classify(4, 4), CoverageLevel::Poor);
        assert_eq!(t.classify(5, 0), CoverageLevel::Adequate);
        assert_eq!(t.classify(10, 1), CoverageLevel::Adequate);
        assert_eq!(t.classify(10, 2), CoverageLevel::Good);
        assert_eq!(t.classify(20, 4), CoverageLevel::Good);
        assert_eq!(t.classify(20, 5), CoverageLevel::Excellent);
    }

    #[test]
    fn density_categories() {
        let t = DensityThresholds::default();
        assert_eq!(t.classify(10_000), DensityCategory::Low);
        assert_eq!(t.classify(10_001), DensityCategory::Medium);
        assert_eq!(t.classify(20_000), DensityCategory::Medium);
        assert_eq!(t.classify(20_001), DensityCategory::High);
    }
}

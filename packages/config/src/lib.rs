#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Pipeline configuration.
//!
//! The shipped defaults live in `config/default.toml`, which is baked into
//! the binary at compile time via [`include_str!`]. A user config file has
//! the same shape; any table it leaves out falls back to the defaults.
//! The resulting [`PipelineConfig`] is passed explicitly into every
//! component so tests can substitute synthetic thresholds.

pub mod sources;
pub mod thresholds;

use std::path::{Path, PathBuf};

use evision_charging_models::AreaCodeRange;
use serde::{Deserialize, Serialize};

pub use sources::{
    GeometryColumns, GeometrySourceConfig, PopulationColumns, PopulationSourceConfig,
    SourceFormat, SourcesConfig, StationColumns, StationSourceConfig,
};
pub use thresholds::{
    CoverageThresholds, DemandConfig, DensityThresholds, PriorityThresholds, QualityConfig,
};

/// Default configuration, embedded at compile time.
const DEFAULT_CONFIG_TOML: &str = include_str!("../config/default.toml");

/// Errors that can occur while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("Failed to read config {path}: {source}")]
    Io {
        /// Path of the config file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The config file is not valid TOML for [`PipelineConfig`].
    #[error("Config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be rendered as TOML.
    #[error("Config serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// The config parsed but is semantically invalid.
    #[error("Invalid config: {message}")]
    Invalid {
        /// Description of what went wrong.
        message: String,
    },
}

/// Latitude/longitude box that valid station coordinates must fall in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Southern edge.
    pub min_lat: f64,
    /// Northern edge.
    pub max_lat: f64,
    /// Western edge.
    pub min_lon: f64,
    /// Eastern edge.
    pub max_lon: f64,
}

impl BoundingBox {
    /// Returns `true` if the point lies inside the box (edges included).
    #[must_use]
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        (self.min_lat..=self.max_lat).contains(&lat) && (self.min_lon..=self.max_lon).contains(&lon)
    }
}

/// The region under analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionConfig {
    /// Administrative region name kept by the station region filter.
    pub name: String,
    /// Smallest valid area code.
    pub area_code_min: u32,
    /// Largest valid area code.
    pub area_code_max: u32,
    /// Coordinate bounds.
    #[serde(flatten)]
    pub bounds: BoundingBox,
}

impl RegionConfig {
    /// Valid area code range for this region.
    #[must_use]
    pub const fn area_codes(&self) -> AreaCodeRange {
        AreaCodeRange::new(self.area_code_min, self.area_code_max)
    }
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            name: "Berlin".to_string(),
            area_code_min: 10_001,
            area_code_max: 14_199,
            bounds: BoundingBox {
                min_lat: 52.3,
                max_lat: 52.7,
                min_lon: 13.0,
                max_lon: 13.8,
            },
        }
    }
}

/// Filesystem locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory the three source files are read from.
    pub dataset_dir: PathBuf,
    /// Directory the metrics table and quality report are written to.
    pub output_dir: PathBuf,
    /// Directory of the content-addressed result cache.
    pub cache_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            dataset_dir: PathBuf::from("datasets"),
            output_dir: PathBuf::from("data/generated"),
            cache_dir: PathBuf::from("data/cache"),
        }
    }
}

/// Complete pipeline configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Region filter, code range and bounding box.
    pub region: RegionConfig,
    /// Filesystem locations.
    pub paths: PathsConfig,
    /// Source file layouts.
    pub sources: SourcesConfig,
    /// Demand scoring.
    pub demand: DemandConfig,
    /// Coverage levels.
    pub coverage: CoverageThresholds,
    /// Density categories.
    pub density: DensityThresholds,
    /// Quality analysis.
    pub quality: QualityConfig,
}

impl PipelineConfig {
    /// Checks the semantic constraints serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the area code range or bounding
    /// box is inverted, a threshold table is not strictly ascending, or a
    /// quality setting is out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |message: String| Err(ConfigError::Invalid { message });

        if self.region.area_code_min > self.region.area_code_max {
            return invalid(format!(
                "area code range is inverted: {} > {}",
                self.region.area_code_min, self.region.area_code_max
            ));
        }

        let b = &self.region.bounds;
        if !(b.min_lat < b.max_lat && b.min_lon < b.max_lon) {
            return invalid(format!(
                "bounding box is empty or inverted: lat {}..{}, lon {}..{}",
                b.min_lat, b.max_lat, b.min_lon, b.max_lon
            ));
        }

        if !self.demand.priority_thresholds.is_ordered() {
            let t = self.demand.priority_thresholds;
            return invalid(format!(
                "priority thresholds must be non-negative and strictly ascending: \
                 medium={} high={} critical={}",
                t.medium, t.high, t.critical
            ));
        }

        if !self.demand.expansion_ratio.is_finite() || self.demand.expansion_ratio < 0.0 {
            return invalid(format!(
                "expansion ratio must be a non-negative number, got {}",
                self.demand.expansion_ratio
            ));
        }

        let c = &self.coverage;
        if !(c.adequate_stations <= c.good_stations && c.good_stations <= c.excellent_stations)
            || c.good_fast_chargers > c.excellent_fast_chargers
        {
            return invalid("coverage thresholds must be ascending".to_string());
        }

        if self.density.medium_above >= self.density.high_above {
            return invalid(format!(
                "density thresholds must be ascending: medium_above={} high_above={}",
                self.density.medium_above, self.density.high_above
            ));
        }

        let q = &self.quality;
        if !q.iqr_multiplier.is_finite() || q.iqr_multiplier < 0.0 {
            return invalid(format!(
                "iqr multiplier must be a non-negative number, got {}",
                q.iqr_multiplier
            ));
        }
        if !(0.0..=1.0).contains(&q.weak_correlation)
            || !(0.0..=1.0).contains(&q.strong_correlation)
            || q.weak_correlation > q.strong_correlation
        {
            return invalid(format!(
                "correlation thresholds must satisfy 0 <= weak <= strong <= 1: weak={} strong={}",
                q.weak_correlation, q.strong_correlation
            ));
        }

        Ok(())
    }

    /// Renders the configuration as TOML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Serialize`] if rendering fails.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Resolves a source file name against the dataset directory.
    #[must_use]
    pub fn dataset_path(&self, file: &str) -> PathBuf {
        self.paths.dataset_dir.join(file)
    }
}

/// Parses and validates a TOML configuration document.
///
/// # Errors
///
/// Returns [`ConfigError`] if the document is not valid TOML or fails
/// validation.
pub fn parse_config(toml_str: &str) -> Result<PipelineConfig, ConfigError> {
    let config: PipelineConfig = toml::de::from_str(toml_str)?;
    config.validate()?;
    Ok(config)
}

/// Returns the shipped default configuration.
///
/// # Panics
///
/// Panics if the embedded `default.toml` is malformed (this is a
/// compile-time guarantee since the config is embedded and covered by
/// tests).
#[must_use]
pub fn default_config() -> PipelineConfig {
    parse_config(DEFAULT_CONFIG_TOML)
        .unwrap_or_else(|e| panic!("Failed to parse embedded default.toml: {e}"))
}

/// Loads a configuration file, falling back to defaults for missing tables.
///
/// # Errors
///
/// Returns [`ConfigError`] if the file cannot be read, parsed, or
/// validated.
pub fn load_config(path: &Path) -> Result<PipelineConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse_config(&contents)?;
    log::info!("Loaded config from {}", path.display());
    Ok(config)
}

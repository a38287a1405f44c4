#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! End-to-end charging infrastructure analysis.
//!
//! [`analyze`] is the pure core: it normalizes the three loaded tables,
//! resolves stations to areas, joins everything per area and runs the
//! metrics, demand and quality stages. [`run`] adds file loading in front,
//! and [`run_cached`] puts the content-addressed [`ResultCache`] around
//! that so unchanged inputs are not recomputed.

pub mod cache;

use std::collections::BTreeSet;
use std::sync::Arc;

use evision_analytics::{
    AggregationEngine, DemandAnalyzer, MetricsBuilder, QualityAnalyzer, QualityInputs,
};
use evision_analytics_models::{AreaMetrics, DemandAnalysis, GeometryRowCounts, QualityReport};
use evision_charging_models::AreaCode;
use evision_config::{ConfigError, PipelineConfig};
use evision_ingest::{ResidentPreprocessor, ResolverChain, StationPreprocessor};
use evision_source::progress::ProgressCallback;
use evision_source::{SourceError, SourceLoader, SourcePaths, SourceTables};
use evision_spatial::{GeometryNormalizer, SpatialIndex};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use cache::{CacheError, CacheOutcome, ResultCache};

/// Errors that abort a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A source file could not be loaded.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// The configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The result cache could not be written.
    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Everything one run produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineOutput {
    /// One row per area, sorted by area code.
    pub metrics: Vec<AreaMetrics>,
    /// Demand ranking plus areas with unknown population.
    pub ranking: DemandAnalysis,
    /// Data quality snapshot.
    pub quality: QualityReport,
}

/// Runs every analysis stage over already loaded tables.
///
/// # Errors
///
/// * If the configuration fails validation
/// * If a table lacks a configured column
pub fn analyze(
    config: &PipelineConfig,
    tables: &SourceTables,
) -> Result<PipelineOutput, PipelineError> {
    config.validate()?;
    let area_codes = config.region.area_codes();

    let geometries = GeometryNormalizer::new(&config.sources.geometry.columns, area_codes)
        .normalize(&tables.geometry)?;
    let residents = ResidentPreprocessor::new(&config.sources.population.columns, area_codes)
        .process(&tables.population)?;

    let known: BTreeSet<AreaCode> = residents
        .records
        .iter()
        .map(|r| r.area_code.clone())
        .chain(geometries.boundaries.keys().cloned())
        .collect();
    let index = SpatialIndex::from_boundaries(&geometries.boundaries);
    let resolvers = ResolverChain::standard(&known, &index);

    let stations = StationPreprocessor::new(&config.region, &config.sources.stations.columns)
        .process(&tables.stations, &resolvers)?;

    let areas =
        AggregationEngine::join(&residents.records, &stations.stations, &geometries.boundaries);

    let demand = DemandAnalyzer::new(config.demand);
    let metrics = MetricsBuilder::new(&demand, config.coverage, config.density).build(&areas);
    let ranking = demand.analyze(&areas);

    let quality = QualityAnalyzer::new(config.quality).analyze(&QualityInputs {
        areas: &areas,
        stations: &stations,
        residents: &residents,
        geometry_issues: &geometries.issues,
        geometry_rows: GeometryRowCounts {
            read: geometries.rows_read as u64,
            dropped: geometries.rows_dropped as u64,
            boundaries: geometries.boundaries.len() as u64,
        },
    });

    Ok(PipelineOutput {
        metrics,
        ranking,
        quality,
    })
}

/// Loads the three source files and analyzes them.
///
/// # Errors
///
/// * If a source file is missing, unreadable or malformed
/// * If the configuration fails validation
pub fn run(
    config: &PipelineConfig,
    paths: &SourcePaths,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<PipelineOutput, PipelineError> {
    progress.set_total(4);
    let tables = SourceLoader::new(&config.sources).load_all(paths, progress)?;

    progress.set_message("Analyzing".to_string());
    let output = analyze(config, &tables)?;
    progress.inc(1);
    progress.finish(format!("Analyzed {} areas", output.metrics.len()));

    Ok(output)
}

/// Like [`run`], but returns a cached result when the configuration and
/// all three source files are unchanged.
///
/// With `force` set the lookup is skipped, and the fresh result replaces
/// whatever was cached.
///
/// # Errors
///
/// * If a source file cannot be read for fingerprinting
/// * If the pipeline itself fails
/// * If the fresh result cannot be written to the cache
pub fn run_cached(
    config: &PipelineConfig,
    paths: &SourcePaths,
    cache: &ResultCache,
    force: bool,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<(PipelineOutput, CacheOutcome), PipelineError> {
    let fingerprint = cache::fingerprint(config, paths)?;

    if force {
        log::info!("Forced run, ignoring cache entry {fingerprint}");
    } else if let Some(output) = cache.load(&fingerprint) {
        progress.finish("Loaded cached result".to_string());
        return Ok((output, CacheOutcome::Hit));
    }

    let output = run(config, paths, progress)?;
    cache.store(&fingerprint, &output)?;

    let outcome = if force {
        CacheOutcome::Forced
    } else {
        CacheOutcome::Miss
    };
    Ok((output, outcome))
}

#[cfg(test)]
pub(crate) mod tests {
    use std::path::PathBuf;

    use evision_analytics_models::QualityColumn;
    use evision_charging_models::{IssueKind, PriorityClass};
    use evision_source::progress::null_progress;

    use super::*;

    /// Station registry in the national export layout: ten preamble lines,
    /// `;`-delimited, Windows-1252 (`0xE4` is `ä`).
    const STATIONS: &[u8] = b"Ladesaeulenregister\n\
Stand: 01.01.2024\n\
\n\
\n\
\n\
\n\
\n\
\n\
\n\
\n\
Betreiber;Bundesland;Breitengrad;L\xE4ngengrad;Nennleistung Ladeeinrichtung [kW];Postleitzahl\n\
A;Berlin;52,45;13,05;22;10115\n\
B;Berlin;52,45;13,15;150;\n\
C;Bayern;48,1;11,5;50;80331\n\
D;Berlin;52,45;13,15;abc;10117\n\
E;Berlin;52,6;13,6;11;\n\
F;Berlin;;;11;\n";

    const POPULATION: &str = "plz,einwohner,lat,lon\n\
10115,20000,52.45,13.05\n\
10117,4000,52.45,13.15\n\
10119,,52.5,13.4\n";

    const GEOMETRY: &str = "PLZ;geometry\n\
10115;POLYGON((13.0 52.4, 13.1 52.4, 13.1 52.5, 13.0 52.5, 13.0 52.4))\n\
10117;POLYGON((13.1 52.4, 13.2 52.4, 13.2 52.5, 13.1 52.5, 13.1 52.4))\n";

    pub(crate) struct Fixture {
        pub(crate) dir: PathBuf,
        pub(crate) config: PipelineConfig,
        pub(crate) paths: SourcePaths,
    }

    impl Drop for Fixture {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.dir);
        }
    }

    pub(crate) fn fixture(name: &str) -> Fixture {
        let dir = std::env::temp_dir().join(format!("evision_pipeline_{name}"));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();

        let mut config = PipelineConfig::default();
        config.paths.dataset_dir.clone_from(&dir);
        config.paths.cache_dir = dir.join("cache");

        let paths = SourcePaths::from_config(&config);
        std::fs::write(&paths.stations, STATIONS).unwrap();
        std::fs::write(&paths.population, POPULATION).unwrap();
        std::fs::write(&paths.geometry, GEOMETRY).unwrap();

        Fixture { dir, config, paths }
    }

    fn codes<'a>(codes: impl Iterator<Item = &'a AreaCode>) -> Vec<&'a str> {
        codes.map(AreaCode::as_str).collect()
    }

    #[test]
    fn end_to_end_over_registry_layout() {
        let f = fixture("end_to_end");
        let output = run(&f.config, &f.paths, &null_progress()).unwrap();

        assert_eq!(
            codes(output.metrics.iter().map(|m| &m.area_code)),
            ["10115", "10117", "10119"]
        );
        let counts: Vec<u64> = output.metrics.iter().map(|m| m.station_count).collect();
        assert_eq!(counts, [1, 2, 0]);

        let ranking = &output.ranking.ranking;
        assert_eq!(codes(ranking.iter().map(|s| &s.area_code)), ["10115", "10117"]);
        assert_eq!(ranking[0].priority_class, PriorityClass::Critical);
        assert_eq!(ranking[1].priority_class, PriorityClass::Medium);
        assert_eq!(codes(output.ranking.population_unknown.iter()), ["10119"]);

        let quality = &output.quality;
        assert_eq!(quality.station_rows.read, 6);
        assert_eq!(quality.station_rows.out_of_region, 1);
        assert_eq!(quality.station_rows.dropped, 1);
        assert_eq!(quality.station_rows.resolved, 3);
        assert_eq!(quality.unresolvable_station_ids, ["row-5"]);
        assert_eq!(quality.issue_count(IssueKind::NumericParseError), 1);
        assert_eq!(quality.issue_count(IssueKind::RangeValidationError), 1);
        assert_eq!(quality.issue_count(IssueKind::UnresolvableStation), 1);
        assert_eq!(quality.issue_count(IssueKind::GeometryParseError), 0);
        assert_eq!(quality.geometry_rows.boundaries, 2);
        assert_eq!(quality.power_kw.unwrap().count, 2);
        assert!(quality.outliers_in(QualityColumn::PowerKw).next().is_none());
    }

    #[test]
    fn resolves_by_declared_code_then_polygon() {
        let f = fixture("resolution");
        let tables = SourceLoader::new(&f.config.sources)
            .load_all(&f.paths, &null_progress())
            .unwrap();
        let output = analyze(&f.config, &tables).unwrap();

        let area = &output.metrics[1];
        assert_eq!(area.area_code.as_str(), "10117");
        assert_eq!(area.unknown_power_count, 1);
        assert_eq!(area.fast_charger_count, 1);
        assert!(area.geometry.is_some());

        let attributed: u64 = output.metrics.iter().map(|m| m.station_count).sum();
        assert_eq!(attributed, output.quality.station_rows.resolved);
    }

    #[test]
    fn missing_source_file_is_fatal() {
        let f = fixture("missing_source");
        std::fs::remove_file(&f.paths.population).unwrap();

        let err = run(&f.config, &f.paths, &null_progress()).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Source(SourceError::SourceUnavailable { ref path, .. })
                if *path == f.paths.population
        ));
    }

    #[test]
    fn invalid_thresholds_are_rejected_before_analysis() {
        let f = fixture("invalid_config");
        let mut config = f.config.clone();
        config.demand.priority_thresholds.high = 1.0;

        let tables = SourceLoader::new(&config.sources)
            .load_all(&f.paths, &null_progress())
            .unwrap();
        assert!(matches!(
            analyze(&config, &tables),
            Err(PipelineError::Config(ConfigError::Invalid { .. }))
        ));
    }
}

//! Data quality analysis.
//!
//! Purely descriptive: reads the joined areas and the preprocessing
//! results, never filters or mutates them.

use std::collections::BTreeMap;

use evision_analytics_models::{
    Correlation, CorrelationStrength, GeometryRowCounts, Outlier, QualityColumn, QualityReport,
    SummaryStats,
};
use evision_charging_models::{DataIssue, IssueKind};
use evision_config::QualityConfig;
use evision_ingest_models::{PreprocessedResidents, PreprocessedStations};

use crate::aggregate::Area;
use crate::stats::{IqrFence, pearson, summarize};

/// Everything the quality analysis looks at.
pub struct QualityInputs<'a> {
    /// Joined areas.
    pub areas: &'a [Area],
    /// Station preprocessing result.
    pub stations: &'a PreprocessedStations,
    /// Resident preprocessing result.
    pub residents: &'a PreprocessedResidents,
    /// Problems found in the geometry table.
    pub geometry_issues: &'a [DataIssue],
    /// Geometry table row accounting.
    pub geometry_rows: GeometryRowCounts,
}

/// Builds the [`QualityReport`].
pub struct QualityAnalyzer {
    config: QualityConfig,
}

impl QualityAnalyzer {
    /// Creates an analyzer with the given fence multiplier and correlation
    /// thresholds.
    #[must_use]
    pub const fn new(config: QualityConfig) -> Self {
        Self { config }
    }

    /// Produces the report.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn analyze(&self, inputs: &QualityInputs<'_>) -> QualityReport {
        let power: Vec<(String, f64)> = inputs
            .areas
            .iter()
            .flat_map(|a| &a.stations)
            .filter(|s| s.power_category.is_some())
            .filter_map(|s| s.power_kw.map(|kw| (s.id.clone(), kw)))
            .collect();

        let population: Vec<(String, f64)> = inputs
            .areas
            .iter()
            .filter_map(|a| a.population.map(|p| (a.area_code.to_string(), p as f64)))
            .collect();

        let station_count: Vec<(String, f64)> = inputs
            .areas
            .iter()
            .map(|a| (a.area_code.to_string(), a.station_count() as f64))
            .collect();

        let mut outliers = Vec::new();
        let power_kw = self.column(QualityColumn::PowerKw, &power, &mut outliers);
        let population_stats = self.column(QualityColumn::Population, &population, &mut outliers);
        let station_count_stats =
            self.column(QualityColumn::StationCount, &station_count, &mut outliers);

        let issues: Vec<DataIssue> = inputs
            .stations
            .issues
            .iter()
            .chain(&inputs.residents.issues)
            .chain(inputs.geometry_issues)
            .cloned()
            .collect();

        let mut issue_counts: BTreeMap<IssueKind, u64> =
            IssueKind::ALL.into_iter().map(|k| (k, 0)).collect();
        for issue in &issues {
            *issue_counts.entry(issue.kind).or_default() += 1;
        }

        let missing_ratios = inputs
            .stations
            .missing
            .iter()
            .chain(&inputs.residents.missing)
            .cloned()
            .collect();

        let correlation = self.correlation(inputs.areas);
        if let Some(c) = &correlation {
            log::info!(
                "Population/station correlation r={:.3} over {} areas ({})",
                c.coefficient,
                c.pairs,
                c.strength
            );
            if c.weak {
                log::warn!(
                    "Weak population/station correlation; residents per station may not track demand"
                );
            }
        } else {
            log::warn!("Population/station correlation is undefined for this data");
        }

        log::info!(
            "Quality report: {} outliers, {} issues, {} unresolvable stations",
            outliers.len(),
            issues.len(),
            inputs.stations.unresolvable.len()
        );

        QualityReport {
            power_kw,
            population: population_stats,
            station_count: station_count_stats,
            outliers,
            missing_ratios,
            station_rows: inputs.stations.counts,
            resident_rows: inputs.residents.counts,
            geometry_rows: inputs.geometry_rows,
            issue_counts,
            issues,
            unresolvable_station_ids: inputs
                .stations
                .unresolvable
                .iter()
                .map(|s| s.id.clone())
                .collect(),
            correlation,
        }
    }

    /// Summarizes one column and appends its IQR outliers.
    fn column(
        &self,
        column: QualityColumn,
        values: &[(String, f64)],
        outliers: &mut Vec<Outlier>,
    ) -> Option<SummaryStats> {
        let raw: Vec<f64> = values.iter().map(|(_, v)| *v).collect();
        let stats = summarize(&raw)?;
        let fence = IqrFence::from_summary(&stats, self.config.iqr_multiplier);

        for (entity_id, value) in values {
            if let Some(breached) = fence.breach(*value) {
                log::debug!("Outlier in {column}: {entity_id} = {value} ({breached})");
                outliers.push(Outlier {
                    column,
                    entity_id: entity_id.clone(),
                    value: *value,
                    fence: breached,
                    lower_bound: fence.lower,
                    upper_bound: fence.upper,
                });
            }
        }

        Some(stats)
    }

    /// Pearson `r` over areas that have both a known population and at
    /// least one resolved station.
    #[allow(clippy::cast_precision_loss)]
    fn correlation(&self, areas: &[Area]) -> Option<Correlation> {
        let (xs, ys): (Vec<f64>, Vec<f64>) = areas
            .iter()
            .filter(|a| !a.stations.is_empty())
            .filter_map(|a| a.population.map(|p| (p as f64, a.station_count() as f64)))
            .unzip();

        let coefficient = pearson(&xs, &ys)?;
        let magnitude = coefficient.abs();
        let strength = if magnitude >= self.config.strong_correlation {
            CorrelationStrength::Strong
        } else if magnitude >= self.config.weak_correlation {
            CorrelationStrength::Moderate
        } else {
            CorrelationStrength::Weak
        };

        Some(Correlation {
            coefficient,
            pairs: xs.len() as u64,
            strength,
            weak: strength == CorrelationStrength::Weak,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use evision_analytics_models::Fence;
    use evision_charging_models::Dataset;
    use evision_ingest_models::{MissingRatio, UnresolvedStation};

    use super::*;
    use crate::aggregate::AggregationEngine;
    use crate::aggregate::tests::{population, station};

    fn report(
        areas: &[Area],
        stations: &PreprocessedStations,
        residents: &PreprocessedResidents,
    ) -> QualityReport {
        QualityAnalyzer::new(QualityConfig::default()).analyze(&QualityInputs {
            areas,
            stations,
            residents,
            geometry_issues: &[],
            geometry_rows: GeometryRowCounts::default(),
        })
    }

    #[test]
    fn flags_power_outlier_with_owning_station() {
        let stations: Vec<_> = [5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 100.0]
            .iter()
            .enumerate()
            .map(|(i, kw)| station(&format!("s{i}"), "10115", Some(*kw)))
            .collect();
        let areas = AggregationEngine::join(&[], &stations, &BTreeMap::new());
        let report = report(
            &areas,
            &PreprocessedStations::default(),
            &PreprocessedResidents::default(),
        );

        let power: Vec<_> = report.outliers_in(QualityColumn::PowerKw).collect();
        assert_eq!(power.len(), 1);
        assert_eq!(power[0].entity_id, "s6");
        assert!((power[0].value - 100.0).abs() < f64::EPSILON);
        assert_eq!(power[0].fence, Fence::Upper);
        assert!((power[0].upper_bound - 14.0).abs() < 1e-9);
    }

    #[test]
    fn outliers_reference_joined_entities_only() {
        let stations = [station("a", "10115", Some(11.0))];
        let areas = AggregationEngine::join(
            &[
                population("10115", Some(100)),
                population("10117", Some(110)),
                population("10119", Some(120)),
                population("10178", Some(130)),
                population("10179", Some(90_000)),
            ],
            &stations,
            &BTreeMap::new(),
        );
        let report = report(
            &areas,
            &PreprocessedStations::default(),
            &PreprocessedResidents::default(),
        );

        let codes: Vec<String> = areas.iter().map(|a| a.area_code.to_string()).collect();
        assert!(
            report
                .outliers
                .iter()
                .all(|o| codes.contains(&o.entity_id) || o.entity_id == "a")
        );
        assert!(
            report
                .outliers_in(QualityColumn::Population)
                .any(|o| o.entity_id == "10179")
        );
    }

    #[test]
    fn correlation_uses_areas_in_both_tables() {
        let stations = [
            station("a", "10115", Some(11.0)),
            station("b", "10117", Some(11.0)),
            station("c", "10117", Some(11.0)),
            station("d", "10119", Some(11.0)),
            station("e", "10119", Some(11.0)),
            station("f", "10119", Some(11.0)),
            // Unknown population: excluded pairwise.
            station("g", "10178", Some(11.0)),
        ];
        let areas = AggregationEngine::join(
            &[
                population("10115", Some(1000)),
                population("10117", Some(2000)),
                population("10119", Some(3000)),
                // Zero stations: excluded pairwise.
                population("10179", Some(50_000)),
            ],
            &stations,
            &BTreeMap::new(),
        );
        let report = report(
            &areas,
            &PreprocessedStations::default(),
            &PreprocessedResidents::default(),
        );

        let correlation = report.correlation.unwrap();
        assert_eq!(correlation.pairs, 3);
        assert!((correlation.coefficient - 1.0).abs() < 1e-9);
        assert_eq!(correlation.strength, CorrelationStrength::Strong);
        assert!(!correlation.weak);
    }

    #[test]
    fn correlation_absent_without_two_pairs() {
        let areas = AggregationEngine::join(
            &[population("10115", Some(1000))],
            &[station("a", "10115", Some(11.0))],
            &BTreeMap::new(),
        );
        let report = report(
            &areas,
            &PreprocessedStations::default(),
            &PreprocessedResidents::default(),
        );
        assert_eq!(report.correlation, None);
    }

    #[test]
    fn weak_correlation_is_flagged() {
        let analyzer = QualityAnalyzer::new(QualityConfig::default());
        let stations = [
            station("a", "10115", Some(11.0)),
            station("b", "10115", Some(11.0)),
            station("c", "10117", Some(11.0)),
            station("d", "10119", Some(11.0)),
            station("e", "10119", Some(11.0)),
            station("f", "10178", Some(11.0)),
        ];
        // Populations 1, 2, 2, 1 against station counts 2, 1, 2, 1.
        let areas = AggregationEngine::join(
            &[
                population("10115", Some(1)),
                population("10117", Some(2)),
                population("10119", Some(2)),
                population("10178", Some(1)),
            ],
            &stations,
            &BTreeMap::new(),
        );
        let correlation = analyzer.correlation(&areas).unwrap();
        assert!(correlation.coefficient.abs() < 1e-9);
        assert_eq!(correlation.strength, CorrelationStrength::Weak);
        assert!(correlation.weak);
    }

    #[test]
    fn aggregates_issues_and_row_accounting() {
        let stations = PreprocessedStations {
            issues: vec![
                DataIssue::new(IssueKind::NumericParseError, Dataset::Stations, "a", "x"),
                DataIssue::new(IssueKind::UnresolvableStation, Dataset::Stations, "b", "y"),
            ],
            unresolvable: vec![UnresolvedStation {
                id: "b".to_string(),
                declared_area_code: None,
                latitude: None,
                longitude: None,
                power_kw: None,
            }],
            missing: vec![MissingRatio::new(Dataset::Stations, "kW", 1, 4)],
            ..PreprocessedStations::default()
        };
        let residents = PreprocessedResidents {
            issues: vec![DataIssue::new(
                IssueKind::RangeValidationError,
                Dataset::Population,
                "10115",
                "negative",
            )],
            missing: vec![MissingRatio::new(Dataset::Population, "einwohner", 0, 2)],
            ..PreprocessedResidents::default()
        };
        let geometry_issues = [DataIssue::new(
            IssueKind::GeometryParseError,
            Dataset::Geometry,
            "10117",
            "empty",
        )];

        let report = QualityAnalyzer::new(QualityConfig::default()).analyze(&QualityInputs {
            areas: &[],
            stations: &stations,
            residents: &residents,
            geometry_issues: &geometry_issues,
            geometry_rows: GeometryRowCounts {
                read: 3,
                dropped: 1,
                boundaries: 2,
            },
        });

        assert_eq!(report.issues.len(), 4);
        for kind in IssueKind::ALL {
            assert_eq!(report.issue_count(kind), 1);
        }
        assert_eq!(report.unresolvable_station_ids, ["b"]);
        assert_eq!(report.missing_ratios.len(), 2);
        assert_eq!(report.geometry_rows.dropped, 1);
        assert_eq!(report.power_kw, None);
    }
}

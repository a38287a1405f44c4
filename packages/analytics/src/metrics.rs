//! Per-area metrics table.

use evision_analytics_models::AreaMetrics;
use evision_config::{CoverageThresholds, DensityThresholds};
use evision_spatial::to_geojson;

use crate::aggregate::Area;
use crate::demand::DemandAnalyzer;

/// Turns joined areas into [`AreaMetrics`] rows.
pub struct MetricsBuilder<'a> {
    demand: &'a DemandAnalyzer,
    coverage: CoverageThresholds,
    density: DensityThresholds,
}

impl<'a> MetricsBuilder<'a> {
    /// Creates a builder that scores areas with `demand`.
    #[must_use]
    pub const fn new(
        demand: &'a DemandAnalyzer,
        coverage: CoverageThresholds,
        density: DensityThresholds,
    ) -> Self {
        Self {
            demand,
            coverage,
            density,
        }
    }

    /// One row per area, in area order.
    #[must_use]
    pub fn build(&self, areas: &[Area]) -> Vec<AreaMetrics> {
        areas.iter().map(|area| self.row(area)).collect()
    }

    fn row(&self, area: &Area) -> AreaMetrics {
        let station_count = area.station_count();
        let fast_charger_count = area.fast_charger_count();
        let score = self.demand.score(area);

        AreaMetrics {
            area_code: area.area_code.clone(),
            population: area.population,
            station_count,
            category_counts: area.category_counts(),
            unknown_power_count: area.unknown_power_count(),
            total_capacity_kw: area.total_capacity_kw(),
            average_power_kw: area.average_power_kw(),
            fast_charger_count,
            coverage_level: self.coverage.classify(station_count, fast_charger_count),
            density_category: area.population.map(|p| self.density.classify(p)),
            residents_per_station: score.map(|(ratio, _)| ratio),
            priority_class: score.map(|(_, class)| class),
            latitude: area.latitude,
            longitude: area.longitude,
            geometry: area.boundary.as_ref().map(to_geojson),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use evision_charging_models::{CoverageLevel, DensityCategory, PriorityClass};
    use evision_config::DemandConfig;
    use geo::{MultiPolygon, polygon};

    use super::*;
    use crate::aggregate::AggregationEngine;
    use crate::aggregate::tests::{code, population, station};

    fn build(areas: &[Area]) -> Vec<AreaMetrics> {
        let demand = DemandAnalyzer::new(DemandConfig::default());
        MetricsBuilder::new(
            &demand,
            CoverageThresholds::default(),
            DensityThresholds::default(),
        )
        .build(areas)
    }

    #[test]
    fn zero_station_area_has_no_coverage_but_a_priority() {
        let areas = AggregationEngine::join(
            &[population("10115", Some(20_000))],
            &[],
            &BTreeMap::new(),
        );
        let rows = build(&areas);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].station_count, 0);
        assert_eq!(rows[0].coverage_level, CoverageLevel::NoCoverage);
        assert_eq!(rows[0].density_category, Some(DensityCategory::Medium));
        assert_eq!(rows[0].priority_class, Some(PriorityClass::Critical));
        assert_eq!(rows[0].average_power_kw, None);
    }

    #[test]
    fn unknown_population_leaves_derived_fields_empty() {
        let areas = AggregationEngine::join(
            &[],
            &[station("a", "10117", Some(150.0))],
            &BTreeMap::new(),
        );
        let rows = build(&areas);

        assert_eq!(rows[0].population, None);
        assert_eq!(rows[0].residents_per_station, None);
        assert_eq!(rows[0].priority_class, None);
        assert_eq!(rows[0].density_category, None);
        assert_eq!(rows[0].coverage_level, CoverageLevel::Poor);
        assert_eq!(rows[0].fast_charger_count, 1);
    }

    #[test]
    fn attaches_boundary_as_geojson() {
        let mut boundaries = BTreeMap::new();
        boundaries.insert(
            code("10115"),
            MultiPolygon(vec![polygon![
                (x: 13.0, y: 52.0),
                (x: 13.1, y: 52.0),
                (x: 13.1, y: 52.1),
                (x: 13.0, y: 52.1),
            ]]),
        );
        let areas = AggregationEngine::join(
            &[population("10115", Some(5_000))],
            &[],
            &boundaries,
        );
        let rows = build(&areas);

        let geometry = rows[0].geometry.as_ref().unwrap();
        assert!(matches!(
            geometry.value,
            geojson::Value::MultiPolygon(_)
        ));
    }

    #[test]
    fn category_counts_reconcile_with_station_count() {
        let areas = AggregationEngine::join(
            &[population("10115", Some(8_000))],
            &[
                station("a", "10115", Some(3.7)),
                station("b", "10115", None),
                station("c", "10115", Some(50.0)),
            ],
            &BTreeMap::new(),
        );
        let row = &build(&areas)[0];
        assert_eq!(
            row.category_counts.total() + row.unknown_power_count,
            row.station_count
        );
        assert!((row.residents_per_station.unwrap() - 8_000.0 / 3.0).abs() < 1e-9);
    }
}

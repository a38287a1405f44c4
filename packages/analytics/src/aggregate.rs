//! Joining stations, population and boundaries by area code.

use std::collections::BTreeMap;

use evision_analytics_models::CategoryCounts;
use evision_charging_models::{AreaCode, PopulationRecord, PowerCategory, Station};
use geo::MultiPolygon;

/// An area with everything attributed to it.
#[derive(Debug, Clone, PartialEq)]
pub struct Area {
    /// Canonical area code.
    pub area_code: AreaCode,
    /// Whether the population table had a row for this code.
    pub in_population_table: bool,
    /// Residents, if known.
    pub population: Option<u64>,
    /// Reference latitude from the population table.
    pub latitude: Option<f64>,
    /// Reference longitude from the population table.
    pub longitude: Option<f64>,
    /// Boundary, if one parsed.
    pub boundary: Option<MultiPolygon<f64>>,
    /// Stations resolved to this area.
    pub stations: Vec<Station>,
}

impl Area {
    fn empty(area_code: AreaCode) -> Self {
        Self {
            area_code,
            in_population_table: false,
            population: None,
            latitude: None,
            longitude: None,
            boundary: None,
            stations: Vec::new(),
        }
    }

    /// Total stations, including those with unknown power.
    #[must_use]
    pub fn station_count(&self) -> u64 {
        self.stations.len() as u64
    }

    /// Stations per power band. Stations with unknown power are not in any
    /// band.
    #[must_use]
    pub fn category_counts(&self) -> CategoryCounts {
        let mut counts = CategoryCounts::default();
        for category in self.stations.iter().filter_map(|s| s.power_category) {
            counts.add(category);
        }
        counts
    }

    /// Stations with unknown power.
    #[must_use]
    pub fn unknown_power_count(&self) -> u64 {
        self.stations
            .iter()
            .filter(|s| s.power_category.is_none())
            .count() as u64
    }

    fn known_power(&self) -> impl Iterator<Item = f64> + '_ {
        self.stations
            .iter()
            .filter(|s| s.power_category.is_some())
            .filter_map(|s| s.power_kw)
    }

    /// Summed power of stations with known power.
    #[must_use]
    pub fn total_capacity_kw(&self) -> f64 {
        self.known_power().sum()
    }

    /// Mean power of stations with known power.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn average_power_kw(&self) -> Option<f64> {
        let (count, sum) = self
            .known_power()
            .fold((0_u64, 0.0), |(n, total), kw| (n + 1, total + kw));
        (count > 0).then(|| sum / count as f64)
    }

    /// Rapid and ultra-rapid stations.
    #[must_use]
    pub fn fast_charger_count(&self) -> u64 {
        self.stations
            .iter()
            .filter(|s| s.power_category.is_some_and(PowerCategory::is_fast_charger))
            .count() as u64
    }
}

/// Joins the preprocessed inputs into one [`Area`] per code.
pub struct AggregationEngine;

impl AggregationEngine {
    /// Builds the union of population areas and station areas, sorted by
    /// code. Boundaries are attached to areas in the union; a boundary for
    /// a code with neither population nor stations is not an area.
    #[must_use]
    pub fn join(
        population: &[PopulationRecord],
        stations: &[Station],
        boundaries: &BTreeMap<AreaCode, MultiPolygon<f64>>,
    ) -> Vec<Area> {
        let mut areas: BTreeMap<AreaCode, Area> = BTreeMap::new();

        for record in population {
            let area = areas
                .entry(record.area_code.clone())
                .or_insert_with(|| Area::empty(record.area_code.clone()));
            area.in_population_table = true;
            area.population = record.population;
            area.latitude = record.latitude;
            area.longitude = record.longitude;
        }

        for station in stations {
            areas
                .entry(station.area_code.clone())
                .or_insert_with(|| Area::empty(station.area_code.clone()))
                .stations
                .push(station.clone());
        }

        for (code, area) in &mut areas {
            area.boundary = boundaries.get(code).cloned();
        }

        let joined: Vec<Area> = areas.into_values().collect();
        log::info!(
            "Joined {} areas ({} with population, {} with stations, {} with boundaries)",
            joined.len(),
            joined.iter().filter(|a| a.in_population_table).count(),
            joined.iter().filter(|a| !a.stations.is_empty()).count(),
            joined.iter().filter(|a| a.boundary.is_some()).count()
        );
        joined
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use evision_charging_models::{AreaCodeRange, ResolutionMethod};

    use super::*;

    pub(crate) fn code(raw: &str) -> AreaCode {
        AreaCode::parse(raw, AreaCodeRange::new(10_001, 14_199)).unwrap()
    }

    pub(crate) fn station(id: &str, area: &str, power_kw: Option<f64>) -> Station {
        Station {
            id: id.to_string(),
            latitude: None,
            longitude: None,
            power_kw,
            power_category: power_kw.and_then(PowerCategory::classify),
            area_code: code(area),
            resolution: ResolutionMethod::DeclaredKey,
        }
    }

    pub(crate) fn population(area: &str, residents: Option<u64>) -> PopulationRecord {
        PopulationRecord {
            area_code: code(area),
            population: residents,
            latitude: None,
            longitude: None,
        }
    }

    #[test]
    fn join_is_a_union() {
        let areas = AggregationEngine::join(
            &[population("10115", Some(20_000))],
            &[station("a", "10117", Some(22.0))],
            &BTreeMap::new(),
        );

        let codes: Vec<_> = areas.iter().map(|a| a.area_code.as_str()).collect();
        assert_eq!(codes, ["10115", "10117"]);
        assert_eq!(areas[0].station_count(), 0);
        assert_eq!(areas[0].population, Some(20_000));
        assert_eq!(areas[1].population, None);
        assert!(!areas[1].in_population_table);
    }

    #[test]
    fn category_counts_plus_unknown_equal_total() {
        let stations = [
            station("a", "10115", Some(3.7)),
            station("b", "10115", Some(11.0)),
            station("c", "10115", Some(50.0)),
            station("d", "10115", Some(300.0)),
            station("e", "10115", None),
            station("f", "10115", None),
        ];
        let areas = AggregationEngine::join(&[], &stations, &BTreeMap::new());
        let area = &areas[0];

        assert_eq!(area.station_count(), 6);
        assert_eq!(area.category_counts().total(), 4);
        assert_eq!(area.unknown_power_count(), 2);
        assert_eq!(
            area.category_counts().total() + area.unknown_power_count(),
            area.station_count()
        );
        assert_eq!(area.fast_charger_count(), 2);
        assert!((area.total_capacity_kw() - 364.7).abs() < 1e-9);
        assert!((area.average_power_kw().unwrap() - 364.7 / 4.0).abs() < 1e-9);
    }

    #[test]
    fn no_station_is_counted_twice() {
        let stations = [
            station("a", "10115", Some(11.0)),
            station("b", "10117", Some(11.0)),
            station("c", "10117", Some(11.0)),
        ];
        let areas = AggregationEngine::join(&[], &stations, &BTreeMap::new());
        let total: u64 = areas.iter().map(Area::station_count).sum();
        assert_eq!(total, 3);
    }

    #[test]
    fn boundaries_attach_only_to_union_members() {
        let mut boundaries = BTreeMap::new();
        boundaries.insert(code("10115"), MultiPolygon(vec![]));
        boundaries.insert(code("12000"), MultiPolygon(vec![]));

        let areas = AggregationEngine::join(
            &[population("10115", Some(1))],
            &[],
            &boundaries,
        );
        assert_eq!(areas.len(), 1);
        assert!(areas[0].boundary.is_some());
    }

    #[test]
    fn area_without_known_power_has_no_average() {
        let areas = AggregationEngine::join(&[], &[station("a", "10115", None)], &BTreeMap::new());
        assert_eq!(areas[0].average_power_kw(), None);
        assert!(areas[0].total_capacity_kw().abs() < f64::EPSILON);
    }
}

//! Station registry preprocessing.
//!
//! Runs, in order: region filter, numeric repair, coordinate validation,
//! power classification and area resolution. Completeness is measured on
//! the in-region rows before repair touches them.

use evision_charging_models::{
    AreaCode, DataIssue, Dataset, IssueKind, PowerCategory, Station,
};
use evision_config::{RegionConfig, StationColumns};
use evision_ingest_models::{MissingCounter, PreprocessedStations, UnresolvedStation};
use evision_source::parsing::{LocaleNumber, parse_locale_number};
use evision_source::{RawTable, SourceError};

use crate::resolver::{ResolverChain, StationCandidate};

/// Column positions resolved once per table.
struct ColumnIndices {
    id: Option<usize>,
    region: usize,
    latitude: usize,
    longitude: usize,
    power_kw: usize,
    area_code: usize,
}

/// Cleans the station registry and attributes each station to an area.
pub struct StationPreprocessor<'a> {
    region: &'a RegionConfig,
    columns: &'a StationColumns,
}

impl<'a> StationPreprocessor<'a> {
    /// Creates a preprocessor for the target region and column layout.
    #[must_use]
    pub const fn new(region: &'a RegionConfig, columns: &'a StationColumns) -> Self {
        Self { region, columns }
    }

    /// Preprocesses every row of the registry.
    ///
    /// Rows outside the region are skipped silently. Rows with neither a
    /// usable area code nor usable coordinates are dropped. Stations the
    /// resolvers cannot attribute are returned in the unresolvable list and
    /// never reach aggregation.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::MissingColumns`] if a configured column is
    /// absent from the table.
    pub fn process(
        &self,
        table: &RawTable,
        resolvers: &ResolverChain<'_>,
    ) -> Result<PreprocessedStations, SourceError> {
        let cols = self.column_indices(table)?;
        let mut out = PreprocessedStations::default();
        out.counts.read = table.len() as u64;

        let mut missing = MissingCounter::new([
            self.columns.latitude.as_str(),
            self.columns.longitude.as_str(),
            self.columns.power_kw.as_str(),
            self.columns.area_code.as_str(),
        ]);

        for row in 0..table.len() {
            if table.value(row, cols.region) != self.region.name {
                out.counts.out_of_region += 1;
                continue;
            }

            let id = cols
                .id
                .map(|c| table.value(row, c))
                .filter(|v| !v.is_empty())
                .map_or_else(|| format!("row-{}", row + 1), ToString::to_string);

            let raw_lat = table.value(row, cols.latitude);
            let raw_lon = table.value(row, cols.longitude);
            let raw_power = table.value(row, cols.power_kw);
            let raw_code = table.value(row, cols.area_code);
            missing.observe([raw_lat, raw_lon, raw_power, raw_code]);

            let latitude = repair(&mut out.issues, &id, &self.columns.latitude, raw_lat);
            let longitude = repair(&mut out.issues, &id, &self.columns.longitude, raw_lon);
            let power_kw = match repair(&mut out.issues, &id, &self.columns.power_kw, raw_power) {
                Some(kw) if kw < 0.0 => {
                    record(
                        &mut out.issues,
                        DataIssue::new(
                            IssueKind::RangeValidationError,
                            Dataset::Stations,
                            id.as_str(),
                            format!("negative power rating {kw} kW treated as missing"),
                        ),
                    );
                    None
                }
                other => other,
            };

            let coordinates = match (latitude, longitude) {
                (Some(lat), Some(lon)) if self.region.bounds.contains(lat, lon) => Some((lat, lon)),
                (Some(lat), Some(lon)) => {
                    log::debug!(
                        "Station {id} at ({lat}, {lon}) is outside the {} bounding box",
                        self.region.name
                    );
                    None
                }
                _ => None,
            };

            let declared = self.declared_code(&mut out.issues, &id, raw_code);

            if declared.is_none() && coordinates.is_none() {
                out.counts.dropped += 1;
                record(
                    &mut out.issues,
                    DataIssue::new(
                        IssueKind::RangeValidationError,
                        Dataset::Stations,
                        id.as_str(),
                        "no usable area code or coordinates, row dropped",
                    ),
                );
                continue;
            }

            let candidate = StationCandidate {
                id: &id,
                declared: declared.as_ref(),
                coordinates,
            };

            if let Some((area_code, resolution)) = resolvers.resolve(&candidate) {
                out.stations.push(Station {
                    id,
                    latitude,
                    longitude,
                    power_kw,
                    power_category: power_kw.and_then(PowerCategory::classify),
                    area_code,
                    resolution,
                });
            } else {
                record(
                    &mut out.issues,
                    DataIssue::new(
                        IssueKind::UnresolvableStation,
                        Dataset::Stations,
                        id.as_str(),
                        "no known area matches the declared code or coordinates",
                    ),
                );
                out.unresolvable.push(UnresolvedStation {
                    id,
                    declared_area_code: (!raw_code.is_empty()).then(|| raw_code.to_string()),
                    latitude,
                    longitude,
                    power_kw,
                });
            }
        }

        out.counts.resolved = out.stations.len() as u64;
        out.counts.unresolvable = out.unresolvable.len() as u64;
        out.missing = missing.finish(Dataset::Stations);

        log::info!(
            "Preprocessed stations: {} read, {} outside {}, {} dropped, {} resolved, {} unresolvable",
            out.counts.read,
            out.counts.out_of_region,
            self.region.name,
            out.counts.dropped,
            out.counts.resolved,
            out.counts.unresolvable
        );

        Ok(out)
    }

    fn column_indices(&self, table: &RawTable) -> Result<ColumnIndices, SourceError> {
        table.require_columns(&self.columns.required())?;

        let index = |name: &str| {
            table
                .column_index(name)
                .ok_or_else(|| SourceError::MissingColumns {
                    path: table.path().to_path_buf(),
                    columns: vec![name.to_string()],
                })
        };

        Ok(ColumnIndices {
            id: self.columns.id.as_deref().and_then(|c| table.column_index(c)),
            region: index(&self.columns.region)?,
            latitude: index(&self.columns.latitude)?,
            longitude: index(&self.columns.longitude)?,
            power_kw: index(&self.columns.power_kw)?,
            area_code: index(&self.columns.area_code)?,
        })
    }

    /// Parses the declared code. A malformed or out-of-range code becomes
    /// missing so coordinates can still be used.
    fn declared_code(&self, issues: &mut Vec<DataIssue>, id: &str, raw: &str) -> Option<AreaCode> {
        if raw.is_empty() {
            return None;
        }

        match AreaCode::parse(raw, self.region.area_codes()) {
            Ok(code) => Some(code),
            Err(e) => {
                let kind = if e.is_out_of_range() {
                    IssueKind::RangeValidationError
                } else {
                    IssueKind::NumericParseError
                };
                record(
                    issues,
                    DataIssue::new(
                        kind,
                        Dataset::Stations,
                        id,
                        format!("{}: {e}", self.columns.area_code),
                    ),
                );
                None
            }
        }
    }
}

/// Runs locale repair on one field, recording a parse failure.
fn repair(issues: &mut Vec<DataIssue>, id: &str, column: &str, raw: &str) -> Option<f64> {
    match parse_locale_number(raw) {
        LocaleNumber::Value(v) => Some(v),
        LocaleNumber::Empty => None,
        LocaleNumber::Invalid => {
            record(
                issues,
                DataIssue::new(
                    IssueKind::NumericParseError,
                    Dataset::Stations,
                    id,
                    format!("{column}: '{raw}' is not a number"),
                ),
            );
            None
        }
    }
}

fn record(issues: &mut Vec<DataIssue>, issue: DataIssue) {
    log::warn!("{issue}");
    issues.push(issue);
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use evision_charging_models::{AreaCodeRange, ResolutionMethod};
    use evision_spatial::{SpatialIndex, parse_geometry_text};

    use super::*;

    const HEADERS: [&str; 6] = ["id", "Bundesland", "Breitengrad", "Längengrad", "kW", "PLZ"];

    fn columns() -> StationColumns {
        StationColumns {
            id: Some("id".to_string()),
            region: "Bundesland".to_string(),
            latitude: "Breitengrad".to_string(),
            longitude: "Längengrad".to_string(),
            power_kw: "kW".to_string(),
            area_code: "PLZ".to_string(),
        }
    }

    fn table(rows: &[[&str; 6]]) -> RawTable {
        RawTable::new(
            "stations.csv",
            HEADERS.iter().map(ToString::to_string).collect(),
            rows.iter()
                .map(|r| r.iter().map(ToString::to_string).collect())
                .collect(),
        )
    }

    fn code(raw: &str) -> AreaCode {
        AreaCode::parse(raw, AreaCodeRange::new(10_001, 14_199)).unwrap()
    }

    /// One area covering the whole Berlin bounding box.
    fn fixtures() -> (BTreeSet<AreaCode>, SpatialIndex) {
        let known: BTreeSet<_> = [code("10115"), code("10117")].into_iter().collect();
        let mut boundaries = BTreeMap::new();
        boundaries.insert(
            code("10117"),
            parse_geometry_text("POLYGON((13.0 52.3, 13.8 52.3, 13.8 52.7, 13.0 52.7, 13.0 52.3))")
                .unwrap(),
        );
        (known, SpatialIndex::from_boundaries(&boundaries))
    }

    fn run(rows: &[[&str; 6]]) -> PreprocessedStations {
        let region = RegionConfig::default();
        let columns = columns();
        let (known, index) = fixtures();
        let chain = ResolverChain::standard(&known, &index);
        StationPreprocessor::new(&region, &columns)
            .process(&table(rows), &chain)
            .unwrap()
    }

    #[test]
    fn filters_to_target_region() {
        let out = run(&[
            ["a", "Berlin", "52,52", "13,40", "22", "10115"],
            ["b", "Bayern", "48,13", "11,58", "22", "80331"],
        ]);
        assert_eq!(out.counts.read, 2);
        assert_eq!(out.counts.out_of_region, 1);
        assert_eq!(out.stations.len(), 1);
        assert!(out.issues.is_empty());
    }

    #[test]
    fn repairs_decimal_commas_and_classifies() {
        let out = run(&[["a", "Berlin", "52,52", "13,40", "150,0", "10115"]]);
        let station = &out.stations[0];
        assert!((station.latitude.unwrap() - 52.52).abs() < f64::EPSILON);
        assert!((station.power_kw.unwrap() - 150.0).abs() < f64::EPSILON);
        assert_eq!(station.power_category, Some(PowerCategory::UltraRapid));
        assert_eq!(station.resolution, ResolutionMethod::DeclaredKey);
    }

    #[test]
    fn unparseable_power_becomes_missing_not_fatal() {
        let out = run(&[
            ["a", "Berlin", "52,52", "13,40", "abc", "10115"],
            ["b", "Berlin", "52,52", "13,40", "", "10115"],
        ]);
        assert_eq!(out.stations.len(), 2);
        assert!(out.stations.iter().all(|s| s.power_category.is_none()));
        assert_eq!(out.issues.len(), 1);
        assert_eq!(out.issues[0].kind, IssueKind::NumericParseError);
        assert_eq!(out.issues[0].entity_id, "a");
    }

    #[test]
    fn negative_power_is_range_error_and_missing() {
        let out = run(&[["a", "Berlin", "52,52", "13,40", "-5", "10115"]]);
        assert_eq!(out.stations[0].power_kw, None);
        assert_eq!(out.issues[0].kind, IssueKind::RangeValidationError);
    }

    #[test]
    fn foreign_declared_code_is_range_error_and_malformed_is_parse_error() {
        let out = run(&[
            ["a", "Berlin", "52,52", "13,40", "11", "80331"],
            ["b", "Berlin", "52,52", "13,40", "11", "1O115"],
        ]);
        let kinds: Vec<_> = out.issues.iter().map(|i| (i.entity_id.as_str(), i.kind)).collect();
        assert_eq!(
            kinds,
            [
                ("a", IssueKind::RangeValidationError),
                ("b", IssueKind::NumericParseError),
            ]
        );
        assert_eq!(out.stations.len(), 2);
        assert!(
            out.stations
                .iter()
                .all(|s| s.resolution == ResolutionMethod::PointInPolygon)
        );
    }

    #[test]
    fn missing_code_resolves_by_polygon() {
        let out = run(&[["a", "Berlin", "52,52", "13,40", "11", ""]]);
        assert_eq!(out.stations[0].area_code, code("10117"));
        assert_eq!(out.stations[0].resolution, ResolutionMethod::PointInPolygon);
    }

    #[test]
    fn out_of_box_coordinates_keep_declared_code() {
        let out = run(&[["a", "Berlin", "48,13", "11,58", "11", "10115"]]);
        assert_eq!(out.stations.len(), 1);
        assert_eq!(out.stations[0].area_code, code("10115"));
    }

    #[test]
    fn no_code_and_no_coordinates_is_dropped() {
        let out = run(&[["a", "Berlin", "", "x", "11", ""]]);
        assert!(out.stations.is_empty());
        assert!(out.unresolvable.is_empty());
        assert_eq!(out.counts.dropped, 1);
    }

    #[test]
    fn unknown_code_without_coordinates_is_unresolvable() {
        let out = run(&[["a", "Berlin", "", "", "11", "12000"]]);
        assert!(out.stations.is_empty());
        assert_eq!(out.unresolvable.len(), 1);
        assert_eq!(out.unresolvable[0].declared_area_code.as_deref(), Some("12000"));
        assert_eq!(out.counts.unresolvable, 1);
        assert!(
            out.issues
                .iter()
                .any(|i| i.kind == IssueKind::UnresolvableStation)
        );
    }

    #[test]
    fn missing_ratios_measure_raw_in_region_rows() {
        let out = run(&[
            ["a", "Berlin", "", "13,40", "", "10115"],
            ["b", "Berlin", "52,52", "13,40", "22", "10115"],
            ["c", "Bayern", "", "", "", ""],
        ]);
        let lat = out.missing.iter().find(|m| m.column == "Breitengrad").unwrap();
        assert_eq!((lat.missing, lat.total), (1, 2));
        let power = out.missing.iter().find(|m| m.column == "kW").unwrap();
        assert!((power.ratio - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn numbers_rows_without_id_column() {
        let region = RegionConfig::default();
        let mut columns = columns();
        columns.id = None;
        let (known, index) = fixtures();
        let chain = ResolverChain::standard(&known, &index);
        let out = StationPreprocessor::new(&region, &columns)
            .process(
                &table(&[
                    ["x", "Bayern", "", "", "", ""],
                    ["x", "Berlin", "52,52", "13,40", "11", "10115"],
                ]),
                &chain,
            )
            .unwrap();
        assert_eq!(out.stations[0].id, "row-2");
    }
}

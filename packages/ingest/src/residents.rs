//! Population table preprocessing.

use std::collections::BTreeMap;

use evision_charging_models::{
    AreaCode, AreaCodeRange, DataIssue, Dataset, IssueKind, PopulationRecord,
};
use evision_config::PopulationColumns;
use evision_ingest_models::{MissingCounter, PreprocessedResidents};
use evision_source::parsing::{parse_count, parse_locale_f64};
use evision_source::{RawTable, SourceError};

/// Normalizes population area codes and validates resident counts.
pub struct ResidentPreprocessor<'a> {
    columns: &'a PopulationColumns,
    area_codes: AreaCodeRange,
}

impl<'a> ResidentPreprocessor<'a> {
    /// Creates a preprocessor for the column layout and region code range.
    #[must_use]
    pub const fn new(columns: &'a PopulationColumns, area_codes: AreaCodeRange) -> Self {
        Self {
            columns,
            area_codes,
        }
    }

    /// Preprocesses every row of the population table.
    ///
    /// Codes from other regions are skipped silently. Malformed codes and
    /// negative populations drop the row; an unparseable population is
    /// kept as unknown. Rows sharing a code are merged by summing their
    /// known populations.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::MissingColumns`] if the code or population
    /// column is absent.
    pub fn process(&self, table: &RawTable) -> Result<PreprocessedResidents, SourceError> {
        table.require_columns(&self.columns.required())?;
        let (Some(code_col), Some(population_col)) = (
            table.column_index(&self.columns.area_code),
            table.column_index(&self.columns.population),
        ) else {
            return Ok(PreprocessedResidents::default());
        };
        let lat_col = self.columns.latitude.as_deref().and_then(|c| table.column_index(c));
        let lon_col = self.columns.longitude.as_deref().and_then(|c| table.column_index(c));

        let mut out = PreprocessedResidents::default();
        out.counts.read = table.len() as u64;

        let mut missing = MissingCounter::new([
            self.columns.area_code.as_str(),
            self.columns.population.as_str(),
        ]);
        let mut by_code: BTreeMap<AreaCode, PopulationRecord> = BTreeMap::new();

        for row in 0..table.len() {
            let raw_code = table.value(row, code_col);
            let raw_population = table.value(row, population_col);

            let code = match AreaCode::parse(raw_code, self.area_codes) {
                Ok(code) => code,
                Err(e) if e.is_out_of_range() => {
                    out.counts.out_of_region += 1;
                    continue;
                }
                Err(e) => {
                    missing.observe([raw_code, raw_population]);
                    out.counts.dropped += 1;
                    record(
                        &mut out.issues,
                        DataIssue::new(
                            IssueKind::NumericParseError,
                            Dataset::Population,
                            format!("row-{}", row + 1),
                            format!("{}: {e}, row dropped", self.columns.area_code),
                        ),
                    );
                    continue;
                }
            };
            missing.observe([raw_code, raw_population]);

            let population = match parse_count(raw_population) {
                None => None,
                Some(Ok(count)) => {
                    if let Ok(count) = u64::try_from(count) {
                        Some(count)
                    } else {
                        out.counts.dropped += 1;
                        record(
                            &mut out.issues,
                            DataIssue::new(
                                IssueKind::RangeValidationError,
                                Dataset::Population,
                                code.as_str(),
                                format!("negative population {count}, row dropped"),
                            ),
                        );
                        continue;
                    }
                }
                Some(Err(raw)) => {
                    record(
                        &mut out.issues,
                        DataIssue::new(
                            IssueKind::NumericParseError,
                            Dataset::Population,
                            code.as_str(),
                            format!("{}: '{raw}' is not a whole number", self.columns.population),
                        ),
                    );
                    None
                }
            };

            let latitude = lat_col.and_then(|c| parse_locale_f64(table.value(row, c)));
            let longitude = lon_col.and_then(|c| parse_locale_f64(table.value(row, c)));

            if let Some(existing) = by_code.get_mut(&code) {
                log::debug!("Merging duplicate population row for {code}");
                out.counts.merged_duplicates += 1;
                existing.population = match (existing.population, population) {
                    (Some(a), Some(b)) => Some(a.saturating_add(b)),
                    (a, b) => a.or(b),
                };
            } else {
                by_code.insert(
                    code.clone(),
                    PopulationRecord {
                        area_code: code,
                        population,
                        latitude,
                        longitude,
                    },
                );
            }
        }

        out.records = by_code.into_values().collect();
        out.missing = missing.finish(Dataset::Population);

        log::info!(
            "Preprocessed population: {} read, {} other regions, {} dropped, {} areas",
            out.counts.read,
            out.counts.out_of_region,
            out.counts.dropped,
            out.records.len()
        );

        Ok(out)
    }
}

fn record(issues: &mut Vec<DataIssue>, issue: DataIssue) {
    log::warn!("{issue}");
    issues.push(issue);
}

//! Geometry table normalization.

use std::collections::BTreeMap;

use evision_charging_models::{AreaCode, AreaCodeRange, DataIssue, Dataset, IssueKind};
use evision_config::GeometryColumns;
use evision_source::{RawTable, SourceError};
use geo::MultiPolygon;

use crate::parse_geometry_text;

/// Boundaries keyed by canonical area code, plus the rows that were dropped.
#[derive(Debug, Clone, Default)]
pub struct NormalizedGeometries {
    /// One boundary per area code.
    pub boundaries: BTreeMap<AreaCode, MultiPolygon<f64>>,
    /// Problems found while normalizing.
    pub issues: Vec<DataIssue>,
    /// Data rows in the source table.
    pub rows_read: usize,
    /// Rows that did not produce a boundary.
    pub rows_dropped: usize,
}

/// Turns geometry table rows into area boundaries.
pub struct GeometryNormalizer<'a> {
    columns: &'a GeometryColumns,
    area_codes: AreaCodeRange,
}

impl<'a> GeometryNormalizer<'a> {
    /// Creates a normalizer for the configured columns and code range.
    #[must_use]
    pub const fn new(columns: &'a GeometryColumns, area_codes: AreaCodeRange) -> Self {
        Self {
            columns,
            area_codes,
        }
    }

    /// Parses every row. Rows with a bad code or bad geometry are dropped and
    /// recorded; the first valid row for a code wins.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::MissingColumns`] if the table lacks the code or
    /// geometry column.
    pub fn normalize(&self, table: &RawTable) -> Result<NormalizedGeometries, SourceError> {
        table.require_columns(&self.columns.required())?;
        let (Some(code_col), Some(geometry_col)) = (
            table.column_index(&self.columns.area_code),
            table.column_index(&self.columns.geometry),
        ) else {
            return Ok(NormalizedGeometries::default());
        };

        let mut out = NormalizedGeometries {
            rows_read: table.len(),
            ..NormalizedGeometries::default()
        };

        for row in 0..table.len() {
            let raw_code = table.value(row, code_col);
            let entity = if raw_code.is_empty() {
                format!("row-{}", row + 1)
            } else {
                raw_code.to_string()
            };

            let code = match AreaCode::parse(raw_code, self.area_codes) {
                Ok(code) => code,
                Err(e) => {
                    let kind = if e.is_out_of_range() {
                        IssueKind::RangeValidationError
                    } else {
                        IssueKind::NumericParseError
                    };
                    out.record(DataIssue::new(kind, Dataset::Geometry, entity, e.to_string()));
                    continue;
                }
            };

            if out.boundaries.contains_key(&code) {
                out.record(DataIssue::new(
                    IssueKind::GeometryParseError,
                    Dataset::Geometry,
                    code.as_str(),
                    "duplicate geometry row, first kept",
                ));
                continue;
            }

            match parse_geometry_text(table.value(row, geometry_col)) {
                Ok(boundary) => {
                    out.boundaries.insert(code, boundary);
                }
                Err(e) => {
                    out.record(DataIssue::new(
                        IssueKind::GeometryParseError,
                        Dataset::Geometry,
                        code.as_str(),
                        e.to_string(),
                    ));
                }
            }
        }

        log::info!(
            "Normalized {} area boundaries ({} of {} rows dropped)",
            out.boundaries.len(),
            out.rows_dropped,
            out.rows_read
        );

        Ok(out)
    }
}

impl NormalizedGeometries {
    fn record(&mut self, issue: DataIssue) {
        log::warn!("{issue}");
        self.rows_dropped += 1;
        self.issues.push(issue);
    }
}
